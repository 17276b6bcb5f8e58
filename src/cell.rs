use crate::coordinates::{
    EdgeType, ELEVATION_PERTURB_STRENGTH, ELEVATION_STEP, HexCoordinates, HexDirection,
    INNER_RADIUS, OUTER_RADIUS,
};
use crate::noise::NoiseSampler;
use serde::{Deserialize, Serialize};

/// Тип поверхности клетки. Числовое значение хранится в файле карты.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TerrainType {
    #[default]
    Sand = 0,
    Grass = 1,
    Mud = 2,
    Stone = 3,
    Snow = 4,
}

impl TerrainType {
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(TerrainType::Sand),
            1 => Some(TerrainType::Grass),
            2 => Some(TerrainType::Mud),
            3 => Some(TerrainType::Stone),
            4 => Some(TerrainType::Snow),
            _ => None,
        }
    }
}

/// Временное состояние клетки, принадлежащее одному поиску.
///
/// Поля имеют смысл только если `stamp` совпадает со штампом текущего поиска.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SearchState {
    pub stamp: u32,
    pub distance: i32,
    pub heuristic: i32,
    pub path_from: Option<usize>,
}

impl SearchState {
    pub fn priority(&self) -> i32 {
        self.distance + self.heuristic
    }
}

/// Узел графа клеток. Все изменения идут через [`crate::grid::HexGrid`],
/// чтобы соседи и наблюдатели оставались согласованными.
#[derive(Debug, Clone)]
pub struct HexCell {
    pub(crate) coordinates: HexCoordinates,
    pub(crate) index: usize,
    pub(crate) chunk_index: usize,
    pub(crate) neighbors: [Option<usize>; 6],

    pub(crate) elevation: i32,
    pub(crate) water_level: i32,
    pub(crate) terrain_type: TerrainType,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) plant_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,
    pub(crate) roads: u8,
    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,

    pub(crate) explorable: bool,
    pub(crate) visibility: u32,
    pub(crate) explored: bool,
    pub(crate) unit: Option<usize>,

    pub(crate) search: SearchState,
}

impl HexCell {
    pub(crate) fn new(coordinates: HexCoordinates, index: usize, chunk_index: usize) -> Self {
        Self {
            coordinates,
            index,
            chunk_index,
            neighbors: [None; 6],
            elevation: 0,
            water_level: 0,
            terrain_type: TerrainType::Sand,
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            roads: 0,
            incoming_river: None,
            outgoing_river: None,
            explorable: false,
            visibility: 0,
            explored: false,
            unit: None,
            search: SearchState::default(),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    #[must_use]
    pub fn neighbor(&self, direction: HexDirection) -> Option<usize> {
        self.neighbors[direction.index()]
    }

    #[must_use]
    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    #[must_use]
    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    /// Видимая высота: уровень воды, если клетка затоплена.
    #[must_use]
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    #[must_use]
    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    #[must_use]
    pub fn terrain_type(&self) -> TerrainType {
        self.terrain_type
    }

    #[must_use]
    pub fn urban_level(&self) -> u8 {
        self.urban_level
    }

    #[must_use]
    pub fn farm_level(&self) -> u8 {
        self.farm_level
    }

    #[must_use]
    pub fn plant_level(&self) -> u8 {
        self.plant_level
    }

    #[must_use]
    pub fn special_index(&self) -> u8 {
        self.special_index
    }

    #[must_use]
    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    #[must_use]
    pub fn walled(&self) -> bool {
        self.walled
    }

    /// Битовая маска дорог: бит `d` соответствует направлению `d`.
    #[must_use]
    pub fn road_mask(&self) -> u8 {
        self.roads
    }

    #[must_use]
    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads & (1 << direction.index()) != 0
    }

    #[must_use]
    pub fn has_roads(&self) -> bool {
        self.roads != 0
    }

    #[must_use]
    pub fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    #[must_use]
    pub fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    #[must_use]
    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// Исток или устье: река входит или выходит, но не то и другое.
    #[must_use]
    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    #[must_use]
    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    /// Может ли река течь из этой клетки в `neighbor`.
    #[must_use]
    pub fn is_valid_river_destination(&self, neighbor: &HexCell) -> bool {
        self.elevation >= neighbor.elevation || self.water_level == neighbor.elevation
    }

    #[must_use]
    pub fn edge_type(&self, other: &HexCell) -> EdgeType {
        EdgeType::between(self.elevation, other.elevation)
    }

    #[must_use]
    pub fn is_explorable(&self) -> bool {
        self.explorable
    }

    #[must_use]
    pub fn is_explored(&self) -> bool {
        self.explored
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility > 0
    }

    #[must_use]
    pub fn visibility(&self) -> u32 {
        self.visibility
    }

    #[must_use]
    pub fn unit(&self) -> Option<usize> {
        self.unit
    }

    /// Стоимость пути до клетки в последнем поиске, который её затронул.
    #[must_use]
    pub fn search_distance(&self) -> i32 {
        self.search.distance
    }

    /// Мировая позиция центра клетки с шумовым смещением высоты.
    #[must_use]
    pub fn position(&self, noise: &dyn NoiseSampler) -> [f32; 3] {
        let (column, row) = self.coordinates.to_offset();
        let x = (column as f32 + row as f32 * 0.5 - (row / 2) as f32) * (INNER_RADIUS * 2.0);
        let z = row as f32 * (OUTER_RADIUS * 1.5);
        let perturb = noise.sample([x, 0.0, z])[1] * 2.0 - 1.0;
        let y = self.elevation as f32 * ELEVATION_STEP + perturb * ELEVATION_PERTURB_STRENGTH;
        [x, y, z]
    }
}
