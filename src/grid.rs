//! Граф клеток: построение сетки, связи соседей и изменение постоянных атрибутов.

use crate::cell::{HexCell, TerrainType};
use crate::config::GridSettings;
use crate::coordinates::{CHUNK_SIZE_X, CHUNK_SIZE_Z, HexCoordinates, HexDirection};
use crate::error::MapError;
use crate::observer::GridObserver;
use crate::unit::HexUnit;
use std::collections::BTreeSet;
use tracing::info;

pub struct HexGrid {
    width: i32,
    height: i32,
    wrapping: bool,
    chunk_count_x: i32,
    chunk_count_z: i32,
    pub(crate) cells: Vec<HexCell>,
    pub(crate) units: Vec<HexUnit>,
    search_stamp: u32,
    pending_chunks: BTreeSet<usize>,
    observer: Option<Box<dyn GridObserver>>,
}

impl HexGrid {
    pub fn new(settings: &GridSettings) -> Result<Self, MapError> {
        settings.validate()?;
        let mut grid = Self {
            width: 0,
            height: 0,
            wrapping: false,
            chunk_count_x: 0,
            chunk_count_z: 0,
            cells: Vec::new(),
            units: Vec::new(),
            search_stamp: 0,
            pending_chunks: BTreeSet::new(),
            observer: None,
        };
        grid.create_map(settings.width, settings.height, settings.wrapping)?;
        Ok(grid)
    }

    /// Перестраивает карту заданного размера. При недопустимом размере
    /// возвращает ошибку и оставляет текущую карту без изменений.
    pub fn create_map(&mut self, width: i32, height: i32, wrapping: bool) -> Result<(), MapError> {
        GridSettings {
            width,
            height,
            wrapping,
        }
        .validate()?;

        self.width = width;
        self.height = height;
        self.wrapping = wrapping;
        self.chunk_count_x = width / CHUNK_SIZE_X;
        self.chunk_count_z = height / CHUNK_SIZE_Z;
        self.units.clear();
        self.search_stamp = 0;
        self.cells = build_cells(width, height, wrapping, self.chunk_count_x);
        info!(width, height, wrapping, "created hex map");

        for chunk in 0..self.chunk_count() {
            self.pending_chunks.insert(chunk);
        }
        self.flush_chunks();
        Ok(())
    }

    /// Подключает получателя уведомлений, возвращая предыдущего.
    pub fn set_observer(
        &mut self,
        observer: Option<Box<dyn GridObserver>>,
    ) -> Option<Box<dyn GridObserver>> {
        std::mem::replace(&mut self.observer, observer)
    }

    pub(crate) fn take_observer(&mut self) -> Option<Box<dyn GridObserver>> {
        self.observer.take()
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub fn wrapping(&self) -> bool {
        self.wrapping
    }

    #[must_use]
    pub fn chunk_count_x(&self) -> i32 {
        self.chunk_count_x
    }

    #[must_use]
    pub fn chunk_count_z(&self) -> i32 {
        self.chunk_count_z
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count_x as usize * self.chunk_count_z as usize
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// # Panics
    /// Если индекс вне карты.
    #[must_use]
    pub fn cell(&self, index: usize) -> &HexCell {
        &self.cells[index]
    }

    #[must_use]
    pub fn units(&self) -> &[HexUnit] {
        &self.units
    }

    #[must_use]
    pub fn neighbor(&self, index: usize, direction: HexDirection) -> Option<usize> {
        self.cells[index].neighbor(direction)
    }

    /// Клетка по смещённым координатам; при свёртке столбец берётся по модулю ширины.
    #[must_use]
    pub fn cell_at_offset(&self, column: i32, row: i32) -> Option<usize> {
        if row < 0 || row >= self.height {
            return None;
        }
        let column = if self.wrapping {
            column.rem_euclid(self.width)
        } else if column < 0 || column >= self.width {
            return None;
        } else {
            column
        };
        Some((row * self.width + column) as usize)
    }

    #[must_use]
    pub fn cell_at(&self, coordinates: HexCoordinates) -> Option<usize> {
        let (column, row) = coordinates.to_offset();
        self.cell_at_offset(column, row)
    }

    /// Расстояние между клетками с учётом свёртки карты.
    #[must_use]
    pub fn distance(&self, a: usize, b: usize) -> i32 {
        let from = self.cells[a].coordinates;
        let to = self.cells[b].coordinates;
        if self.wrapping {
            from.wrapped_distance_to(to, self.width)
        } else {
            from.distance_to(to)
        }
    }

    /// Выдаёт штамп для нового поиска. Клетка считается свежей для поиска,
    /// если её штамп отличается от выданного.
    pub fn begin_search(&mut self) -> u32 {
        if self.search_stamp == u32::MAX {
            self.clear_search_state();
        }
        self.search_stamp += 1;
        self.search_stamp
    }

    pub(crate) fn search_stamp(&self) -> u32 {
        self.search_stamp
    }

    /// Забывает все штампы поисков.
    pub fn clear_search_state(&mut self) {
        for cell in &mut self.cells {
            cell.search = crate::cell::SearchState::default();
        }
        self.search_stamp = 0;
    }

    pub fn set_elevation(&mut self, index: usize, elevation: i32) {
        if self.cells[index].elevation == elevation {
            return;
        }
        self.cells[index].elevation = elevation;
        self.validate_rivers(index);
        self.mark_with_neighbors(index);
        self.flush_chunks();
    }

    pub fn set_water_level(&mut self, index: usize, water_level: i32) {
        if self.cells[index].water_level == water_level {
            return;
        }
        self.cells[index].water_level = water_level;
        self.validate_rivers(index);
        self.mark_with_neighbors(index);
        self.flush_chunks();
    }

    pub fn set_terrain_type(&mut self, index: usize, terrain_type: TerrainType) {
        if self.cells[index].terrain_type == terrain_type {
            return;
        }
        self.cells[index].terrain_type = terrain_type;
        if let Some(observer) = self.observer.as_mut() {
            observer.refresh_terrain(&self.cells[index]);
        }
    }

    pub fn set_urban_level(&mut self, index: usize, level: u8) {
        if self.cells[index].urban_level != level {
            self.cells[index].urban_level = level;
            self.mark(index);
            self.flush_chunks();
        }
    }

    pub fn set_farm_level(&mut self, index: usize, level: u8) {
        if self.cells[index].farm_level != level {
            self.cells[index].farm_level = level;
            self.mark(index);
            self.flush_chunks();
        }
    }

    pub fn set_plant_level(&mut self, index: usize, level: u8) {
        if self.cells[index].plant_level != level {
            self.cells[index].plant_level = level;
            self.mark(index);
            self.flush_chunks();
        }
    }

    /// Особые объекты не ставятся на реки и убирают дороги клетки.
    pub fn set_special_index(&mut self, index: usize, special_index: u8) {
        let cell = &self.cells[index];
        if cell.special_index == special_index || cell.has_river() {
            return;
        }
        self.cells[index].special_index = special_index;
        self.remove_roads_inner(index);
        self.mark(index);
        self.flush_chunks();
    }

    pub fn set_walled(&mut self, index: usize, walled: bool) {
        if self.cells[index].walled != walled {
            self.cells[index].walled = walled;
            self.mark_with_neighbors(index);
            self.flush_chunks();
        }
    }

    /// Прокладывает дорогу через ребро. Возвращает `false`, если дорогу
    /// нельзя проложить: по ребру течёт река, одна из клеток особая или
    /// перепад высот больше одного уровня.
    pub fn add_road(&mut self, index: usize, direction: HexDirection) -> bool {
        let cell = &self.cells[index];
        let Some(neighbor) = cell.neighbor(direction) else {
            return false;
        };
        let other = &self.cells[neighbor];
        if cell.has_road_through_edge(direction)
            || cell.has_river_through_edge(direction)
            || cell.is_special()
            || other.is_special()
            || (cell.elevation - other.elevation).abs() > 1
        {
            return false;
        }
        self.set_road_inner(index, direction, true);
        self.flush_chunks();
        true
    }

    pub fn remove_roads(&mut self, index: usize) {
        self.remove_roads_inner(index);
        self.flush_chunks();
    }

    /// Пускает реку из клетки в соседа. Реки не текут вверх, поэтому
    /// недопустимое направление отклоняется и возвращается `false`.
    pub fn set_outgoing_river(&mut self, index: usize, direction: HexDirection) -> bool {
        if self.cells[index].outgoing_river == Some(direction) {
            return true;
        }
        let Some(neighbor) = self.cells[index].neighbor(direction) else {
            return false;
        };
        if !self.cells[index].is_valid_river_destination(&self.cells[neighbor]) {
            return false;
        }

        self.remove_outgoing_river_inner(index);
        if self.cells[index].incoming_river == Some(direction) {
            self.remove_incoming_river_inner(index);
        }
        self.cells[index].special_index = 0;
        self.cells[index].outgoing_river = Some(direction);

        self.remove_incoming_river_inner(neighbor);
        self.cells[neighbor].incoming_river = Some(direction.opposite());
        self.cells[neighbor].special_index = 0;

        self.set_road_inner(index, direction, false);
        self.mark(index);
        self.mark(neighbor);
        self.flush_chunks();
        true
    }

    pub fn remove_outgoing_river(&mut self, index: usize) {
        self.remove_outgoing_river_inner(index);
        self.flush_chunks();
    }

    pub fn remove_incoming_river(&mut self, index: usize) {
        self.remove_incoming_river_inner(index);
        self.flush_chunks();
    }

    pub fn remove_river(&mut self, index: usize) {
        self.remove_outgoing_river_inner(index);
        self.remove_incoming_river_inner(index);
        self.flush_chunks();
    }

    fn river_neighbor(&self, index: usize, direction: HexDirection) -> usize {
        self.cells[index]
            .neighbor(direction)
            .expect("river edge must lead to an existing neighbor")
    }

    fn remove_outgoing_river_inner(&mut self, index: usize) {
        let Some(direction) = self.cells[index].outgoing_river.take() else {
            return;
        };
        let neighbor = self.river_neighbor(index, direction);
        self.cells[neighbor].incoming_river = None;
        self.mark(index);
        self.mark(neighbor);
    }

    fn remove_incoming_river_inner(&mut self, index: usize) {
        let Some(direction) = self.cells[index].incoming_river.take() else {
            return;
        };
        let neighbor = self.river_neighbor(index, direction);
        self.cells[neighbor].outgoing_river = None;
        self.mark(index);
        self.mark(neighbor);
    }

    /// Убирает рёбра рек, ставшие недопустимыми после изменения высот.
    fn validate_rivers(&mut self, index: usize) {
        if let Some(direction) = self.cells[index].outgoing_river {
            let neighbor = self.river_neighbor(index, direction);
            if !self.cells[index].is_valid_river_destination(&self.cells[neighbor]) {
                self.remove_outgoing_river_inner(index);
            }
        }
        if let Some(direction) = self.cells[index].incoming_river {
            let neighbor = self.river_neighbor(index, direction);
            if !self.cells[neighbor].is_valid_river_destination(&self.cells[index]) {
                self.remove_incoming_river_inner(index);
            }
        }
    }

    fn set_road_inner(&mut self, index: usize, direction: HexDirection, state: bool) {
        let Some(neighbor) = self.cells[index].neighbor(direction) else {
            return;
        };
        let bit = 1u8 << direction.index();
        let opposite_bit = 1u8 << direction.opposite().index();
        if state {
            self.cells[index].roads |= bit;
            self.cells[neighbor].roads |= opposite_bit;
        } else {
            self.cells[index].roads &= !bit;
            self.cells[neighbor].roads &= !opposite_bit;
        }
        self.mark(index);
        self.mark(neighbor);
    }

    fn remove_roads_inner(&mut self, index: usize) {
        for direction in HexDirection::ALL {
            if self.cells[index].has_road_through_edge(direction) {
                self.set_road_inner(index, direction, false);
            }
        }
    }

    pub(crate) fn notify_visibility(&mut self, index: usize) {
        if let Some(observer) = self.observer.as_mut() {
            observer.refresh_visibility(&self.cells[index]);
        }
    }

    /// Полное обновление после загрузки или генерации карты.
    pub(crate) fn refresh_all(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            for cell in &self.cells {
                observer.refresh_terrain(cell);
                observer.refresh_visibility(cell);
            }
        }
        for chunk in 0..self.chunk_count() {
            self.pending_chunks.insert(chunk);
        }
        self.flush_chunks();
    }

    fn mark(&mut self, index: usize) {
        self.pending_chunks.insert(self.cells[index].chunk_index);
    }

    fn mark_with_neighbors(&mut self, index: usize) {
        self.mark(index);
        for neighbor in self.cells[index].neighbors.into_iter().flatten() {
            self.mark(neighbor);
        }
    }

    fn flush_chunks(&mut self) {
        let pending = std::mem::take(&mut self.pending_chunks);
        if let Some(observer) = self.observer.as_mut() {
            for chunk in pending {
                observer.refresh_chunk(chunk);
            }
        }
    }
}

/// Создаёт клетки построчно и связывает соседей.
fn build_cells(width: i32, height: i32, wrapping: bool, chunk_count_x: i32) -> Vec<HexCell> {
    let mut cells = Vec::with_capacity(width as usize * height as usize);
    for z in 0..height {
        for x in 0..width {
            let i = (z * width + x) as usize;
            let chunk = (x / CHUNK_SIZE_X + (z / CHUNK_SIZE_Z) * chunk_count_x) as usize;
            let mut cell = HexCell::new(HexCoordinates::from_offset(x, z), i, chunk);
            cell.explorable = if wrapping {
                z > 0 && z < height - 1
            } else {
                x > 0 && z > 0 && x < width - 1 && z < height - 1
            };
            cells.push(cell);

            let w = width as usize;
            if x > 0 {
                link(&mut cells, i, HexDirection::W, i - 1);
                if wrapping && x == width - 1 {
                    link(&mut cells, i, HexDirection::E, i - x as usize);
                }
            }
            if z > 0 {
                if z & 1 == 0 {
                    link(&mut cells, i, HexDirection::SE, i - w);
                    if x > 0 {
                        link(&mut cells, i, HexDirection::SW, i - w - 1);
                    } else if wrapping {
                        link(&mut cells, i, HexDirection::SW, i - 1);
                    }
                } else {
                    link(&mut cells, i, HexDirection::SW, i - w);
                    if x < width - 1 {
                        link(&mut cells, i, HexDirection::SE, i - w + 1);
                    } else if wrapping {
                        link(&mut cells, i, HexDirection::SE, i + 1 - 2 * w);
                    }
                }
            }
        }
    }
    cells
}

/// Связывает две клетки ребром сразу с обеих сторон.
fn link(cells: &mut [HexCell], a: usize, direction: HexDirection, b: usize) {
    cells[a].neighbors[direction.index()] = Some(b);
    cells[b].neighbors[direction.opposite().index()] = Some(a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        chunks: Vec<usize>,
        terrain: Vec<usize>,
    }

    struct Recorder(Rc<RefCell<Log>>);

    impl GridObserver for Recorder {
        fn refresh_chunk(&mut self, chunk: usize) {
            self.0.borrow_mut().chunks.push(chunk);
        }
        fn refresh_terrain(&mut self, cell: &HexCell) {
            self.0.borrow_mut().terrain.push(cell.index());
        }
    }

    fn grid(width: i32, height: i32, wrapping: bool) -> HexGrid {
        HexGrid::new(&GridSettings {
            width,
            height,
            wrapping,
        })
        .unwrap()
    }

    fn assert_symmetric(grid: &HexGrid) {
        for cell in grid.cells() {
            for d in HexDirection::ALL {
                if let Some(n) = cell.neighbor(d) {
                    assert_eq!(
                        grid.cell(n).neighbor(d.opposite()),
                        Some(cell.index()),
                        "cell {} dir {d:?}",
                        cell.index()
                    );
                }
            }
        }
    }

    #[test]
    fn builds_width_times_height_cells() {
        let g = grid(20, 15, false);
        assert_eq!(g.cell_count(), 300);
        assert_eq!(g.chunk_count(), 12);
        assert_symmetric(&g);
    }

    #[test]
    fn neighbors_match_coordinate_steps() {
        let g = grid(10, 10, false);
        for cell in g.cells() {
            for d in HexDirection::ALL {
                let expected = g.cell_at(cell.coordinates().step(d));
                assert_eq!(cell.neighbor(d), expected);
            }
        }
    }

    #[test]
    fn wrapping_links_east_and_west_edges() {
        let g = grid(10, 10, true);
        assert_symmetric(&g);
        for cell in g.cells() {
            let (_, row) = cell.coordinates().to_offset();
            let expected = if row == 0 || row == 9 { 4 } else { 6 };
            let count = cell.neighbors.iter().flatten().count();
            assert_eq!(count, expected, "cell {}", cell.index());
        }
        let east_edge = g.cell_at_offset(9, 2).unwrap();
        assert_eq!(g.neighbor(east_edge, HexDirection::E), g.cell_at_offset(0, 2));
        assert_eq!(g.distance(east_edge, g.cell_at_offset(0, 2).unwrap()), 1);
    }

    #[test]
    fn rejects_invalid_sizes_and_keeps_map() {
        let mut g = grid(10, 10, false);
        g.set_elevation(12, 4);
        for (w, h) in [(0, 10), (12, 10), (10, -5), (10, 7)] {
            assert!(matches!(
                g.create_map(w, h, false),
                Err(MapError::InvalidDimensions { .. })
            ));
        }
        assert_eq!(g.cell_count(), 100);
        assert_eq!(g.cell(12).elevation(), 4);
    }

    #[test]
    fn border_cells_are_not_explorable() {
        let g = grid(10, 10, false);
        assert!(!g.cell(g.cell_at_offset(0, 4).unwrap()).is_explorable());
        assert!(!g.cell(g.cell_at_offset(4, 9).unwrap()).is_explorable());
        assert!(g.cell(g.cell_at_offset(4, 4).unwrap()).is_explorable());

        let wrapped = grid(10, 10, true);
        assert!(wrapped.cell(wrapped.cell_at_offset(0, 4).unwrap()).is_explorable());
    }

    #[test]
    fn river_requires_downhill_edge() {
        let mut g = grid(10, 10, false);
        let a = g.cell_at_offset(4, 4).unwrap();
        let b = g.neighbor(a, HexDirection::E).unwrap();
        g.set_elevation(b, 2);
        assert!(!g.set_outgoing_river(a, HexDirection::E));
        assert!(g.set_outgoing_river(b, HexDirection::W));
        assert_eq!(g.cell(a).incoming_river(), Some(HexDirection::E));
        assert_eq!(g.cell(b).outgoing_river(), Some(HexDirection::W));

        // подъём нижней клетки делает ребро недопустимым
        g.set_elevation(a, 3);
        assert!(!g.cell(a).has_river());
        assert!(!g.cell(b).has_river());
    }

    #[test]
    fn new_outgoing_river_replaces_old_edges() {
        let mut g = grid(10, 10, false);
        let a = g.cell_at_offset(4, 4).unwrap();
        let e = g.neighbor(a, HexDirection::E).unwrap();
        let w = g.neighbor(a, HexDirection::W).unwrap();
        assert!(g.set_outgoing_river(a, HexDirection::E));
        assert!(g.set_outgoing_river(a, HexDirection::W));
        assert!(!g.cell(e).has_river());
        assert_eq!(g.cell(w).incoming_river(), Some(HexDirection::E));
        // река в обратную сторону снимает входящую
        assert!(g.set_outgoing_river(w, HexDirection::E));
        assert_eq!(g.cell(a).outgoing_river(), None);
        assert_eq!(g.cell(a).incoming_river(), Some(HexDirection::W));
    }

    #[test]
    fn roads_are_symmetric_and_blocked_by_rivers() {
        let mut g = grid(10, 10, false);
        let a = g.cell_at_offset(4, 4).unwrap();
        let ne = g.neighbor(a, HexDirection::NE).unwrap();
        assert!(g.add_road(a, HexDirection::NE));
        assert!(g.cell(ne).has_road_through_edge(HexDirection::SW));
        assert!(!g.add_road(a, HexDirection::NE));

        assert!(g.set_outgoing_river(a, HexDirection::NE));
        assert!(!g.cell(a).has_road_through_edge(HexDirection::NE));
        assert!(!g.cell(ne).has_roads());
        assert!(!g.add_road(a, HexDirection::NE));
    }

    #[test]
    fn roads_refuse_steep_edges_and_special_cells() {
        let mut g = grid(10, 10, false);
        let a = g.cell_at_offset(4, 4).unwrap();
        let e = g.neighbor(a, HexDirection::E).unwrap();
        g.set_elevation(e, 2);
        assert!(!g.add_road(a, HexDirection::E));
        assert!(g.add_road(a, HexDirection::W));
        g.set_special_index(a, 1);
        assert!(!g.cell(a).has_roads());
        assert!(!g.add_road(a, HexDirection::SW));
    }

    #[test]
    fn observers_get_each_chunk_once_per_mutation() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut g = grid(10, 10, false);
        g.set_observer(Some(Box::new(Recorder(log.clone()))));

        // клетка на стыке четырёх чанков
        let corner = g.cell_at_offset(5, 5).unwrap();
        g.set_elevation(corner, 1);
        let mut chunks = log.borrow().chunks.clone();
        let total = chunks.len();
        chunks.sort_unstable();
        chunks.dedup();
        assert_eq!(chunks.len(), total);
        assert!(chunks.contains(&g.cell(corner).chunk_index()));

        log.borrow_mut().chunks.clear();
        g.set_urban_level(corner, 2);
        assert_eq!(log.borrow().chunks, vec![g.cell(corner).chunk_index()]);

        g.set_terrain_type(corner, TerrainType::Snow);
        g.set_terrain_type(corner, TerrainType::Snow);
        assert_eq!(log.borrow().terrain, vec![corner]);
    }

    #[test]
    fn search_stamps_are_fresh() {
        let mut g = grid(5, 5, false);
        let first = g.begin_search();
        let second = g.begin_search();
        assert_ne!(first, 0);
        assert!(second > first);
        g.clear_search_state();
        assert_eq!(g.begin_search(), 1);
    }
}
