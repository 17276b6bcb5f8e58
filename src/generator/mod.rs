//! Процедурная генерация карты.
//!
//! Этапы выполняются строго по порядку и используют один поток случайных
//! чисел `ChaCha8Rng`, поэтому одинаковый сид на одинаковой сетке даёт
//! одинаковую карту:
//! 1. разбиение на регионы
//! 2. лепка суши
//! 3. эрозия
//! 4. климат (40 итераций)
//! 5. биомы и типы поверхности
//! 6. реки

mod biome;
mod climate;
mod erosion;
mod land;
mod regions;
mod rivers;

pub use biome::{MOISTURE_BANDS, TEMPERATURE_BANDS};
pub use climate::ClimateData;
pub use regions::MapRegion;

use crate::config::GeneratorSettings;
use crate::coordinates::HexDirection;
use crate::error::MapError;
use crate::frontier::SearchFrontier;
use crate::grid::HexGrid;
use crate::noise::NoiseSampler;
use petgraph::unionfind::UnionFind;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Итоги генерации. Недобор бюджетов не считается ошибкой.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub land_budget: i64,
    pub land_cells: i64,
    /// Остаток бюджета суши после исчерпания лимита итераций
    pub unused_land_budget: i64,
    pub land_iterations: u32,
    pub erodible_before: usize,
    pub erodible_after: usize,
    pub river_budget: i64,
    pub unused_river_budget: i64,
    pub river_count: usize,
    pub landmasses: usize,
}

pub struct MapGenerator<'a> {
    settings: GeneratorSettings,
    noise: &'a dyn NoiseSampler,
}

impl<'a> MapGenerator<'a> {
    #[must_use]
    pub fn new(settings: GeneratorSettings, noise: &'a dyn NoiseSampler) -> Self {
        Self { settings, noise }
    }

    #[must_use]
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Генерирует новую карту того же размера, что и `grid`.
    ///
    /// Наблюдатель сетки на время генерации отключается и после неё
    /// получает одно полное обновление.
    pub fn generate(&self, grid: &mut HexGrid) -> Result<GenerationReport, MapError> {
        self.settings.validate()?;
        let seed = self.settings.seed.unwrap_or_else(clock_seed);
        info!(
            seed,
            width = grid.width(),
            height = grid.height(),
            "generating map"
        );

        let observer = grid.take_observer();
        grid.create_map(grid.width(), grid.height(), grid.wrapping())?;

        let mut generation = Generation::new(grid, &self.settings, self.noise, seed);
        generation.run();
        let report = generation.report;

        grid.clear_search_state();
        grid.set_observer(observer);
        grid.refresh_all();

        info!(
            land_cells = report.land_cells,
            rivers = report.river_count,
            landmasses = report.landmasses,
            "map generated"
        );
        Ok(report)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Состояние одной генерации.
pub(crate) struct Generation<'g> {
    grid: &'g mut HexGrid,
    settings: &'g GeneratorSettings,
    noise: &'g dyn NoiseSampler,
    rng: ChaCha8Rng,
    frontier: SearchFrontier,
    regions: Vec<MapRegion>,
    climate: Vec<ClimateData>,
    next_climate: Vec<ClimateData>,
    report: GenerationReport,
}

impl<'g> Generation<'g> {
    pub(crate) fn new(
        grid: &'g mut HexGrid,
        settings: &'g GeneratorSettings,
        noise: &'g dyn NoiseSampler,
        seed: u64,
    ) -> Self {
        for index in 0..grid.cell_count() {
            grid.set_water_level(index, settings.water_level);
        }
        Self {
            grid,
            settings,
            noise,
            rng: ChaCha8Rng::seed_from_u64(seed),
            frontier: SearchFrontier::new(),
            regions: Vec::new(),
            climate: Vec::new(),
            next_climate: Vec::new(),
            report: GenerationReport {
                seed,
                ..GenerationReport::default()
            },
        }
    }

    pub(crate) fn run(&mut self) {
        self.regions = regions::create_regions(
            self.settings,
            self.grid.width(),
            self.grid.height(),
            self.grid.wrapping(),
            &mut self.rng,
        );
        self.create_land();
        self.erode_land();
        self.create_climate();
        self.set_terrain_types();
        self.create_rivers();
        self.report.landmasses = count_landmasses(&*self.grid);
    }

    fn random_value(&mut self) -> f32 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Число связных массивов суши.
#[must_use]
pub fn count_landmasses(grid: &HexGrid) -> usize {
    let mut components = UnionFind::<usize>::new(grid.cell_count());
    for cell in grid.cells() {
        if cell.is_underwater() {
            continue;
        }
        for direction in [HexDirection::NE, HexDirection::E, HexDirection::SE] {
            if let Some(neighbor) = cell.neighbor(direction) {
                if !grid.cell(neighbor).is_underwater() {
                    components.union(cell.index(), neighbor);
                }
            }
        }
    }
    grid.cells()
        .iter()
        .filter(|cell| !cell.is_underwater())
        .map(|cell| components.find(cell.index()))
        .collect::<HashSet<_>>()
        .len()
}
