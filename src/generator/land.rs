//! Лепка суши: случайные участки поднимаются или опускаются, пока доля
//! суши не достигнет заданной.

use super::{Generation, MapRegion};
use crate::coordinates::HexDirection;
use rand::Rng;
use tracing::{info, warn};

impl Generation<'_> {
    /// Размер участка: две верхние границы диапазона не выпадают.
    fn chunk_size(&mut self) -> i32 {
        let min = self.settings.chunk_size_min;
        let max = (self.settings.chunk_size_max - 2).max(min);
        self.rng.gen_range(min..=max)
    }

    pub(super) fn create_land(&mut self) {
        let cell_count = self.grid.cell_count() as f32;
        let mut budget = (cell_count * self.settings.land_percentage as f32 * 0.01).round() as i64;
        self.report.land_budget = budget;
        self.report.land_cells = budget;

        let regions = self.regions.clone();
        let mut iterations = 0;
        'sculpt: for guard in 0..self.settings.land_iteration_cap {
            iterations = guard + 1;
            let sink = self.random_value() < self.settings.sink_probability;
            for region in &regions {
                let chunk_size = self.chunk_size();
                budget = if sink {
                    self.sink_terrain(chunk_size, budget, *region)
                } else {
                    self.raise_terrain(chunk_size, budget, *region)
                };
                if budget == 0 {
                    break 'sculpt;
                }
            }
        }
        self.report.land_iterations = iterations;

        if budget > 0 {
            warn!(
                unused = budget,
                iterations, "land budget not exhausted before iteration cap"
            );
            self.report.land_cells -= budget;
            self.report.unused_land_budget = budget;
        }
        info!(land_cells = self.report.land_cells, iterations, "land sculpted");
    }

    /// Поднимает участок до `chunk_size` клеток. Каждая клетка, вышедшая из
    /// воды, уменьшает бюджет; при нуле лепка участка прекращается.
    fn raise_terrain(&mut self, chunk_size: i32, mut budget: i64, region: MapRegion) -> i64 {
        let Some(first) = self.start_chunk(region) else {
            return budget;
        };
        let rise = if self.random_value() < self.settings.high_rise_probability {
            2
        } else {
            1
        };
        let water_level = self.settings.water_level;

        let mut size = 0;
        while size < chunk_size {
            let Some(current) = self.frontier.dequeue() else {
                break;
            };
            let original = self.grid.cell(current).elevation();
            let elevation = original + rise;
            if elevation > self.settings.elevation_maximum {
                continue;
            }
            self.grid.set_elevation(current, elevation);
            if original < water_level && elevation >= water_level {
                budget -= 1;
                if budget == 0 {
                    break;
                }
            }
            size += 1;
            self.expand_chunk(current, first);
        }
        self.frontier.clear();
        budget
    }

    /// Зеркало `raise_terrain`: ушедшие под воду клетки возвращают бюджет.
    fn sink_terrain(&mut self, chunk_size: i32, mut budget: i64, region: MapRegion) -> i64 {
        let Some(first) = self.start_chunk(region) else {
            return budget;
        };
        let sink = if self.random_value() < self.settings.high_rise_probability {
            2
        } else {
            1
        };
        let water_level = self.settings.water_level;

        let mut size = 0;
        while size < chunk_size {
            let Some(current) = self.frontier.dequeue() else {
                break;
            };
            let original = self.grid.cell(current).elevation();
            let elevation = original - sink;
            if elevation < self.settings.elevation_minimum {
                continue;
            }
            self.grid.set_elevation(current, elevation);
            if original >= water_level && elevation < water_level {
                budget += 1;
            }
            size += 1;
            self.expand_chunk(current, first);
        }
        self.frontier.clear();
        budget
    }

    /// Начинает новую заливку со случайной клетки региона.
    fn start_chunk(&mut self, region: MapRegion) -> Option<usize> {
        let stamp = self.grid.begin_search();
        let (column, row) = region.random_cell(&mut self.rng);
        let first = self.grid.cell_at_offset(column, row)?;

        let state = &mut self.grid.cells[first].search;
        state.stamp = stamp;
        state.distance = 0;
        state.heuristic = 0;
        state.path_from = None;

        self.frontier.clear();
        self.frontier.enqueue(first, 0);
        Some(first)
    }

    /// Добавляет в заливку соседей `current`, ещё не попавших в неё.
    /// Приоритет: расстояние до центра участка плюс случайный сдвиг.
    fn expand_chunk(&mut self, current: usize, center: usize) {
        let stamp = self.grid.search_stamp();
        for direction in HexDirection::ALL {
            let Some(neighbor) = self.grid.neighbor(current, direction) else {
                continue;
            };
            if self.grid.cells[neighbor].search.stamp == stamp {
                continue;
            }
            let distance = self.grid.distance(neighbor, center);
            let heuristic = i32::from(self.random_value() < self.settings.jitter_probability);

            let state = &mut self.grid.cells[neighbor].search;
            state.stamp = stamp;
            state.distance = distance;
            state.heuristic = heuristic;
            state.path_from = None;
            self.frontier.enqueue(neighbor, distance + heuristic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Generation, regions};
    use crate::config::{GeneratorSettings, GridSettings};
    use crate::grid::HexGrid;
    use crate::noise::FlatNoise;

    fn sculpt(settings: &GeneratorSettings, width: i32, height: i32) -> (HexGrid, i64, i64) {
        let mut grid = HexGrid::new(&GridSettings {
            width,
            height,
            wrapping: false,
        })
        .unwrap();
        let noise = FlatNoise::default();
        let (budget, land) = {
            let mut generation = Generation::new(&mut grid, settings, &noise, 5);
            generation.regions = regions::create_regions(
                settings,
                width,
                height,
                false,
                &mut generation.rng,
            );
            generation.create_land();
            (generation.report.land_budget, generation.report.land_cells)
        };
        (grid, budget, land)
    }

    #[test]
    fn chunk_size_skips_top_of_range() {
        let mut grid = HexGrid::new(&GridSettings::default()).unwrap();
        let noise = FlatNoise::default();
        let settings = GeneratorSettings {
            chunk_size_min: 3,
            chunk_size_max: 6,
            ..GeneratorSettings::default()
        };
        let mut generation = Generation::new(&mut grid, &settings, &noise, 11);
        let sizes: Vec<i32> = (0..200).map(|_| generation.chunk_size()).collect();
        assert!(sizes.iter().all(|size| (3..=4).contains(size)));
        assert!(sizes.contains(&3) && sizes.contains(&4));

        let narrow = GeneratorSettings {
            chunk_size_min: 5,
            chunk_size_max: 5,
            ..GeneratorSettings::default()
        };
        let mut generation = Generation::new(&mut grid, &narrow, &noise, 11);
        assert_eq!(generation.chunk_size(), 5);
    }

    fn count_land(grid: &HexGrid) -> i64 {
        grid.cells().iter().filter(|c| !c.is_underwater()).count() as i64
    }

    #[test]
    fn land_matches_budget() {
        let settings = GeneratorSettings::default();
        let (grid, budget, land) = sculpt(&settings, 40, 30);
        assert_eq!(budget, 600);
        assert_eq!(land, budget);
        assert_eq!(count_land(&grid), land);
    }

    #[test]
    fn elevations_stay_within_bounds() {
        let settings = GeneratorSettings {
            sink_probability: 0.4,
            high_rise_probability: 0.8,
            ..GeneratorSettings::default()
        };
        let (grid, _, land) = sculpt(&settings, 40, 30);
        assert_eq!(count_land(&grid), land);
        for cell in grid.cells() {
            assert!(cell.elevation() >= settings.elevation_minimum);
            assert!(cell.elevation() <= settings.elevation_maximum);
        }
    }

    #[test]
    fn iteration_cap_leaves_budget_unused() {
        let settings = GeneratorSettings {
            land_iteration_cap: 1,
            chunk_size_min: 1,
            chunk_size_max: 1,
            ..GeneratorSettings::default()
        };
        let (grid, budget, land) = sculpt(&settings, 40, 30);
        assert!(land < budget);
        assert_eq!(count_land(&grid), land);
    }
}
