//! Реки: стекают от влажных возвышенностей к воде, сливаются с уже
//! проложенными и заканчиваются озером, если дальше течь некуда.

use super::Generation;
use crate::coordinates::HexDirection;
use rand::Rng;
use tracing::{debug, info, warn};

impl Generation<'_> {
    pub(super) fn create_rivers(&mut self) {
        let water_level = self.settings.water_level;
        let elevation_maximum = self.settings.elevation_maximum;

        // чем выше и влажнее клетка, тем больше у неё шансов стать истоком
        let mut origins = Vec::new();
        for index in 0..self.grid.cell_count() {
            let cell = self.grid.cell(index);
            if cell.is_underwater() || cell.elevation() <= water_level {
                continue;
            }
            let weight = self.moisture(index) * (cell.elevation() - water_level) as f32
                / (elevation_maximum - water_level) as f32;
            if weight > 0.75 {
                origins.push(index);
                origins.push(index);
            }
            if weight > 0.5 {
                origins.push(index);
            }
            if weight > 0.25 {
                origins.push(index);
            }
        }

        let mut budget =
            (self.report.land_cells as f32 * self.settings.river_percentage as f32 * 0.01).round() as i64;
        self.report.river_budget = budget;

        while budget > 0 && !origins.is_empty() {
            let position = self.rng.gen_range(0..origins.len());
            let origin = origins.swap_remove(position);
            if self.grid.cell(origin).has_river() || !self.is_free_origin(origin) {
                continue;
            }
            let length = self.create_river(origin);
            if length > 0 {
                self.report.river_count += 1;
                budget -= length;
            }
        }

        if budget > 0 {
            warn!(unused = budget, "river budget not exhausted");
        }
        self.report.unused_river_budget = budget.max(0);
        self.boost_river_plants();
        info!(rivers = self.report.river_count, "rivers carved");
    }

    /// Исток не должен касаться воды или другой реки.
    fn is_free_origin(&self, origin: usize) -> bool {
        HexDirection::ALL.into_iter().all(|direction| {
            self.grid.neighbor(origin, direction).is_none_or(|neighbor| {
                let cell = self.grid.cell(neighbor);
                !cell.has_river() && !cell.is_underwater()
            })
        })
    }

    /// Прокладывает реку от `origin` и возвращает её длину в клетках;
    /// 0, если из истока некуда течь.
    fn create_river(&mut self, origin: usize) -> i64 {
        let mut length = 1;
        let mut cell = origin;
        let mut direction = HexDirection::NE;
        let mut flow_directions = Vec::with_capacity(HexDirection::ALL.len() * 5);

        while !self.grid.cell(cell).is_underwater() {
            let elevation = self.grid.cell(cell).elevation();
            let mut min_neighbor_elevation = i32::MAX;
            flow_directions.clear();

            for d in HexDirection::ALL {
                let Some(neighbor) = self.grid.neighbor(cell, d) else {
                    continue;
                };
                let neighbor_cell = self.grid.cell(neighbor);
                min_neighbor_elevation = min_neighbor_elevation.min(neighbor_cell.elevation());

                if neighbor == origin || neighbor_cell.incoming_river().is_some() {
                    continue;
                }
                let delta = neighbor_cell.elevation() - elevation;
                if delta > 0 {
                    continue;
                }
                if neighbor_cell.outgoing_river().is_some() {
                    // впадаем в существующую реку
                    self.grid.set_outgoing_river(cell, d);
                    return length;
                }

                // вниз по склону течь охотнее, резкие повороты реже
                if delta < 0 {
                    flow_directions.extend([d; 3]);
                }
                if length == 1 || (d != direction.next2() && d != direction.previous2()) {
                    flow_directions.push(d);
                }
                flow_directions.push(d);
            }

            if flow_directions.is_empty() {
                if length == 1 {
                    return 0;
                }
                self.grid.set_elevation(cell, min_neighbor_elevation - 1);
                self.grid.set_water_level(cell, min_neighbor_elevation);
                debug!(cell, "river ends in a lake");
                break;
            }

            direction = flow_directions[self.rng.gen_range(0..flow_directions.len())];
            self.grid.set_outgoing_river(cell, direction);
            length += 1;

            if min_neighbor_elevation >= elevation
                && self.random_value() < self.settings.extra_lake_probability
            {
                self.grid.set_water_level(cell, elevation);
                self.grid.set_elevation(cell, elevation - 1);
            }

            let Some(next) = self.grid.neighbor(cell, direction) else {
                break;
            };
            cell = next;
        }
        length
    }
}
