//! Модель климата: облака и влажность переносятся между клетками.
//!
//! Вода испаряется в облака, облака выпадают осадками и разносятся
//! ветром, влага стекает вниз по склонам. Каждая итерация пишет во второй
//! буфер, после чего буферы меняются местами.

use super::Generation;
use crate::coordinates::HexDirection;
use tracing::info;

const CLIMATE_CYCLES: usize = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClimateData {
    pub clouds: f32,
    pub moisture: f32,
}

impl Generation<'_> {
    pub(super) fn create_climate(&mut self) {
        let cell_count = self.grid.cell_count();
        let initial = ClimateData {
            clouds: 0.0,
            moisture: self.settings.starting_moisture,
        };
        self.climate = vec![initial; cell_count];
        self.next_climate = vec![ClimateData::default(); cell_count];

        for _ in 0..CLIMATE_CYCLES {
            for index in 0..cell_count {
                self.evolve_climate(index);
            }
            std::mem::swap(&mut self.climate, &mut self.next_climate);
        }

        let mean = self.climate.iter().map(|c| c.moisture).sum::<f32>() / cell_count as f32;
        info!(mean_moisture = mean, "climate simulated");
    }

    fn evolve_climate(&mut self, index: usize) {
        let settings = self.settings;
        let cell = self.grid.cell(index);
        let view_elevation = cell.view_elevation();
        let mut climate = self.climate[index];

        if cell.is_underwater() {
            climate.moisture = 1.0;
            climate.clouds += settings.evaporation_factor;
        } else {
            let evaporation = climate.moisture * settings.evaporation_factor;
            climate.moisture -= evaporation;
            climate.clouds += evaporation;
        }

        let precipitation = climate.clouds * settings.precipitation_factor;
        climate.clouds -= precipitation;
        climate.moisture += precipitation;

        // чем выше клетка, тем меньше облаков она удерживает
        let cloud_maximum = 1.0 - view_elevation as f32 / (settings.elevation_maximum + 1) as f32;
        if climate.clouds > cloud_maximum {
            climate.moisture += climate.clouds - cloud_maximum;
            climate.clouds = cloud_maximum;
        }

        let main_dispersal_direction = settings.wind_direction.opposite();
        let cloud_dispersal = climate.clouds * (1.0 / (5.0 + settings.wind_strength));
        let runoff = climate.moisture * settings.runoff_factor * (1.0 / 6.0);
        let seepage = climate.moisture * settings.seepage_factor * (1.0 / 6.0);

        for direction in HexDirection::ALL {
            let Some(neighbor) = cell.neighbor(direction) else {
                continue;
            };
            let next = &mut self.next_climate[neighbor];
            if direction == main_dispersal_direction {
                next.clouds += cloud_dispersal * settings.wind_strength;
            } else {
                next.clouds += cloud_dispersal;
            }

            let elevation_delta = self.grid.cell(neighbor).view_elevation() - view_elevation;
            if elevation_delta < 0 {
                climate.moisture -= runoff;
                next.moisture += runoff;
            } else if elevation_delta == 0 {
                climate.moisture -= seepage;
                next.moisture += seepage;
            }
        }

        let next = &mut self.next_climate[index];
        next.moisture = (next.moisture + climate.moisture).min(1.0);
        self.climate[index] = ClimateData::default();
    }

    pub(super) fn moisture(&self, index: usize) -> f32 {
        self.climate[index].moisture
    }
}

#[cfg(test)]
mod tests {
    use super::super::Generation;
    use crate::config::{GeneratorSettings, GridSettings};
    use crate::grid::HexGrid;
    use crate::noise::FlatNoise;

    fn grid() -> HexGrid {
        HexGrid::new(&GridSettings {
            width: 20,
            height: 15,
            wrapping: false,
        })
        .unwrap()
    }

    #[test]
    fn water_cells_are_saturated() {
        let mut grid = grid();
        let settings = GeneratorSettings::default();
        let noise = FlatNoise::default();
        let mut generation = Generation::new(&mut grid, &settings, &noise, 1);
        generation.create_climate();
        // всё под водой: собственная влага упирается в 1, сверху только
        // просачивание от соседей, обработанных позже
        for index in 0..generation.grid.cell_count() {
            let moisture = generation.moisture(index);
            assert!((0.99..1.1).contains(&moisture), "{moisture}");
        }
    }

    #[test]
    fn coast_is_wetter_than_interior() {
        let mut grid = grid();
        let settings = GeneratorSettings::default();
        let noise = FlatNoise::default();
        let mut generation = Generation::new(&mut grid, &settings, &noise, 1);
        // восточная половина карты суша
        for index in 0..generation.grid.cell_count() {
            let (column, _) = generation.grid.cell(index).coordinates().to_offset();
            if column >= 10 {
                generation.grid.set_elevation(index, settings.water_level + 1);
            }
        }
        generation.create_climate();

        let coast = generation.grid.cell_at_offset(10, 7).unwrap();
        let inland = generation.grid.cell_at_offset(19, 7).unwrap();
        assert!(generation.moisture(coast) > settings.starting_moisture);
        assert!(generation.moisture(coast) > generation.moisture(inland));
        assert!(generation.moisture(inland) < settings.starting_moisture);
    }
}
