//! Типы поверхности по температуре и влажности.

use super::Generation;
use crate::cell::TerrainType;
use crate::config::HemisphereMode;
use crate::coordinates::HexDirection;
use rand::Rng;
use tracing::info;

/// Нижние границы температурных поясов (кроме первого).
pub const TEMPERATURE_BANDS: [f32; 3] = [0.1, 0.3, 0.6];

/// Нижние границы поясов влажности (кроме первого).
pub const MOISTURE_BANDS: [f32; 3] = [0.12, 0.28, 0.85];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Biome {
    terrain: TerrainType,
    plant: u8,
}

const fn biome(terrain: TerrainType, plant: u8) -> Biome {
    Biome { terrain, plant }
}

/// Строка на температурный пояс, столбец на пояс влажности.
const BIOMES: [Biome; 16] = [
    biome(TerrainType::Sand, 0),
    biome(TerrainType::Snow, 0),
    biome(TerrainType::Snow, 0),
    biome(TerrainType::Snow, 0),
    biome(TerrainType::Sand, 0),
    biome(TerrainType::Mud, 0),
    biome(TerrainType::Mud, 1),
    biome(TerrainType::Mud, 2),
    biome(TerrainType::Sand, 0),
    biome(TerrainType::Grass, 0),
    biome(TerrainType::Grass, 1),
    biome(TerrainType::Grass, 2),
    biome(TerrainType::Sand, 0),
    biome(TerrainType::Grass, 1),
    biome(TerrainType::Grass, 2),
    biome(TerrainType::Grass, 3),
];

fn band(value: f32, bands: &[f32; 3]) -> usize {
    bands.iter().take_while(|&&edge| value >= edge).count()
}

impl Generation<'_> {
    pub(super) fn set_terrain_types(&mut self) {
        let jitter_channel = self.rng.gen_range(0..4);
        let water_level = self.settings.water_level;
        let elevation_maximum = self.settings.elevation_maximum;
        let rock_desert_elevation = elevation_maximum - (elevation_maximum - water_level) / 2;

        for index in 0..self.grid.cell_count() {
            let temperature = self.determine_temperature(index, jitter_channel);
            let moisture = self.moisture(index);
            let cell = self.grid.cell(index);
            let elevation = cell.elevation();

            if cell.is_underwater() {
                let terrain = self.underwater_terrain(index, temperature);
                self.grid.set_terrain_type(index, terrain);
                continue;
            }

            let t = band(temperature, &TEMPERATURE_BANDS);
            let m = band(moisture, &MOISTURE_BANDS);
            let mut biome = BIOMES[t * 4 + m];

            if biome.terrain == TerrainType::Sand {
                if elevation >= rock_desert_elevation {
                    biome.terrain = TerrainType::Stone;
                }
            } else if elevation == elevation_maximum {
                biome.terrain = TerrainType::Snow;
            }

            if biome.terrain == TerrainType::Snow {
                biome.plant = 0;
            } else if biome.plant < 3 && cell.has_river() {
                biome.plant += 1;
            }

            self.grid.set_terrain_type(index, biome.terrain);
            self.grid.set_plant_level(index, biome.plant);
        }
        info!(jitter_channel, "terrain types assigned");
    }

    /// Температура от 0 (полюс) до 1 (экватор) с поправкой на высоту и шум.
    pub(super) fn determine_temperature(&self, index: usize, jitter_channel: usize) -> f32 {
        let settings = self.settings;
        let cell = self.grid.cell(index);

        let mut latitude = cell.coordinates().z() as f32 / self.grid.height() as f32;
        match settings.hemisphere {
            HemisphereMode::Both => {
                latitude *= 2.0;
                if latitude > 1.0 {
                    latitude = 2.0 - latitude;
                }
            }
            HemisphereMode::North => latitude = 1.0 - latitude,
            HemisphereMode::South => {}
        }

        let mut temperature = settings.low_temperature
            + (settings.high_temperature - settings.low_temperature) * latitude;
        temperature *= 1.0
            - (cell.view_elevation() - settings.water_level) as f32
                / (settings.elevation_maximum - settings.water_level + 1) as f32;

        let [x, y, z] = cell.position(self.noise);
        let jitter = self.noise.sample([x * 0.1, y * 0.1, z * 0.1])[jitter_channel];
        temperature + (jitter * 2.0 - 1.0) * settings.temperature_jitter
    }

    /// Дно: мелководье у берега зависит от склонов и обрывов вокруг,
    /// дальше озёрное дно, шельф и глубина.
    fn underwater_terrain(&self, index: usize, temperature: f32) -> TerrainType {
        let cell = self.grid.cell(index);
        let elevation = cell.elevation();
        let water_level = self.settings.water_level;

        let terrain = if elevation == water_level - 1 {
            let mut cliffs = 0;
            let mut slopes = 0;
            for direction in HexDirection::ALL {
                let Some(neighbor) = cell.neighbor(direction) else {
                    continue;
                };
                let delta = self.grid.cell(neighbor).elevation() - cell.water_level();
                if delta == 0 {
                    slopes += 1;
                } else if delta > 0 {
                    cliffs += 1;
                }
            }
            if cliffs + slopes > 3 {
                TerrainType::Grass
            } else if cliffs > 0 {
                TerrainType::Stone
            } else if slopes > 0 {
                TerrainType::Sand
            } else {
                TerrainType::Grass
            }
        } else if elevation >= water_level {
            TerrainType::Grass
        } else if elevation < 0 {
            TerrainType::Stone
        } else {
            TerrainType::Mud
        };

        if terrain == TerrainType::Grass && temperature < TEMPERATURE_BANDS[0] {
            TerrainType::Mud
        } else {
            terrain
        }
    }

    /// Растительность вдоль проложенных рек гуще на одну ступень.
    pub(super) fn boost_river_plants(&mut self) {
        for index in 0..self.grid.cell_count() {
            let cell = self.grid.cell(index);
            if cell.is_underwater()
                || !cell.has_river()
                || cell.terrain_type() == TerrainType::Snow
                || cell.plant_level() >= 3
            {
                continue;
            }
            let plant = cell.plant_level() + 1;
            self.grid.set_plant_level(index, plant);
        }
    }
}
