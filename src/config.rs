// src/config.rs
//! Конфигурация карты и генератора
//!
//! Этот модуль определяет все параметры, управляющие построением и генерацией карты:
//! - Размеры сетки и свёртку по долготе
//! - Параметры лепки суши, эрозии и климата
//! - Параметры рек и биомов
//! - Настройки источника шума
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::coordinates::{CHUNK_SIZE_X, CHUNK_SIZE_Z, HexDirection};
use crate::error::MapError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Какое полушарие изображает карта
///
/// Определяет, как широта (строка клетки) переводится в температуру.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HemisphereMode {
    /// Экватор посередине, полюса сверху и снизу
    #[default]
    Both,
    /// Экватор внизу карты
    North,
    /// Экватор вверху карты
    South,
}

/// Наибольшее число клеток карты.
pub const MAX_CELL_COUNT: i64 = 1 << 22;

/// Допустимый диапазон высот и уровня воды: в файле они занимают один байт.
pub const HEIGHT_RANGE: std::ops::RangeInclusive<i32> = -128..=127;

/// Размеры сетки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Ширина в клетках (кратна размеру чанка)
    #[serde(default = "default_width")]
    pub width: i32,

    /// Высота в клетках (кратна размеру чанка)
    #[serde(default = "default_height")]
    pub height: i32,

    /// Свёртка по оси X: восточный край соединён с западным
    #[serde(default)]
    pub wrapping: bool,
}

fn default_width() -> i32 {
    40
}
fn default_height() -> i32 {
    30
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            wrapping: false,
        }
    }
}

impl GridSettings {
    /// Проверяет, что размеры положительны, кратны размеру чанка и дают
    /// не больше [`MAX_CELL_COUNT`] клеток.
    ///
    /// ```
    /// use hexmap::config::GridSettings;
    /// assert!(GridSettings { width: 20, height: 15, wrapping: false }.validate().is_ok());
    /// assert!(GridSettings { width: 21, height: 15, wrapping: false }.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), MapError> {
        if self.width <= 0
            || self.width % CHUNK_SIZE_X != 0
            || self.height <= 0
            || self.height % CHUNK_SIZE_Z != 0
            || i64::from(self.width) * i64::from(self.height) > MAX_CELL_COUNT
        {
            return Err(MapError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Параметры процедурной генерации
///
/// Значения по умолчанию дают континент примерно на половину карты с умеренным климатом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Сид генератора случайных чисел. Если не задан, берётся из текущего времени.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Минимальный размер поднимаемого/опускаемого участка (в клетках)
    #[serde(default = "default_chunk_size_min")]
    pub chunk_size_min: i32,

    /// Максимальный размер участка (в клетках)
    #[serde(default = "default_chunk_size_max")]
    pub chunk_size_max: i32,

    /// Нижняя граница высоты
    #[serde(default = "default_elevation_minimum")]
    pub elevation_minimum: i32,

    /// Верхняя граница высоты
    #[serde(default = "default_elevation_maximum")]
    pub elevation_maximum: i32,

    /// Уровень воды для всей карты
    #[serde(default = "default_water_level")]
    pub water_level: i32,

    /// Целевая доля суши в процентах
    #[serde(default = "default_land_percentage")]
    pub land_percentage: i32,

    /// Вероятность случайного сдвига приоритета клетки при заливке (рваные края)
    #[serde(default = "default_jitter_probability")]
    pub jitter_probability: f32,

    /// Вероятность подъёма/опускания сразу на 2 уровня
    #[serde(default = "default_high_rise_probability")]
    pub high_rise_probability: f32,

    /// Вероятность того, что шаг лепки опускает сушу, а не поднимает
    #[serde(default = "default_sink_probability")]
    pub sink_probability: f32,

    /// Отступ регионов от краёв карты по X
    #[serde(default = "default_map_border")]
    pub map_border_x: i32,

    /// Отступ регионов от краёв карты по Z
    #[serde(default = "default_map_border")]
    pub map_border_z: i32,

    /// Зазор между регионами
    #[serde(default = "default_map_border")]
    pub region_border: i32,

    /// Количество регионов (1–4)
    #[serde(default = "default_region_count")]
    pub region_count: i32,

    /// Доля подверженных эрозии клеток, которую нужно сгладить (в процентах)
    #[serde(default = "default_erosion_percentage")]
    pub erosion_percentage: i32,

    /// Доля влаги суши, испаряющаяся за итерацию
    #[serde(default = "default_evaporation_factor")]
    pub evaporation_factor: f32,

    /// Доля облаков, выпадающая осадками за итерацию
    #[serde(default = "default_precipitation_factor")]
    pub precipitation_factor: f32,

    /// Доля влаги, стекающая к более низким соседям
    #[serde(default = "default_runoff_factor")]
    pub runoff_factor: f32,

    /// Доля влаги, просачивающаяся к соседям той же высоты
    #[serde(default = "default_seepage_factor")]
    pub seepage_factor: f32,

    /// Направление, откуда дует ветер
    #[serde(default = "default_wind_direction")]
    pub wind_direction: HexDirection,

    /// Сила ветра (1.0 = без преобладающего направления)
    #[serde(default = "default_wind_strength")]
    pub wind_strength: f32,

    /// Начальная влажность всех клеток
    #[serde(default = "default_starting_moisture")]
    pub starting_moisture: f32,

    /// Бюджет рек в процентах от клеток суши
    #[serde(default = "default_river_percentage")]
    pub river_percentage: i32,

    /// Вероятность озера на пути реки
    #[serde(default = "default_extra_lake_probability")]
    pub extra_lake_probability: f32,

    /// Температура у полюса
    #[serde(default = "default_low_temperature")]
    pub low_temperature: f32,

    /// Температура у экватора
    #[serde(default = "default_high_temperature")]
    pub high_temperature: f32,

    #[serde(default)]
    pub hemisphere: HemisphereMode,

    /// Амплитуда шумового разброса температуры
    #[serde(default = "default_temperature_jitter")]
    pub temperature_jitter: f32,

    /// Жёсткий предел итераций лепки суши
    #[serde(default = "default_land_iteration_cap")]
    pub land_iteration_cap: u32,
}

fn default_chunk_size_min() -> i32 {
    30
}
fn default_chunk_size_max() -> i32 {
    100
}
fn default_elevation_minimum() -> i32 {
    -2
}
fn default_elevation_maximum() -> i32 {
    8
}
fn default_water_level() -> i32 {
    3
}
fn default_land_percentage() -> i32 {
    50
}
fn default_jitter_probability() -> f32 {
    0.25
}
fn default_high_rise_probability() -> f32 {
    0.25
}
fn default_sink_probability() -> f32 {
    0.2
}
fn default_map_border() -> i32 {
    5
}
fn default_region_count() -> i32 {
    1
}
fn default_erosion_percentage() -> i32 {
    50
}
fn default_evaporation_factor() -> f32 {
    0.5
}
fn default_precipitation_factor() -> f32 {
    0.25
}
fn default_runoff_factor() -> f32 {
    0.25
}
fn default_seepage_factor() -> f32 {
    0.125
}
fn default_wind_direction() -> HexDirection {
    HexDirection::NW
}
fn default_wind_strength() -> f32 {
    4.0
}
fn default_starting_moisture() -> f32 {
    0.1
}
fn default_river_percentage() -> i32 {
    10
}
fn default_extra_lake_probability() -> f32 {
    0.25
}
fn default_low_temperature() -> f32 {
    0.0
}
fn default_high_temperature() -> f32 {
    1.0
}
fn default_temperature_jitter() -> f32 {
    0.1
}
fn default_land_iteration_cap() -> u32 {
    10_000
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            seed: None,
            chunk_size_min: 30,
            chunk_size_max: 100,
            elevation_minimum: -2,
            elevation_maximum: 8,
            water_level: 3,
            land_percentage: 50,
            jitter_probability: 0.25,
            high_rise_probability: 0.25,
            sink_probability: 0.2,
            map_border_x: 5,
            map_border_z: 5,
            region_border: 5,
            region_count: 1,
            erosion_percentage: 50,
            evaporation_factor: 0.5,
            precipitation_factor: 0.25,
            runoff_factor: 0.25,
            seepage_factor: 0.125,
            wind_direction: HexDirection::NW,
            wind_strength: 4.0,
            starting_moisture: 0.1,
            river_percentage: 10,
            extra_lake_probability: 0.25,
            low_temperature: 0.0,
            high_temperature: 1.0,
            hemisphere: HemisphereMode::Both,
            temperature_jitter: 0.1,
            land_iteration_cap: 10_000,
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<(), MapError> {
        let invalid = |message: String| Err(MapError::InvalidConfig(message));

        if !(1..=4).contains(&self.region_count) {
            return invalid(format!("region_count must be 1..=4, got {}", self.region_count));
        }
        if !(5..=95).contains(&self.land_percentage) {
            return invalid(format!(
                "land_percentage must be 5..=95, got {}",
                self.land_percentage
            ));
        }
        if self.chunk_size_min <= 0 || self.chunk_size_min > self.chunk_size_max {
            return invalid(format!(
                "chunk size range {}..={} is empty",
                self.chunk_size_min, self.chunk_size_max
            ));
        }
        if self.elevation_minimum > 0 || self.elevation_maximum <= self.water_level {
            return invalid(format!(
                "elevation range {}..={} does not fit water level {}",
                self.elevation_minimum, self.elevation_maximum, self.water_level
            ));
        }
        for (name, value) in [
            ("elevation_minimum", self.elevation_minimum),
            ("elevation_maximum", self.elevation_maximum),
            ("water_level", self.water_level),
        ] {
            if !HEIGHT_RANGE.contains(&value) {
                return invalid(format!("{name} must be within -128..=127, got {value}"));
            }
        }
        if self.water_level < 1 {
            return invalid(format!("water_level must be positive, got {}", self.water_level));
        }
        if !(0..=100).contains(&self.erosion_percentage) {
            return invalid(format!(
                "erosion_percentage must be 0..=100, got {}",
                self.erosion_percentage
            ));
        }
        if !(0..=100).contains(&self.river_percentage) {
            return invalid(format!(
                "river_percentage must be 0..=100, got {}",
                self.river_percentage
            ));
        }
        if self.wind_strength < 1.0 {
            return invalid(format!("wind_strength must be >= 1, got {}", self.wind_strength));
        }

        let probabilities = [
            ("jitter_probability", self.jitter_probability),
            ("high_rise_probability", self.high_rise_probability),
            ("sink_probability", self.sink_probability),
            ("evaporation_factor", self.evaporation_factor),
            ("precipitation_factor", self.precipitation_factor),
            ("runoff_factor", self.runoff_factor),
            ("seepage_factor", self.seepage_factor),
            ("starting_moisture", self.starting_moisture),
            ("extra_lake_probability", self.extra_lake_probability),
            ("temperature_jitter", self.temperature_jitter),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }
}

/// Настройки источника шума
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    #[serde(default)]
    pub seed: i32,

    /// Частота шума в мировых единицах
    #[serde(default = "default_noise_frequency")]
    pub frequency: f32,
}

fn default_noise_frequency() -> f32 {
    0.03
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: 0.03,
        }
    }
}

/// Полная конфигурация карты
///
/// Поддерживает загрузку из TOML-файлов; отсутствующие секции берут значения по умолчанию.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub grid: GridSettings,

    #[serde(default)]
    pub generator: GeneratorSettings,

    #[serde(default)]
    pub noise: NoiseSettings,
}

impl MapConfig {
    /// Загружает параметры из TOML-файла и проверяет их
    ///
    /// # Пример
    /// ```toml
    /// # map.toml
    /// [grid]
    /// width = 80
    /// height = 60
    ///
    /// [generator]
    /// seed = 42
    /// region_count = 2
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Разбирает конфигурацию из строки TOML.
    ///
    /// ```
    /// use hexmap::config::MapConfig;
    /// let config = MapConfig::from_toml_str("[generator]\nseed = 7\nland_percentage = 30\n").unwrap();
    /// assert_eq!(config.generator.seed, Some(7));
    /// assert_eq!(config.generator.land_percentage, 30);
    /// assert_eq!(config.grid.width, 40);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, MapError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        self.grid.validate()?;
        self.generator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(MapConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = MapConfig::from_toml_str(
            r#"
            [grid]
            width = 20
            height = 15
            wrapping = true

            [generator]
            hemisphere = "North"
            wind_direction = "E"
            "#,
        )
        .unwrap();
        assert!(config.grid.wrapping);
        assert_eq!(config.generator.hemisphere, HemisphereMode::North);
        assert_eq!(config.generator.wind_direction, HexDirection::E);
        assert_eq!(config.generator.water_level, 3);
        assert_eq!(config.noise, NoiseSettings::default());
    }

    #[test]
    fn rejects_bad_region_count() {
        let err = MapConfig::from_toml_str("[generator]\nregion_count = 5\n").unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_size_not_multiple_of_chunk() {
        let err = MapConfig::from_toml_str("[grid]\nwidth = 12\n").unwrap_err();
        assert!(matches!(
            err,
            MapError::InvalidDimensions {
                width: 12,
                height: 30
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let settings = GeneratorSettings {
            sink_probability: 1.5,
            ..GeneratorSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_huge_grid() {
        let grid = GridSettings {
            width: 100_000,
            height: 100_000,
            wrapping: false,
        };
        assert!(matches!(
            grid.validate(),
            Err(MapError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rejects_heights_outside_byte() {
        let settings = GeneratorSettings {
            elevation_maximum: 200,
            ..GeneratorSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(MapError::InvalidConfig(_))
        ));
        let settings = GeneratorSettings {
            elevation_minimum: -129,
            ..GeneratorSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
