//! Ошибки библиотеки.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// Размеры карты не положительны или не кратны размеру чанка.
    #[error("unsupported map size {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    /// Файл карты записан более новой версией формата.
    #[error("unknown map format {found} (newest supported is {supported})")]
    UnsupportedVersion { found: i32, supported: i32 },

    /// Высота или уровень воды не помещаются в байт файла.
    #[error("height {value} of cell {cell} does not fit the map format")]
    HeightOutOfRange { cell: usize, value: i32 },

    #[error("corrupt map data: {0}")]
    Corrupt(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
