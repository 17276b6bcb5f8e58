pub mod cell;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod frontier;
pub mod generator;
pub mod grid;
pub mod noise;
pub mod observer;
pub mod pathfinding;
pub mod preview;
pub mod save;
pub mod unit;
pub mod visibility;

pub use cell::{HexCell, TerrainType};
pub use config::{
    GeneratorSettings, GridSettings, HEIGHT_RANGE, HemisphereMode, MAX_CELL_COUNT, MapConfig,
    NoiseSettings,
};
pub use coordinates::{EdgeType, HexCoordinates, HexDirection};
pub use error::MapError;
pub use generator::{GenerationReport, MapGenerator, count_landmasses};
pub use grid::HexGrid;
pub use noise::{FastNoiseSampler, FlatNoise, NoiseSampler};
pub use observer::GridObserver;
pub use pathfinding::turn_of;
pub use preview::{render_preview, save_preview};
pub use save::{MAP_FILE_VERSION, read_map, write_map};
pub use unit::{HexUnit, Mover, standard_move_cost};
