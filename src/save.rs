//! Двоичный формат файла карты.
//!
//! Все целые little-endian. Файл начинается с версии (`i32`), затем идут
//! размеры, свёртка, по 12 байт на клетку и список отрядов. Старые версии
//! читаются: без размеров карта 20×15, без флага исследованности клетки
//! неисследованы, без отрядов список пуст.

use crate::cell::TerrainType;
use crate::config::GridSettings;
use crate::coordinates::{HexCoordinates, HexDirection};
use crate::error::MapError;
use crate::grid::HexGrid;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{info, warn};

pub const MAP_FILE_VERSION: i32 = 5;

const LEGACY_WIDTH: i32 = 20;
const LEGACY_HEIGHT: i32 = 15;
const RIVER_FLAG: u8 = 128;

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), MapError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_bool(w: &mut dyn Write, v: bool) -> Result<(), MapError> {
    write_u8(w, u8::from(v))
}

fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), MapError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), MapError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_bytes<const N: usize>(r: &mut dyn Read) -> Result<[u8; N], MapError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            MapError::Corrupt("unexpected end of map file".into())
        } else {
            MapError::Io(e)
        }
    })?;
    Ok(buf)
}

fn read_u8(r: &mut dyn Read) -> Result<u8, MapError> {
    Ok(read_bytes::<1>(r)?[0])
}

fn read_bool(r: &mut dyn Read) -> Result<bool, MapError> {
    Ok(read_u8(r)? != 0)
}

fn read_i32_le(r: &mut dyn Read) -> Result<i32, MapError> {
    Ok(i32::from_le_bytes(read_bytes(r)?))
}

fn read_f32_le(r: &mut dyn Read) -> Result<f32, MapError> {
    Ok(f32::from_le_bytes(read_bytes(r)?))
}

fn write_height(w: &mut dyn Write, cell: usize, value: i32) -> Result<(), MapError> {
    let byte = i8::try_from(value).map_err(|_| MapError::HeightOutOfRange { cell, value })?;
    write_u8(w, byte as u8)
}

fn encode_river(river: Option<HexDirection>) -> u8 {
    river.map_or(0, |d| d.index() as u8 + RIVER_FLAG)
}

fn decode_river(byte: u8) -> Result<Option<HexDirection>, MapError> {
    if byte < RIVER_FLAG {
        return Ok(None);
    }
    HexDirection::from_index(usize::from(byte - RIVER_FLAG))
        .map(Some)
        .ok_or_else(|| MapError::Corrupt(format!("invalid river byte {byte}")))
}

/// Записывает карту в текущей версии формата. Высоты вне `-128..=127`
/// не записываются: возвращается [`MapError::HeightOutOfRange`].
pub fn write_map(grid: &HexGrid, writer: &mut dyn Write) -> Result<(), MapError> {
    write_i32_le(writer, MAP_FILE_VERSION)?;
    write_i32_le(writer, grid.width())?;
    write_i32_le(writer, grid.height())?;
    write_bool(writer, grid.wrapping())?;

    for cell in grid.cells() {
        write_u8(writer, cell.terrain_type().index())?;
        // высота и вода в дополнительном коде, отрицательные значения допустимы
        write_height(writer, cell.index(), cell.elevation())?;
        write_height(writer, cell.index(), cell.water_level())?;
        write_u8(writer, cell.urban_level())?;
        write_u8(writer, cell.farm_level())?;
        write_u8(writer, cell.plant_level())?;
        write_u8(writer, cell.special_index())?;
        write_bool(writer, cell.walled())?;
        write_u8(writer, encode_river(cell.incoming_river()))?;
        write_u8(writer, encode_river(cell.outgoing_river()))?;
        write_u8(writer, cell.road_mask())?;
        write_bool(writer, cell.is_explored())?;
    }

    write_i32_le(writer, grid.units().len() as i32)?;
    for unit in grid.units() {
        let coordinates = grid.cell(unit.location()).coordinates();
        write_i32_le(writer, coordinates.x())?;
        write_i32_le(writer, coordinates.z())?;
        write_f32_le(writer, unit.orientation())?;
    }
    Ok(())
}

/// Читает карту в новую сетку. Версии новее текущей отклоняются.
pub fn read_map(reader: &mut dyn Read) -> Result<HexGrid, MapError> {
    let header = read_i32_le(reader)?;
    if !(0..=MAP_FILE_VERSION).contains(&header) {
        return Err(MapError::UnsupportedVersion {
            found: header,
            supported: MAP_FILE_VERSION,
        });
    }

    let (width, height) = if header >= 1 {
        (read_i32_le(reader)?, read_i32_le(reader)?)
    } else {
        (LEGACY_WIDTH, LEGACY_HEIGHT)
    };
    let wrapping = header >= 5 && read_bool(reader)?;
    let mut grid = HexGrid::new(&GridSettings {
        width,
        height,
        wrapping,
    })
    .map_err(|_| MapError::Corrupt(format!("invalid map size {width}x{height}")))?;

    for index in 0..grid.cell_count() {
        let terrain = read_u8(reader)?;
        let cell = &mut grid.cells[index];
        cell.terrain_type = TerrainType::from_index(terrain)
            .ok_or_else(|| MapError::Corrupt(format!("invalid terrain type {terrain}")))?;
        cell.elevation = i32::from(read_u8(reader)? as i8);
        cell.water_level = i32::from(read_u8(reader)? as i8);
        cell.urban_level = read_u8(reader)?;
        cell.farm_level = read_u8(reader)?;
        cell.plant_level = read_u8(reader)?;
        cell.special_index = read_u8(reader)?;
        cell.walled = read_bool(reader)?;
        cell.incoming_river = decode_river(read_u8(reader)?)?;
        cell.outgoing_river = decode_river(read_u8(reader)?)?;
        cell.roads = read_u8(reader)? & 0b11_1111;
        cell.explored = header >= 3 && read_bool(reader)?;
    }
    check_links(&grid)?;

    if header >= 2 {
        let unit_count = read_i32_le(reader)?;
        if unit_count < 0 {
            return Err(MapError::Corrupt(format!("negative unit count {unit_count}")));
        }
        for _ in 0..unit_count {
            let x = read_i32_le(reader)?;
            let z = read_i32_le(reader)?;
            let orientation = read_f32_le(reader)?;
            let location = grid
                .cell_at(HexCoordinates::new(x, z))
                .ok_or_else(|| MapError::Corrupt(format!("unit outside map at ({x}, {z})")))?;
            if grid.add_unit(location, orientation).is_none() {
                return Err(MapError::Corrupt(format!("two units at ({x}, {z})")));
            }
        }
    }
    Ok(grid)
}

/// Реки и дороги должны быть записаны с обеих сторон ребра.
fn check_links(grid: &HexGrid) -> Result<(), MapError> {
    for cell in grid.cells() {
        if let Some(direction) = cell.outgoing_river() {
            let matched = cell
                .neighbor(direction)
                .is_some_and(|n| grid.cell(n).incoming_river() == Some(direction.opposite()));
            if !matched {
                return Err(MapError::Corrupt(format!(
                    "river leaving cell {} has no matching end",
                    cell.index()
                )));
            }
        }
        for direction in HexDirection::ALL {
            if !cell.has_road_through_edge(direction) {
                continue;
            }
            let matched = cell
                .neighbor(direction)
                .is_some_and(|n| grid.cell(n).has_road_through_edge(direction.opposite()));
            if !matched {
                return Err(MapError::Corrupt(format!(
                    "road from cell {} has no matching end",
                    cell.index()
                )));
            }
        }
    }
    Ok(())
}

impl HexGrid {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        write_map(self, &mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), "map saved");
        Ok(())
    }

    /// Заменяет карту содержимым потока. При ошибке текущая карта не меняется.
    pub fn load(&mut self, reader: &mut dyn Read) -> Result<(), MapError> {
        let loaded = match read_map(reader) {
            Ok(grid) => grid,
            Err(error) => {
                warn!(%error, "map not loaded");
                return Err(error);
            }
        };
        let observer = self.take_observer();
        *self = loaded;
        self.set_observer(observer);
        self.refresh_all();
        Ok(())
    }

    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader)?;
        info!(path = %path.display(), "map loaded");
        Ok(())
    }
}
