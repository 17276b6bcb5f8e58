//! PNG-превью карты: клетка рисуется квадратом `scale`×`scale`, нечётные
//! строки сдвинуты на полклетки, север сверху.

use crate::cell::{HexCell, TerrainType};
use crate::error::MapError;
use crate::grid::HexGrid;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

const RIVER_COLOR: Rgba<u8> = Rgba([40, 110, 230, 255]);
const BACKGROUND: [u8; 4] = [0, 0, 0, 0];

fn terrain_color(terrain: TerrainType) -> [u8; 3] {
    match terrain {
        TerrainType::Sand => [222, 200, 140],
        TerrainType::Grass => [100, 170, 70],
        TerrainType::Mud => [125, 100, 70],
        TerrainType::Stone => [140, 140, 140],
        TerrainType::Snow => [240, 240, 250],
    }
}

fn cell_color(cell: &HexCell) -> [u8; 4] {
    if cell.is_underwater() {
        let depth = (cell.water_level() - cell.elevation()).clamp(1, 6) as u8;
        return [20, 60 + 10 * (6 - depth), 120 + 20 * (6 - depth), 255];
    }
    let [r, g, b] = terrain_color(cell.terrain_type());
    // густая растительность темнее
    let shade = 1.0 - f32::from(cell.plant_level()) * 0.08;
    [
        (f32::from(r) * shade) as u8,
        (f32::from(g) * shade) as u8,
        (f32::from(b) * shade) as u8,
        255,
    ]
}

/// Рисует превью карты.
#[must_use]
pub fn render_preview(grid: &HexGrid, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let columns = grid.width() as u32;
    let rows = grid.height() as u32;
    let half = scale / 2;
    let image_width = columns * scale + half;
    let image_height = rows * scale;

    let colors: Vec<[u8; 4]> = grid.cells().iter().map(cell_color).collect();
    let pixel = |i: usize| -> [u8; 4] {
        let px = i as u32 % image_width;
        let py = i as u32 / image_width;
        let row = rows - 1 - py / scale;
        let offset = if row % 2 == 1 { half } else { 0 };
        if px < offset {
            return BACKGROUND;
        }
        let column = (px - offset) / scale;
        if column >= columns {
            return BACKGROUND;
        }
        colors[(row * columns + column) as usize]
    };

    let count = (image_width * image_height) as usize;
    #[cfg(feature = "parallel")]
    let pixels: Vec<[u8; 4]> = (0..count).into_par_iter().map(pixel).collect();
    #[cfg(not(feature = "parallel"))]
    let pixels: Vec<[u8; 4]> = (0..count).map(pixel).collect();

    let mut image = RgbaImage::from_raw(image_width, image_height, pixels.concat())
        .unwrap_or_else(|| RgbaImage::new(image_width, image_height));

    let center = |cell: &HexCell| -> (f32, f32) {
        let (column, row) = cell.coordinates().to_offset();
        let offset = if row % 2 == 1 { half } else { 0 };
        (
            (column as u32 * scale + offset + half) as f32,
            ((rows - 1 - row as u32) * scale + half) as f32,
        )
    };
    for cell in grid.cells() {
        let Some(direction) = cell.outgoing_river() else {
            continue;
        };
        let Some(next) = cell.neighbor(direction) else {
            continue;
        };
        let next = grid.cell(next);
        let (from_column, _) = cell.coordinates().to_offset();
        let (to_column, _) = next.coordinates().to_offset();
        // отрезок через шов свёрнутой карты не рисуем
        if (from_column - to_column).abs() > 1 {
            continue;
        }
        draw_line_segment_mut(&mut image, center(cell), center(next), RIVER_COLOR);
    }
    image
}

pub fn save_preview(grid: &HexGrid, scale: u32, path: impl AsRef<Path>) -> Result<(), MapError> {
    let path = path.as_ref();
    render_preview(grid, scale).save(path)?;
    info!(path = %path.display(), "preview saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSettings;
    use crate::coordinates::HexDirection;

    fn grid() -> HexGrid {
        HexGrid::new(&GridSettings {
            width: 10,
            height: 5,
            wrapping: false,
        })
        .unwrap()
    }

    #[test]
    fn image_size_follows_scale() {
        let image = render_preview(&grid(), 4);
        assert_eq!(image.dimensions(), (42, 20));
    }

    #[test]
    fn cells_are_coloured_by_terrain() {
        let mut g = grid();
        let cell = g.cell_at_offset(0, 0).unwrap();
        g.set_terrain_type(cell, TerrainType::Snow);
        let image = render_preview(&g, 4);
        // нижний левый угол: строка 0 чётная, без сдвига
        assert_eq!(image.get_pixel(1, 18).0, [240, 240, 250, 255]);
        // начало нечётной строки пустое
        assert_eq!(image.get_pixel(0, 14).0, BACKGROUND);
    }

    #[test]
    fn water_is_blue_and_rivers_are_drawn() {
        let mut g = grid();
        for index in 0..g.cell_count() {
            g.set_water_level(index, 1);
        }
        let image = render_preview(&g, 4);
        let [r, _, b, _] = image.get_pixel(1, 1).0;
        assert!(b > r);

        let mut g = grid();
        let a = g.cell_at_offset(2, 2).unwrap();
        g.set_elevation(a, 1);
        assert!(g.set_outgoing_river(a, HexDirection::E));
        let image = render_preview(&g, 8);
        // середина отрезка между центрами клеток (2,2) и (3,2)
        assert_eq!(*image.get_pixel(24, 20), RIVER_COLOR);
    }
}
