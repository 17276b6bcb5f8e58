//! Разбиение карты на прямоугольные регионы, в которых растёт суша.

use crate::config::GeneratorSettings;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Прямоугольник в координатах смещения: `x_min..x_max`, `z_min..z_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRegion {
    pub x_min: i32,
    pub x_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

impl MapRegion {
    /// Случайная клетка региона (столбец, строка).
    pub(crate) fn random_cell(&self, rng: &mut ChaCha8Rng) -> (i32, i32) {
        (
            rng.gen_range(self.x_min..self.x_max),
            rng.gen_range(self.z_min..self.z_max),
        )
    }

    /// Подрезает регион под размер карты так, чтобы в нём была хотя бы одна клетка.
    fn fitted(self, width: i32, height: i32) -> Self {
        let (x_min, x_max) = fit_span(self.x_min, self.x_max, width);
        let (z_min, z_max) = fit_span(self.z_min, self.z_max, height);
        Self {
            x_min,
            x_max,
            z_min,
            z_max,
        }
    }
}

fn fit_span(min: i32, max: i32, size: i32) -> (i32, i32) {
    let min = min.clamp(0, size - 1);
    let max = max.clamp(min + 1, size);
    (min, max)
}

pub(crate) fn create_regions(
    settings: &GeneratorSettings,
    width: i32,
    height: i32,
    wrapping: bool,
    rng: &mut ChaCha8Rng,
) -> Vec<MapRegion> {
    let mut border_x = if wrapping {
        settings.region_border
    } else {
        settings.map_border_x
    };
    let border_z = settings.map_border_z;
    let region_border = settings.region_border;

    let mut region = MapRegion {
        x_min: border_x,
        x_max: width - border_x,
        z_min: border_z,
        z_max: height - border_z,
    };

    let regions = match settings.region_count {
        1 => {
            if wrapping {
                border_x = 0;
            }
            region.x_min = border_x;
            region.x_max = width - border_x;
            vec![region]
        }
        2 => {
            if rng.gen_range(0.0f32..1.0) < 0.5 {
                region.x_max = width / 2 - region_border;
                let left = region;
                region.x_min = width / 2 + region_border;
                region.x_max = width - border_x;
                vec![left, region]
            } else {
                if wrapping {
                    border_x = 0;
                }
                region.x_min = border_x;
                region.x_max = width - border_x;
                region.z_max = height / 2 - region_border;
                let bottom = region;
                region.z_min = height / 2 + region_border;
                region.z_max = height - border_z;
                vec![bottom, region]
            }
        }
        3 => {
            region.x_max = width / 3 - region_border;
            let first = region;
            region.x_min = width / 3 + region_border;
            region.x_max = width * 2 / 3 - region_border;
            let second = region;
            region.x_min = width * 2 / 3 + region_border;
            region.x_max = width - border_x;
            vec![first, second, region]
        }
        _ => {
            region.x_max = width / 2 - region_border;
            region.z_max = height / 2 - region_border;
            let first = region;
            region.x_min = width / 2 + region_border;
            region.x_max = width - border_x;
            let second = region;
            region.z_min = height / 2 + region_border;
            region.z_max = height - border_z;
            let third = region;
            region.x_min = border_x;
            region.x_max = width / 2 - region_border;
            vec![first, second, third, region]
        }
    };

    regions
        .into_iter()
        .map(|region| region.fitted(width, height))
        .collect()
}
