use crate::config::NoiseSettings;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

/// Источник шума: четыре канала в диапазоне [0, 1] для точки в пространстве.
///
/// Используется для смещения высоты клеток и разброса температуры.
pub trait NoiseSampler {
    fn sample(&self, position: [f32; 3]) -> [f32; 4];
}

/// Шум на основе `FastNoiseLite`: по одному генератору `OpenSimplex2` на канал.
pub struct FastNoiseSampler {
    channels: [FastNoiseLite; 4],
}

impl FastNoiseSampler {
    #[must_use]
    pub fn new(settings: &NoiseSettings) -> Self {
        let channel = |offset: i32| {
            let mut noise = FastNoiseLite::new();
            noise.set_seed(Some(settings.seed.wrapping_add(offset * 1_000)));
            noise.set_noise_type(Some(NoiseType::OpenSimplex2));
            noise.set_fractal_type(Some(FractalType::FBm));
            noise.set_fractal_octaves(Some(2));
            noise.set_frequency(Some(settings.frequency));
            noise
        };
        Self {
            channels: [channel(0), channel(1), channel(2), channel(3)],
        }
    }
}

impl Default for FastNoiseSampler {
    fn default() -> Self {
        Self::new(&NoiseSettings::default())
    }
}

impl NoiseSampler for FastNoiseSampler {
    fn sample(&self, position: [f32; 3]) -> [f32; 4] {
        let [x, y, z] = position;
        let mut value = [0.0; 4];
        for (out, noise) in value.iter_mut().zip(&self.channels) {
            *out = ((noise.get_noise_3d(x, y, z) + 1.0) * 0.5).clamp(0.0, 1.0);
        }
        value
    }
}

/// Постоянный шум: удобен в тестах, где смещения не нужны.
#[derive(Debug, Clone, Copy)]
pub struct FlatNoise(pub f32);

impl Default for FlatNoise {
    fn default() -> Self {
        Self(0.5)
    }
}

impl NoiseSampler for FlatNoise {
    fn sample(&self, _position: [f32; 3]) -> [f32; 4] {
        [self.0; 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_stay_in_unit_range() {
        let noise = FastNoiseSampler::default();
        for i in 0..200 {
            let p = [i as f32 * 7.3, i as f32 * 0.5, i as f32 * -3.1];
            for v in noise.sample(p) {
                assert!((0.0..=1.0).contains(&v), "value {v} at {p:?}");
            }
        }
    }

    #[test]
    fn sampling_is_deterministic() {
        let a = FastNoiseSampler::default();
        let b = FastNoiseSampler::default();
        let p = [12.5, 3.0, -40.0];
        assert_eq!(a.sample(p), b.sample(p));
    }
}
