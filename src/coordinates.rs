//! Кубические координаты шестиугольной сетки, направления и метрики.
//!
//! Сетка "pointy-top": строки идут по оси Z, нечётные строки сдвинуты на
//! половину клетки вправо. Кубическая координата хранит `x` и `z`, а `y`
//! выводится из инварианта `x + y + z = 0`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Внешний радиус клетки в мировых единицах.
pub const OUTER_RADIUS: f32 = 10.0;
/// Внутренний радиус: `OUTER_RADIUS * √3 / 2`.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * 0.866_025_4;
/// Высота одного уровня рельефа.
pub const ELEVATION_STEP: f32 = 3.0;
/// Амплитуда шумового смещения высоты клетки.
pub const ELEVATION_PERTURB_STRENGTH: f32 = 1.5;
/// Размер чанка по X (в клетках). Ширина карты должна быть ему кратна.
pub const CHUNK_SIZE_X: i32 = 5;
/// Размер чанка по Z (в клетках). Высота карты должна быть ему кратна.
pub const CHUNK_SIZE_Z: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexDirection {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
}

impl HexDirection {
    pub const ALL: [HexDirection; 6] = [
        HexDirection::NE,
        HexDirection::E,
        HexDirection::SE,
        HexDirection::SW,
        HexDirection::W,
        HexDirection::NW,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % 6]
    }

    #[must_use]
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + 5) % 6]
    }

    #[must_use]
    pub fn next2(self) -> Self {
        Self::ALL[(self.index() + 2) % 6]
    }

    #[must_use]
    pub fn previous2(self) -> Self {
        Self::ALL[(self.index() + 4) % 6]
    }

    /// Смещение `(dx, dz)` кубической координаты при шаге в этом направлении.
    fn offset(self) -> (i32, i32) {
        match self {
            HexDirection::NE => (0, 1),
            HexDirection::E => (1, 0),
            HexDirection::SE => (1, -1),
            HexDirection::SW => (0, -1),
            HexDirection::W => (-1, 0),
            HexDirection::NW => (-1, 1),
        }
    }
}

/// Тип ребра между соседними клетками по перепаду высот.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    Flat,
    Slope,
    Cliff,
}

impl EdgeType {
    #[must_use]
    pub fn between(elevation1: i32, elevation2: i32) -> Self {
        match (elevation1 - elevation2).abs() {
            0 => EdgeType::Flat,
            1 => EdgeType::Slope,
            _ => EdgeType::Cliff,
        }
    }
}

/// Неизменяемая кубическая координата клетки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoordinates {
    x: i32,
    z: i32,
}

impl HexCoordinates {
    #[must_use]
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Переводит смещённые координаты (столбец, строка) в кубические.
    ///
    /// ```
    /// use hexmap::coordinates::HexCoordinates;
    /// let c = HexCoordinates::from_offset(3, 4);
    /// assert_eq!((c.x(), c.y(), c.z()), (1, -5, 4));
    /// assert_eq!(c.to_offset(), (3, 4));
    /// ```
    #[must_use]
    pub fn from_offset(column: i32, row: i32) -> Self {
        Self {
            x: column - row.div_euclid(2),
            z: row,
        }
    }

    #[must_use]
    pub fn to_offset(self) -> (i32, i32) {
        (self.x + self.z.div_euclid(2), self.z)
    }

    #[must_use]
    pub fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> i32 {
        -self.x - self.z
    }

    #[must_use]
    pub fn z(self) -> i32 {
        self.z
    }

    #[must_use]
    pub fn step(self, direction: HexDirection) -> Self {
        let (dx, dz) = direction.offset();
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Стандартная кубическая метрика.
    #[must_use]
    pub fn distance_to(self, other: Self) -> i32 {
        ((self.x - other.x).abs() + (self.y() - other.y()).abs() + (self.z - other.z).abs()) / 2
    }

    /// Расстояние на карте, свёрнутой по оси X с периодом `wrap_size` столбцов.
    #[must_use]
    pub fn wrapped_distance_to(self, other: Self, wrap_size: i32) -> i32 {
        let direct = self.distance_to(other);
        let east = self.distance_to(Self::new(other.x + wrap_size, other.z));
        let west = self.distance_to(Self::new(other.x - wrap_size, other.z));
        direct.min(east).min(west)
    }
}

impl fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}
