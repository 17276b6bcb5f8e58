//! Подвижные отряды и правила стоимости перемещения.

use crate::cell::HexCell;
use crate::coordinates::{EdgeType, HexDirection};
use crate::grid::HexGrid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Способность передвигаться по карте, которую использует поиск пути.
pub trait Mover {
    /// Очки движения за ход.
    fn speed(&self) -> i32;

    fn is_valid_destination(&self, cell: &HexCell) -> bool;

    /// Стоимость шага из `from` в соседнюю `to`; `None`, если шаг запрещён.
    fn move_cost(&self, from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32>;
}

/// Стандартные правила передвижения по суше.
///
/// Запрещены вода, занятые клетки, обрывы и переход через стену. Дорога
/// стоит 1, иначе ровное ребро стоит 5, склон 10, плюс застройка, фермы и
/// растительность клетки назначения.
#[must_use]
pub fn standard_move_cost(from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32> {
    if to.is_underwater() || to.unit().is_some() {
        return None;
    }
    let edge_type = from.edge_type(to);
    if edge_type == EdgeType::Cliff || from.walled() != to.walled() {
        return None;
    }
    if from.has_road_through_edge(direction) {
        return Some(1);
    }
    let base = if edge_type == EdgeType::Flat { 5 } else { 10 };
    Some(base + i32::from(to.urban_level()) + i32::from(to.farm_level()) + i32::from(to.plant_level()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HexUnit {
    location: usize,
    orientation: f32,
}

impl HexUnit {
    pub const SPEED: i32 = 24;
    pub const VISION_RANGE: i32 = 3;

    #[must_use]
    pub fn location(&self) -> usize {
        self.location
    }

    /// Поворот в градусах вокруг вертикальной оси.
    #[must_use]
    pub fn orientation(&self) -> f32 {
        self.orientation
    }
}

impl Mover for HexUnit {
    fn speed(&self) -> i32 {
        Self::SPEED
    }

    fn is_valid_destination(&self, cell: &HexCell) -> bool {
        !cell.is_underwater() && cell.unit().is_none()
    }

    fn move_cost(&self, from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32> {
        standard_move_cost(from, to, direction)
    }
}

impl HexGrid {
    /// Ставит отряд на клетку и открывает видимость вокруг него.
    /// Возвращает номер отряда или `None`, если клетка занята.
    pub fn add_unit(&mut self, location: usize, orientation: f32) -> Option<usize> {
        if self.cells[location].unit.is_some() {
            return None;
        }
        let id = self.units.len();
        self.units.push(HexUnit {
            location,
            orientation,
        });
        self.cells[location].unit = Some(id);
        self.increase_visibility(location, HexUnit::VISION_RANGE);
        debug!(unit = id, location, "unit added");
        Some(id)
    }

    /// Убирает отряд. Номер последнего отряда переходит к освободившемуся.
    /// Для несуществующего номера возвращает `None`.
    pub fn remove_unit(&mut self, id: usize) -> Option<HexUnit> {
        if id >= self.units.len() {
            return None;
        }
        let unit = self.units.swap_remove(id);
        self.cells[unit.location].unit = None;
        self.decrease_visibility(unit.location, HexUnit::VISION_RANGE);
        if let Some(moved) = self.units.get(id) {
            self.cells[moved.location].unit = Some(id);
        }
        debug!(unit = id, location = unit.location, "unit removed");
        Some(unit)
    }

    /// Мгновенно переносит отряд в другую клетку. Возвращает `false`, если
    /// отряда нет или клетка ему не подходит.
    pub fn move_unit(&mut self, id: usize, destination: usize) -> bool {
        let Some(&unit) = self.units.get(id) else {
            return false;
        };
        if unit.location == destination {
            return true;
        }
        if !unit.is_valid_destination(&self.cells[destination]) {
            return false;
        }
        self.decrease_visibility(unit.location, HexUnit::VISION_RANGE);
        self.cells[unit.location].unit = None;
        self.units[id].location = destination;
        self.cells[destination].unit = Some(id);
        self.increase_visibility(destination, HexUnit::VISION_RANGE);
        true
    }

    pub fn set_unit_orientation(&mut self, id: usize, orientation: f32) -> bool {
        let Some(unit) = self.units.get_mut(id) else {
            return false;
        };
        unit.orientation = orientation;
        true
    }
}
