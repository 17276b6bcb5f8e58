//! Поиск пути с учётом ходов.
//!
//! Поиск по возрастанию `стоимость + расстояние до цели`. Каждая клетка
//! получает стоимость ровно один раз за поиск (при первом обнаружении), а
//! поиск завершается, как только обнаружена цель. Это приближение, а не
//! строгий A*: на неоднородном рельефе найденный путь может быть не самым
//! дешёвым.

use crate::coordinates::HexDirection;
use crate::frontier::SearchFrontier;
use crate::grid::HexGrid;
use crate::unit::Mover;
use tracing::debug;

/// Номер хода, в котором заканчивается накопленная стоимость `distance`.
#[must_use]
pub fn turn_of(distance: i32, speed: i32) -> i32 {
    (distance - 1) / speed
}

impl HexGrid {
    /// Ищет путь от `origin` до `destination` для `mover`.
    ///
    /// Возвращает клетки пути от начала до цели включительно; если цель
    /// недостижима, возвращает пустой вектор. Штампы и стоимости клеток
    /// после вызова описывают этот поиск.
    pub fn find_path(&mut self, origin: usize, destination: usize, mover: &dyn Mover) -> Vec<usize> {
        if origin == destination {
            return vec![origin];
        }
        let speed = mover.speed().max(1);
        let stamp = self.begin_search();
        let target = self.cells[destination].coordinates;

        let start = &mut self.cells[origin].search;
        start.stamp = stamp;
        start.distance = 0;
        start.heuristic = 0;
        start.path_from = None;

        let mut frontier = SearchFrontier::new();
        frontier.enqueue(origin, 0);

        let mut found = false;
        'search: while let Some(current) = frontier.dequeue() {
            let current_distance = self.cells[current].search.distance;
            let current_turn = turn_of(current_distance, speed);

            for direction in HexDirection::ALL {
                let Some(neighbor) = self.cells[current].neighbor(direction) else {
                    continue;
                };
                if self.cells[neighbor].search.stamp == stamp {
                    continue;
                }
                if !mover.is_valid_destination(&self.cells[neighbor]) {
                    continue;
                }
                let Some(cost) =
                    mover.move_cost(&self.cells[current], &self.cells[neighbor], direction)
                else {
                    continue;
                };

                let mut distance = current_distance + cost;
                let turn = turn_of(distance, speed);
                if turn > current_turn {
                    // остаток очков предыдущего хода сгорает
                    distance = turn * speed + cost;
                }

                let heuristic = if self.wrapping() {
                    self.cells[neighbor].coordinates.wrapped_distance_to(target, self.width())
                } else {
                    self.cells[neighbor].coordinates.distance_to(target)
                };
                let state = &mut self.cells[neighbor].search;
                state.stamp = stamp;
                state.distance = distance;
                state.heuristic = heuristic;
                state.path_from = Some(current);
                frontier.enqueue(neighbor, state.priority());

                if neighbor == destination {
                    found = true;
                    break 'search;
                }
            }
        }

        if !found {
            debug!(origin, destination, "no path");
            return Vec::new();
        }

        let mut path = vec![destination];
        let mut current = destination;
        while let Some(previous) = self.cells[current].search.path_from {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::HexCell;
    use crate::config::GridSettings;
    use crate::unit::{HexUnit, standard_move_cost};

    struct Walker(i32);

    impl Mover for Walker {
        fn speed(&self) -> i32 {
            self.0
        }
        fn is_valid_destination(&self, cell: &HexCell) -> bool {
            !cell.is_underwater()
        }
        fn move_cost(&self, from: &HexCell, to: &HexCell, d: HexDirection) -> Option<i32> {
            standard_move_cost(from, to, d)
        }
    }

    fn grid() -> HexGrid {
        HexGrid::new(&GridSettings {
            width: 15,
            height: 15,
            wrapping: false,
        })
        .unwrap()
    }

    #[test]
    fn turn_boundaries() {
        assert_eq!(turn_of(0, 24), 0);
        assert_eq!(turn_of(24, 24), 0);
        assert_eq!(turn_of(25, 24), 1);
        assert_eq!(turn_of(48, 24), 1);
    }

    #[test]
    fn straight_path_on_flat_map() {
        let mut g = grid();
        let a = g.cell_at_offset(2, 7).unwrap();
        let b = g.cell_at_offset(9, 7).unwrap();
        let path = g.find_path(a, b, &Walker(1000));
        assert_eq!(path.len(), 8);
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        for pair in path.windows(2) {
            assert_eq!(g.distance(pair[0], pair[1]), 1);
        }
        assert_eq!(g.cell(b).search_distance(), 35);
    }

    #[test]
    fn cost_is_inflated_at_turn_boundary() {
        let mut g = grid();
        let a = g.cell_at_offset(2, 7).unwrap();
        let b = g.cell_at_offset(7, 7).unwrap();
        // 5 очков за шаг, 12 за ход: третий шаг переносится на второй ход
        let path = g.find_path(a, b, &Walker(12));
        assert_eq!(path.len(), 6);
        let distances: Vec<i32> = path.iter().map(|&c| g.cell(c).search_distance()).collect();
        assert_eq!(distances, vec![0, 5, 10, 17, 22, 29]);
    }

    #[test]
    fn prefers_roads() {
        let mut g = grid();
        let a = g.cell_at_offset(2, 7).unwrap();
        let b = g.cell_at_offset(6, 7).unwrap();
        let mut cell = a;
        while cell != b {
            assert!(g.add_road(cell, HexDirection::E));
            cell = g.neighbor(cell, HexDirection::E).unwrap();
        }
        let path = g.find_path(a, b, &Walker(1000));
        assert_eq!(path.len(), 5);
        assert_eq!(g.cell(b).search_distance(), 4);
    }

    #[test]
    fn walks_around_water() {
        let mut g = grid();
        let a = g.cell_at_offset(3, 7).unwrap();
        let b = g.cell_at_offset(7, 7).unwrap();
        let blocker = g.cell_at_offset(5, 7).unwrap();
        g.set_water_level(blocker, 1);
        let path = g.find_path(a, b, &Walker(1000));
        assert!(!path.is_empty());
        assert!(!path.contains(&blocker));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn island_destination_is_unreachable() {
        let mut g = grid();
        let a = g.cell_at_offset(2, 2).unwrap();
        let b = g.cell_at_offset(8, 8).unwrap();
        for d in HexDirection::ALL {
            let n = g.neighbor(b, d).unwrap();
            g.set_water_level(n, 1);
        }
        assert!(g.find_path(a, b, &Walker(24)).is_empty());
    }

    #[test]
    fn trivial_path_and_unit_mover() {
        let mut g = grid();
        let a = g.cell_at_offset(4, 4).unwrap();
        assert_eq!(g.find_path(a, a, &Walker(24)), vec![a]);

        let id = g.add_unit(a, 0.0).unwrap();
        let unit: HexUnit = g.units()[id];
        let b = g.cell_at_offset(6, 4).unwrap();
        assert_eq!(g.find_path(a, b, &unit).len(), 3);
    }
}
