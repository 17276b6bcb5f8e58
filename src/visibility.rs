//! Видимость с учётом дальности и рельефа.
//!
//! Обзор распространяется от клетки наблюдателя заливкой по шагам. Клетка
//! видна, если её можно исследовать, если шаги до неё плюс её высота не
//! превышают дальность плюс высоту наблюдателя, и если число шагов не больше
//! прямого расстояния (обзор не огибает возвышенности).

use crate::coordinates::HexDirection;
use crate::frontier::SearchFrontier;
use crate::grid::HexGrid;

impl HexGrid {
    /// Клетки, видимые из `origin` на дальности `range`, включая саму клетку.
    pub fn visible_cells(&mut self, origin: usize, range: i32) -> Vec<usize> {
        let stamp = self.begin_search();
        let range = range + self.cells[origin].view_elevation();

        let start = &mut self.cells[origin].search;
        start.stamp = stamp;
        start.distance = 0;
        start.heuristic = 0;
        start.path_from = None;

        let mut visible = Vec::new();
        let mut frontier = SearchFrontier::new();
        frontier.enqueue(origin, 0);

        while let Some(current) = frontier.dequeue() {
            visible.push(current);
            let distance = self.cells[current].search.distance + 1;

            for direction in HexDirection::ALL {
                let Some(neighbor) = self.cells[current].neighbor(direction) else {
                    continue;
                };
                let cell = &self.cells[neighbor];
                if cell.search.stamp == stamp || !cell.explorable {
                    continue;
                }
                if distance + cell.view_elevation() > range
                    || distance > self.distance(origin, neighbor)
                {
                    continue;
                }

                let state = &mut self.cells[neighbor].search;
                state.stamp = stamp;
                state.distance = distance;
                state.heuristic = 0;
                state.path_from = Some(current);
                frontier.enqueue(neighbor, distance);
            }
        }
        visible
    }

    /// Добавляет наблюдателя: каждая видимая клетка получает +1 к счётчику
    /// и навсегда становится исследованной.
    pub fn increase_visibility(&mut self, origin: usize, range: i32) {
        for index in self.visible_cells(origin, range) {
            let cell = &mut self.cells[index];
            cell.visibility += 1;
            if cell.visibility == 1 {
                cell.explored = true;
                self.notify_visibility(index);
            }
        }
    }

    /// Убирает наблюдателя. Исследованность клеток сохраняется.
    pub fn decrease_visibility(&mut self, origin: usize, range: i32) {
        for index in self.visible_cells(origin, range) {
            let cell = &mut self.cells[index];
            if cell.visibility == 0 {
                continue;
            }
            cell.visibility -= 1;
            if cell.visibility == 0 {
                self.notify_visibility(index);
            }
        }
    }

    /// Обнуляет счётчики видимости, не трогая исследованность.
    pub fn reset_visibility(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].visibility > 0 {
                self.cells[index].visibility = 0;
                self.notify_visibility(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GridSettings;
    use crate::grid::HexGrid;
    use std::collections::HashSet;

    fn grid() -> HexGrid {
        HexGrid::new(&GridSettings {
            width: 20,
            height: 20,
            wrapping: false,
        })
        .unwrap()
    }

    #[test]
    fn flat_map_sees_hex_disk() {
        let mut g = grid();
        let origin = g.cell_at_offset(10, 10).unwrap();
        let visible = g.visible_cells(origin, 2);
        // 1 + 6 + 12
        assert_eq!(visible.len(), 19);
        assert!(visible.iter().all(|&c| g.distance(origin, c) <= 2));
    }

    #[test]
    fn high_ground_blocks_view() {
        let mut g = grid();
        let origin = g.cell_at_offset(10, 10).unwrap();
        let hill = g.cell_at_offset(11, 10).unwrap();
        g.set_elevation(hill, 5);
        let visible: HashSet<usize> = g.visible_cells(origin, 3).into_iter().collect();
        assert!(!visible.contains(&hill));
        // за холм обзор не заглядывает: обход длиннее прямого расстояния
        let behind = g.cell_at_offset(12, 10).unwrap();
        assert!(!visible.contains(&behind));
        let beside = g.cell_at_offset(10, 11).unwrap();
        assert!(visible.contains(&beside));
    }

    #[test]
    fn elevated_observer_sees_further() {
        let mut g = grid();
        let origin = g.cell_at_offset(10, 10).unwrap();
        let low = g.visible_cells(origin, 2).len();
        g.set_elevation(origin, 2);
        let high = g.visible_cells(origin, 2).len();
        assert!(high > low);
    }

    #[test]
    fn map_border_is_never_seen() {
        let mut g = grid();
        let origin = g.cell_at_offset(1, 1).unwrap();
        let visible = g.visible_cells(origin, 3);
        assert!(visible.iter().skip(1).all(|&c| g.cell(c).is_explorable()));
    }

    #[test]
    fn overlapping_viewers_keep_cells_visible() {
        let mut g = grid();
        let a = g.cell_at_offset(8, 10).unwrap();
        let b = g.cell_at_offset(10, 10).unwrap();
        let shared = g.cell_at_offset(9, 10).unwrap();

        g.increase_visibility(a, 2);
        g.increase_visibility(b, 2);
        assert_eq!(g.cell(shared).visibility(), 2);

        g.decrease_visibility(a, 2);
        assert!(g.cell(shared).is_visible());
        assert!(!g.cell(g.cell_at_offset(6, 10).unwrap()).is_visible());
        assert!(g.cell(g.cell_at_offset(6, 10).unwrap()).is_explored());

        g.decrease_visibility(b, 2);
        assert!(!g.cell(shared).is_visible());
        assert!(g.cell(shared).is_explored());
    }

    #[test]
    fn reset_keeps_explored() {
        let mut g = grid();
        let a = g.cell_at_offset(8, 10).unwrap();
        g.increase_visibility(a, 2);
        g.reset_visibility();
        assert!(g.cells().iter().all(|c| !c.is_visible()));
        assert!(g.cell(a).is_explored());
    }
}
