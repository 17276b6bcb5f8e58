//! Эрозия: крутые клетки отдают по уровню высоты более низким соседям.

use super::Generation;
use crate::coordinates::HexDirection;
use rand::Rng;
use tracing::info;

impl Generation<'_> {
    pub(super) fn erode_land(&mut self) {
        let mut erodible: Vec<usize> = (0..self.grid.cell_count())
            .filter(|&index| self.is_erodible(index))
            .collect();
        let target_count =
            (erodible.len() as f32 * (100 - self.settings.erosion_percentage) as f32 * 0.01) as usize;
        self.report.erodible_before = erodible.len();

        while erodible.len() > target_count {
            let position = self.rng.gen_range(0..erodible.len());
            let cell = erodible[position];
            let Some(target) = self.erosion_target(cell) else {
                erodible.swap_remove(position);
                continue;
            };

            let elevation = self.grid.cell(cell).elevation() - 1;
            self.grid.set_elevation(cell, elevation);
            let target_elevation = self.grid.cell(target).elevation() + 1;
            self.grid.set_elevation(target, target_elevation);

            if !self.is_erodible(cell) {
                erodible.swap_remove(position);
            }

            for neighbor in self.neighbors(cell) {
                if self.grid.cell(neighbor).elevation() == elevation + 2
                    && !erodible.contains(&neighbor)
                {
                    erodible.push(neighbor);
                }
            }

            if self.is_erodible(target) && !erodible.contains(&target) {
                erodible.push(target);
            }

            for neighbor in self.neighbors(target) {
                if neighbor != cell
                    && self.grid.cell(neighbor).elevation() == target_elevation + 1
                    && !self.is_erodible(neighbor)
                {
                    if let Some(stale) = erodible.iter().position(|&c| c == neighbor) {
                        erodible.remove(stale);
                    }
                }
            }
        }

        self.report.erodible_after = erodible.len();
        info!(
            before = self.report.erodible_before,
            after = erodible.len(),
            "land eroded"
        );
    }

    /// Клетка подвержена эрозии, если хотя бы один сосед ниже на 2 уровня и больше.
    pub(super) fn is_erodible(&self, index: usize) -> bool {
        let erodible_elevation = self.grid.cell(index).elevation() - 2;
        self.neighbors(index)
            .any(|n| self.grid.cell(n).elevation() <= erodible_elevation)
    }

    fn erosion_target(&mut self, index: usize) -> Option<usize> {
        let erodible_elevation = self.grid.cell(index).elevation() - 2;
        let candidates: Vec<usize> = self
            .neighbors(index)
            .filter(|&n| self.grid.cell(n).elevation() <= erodible_elevation)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        HexDirection::ALL
            .into_iter()
            .filter_map(move |direction| self.grid.neighbor(index, direction))
    }
}
