//! Очередь с приоритетом для всех поисков по сетке.
//!
//! Уменьшения ключа нет: клетку, чей приоритет улучшился, просто кладут в
//! очередь ещё раз. Устаревшие копии отбрасываются при извлечении по
//! множеству уже завершённых клеток. Порядок дубликатов влияет на
//! воспроизводимость генерации, поэтому при равном приоритете клетки
//! извлекаются в порядке добавления.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct SearchFrontier {
    heap: BinaryHeap<Reverse<(i32, u64, usize)>>,
    sequence: u64,
    finalized: HashSet<usize>,
}

impl SearchFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет клетку с приоритетом, вычисленным в момент вызова.
    pub fn enqueue(&mut self, cell: usize, priority: i32) {
        self.heap.push(Reverse((priority, self.sequence, cell)));
        self.sequence += 1;
    }

    /// Извлекает клетку с минимальным приоритетом, пропуская уже завершённые,
    /// и помечает её завершённой.
    pub fn dequeue(&mut self) -> Option<usize> {
        while let Some(Reverse((_, _, cell))) = self.heap.pop() {
            if self.finalized.insert(cell) {
                return Some(cell);
            }
        }
        None
    }

    #[must_use]
    pub fn is_finalized(&self, cell: usize) -> bool {
        self.finalized.contains(&cell)
    }

    /// Число записей в куче, включая ещё не отброшенные дубликаты.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Сбрасывает очередь перед новым поиском.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.finalized.clear();
        self.sequence = 0;
    }
}
