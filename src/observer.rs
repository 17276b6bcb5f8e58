use crate::cell::HexCell;

/// Получатель уведомлений об изменениях карты.
///
/// Отрисовка чанков и шейдерные данные клеток живут вне библиотеки; сетка
/// лишь сообщает, что нужно обновить. За одно логическое изменение каждый
/// чанк уведомляется не более одного раза.
pub trait GridObserver {
    /// Чанк нужно перестроить.
    fn refresh_chunk(&mut self, _chunk: usize) {}

    /// Изменился тип поверхности клетки.
    fn refresh_terrain(&mut self, _cell: &HexCell) {}

    /// Изменилась видимость или исследованность клетки.
    fn refresh_visibility(&mut self, _cell: &HexCell) {}
}
