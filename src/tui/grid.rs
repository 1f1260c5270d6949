//! Selection and scrolling math for the results grid.

/// Number of cards per row.
pub const GRID_COLUMNS: usize = 3;

/// Direction of a selection move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

/// (row, column) of a card.
pub fn position(index: usize, columns: usize) -> (usize, usize) {
    (index / columns, index % columns)
}

/// Number of rows needed for `len` cards.
pub fn row_count(len: usize, columns: usize) -> usize {
    len.div_ceil(columns)
}

/// Move the selection within a grid of `len` cards.
///
/// Left/right wrap across rows; up/down keep the column and stop at the
/// edges. Moving down into a short last row lands on its last card.
pub fn step(selected: usize, len: usize, columns: usize, direction: Move) -> usize {
    if len == 0 {
        return 0;
    }
    let selected = selected.min(len - 1);

    match direction {
        Move::Left => selected.saturating_sub(1),
        Move::Right => (selected + 1).min(len - 1),
        Move::Up => selected.checked_sub(columns).unwrap_or(selected),
        Move::Down => {
            let (row, _) = position(selected, columns);
            if row + 1 >= row_count(len, columns) {
                selected
            } else {
                (selected + columns).min(len - 1)
            }
        }
    }
}

/// First visible row so that `selected_row` is on screen.
pub fn scroll_to_fit(selected_row: usize, scroll: usize, visible_rows: usize) -> usize {
    let visible_rows = visible_rows.max(1);
    if selected_row < scroll {
        selected_row
    } else if selected_row >= scroll + visible_rows {
        selected_row + 1 - visible_rows
    } else {
        scroll
    }
}
