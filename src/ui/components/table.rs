//! Report table and the detail pane of the selected report.
//!
//! Columns: TIPO, NOMBRE, UBICACIÓN, PUBLICADO, ESTADO. The location column
//! takes whatever width the fixed columns leave over.

use crate::ui::helpers::{self, display_len, position_cursor, print_cell};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{DetailPane, DisplayItem};

const PET_COLUMN_WIDTH: usize = 10;
const NAME_COLUMN_WIDTH: usize = 24;
const PUBLISHED_COLUMN_WIDTH: usize = 14;
const STATUS_COLUMN_WIDTH: usize = 16;
const MIN_LOCATION_WIDTH: usize = 10;
const DETAIL_LABEL_WIDTH: usize = 13;

fn location_width(cols: usize) -> usize {
    cols.saturating_sub(PET_COLUMN_WIDTH + NAME_COLUMN_WIDTH + PUBLISHED_COLUMN_WIDTH + STATUS_COLUMN_WIDTH)
        .max(MIN_LOCATION_WIDTH)
}

/// Renders the column headers and returns the next row.
pub fn render_table_headers(row: usize, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    print_cell("TIPO", PET_COLUMN_WIDTH);
    print_cell("NOMBRE", NAME_COLUMN_WIDTH);
    print_cell("UBICACIÓN", location_width(cols));
    print_cell("PUBLICADO", PUBLISHED_COLUMN_WIDTH);
    print_cell("ESTADO", STATUS_COLUMN_WIDTH);
    print!("{}", Theme::reset());
    row + 1
}

/// Renders all rows starting at `row` and returns the row after the last one.
pub fn render_table_rows(row: usize, items: &[DisplayItem], theme: &Theme, cols: usize) -> usize {
    let mut current_row = row;
    for item in items {
        current_row = render_table_row(current_row, item, theme, cols);
    }
    current_row
}

fn render_table_row(row: usize, item: &DisplayItem, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);

    if item.is_selected {
        print!("{}", Theme::fg(&theme.colors.selection_fg));
        print!("{}", Theme::bg(&theme.colors.selection_bg));
    } else {
        print!("{}", Theme::fg(&theme.colors.text_normal));
    }

    print_cell(&item.pet, PET_COLUMN_WIDTH);

    helpers::render_highlighted_text(&item.name, &item.highlight_ranges, theme, item.is_selected);
    print!("{}", " ".repeat(NAME_COLUMN_WIDTH.saturating_sub(display_len(&item.name))));

    print_cell(&item.location, location_width(cols));
    print_cell(&item.published, PUBLISHED_COLUMN_WIDTH);
    print_cell(&item.status, STATUS_COLUMN_WIDTH);

    let line_len = location_width(cols) + PET_COLUMN_WIDTH + NAME_COLUMN_WIDTH + PUBLISHED_COLUMN_WIDTH + STATUS_COLUMN_WIDTH;
    print!("{}", " ".repeat(cols.saturating_sub(line_len)));

    print!("{}", Theme::reset());
    row + 1
}

/// Renders `label: value` lines of the selected report starting at `row`.
pub fn render_detail(row: usize, detail: &DetailPane, theme: &Theme, cols: usize) -> usize {
    let value_width = cols.saturating_sub(DETAIL_LABEL_WIDTH + 1);
    let mut current_row = row;

    for (label, value) in &detail.lines {
        position_cursor(current_row, 1);
        print!(" {}", Theme::fg(&theme.colors.text_dim));
        print_cell(label, DETAIL_LABEL_WIDTH);
        print!("{}", Theme::fg(&theme.colors.text_normal));
        // Descriptions may hold newlines; the pane is one line per field.
        print_cell(&value.replace('\n', " "), value_width);
        print!("{}", Theme::reset());
        current_row += 1;
    }
    current_row
}
