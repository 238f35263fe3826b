//! Form renderer shared by the publish, profile, login and register views.
//!
//! ```text
//!   ▸ Nombre          Luna█
//!     Tipo            ◂ Perro ▸
//!
//!     Vista previa: luna.jpg (image/jpeg, 120 KB)
//!
//!     [ Publicar ]
//! ```

use crate::ui::helpers::{display_len, position_cursor, print_cell, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{FormBody, FormFieldView};

const LABEL_WIDTH: usize = 22;
const INDENT: usize = 2;

/// Renders fields, extra lines and the submit control from `row`, stopping
/// before `last_row`. Returns the next free row.
pub fn render_form(row: usize, form: &FormBody, theme: &Theme, cols: usize, last_row: usize) -> usize {
    let mut current_row = row + 1;

    for field in &form.fields {
        if current_row >= last_row {
            return current_row;
        }
        render_field(current_row, field, theme, cols);
        current_row += 1;
    }

    if !form.extra_lines.is_empty() {
        current_row += 1;
    }
    for line in &form.extra_lines {
        if current_row >= last_row {
            return current_row;
        }
        position_cursor(current_row, 1);
        print!("{}", " ".repeat(INDENT + 2));
        print!("{}", Theme::fg(&theme.colors.text_dim));
        print_cell(line, cols.saturating_sub(INDENT + 2));
        print!("{}", Theme::reset());
        current_row += 1;
    }

    current_row += 1;
    if current_row < last_row {
        render_submit(current_row, form, theme);
        current_row += 1;
    }
    current_row
}

fn render_field(row: usize, field: &FormFieldView, theme: &Theme, cols: usize) {
    position_cursor(row, 1);
    print!("{}", " ".repeat(INDENT));

    if field.is_focused {
        print!("{}", Theme::bold());
        print!("{}", Theme::fg(&theme.colors.field_focus_fg));
        print!("▸ ");
    } else {
        print!("{}", Theme::fg(&theme.colors.text_dim));
        print!("  ");
    }
    print_cell(&field.label, LABEL_WIDTH);
    print!("{}", Theme::reset());

    let value_width = cols.saturating_sub(INDENT + 2 + LABEL_WIDTH + 1);
    let value = if field.is_choice {
        format!("◂ {} ▸", field.value)
    } else if field.is_focused {
        format!("{}█", field.value)
    } else {
        field.value.clone()
    };

    print!("{}", Theme::fg(&theme.colors.text_normal));
    if !field.is_choice && display_len(&value) > value_width {
        // Keep the end of long inputs visible, where the cursor is.
        let skip = display_len(&value) - value_width;
        print!("{}", value.chars().skip(skip).collect::<String>());
    } else {
        print_cell(&truncate(&value, value_width), value_width);
    }
    print!("{}", Theme::reset());
}

fn render_submit(row: usize, form: &FormBody, theme: &Theme) {
    position_cursor(row, 1);
    print!("{}", " ".repeat(INDENT + 2));
    if form.is_busy {
        print!("{}", Theme::dim());
        print!("{}", Theme::fg(&theme.colors.text_dim));
    } else {
        print!("{}", Theme::bold());
        print!("{}", Theme::fg(&theme.colors.tab_active_fg));
        print!("{}", Theme::bg(&theme.colors.tab_active_bg));
    }
    print!("[ {} ]", form.submit_label);
    print!("{}", Theme::reset());
}
