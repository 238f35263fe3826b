//! Header: view title with the account marker, then the navigation tabs.

use crate::ui::helpers::{display_len, position_cursor, print_cell, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{HeaderInfo, NavTab};

/// Renders the two header lines starting at `row` and returns the next row.
///
/// ```text
///  Mascotas Perdidas                         ana@example.org
///  [h] Inicio  [p] Publicar  [u] Perfil  [l] Entrar  [r] Registro
/// ```
pub fn render_header(row: usize, header: &HeaderInfo, theme: &Theme, cols: usize) -> usize {
    let account = truncate(&header.account, cols / 2);
    let account_len = display_len(&account);
    let title_width = cols.saturating_sub(account_len + 2);

    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        print!("{}", Theme::bg(bg));
    }
    print!(" ");
    print_cell(&header.title, title_width);
    print!("{}", Theme::reset());
    print!("{}", Theme::fg(&theme.colors.account_fg));
    print!("{account} ");
    print!("{}", Theme::reset());

    render_tabs(row + 1, &header.tabs, theme, cols)
}

fn render_tabs(row: usize, tabs: &[NavTab], theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    let mut used = 1;
    print!(" ");

    for tab in tabs {
        let label = format!(" [{}] {} ", tab.shortcut, tab.label);
        let len = display_len(&label);
        if used + len > cols {
            break;
        }

        if tab.is_active {
            print!("{}", Theme::bold());
            print!("{}", Theme::fg(&theme.colors.tab_active_fg));
            print!("{}", Theme::bg(&theme.colors.tab_active_bg));
        } else {
            print!("{}", Theme::fg(&theme.colors.text_dim));
        }
        print!("{label}");
        print!("{}", Theme::reset());
        print!(" ");
        used += len + 1;
    }

    print!("{}", " ".repeat(cols.saturating_sub(used)));
    row + 1
}
