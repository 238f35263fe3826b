//! Top-level rendering coordinator.
//!
//! Rendering is two steps: compute the [`UIViewModel`] from `AppState`, then
//! hand it to the component layout. Nothing here reads workflow state.

use crate::app::AppState;
use crate::ui::components;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;

/// Renders the plugin UI to stdout.
pub fn render(state: &AppState, rows: usize, cols: usize) {
    let _span = tracing::trace_span!("render", rows, cols, view = ?state.view).entered();
    let viewmodel = state.compute_viewmodel(rows, cols);

    render_viewmodel(&viewmodel, &state.theme, rows, cols);
}

/// Renders an already computed view model.
pub fn render_viewmodel(vm: &UIViewModel, theme: &Theme, rows: usize, cols: usize) {
    components::render_layout(vm, theme, cols, rows);
}
