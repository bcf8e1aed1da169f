use crate::agent_engine::state::ZoomState;
use crate::perception::types::GridAddress;

const SYSTEM_DIRECTIVE_TEMPLATE: &str = include_str!("../../prompts/system_directive.md");

/// System directive with the grid dimensions filled in.
pub fn system_directive(grid_size: u32) -> String {
    SYSTEM_DIRECTIVE_TEMPLATE
        .replace("{grid_size}", &grid_size.to_string())
        .replace("{cell_count}", &(grid_size * grid_size).to_string())
}

/// Per-turn instruction: the user's goal plus where the view currently is.
pub fn observation_instruction(goal: &str, zoom: &ZoomState, last_cell: Option<GridAddress>) -> String {
    let view = match (zoom, last_cell) {
        (ZoomState::Full, _) => "View: whole screen.".to_string(),
        (ZoomState::Narrowed { depth }, Some(cell)) => {
            format!("View: zoomed into cell {cell} (zoom depth {depth}).")
        }
        (ZoomState::Narrowed { depth }, None) => format!("View: zoom depth {depth}."),
    };
    format!("{goal}\n\n{view}")
}
