// State local to the tui; nothing here reaches the player
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub show_help: bool,
}
