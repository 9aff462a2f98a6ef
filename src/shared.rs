// Types shared between the terminal front-end and the middle layer.
//
// Keys:
//   Space         //  TogglePause
//   c             //  Cancel the running session
//   r             //  Restart with the same settings
//   ?             //  toggle the key help
//   Esc / q       //  Quit
//
// The TUI never touches the player. Each frame it asks the middle layer for a
// `DisplayState` and draws that.

use crate::loader::{LoadProgress, LoadStatus};
use crate::sequencing::{PlayerState, SessionView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    TogglePause,
    Cancel,
    Restart,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRow {
    pub instrument: String,
    pub status: LoadStatus,
    pub progress: Option<LoadProgress>,
}

#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    pub title: String,
    pub state: PlayerState,
    pub view: SessionView,
    pub loads: Vec<LoadRow>,
    pub message: Option<String>, // last error or notice
}
