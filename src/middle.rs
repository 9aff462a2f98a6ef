// Sits between the terminal and the player: turns key events into player
// transitions, drains loader status events, and keeps the DisplayState the
// TUI draws from.

use crossbeam_channel::Receiver;
use tracing::{error, info};

use crate::loader::status::Subscription;
use crate::loader::{LoadStatus, StatusBoard, StatusEvent};
use crate::sequencing::{Player, Session};
use crate::shared::{DisplayState, InputEvent, LoadRow};

pub struct Middle {
    player: Player,
    session: Session,
    status_rx: Receiver<StatusEvent>,
    _status_sub: Subscription,
    display: DisplayState,
}

impl Middle {
    pub fn new(player: Player, board: &StatusBoard, session: Session, title: String) -> Self {
        let (sub, status_rx) = board.subscribe_channel();
        let loads = board
            .snapshot()
            .into_iter()
            .map(|(instrument, status, progress)| LoadRow {
                instrument,
                status,
                progress,
            })
            .collect();
        Self {
            player,
            session,
            status_rx,
            _status_sub: sub,
            display: DisplayState {
                title,
                loads,
                ..DisplayState::default()
            },
        }
    }

    pub fn start(&mut self) {
        match self.player.start(self.session.clone()) {
            Ok(()) => self.display.message = None,
            Err(e) => {
                error!(error = %e, "could not start session");
                self.display.message = Some(e.to_string());
            }
        }
        self.sync();
    }

    // Returns false once the app should exit.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::TogglePause => self.player.toggle_pause(),
            InputEvent::Cancel => self.player.cancel(),
            InputEvent::Restart => {
                info!("restarting session");
                self.start();
            }
            InputEvent::Quit => {
                self.player.cancel();
                return false;
            }
        }
        self.sync();
        true
    }

    pub fn tick(&mut self) {
        self.player.tick();
        while let Ok(event) = self.status_rx.try_recv() {
            self.apply_status(event);
        }
        self.sync();
    }

    fn apply_status(&mut self, event: StatusEvent) {
        if event.status == LoadStatus::Error {
            self.display.message = Some(format!("could not load {}", event.instrument));
        }
        let rows = &mut self.display.loads;
        let row = match rows.iter().position(|r| r.instrument == event.instrument) {
            Some(i) => &mut rows[i],
            None => {
                rows.push(LoadRow {
                    instrument: event.instrument.clone(),
                    status: event.status,
                    progress: None,
                });
                rows.sort_by(|a, b| a.instrument.cmp(&b.instrument));
                let i = rows
                    .iter()
                    .position(|r| r.instrument == event.instrument)
                    .unwrap_or(0);
                &mut rows[i]
            }
        };
        row.status = event.status;
        if event.progress.is_some() {
            row.progress = event.progress;
        }
    }

    fn sync(&mut self) {
        self.display.state = self.player.state();
        self.display.view = self.player.view().clone();
    }

    #[cfg(test)]
    pub fn state(&self) -> crate::sequencing::PlayerState {
        self.player.state()
    }

    pub fn display_state(&self) -> &DisplayState {
        &self.display
    }
}
