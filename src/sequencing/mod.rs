pub mod clock;
pub mod plan;
pub mod player;
pub mod spec;
pub mod training;
pub mod vocal;

#[cfg(test)]
pub(crate) mod test_fixture;

pub use clock::SystemClock;
pub use player::{Player, PlayerState, Session, SessionView};
pub use spec::{PlaybackSpec, ToneKind, VocalPatternSpec, VOCAL_PRESETS};
