mod chords;
mod pitch;
pub mod patterns;

pub use chords::chord_pitches;
pub use pitch::Pitch;
