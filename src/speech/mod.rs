mod announce;
mod speaker;

pub use announce::{numeral, render, solfege, speaking_rate};
pub use speaker::{CommandSpeaker, SilentSpeaker, Speaker};
