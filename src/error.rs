// Error types for the playback core. The binary edge (main, config, cpal setup)
// stays on anyhow; everything a caller is expected to match on lives here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    #[error("invalid pitch name: {0:?}")]
    InvalidPitch(String),

    #[error("pitch {root} shifted by {offset} semitones leaves the MIDI range")]
    OutOfRange { root: String, offset: i32 },
}

// Why an instrument could not be loaded. Clonable so every coalesced caller
// waiting on the same load receives the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("no such instrument: {0}")]
    UnknownInstrument(String),

    #[error("failed to load sample {pitch} for {instrument}: {reason}")]
    SampleFetch {
        instrument: String,
        pitch: String,
        reason: String,
    },

    // loader thread went away without reporting (panicked)
    #[error("loading {0} was aborted")]
    Aborted(String),
}

// Session validation failures, reported before any cue is armed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("nothing to play: the target set is empty")]
    EmptyTargetSet,

    #[error("cannot play {symbol:?}: {source}")]
    InvalidSymbol {
        symbol: String,
        #[source]
        source: TheoryError,
    },

    #[error("invalid exercise: {0}")]
    InvalidRange(#[from] TheoryError),
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech synthesis is unavailable")]
    Unavailable,

    #[error("speech synthesis failed: {0}")]
    Failed(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_instrument_and_pitch() {
        let err = LoadError::SampleFetch {
            instrument: "piano".to_string(),
            pitch: "A#4".to_string(),
            reason: "missing file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load sample A#4 for piano: missing file"
        );
        assert_eq!(
            LoadError::UnknownInstrument("kazoo".into()).to_string(),
            "no such instrument: kazoo"
        );
    }

    #[test]
    fn invalid_symbol_keeps_its_source() {
        use std::error::Error as _;
        let err = SessionError::InvalidSymbol {
            symbol: "H2".into(),
            source: TheoryError::InvalidPitch("H2".into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("H2"));
    }
}
