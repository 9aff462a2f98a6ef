// Session configuration. Read-only once a session starts; a new session
// takes a fresh copy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::theory::patterns::{MA_PATTERN, RANGE_EXTENSION_PATTERN, RESONANCE_PATTERN};
use crate::theory::Pitch;

// fixed allowance per utterance; real speech length is not measurable up front
pub const SPEECH_ALLOWANCE: Duration = Duration::from_secs(1);
pub const MIN_STEP_PERIOD: Duration = Duration::from_millis(500);

// Durations are stored as whole milliseconds in config files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneKind {
    #[default]
    Notes,
    Chords,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceNote {
    pub enabled: bool,
    pub symbol: String,
}

impl Default for ReferenceNote {
    fn default() -> Self {
        Self {
            enabled: false,
            symbol: "C4".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechOptions {
    pub enabled: bool,
    pub slowness: f32, // 1 = normal, 2 = half speed
    pub solfege: bool,
    pub numeral: bool,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            slowness: 1.0,
            solfege: false,
            numeral: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSpec {
    pub symbols: Vec<String>,
    pub tone_kind: ToneKind,
    #[serde(with = "millis")]
    pub tone_duration: Duration,
    #[serde(with = "millis")]
    pub tone_wait: Duration,
    #[serde(with = "millis")]
    pub answer_wait: Duration,
    #[serde(with = "millis")]
    pub solfege_wait: Duration,
    #[serde(with = "millis")]
    pub numeral_wait: Duration,
    pub loop_count: u32, // 0 = forever
    pub random: bool,
    pub reference: ReferenceNote,
    pub speech: SpeechOptions,
    pub instrument: String,
}

impl Default for PlaybackSpec {
    fn default() -> Self {
        // C major across octaves 3..5
        let symbols = (3..=5)
            .flat_map(|oct| ["C", "D", "E", "F", "G", "A", "B"].map(|n| format!("{n}{oct}")))
            .collect();
        Self {
            symbols,
            tone_kind: ToneKind::Notes,
            tone_duration: Duration::from_millis(1000),
            tone_wait: Duration::from_millis(1500),
            answer_wait: Duration::from_millis(2000),
            solfege_wait: Duration::from_millis(500),
            numeral_wait: Duration::from_millis(500),
            loop_count: 0,
            random: true,
            reference: ReferenceNote::default(),
            speech: SpeechOptions::default(),
            instrument: "guitar-acoustic".into(),
        }
    }
}

impl PlaybackSpec {
    // Width of every step slot: the sum of the enabled phases plus a fixed
    // allowance per utterance.
    pub fn step_period(&self) -> Duration {
        let mut period = self.tone_duration + self.tone_wait + self.answer_wait;
        if self.reference.enabled {
            period += self.tone_duration + self.tone_wait;
        }
        if self.speech.enabled {
            period += SPEECH_ALLOWANCE;
            let notes = self.tone_kind == ToneKind::Notes;
            if notes && self.speech.solfege {
                period += self.solfege_wait + SPEECH_ALLOWANCE;
            }
            if notes && self.speech.numeral {
                period += self.numeral_wait + SPEECH_ALLOWANCE;
            }
        }
        period.max(MIN_STEP_PERIOD)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocalPatternSpec {
    pub name: String,
    pub start: Pitch,
    pub end: Pitch,
    pub offsets: Vec<i8>,
    #[serde(with = "millis")]
    pub root_hold: Duration,
    #[serde(with = "millis")]
    pub first_note: Duration,
    #[serde(with = "millis")]
    pub interior_note: Duration,
    #[serde(with = "millis")]
    pub last_note: Duration,
    #[serde(with = "millis")]
    pub post_phrase_wait: Duration,
    pub loop_count: u32, // 0 = forever
    #[serde(with = "millis")]
    pub countdown: Duration,
    pub tips: Vec<String>,
    pub instrument: String,
}

pub const VOCAL_PRESETS: [&str; 3] = ["ma", "resonance", "range-extension"];

impl VocalPatternSpec {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "ma" => Some(Self::ma()),
            "resonance" => Some(Self::resonance()),
            "range-extension" => Some(Self::range_extension()),
            _ => None,
        }
    }

    fn base(name: &str, start: u8, end: u8, offsets: &[i8], tips: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            start: Pitch(start),
            end: Pitch(end),
            offsets: offsets.to_vec(),
            root_hold: Duration::from_millis(1500),
            first_note: Duration::from_millis(1500),
            interior_note: Duration::from_millis(500),
            last_note: Duration::from_millis(1500),
            post_phrase_wait: Duration::from_millis(1000),
            loop_count: 2,
            countdown: Duration::from_millis(3000),
            tips: tips.iter().map(|t| t.to_string()).collect(),
            instrument: "piano".into(),
        }
    }

    // B2..B3, descending five-note "ma"
    pub fn ma() -> Self {
        Self::base(
            "ma",
            47,
            59,
            &MA_PATTERN,
            &[
                "Open the mouth wide on \"ma\" and keep the jaw loose.",
                "Start each phrase from a relaxed breath, not a push.",
                "Keep the top note light; let the line fall to the root.",
                "Match the root before you start the pattern.",
            ],
        )
    }

    // C3..C4, up and down the first five degrees
    pub fn resonance() -> Self {
        Self {
            first_note: Duration::from_millis(1000),
            ..Self::base(
                "resonance",
                48,
                60,
                &RESONANCE_PATTERN,
                &[
                    "Hum first and feel the buzz behind the lips.",
                    "Keep the sound forward as the line rises.",
                    "Stay connected between notes; no gaps.",
                ],
            )
        }
    }

    // D3..A#3, arpeggio to the octave
    pub fn range_extension() -> Self {
        Self {
            first_note: Duration::from_millis(500),
            last_note: Duration::from_millis(500),
            ..Self::base(
                "range-extension",
                50,
                58,
                &RANGE_EXTENSION_PATTERN,
                &[
                    "Don't reach for the octave; let it float.",
                    "Stop if anything strains and rest a phrase.",
                ],
            )
        }
    }
}
