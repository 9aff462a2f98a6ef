use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TheoryError;

pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// A concrete pitch as a MIDI note number (C4 = 60). Names are always written
// with sharps; flats are accepted when parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch(pub u8);

impl Pitch {
    pub fn midi(self) -> u8 {
        self.0
    }

    // 0 = C ... 11 = B
    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    pub fn class_name(self) -> &'static str {
        PITCH_CLASSES[self.pitch_class() as usize]
    }

    pub fn frequency(self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }

    // Shift by a number of semitones, failing if the result leaves 0..=127.
    pub fn transpose(self, semitones: i32) -> Result<Pitch, TheoryError> {
        let shifted = self.0 as i32 + semitones;
        u8::try_from(shifted)
            .ok()
            .filter(|m| *m <= 127)
            .map(Pitch)
            .ok_or_else(|| TheoryError::OutOfRange {
                root: self.to_string(),
                offset: semitones,
            })
    }

    // Parse the leading pitch class of a name ("F#" from "F#5", "Bb" from
    // "Bbm7"). Returns the class (0..12) and the number of bytes consumed.
    pub fn parse_class(s: &str) -> Option<(u8, usize)> {
        let mut chars = s.chars();
        let base: i32 = match chars.next()? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        match chars.next() {
            Some('#') => Some((((base + 1) % 12) as u8, 2)),
            Some('b') => Some((((base + 11) % 12) as u8, 2)),
            _ => Some((base as u8, 1)),
        }
    }
}

impl FromStr for Pitch {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TheoryError::InvalidPitch(s.to_string());
        let trimmed = s.trim();
        let (class, used) = Pitch::parse_class(trimmed).ok_or_else(invalid)?;
        let octave: i32 = trimmed[used..].parse().map_err(|_| invalid())?;
        // Cb/B# roll over into the neighbouring octave
        let letter_fix = match &trimmed[..used] {
            "Cb" => 12,
            "B#" => -12,
            _ => 0,
        };
        let midi = (octave + 1) * 12 + class as i32 - letter_fix;
        u8::try_from(midi)
            .ok()
            .filter(|m| *m <= 127)
            .map(Pitch)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class_name(), self.octave())
    }
}

impl TryFrom<String> for Pitch {
    type Error = TheoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(p: Pitch) -> Self {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_naturals_sharps_and_flats() {
        assert_eq!("C4".parse::<Pitch>().unwrap(), Pitch(60));
        assert_eq!("A4".parse::<Pitch>().unwrap(), Pitch(69));
        assert_eq!("F#3".parse::<Pitch>().unwrap(), Pitch(54));
        assert_eq!("Bb3".parse::<Pitch>().unwrap(), Pitch(58));
        assert_eq!("C-1".parse::<Pitch>().unwrap(), Pitch(0));
        assert_eq!("Cb4".parse::<Pitch>().unwrap(), Pitch(59));
        assert_eq!("B#3".parse::<Pitch>().unwrap(), Pitch(60));
    }

    #[test]
    fn rejects_garbage() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("Do".parse::<Pitch>().is_err());
        assert!("G9".parse::<Pitch>().is_ok());
        assert!("A9".parse::<Pitch>().is_err());
    }

    #[test]
    fn displays_with_sharps() {
        assert_eq!(Pitch(61).to_string(), "C#4");
        assert_eq!("Db4".parse::<Pitch>().unwrap().to_string(), "C#4");
        assert_eq!(Pitch(47).to_string(), "B2");
    }

    #[test]
    fn transpose_checks_range() {
        assert_eq!(Pitch(60).transpose(7).unwrap(), Pitch(67));
        assert_eq!(Pitch(60).transpose(-12).unwrap(), Pitch(48));
        assert!(Pitch(125).transpose(5).is_err());
        assert!(Pitch(2).transpose(-3).is_err());
    }

    #[test]
    fn a4_is_440() {
        assert!((Pitch(69).frequency() - 440.0).abs() < 1e-3);
        assert!((Pitch(81).frequency() - 880.0).abs() < 1e-2);
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&Pitch(54)).unwrap();
        assert_eq!(json, "\"F#3\"");
        let back: Pitch = serde_json::from_str("\"Gb3\"").unwrap();
        assert_eq!(back, Pitch(54));
    }
}
