// Which pitches each instrument was sampled at. Only these pitches are fetched;
// everything in between is pitch-shifted from the nearest sample at playback.

use std::collections::BTreeMap;

use crate::theory::Pitch;

pub const SAMPLE_EXT: &str = "wav";

const BUILTIN: &[(&str, &[&str])] = &[
    ("bass-electric", &[
        "C#1", "E1", "G1", "A#1", "C#2", "E2", "G2", "A#2", "C#3", "E3", "G3", "A#3",
        "C#4", "E4", "G4", "A#4",
    ]),
    ("bassoon", &[
        "G2", "A2", "C3", "G3", "A3", "C4", "E4", "G4", "A4", "C5",
    ]),
    ("cello", &[
        "C2", "D2", "D#2", "E2", "F2", "G2", "G#2", "A2", "A#2", "B2", "C3", "C#3",
        "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3", "C4", "C#4",
        "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "B4", "C5",
    ]),
    ("clarinet", &[
        "D3", "F3", "A#3", "D4", "F4", "A#4", "D5", "F5", "A#5", "D6", "F#6",
    ]),
    ("contrabass", &[
        "F#1", "G1", "A#1", "C2", "D2", "E2", "F#2", "G#2", "A2", "C#3", "E3", "G#3",
        "B3",
    ]),
    ("flute", &[
        "C4", "E4", "A4", "C5", "E5", "A5", "C6", "E6", "A6", "C7",
    ]),
    ("french-horn", &[
        "A1", "C2", "D#2", "G2", "D3", "F3", "A3", "C4", "D5", "F5",
    ]),
    ("guitar-acoustic", &[
        "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2", "C3", "C#3",
        "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3", "C4", "C#4",
        "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", "C5", "C#5",
        "D5",
    ]),
    ("guitar-electric", &[
        "C#2", "E2", "F#2", "A2", "C3", "D#3", "F#3", "A3", "C4", "D#4", "F#4", "A4",
        "C5", "D#5", "F#5", "A5", "C6",
    ]),
    ("guitar-nylon", &[
        "B1", "D2", "E2", "F#2", "G#2", "A2", "B2", "C#3", "D3", "E3", "F#3", "G3",
        "A3", "B3", "C#4", "D#4", "E4", "F#4", "G#4", "A4", "B4", "C#5", "D5", "E5",
        "F#5", "G5", "G#5", "A5", "A#5",
    ]),
    ("harmonium", &[
        "C2", "C#2", "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "C3",
        "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "C4", "C#4",
        "D4", "D#4", "E4", "F4", "G4", "G#4", "A4", "A#4", "C5", "C#5", "D5",
    ]),
    ("harp", &[
        "E1", "G1", "B1", "D2", "F2", "A2", "C3", "E3", "G3", "B3", "D4", "F4", "A4",
        "C5", "E5", "G5", "B5", "D6", "F6", "A6", "B6", "D7", "F7",
    ]),
    ("organ", &[
        "C1", "D#1", "F#1", "A1", "C2", "D#2", "F#2", "A2", "C3", "D#3", "F#3", "A3",
        "C4", "D#4", "F#4", "A4", "C5", "D#5", "F#5", "A5", "C6",
    ]),
    ("piano", &[
        "C1", "C#1", "D1", "D#1", "E1", "F1", "F#1", "G1", "G#1", "A1", "A#1", "B1",
        "C2", "C#2", "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2",
        "C3", "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3",
        "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4",
        "C5", "C#5", "D5", "D#5", "E5", "F5", "F#5", "G5", "G#5", "A5", "A#5", "B5",
        "C6", "C#6", "D6", "D#6", "E6", "F6", "F#6", "G6", "G#6", "A6", "A#6", "B6",
        "C7", "C#7", "D7", "D#7", "E7", "F7", "F#7", "G7", "G#7", "A7", "A#7", "B7",
    ]),
    ("saxophone", &[
        "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A#3", "B3", "C4", "C#4",
        "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", "C5", "C#5",
        "D5", "D#5", "E5", "F5", "F#5", "G5", "G#5", "A5",
    ]),
    ("trombone", &[
        "A#1", "C#2", "D#2", "F2", "G#2", "A#2", "C3", "D3", "D#3", "F3", "G#3", "A#3",
        "C4", "C#4", "D4", "D#4", "F4",
    ]),
    ("trumpet", &[
        "F3", "A3", "C4", "D#4", "F4", "G4", "A#4", "D5", "F5", "A5", "C6",
    ]),
    ("tuba", &[
        "F1", "A#1", "D#2", "F2", "A#2", "D3", "F3", "A#3", "D4",
    ]),
    ("violin", &[
        "A3", "C4", "E4", "G4", "A4", "C5", "E5", "G5", "A5", "C6", "E6", "G6", "A6",
        "C7",
    ]),
    ("xylophone", &[
        "G4", "C5", "G5", "C6", "G6", "C7", "G7", "C8",
    ]),
];

// "A#4" -> "As4.wav"; '#' can't appear in an asset path.
pub fn sample_file_name(pitch: Pitch) -> String {
    format!("{}.{}", pitch.to_string().replace('#', "s"), SAMPLE_EXT)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentDescriptor {
    pub name: String,
    pub samples: BTreeMap<Pitch, String>, // pitch -> asset file name
}

impl InstrumentDescriptor {
    pub fn new(name: &str, pitches: impl IntoIterator<Item = Pitch>) -> Self {
        Self {
            name: name.to_string(),
            samples: pitches
                .into_iter()
                .map(|p| (p, sample_file_name(p)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SampleCatalog {
    instruments: Vec<InstrumentDescriptor>,
}

impl SampleCatalog {
    pub fn new(instruments: Vec<InstrumentDescriptor>) -> Self {
        Self { instruments }
    }

    pub fn builtin() -> Self {
        let instruments = BUILTIN
            .iter()
            .map(|(name, pitches)| {
                // the table is hand-written; a typo drops the entry rather than the instrument
                InstrumentDescriptor::new(name, pitches.iter().filter_map(|p| p.parse().ok()))
            })
            .collect();
        Self { instruments }
    }

    pub fn get(&self, name: &str) -> Option<&InstrumentDescriptor> {
        self.instruments.iter().find(|i| i.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(|i| i.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_pitch_parses() {
        let catalog = SampleCatalog::builtin();
        for (name, pitches) in BUILTIN {
            assert_eq!(catalog.get(name).unwrap().len(), pitches.len(), "{name}");
        }
        assert_eq!(catalog.get("piano").unwrap().len(), 84);
    }

    #[test]
    fn file_names_escape_sharps() {
        assert_eq!(sample_file_name("A#1".parse().unwrap()), "As1.wav");
        assert_eq!(sample_file_name("C4".parse().unwrap()), "C4.wav");
        let cello = SampleCatalog::builtin();
        let cello = cello.get("cello").unwrap();
        assert_eq!(cello.samples[&"F#3".parse::<Pitch>().unwrap()], "Fs3.wav");
    }

    #[test]
    fn unknown_names_are_absent() {
        let catalog = SampleCatalog::builtin();
        assert!(catalog.get("kazoo").is_none());
        assert!(catalog.names().any(|n| n == "guitar-acoustic"));
    }
}
