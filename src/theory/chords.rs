// Chord symbol resolution
//
// Turns a chord name (C, Am, G7, F#m7, Dsus4, C/G ...) into the pitches that
// are struck together. Chords are voiced from the C3 octave upward, with a
// slash bass placed in the octave below.

use super::pitch::Pitch;

const CHORD_ROOT_MIDI: u8 = 48; // C3

// Semitone stack for a chord quality, or `None` if the quality is unknown.
fn quality_intervals(quality: &str) -> Option<&'static [u8]> {
    let intervals: &'static [u8] = match quality {
        "" | "maj" | "M" => &[0, 4, 7],
        "m" | "min" | "-" => &[0, 3, 7],
        "5" => &[0, 7],
        "6" => &[0, 4, 7, 9],
        "m6" => &[0, 3, 7, 9],
        "7" => &[0, 4, 7, 10],
        "maj7" | "M7" => &[0, 4, 7, 11],
        "m7" | "min7" | "-7" => &[0, 3, 7, 10],
        "mmaj7" | "mM7" => &[0, 3, 7, 11],
        "m7b5" => &[0, 3, 6, 10],
        "dim" => &[0, 3, 6],
        "dim7" => &[0, 3, 6, 9],
        "aug" | "+" => &[0, 4, 8],
        "sus2" => &[0, 2, 7],
        "sus4" | "sus" => &[0, 5, 7],
        "7sus4" => &[0, 5, 7, 10],
        "add9" => &[0, 4, 7, 14],
        "9" => &[0, 4, 7, 10, 14],
        "maj9" | "M9" => &[0, 4, 7, 11, 14],
        "m9" | "min9" => &[0, 3, 7, 10, 14],
        _ => return None,
    };
    Some(intervals)
}

// Resolve a chord symbol into its pitches, lowest first.
//
// Returns `None` for anything that is not a recognizable chord, so callers can
// fall back to treating the symbol as a single note.
//
// "C"    -> [C3, E3, G3]
// "Am7"  -> [A3, C4, E4, G4]
// "C/G"  -> [G2, C3, E3, G3]
pub fn chord_pitches(symbol: &str) -> Option<Vec<Pitch>> {
    let (upper, bass) = match symbol.split_once('/') {
        Some((upper, bass)) => (upper, Some(bass)),
        None => (symbol, None),
    };

    let (class, used) = Pitch::parse_class(upper)?;
    let intervals = quality_intervals(&upper[used..])?;
    let root = CHORD_ROOT_MIDI + class;
    let mut pitches: Vec<Pitch> = intervals.iter().map(|i| Pitch(root + i)).collect();

    if let Some(bass) = bass {
        let (bass_class, bass_used) = Pitch::parse_class(bass)?;
        if bass_used != bass.len() {
            return None;
        }
        // one octave under the chord root's octave
        pitches.insert(0, Pitch(CHORD_ROOT_MIDI - 12 + bass_class));
    }
    Some(pitches)
}
