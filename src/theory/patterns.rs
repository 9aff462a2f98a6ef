// Pattern generators for the vocal exercises: walk a root across a range and
// expand a fixed interval shape on top of each root.

use super::pitch::Pitch;
use crate::error::TheoryError;

pub const MA_PATTERN: [i8; 5] = [7, 5, 4, 2, 0]; // sol fa mi re do
pub const RESONANCE_PATTERN: [i8; 9] = [0, 2, 4, 5, 7, 5, 4, 2, 0];
pub const RANGE_EXTENSION_PATTERN: [i8; 7] = [0, 4, 7, 12, 7, 4, 0];

// Concrete pitches for one step: each offset added to the root.
pub fn expand(root: Pitch, offsets: &[i8]) -> Result<Vec<Pitch>, TheoryError> {
    offsets
        .iter()
        .map(|offset| root.transpose(*offset as i32))
        .collect()
}

// Every root from `start` to `end` inclusive, one semitone at a time, in
// whichever direction reaches `end`.
pub fn root_walk(start: Pitch, end: Pitch) -> Vec<Pitch> {
    if end >= start {
        (start.0..=end.0).map(Pitch).collect()
    } else {
        (end.0..=start.0).rev().map(Pitch).collect()
    }
}
