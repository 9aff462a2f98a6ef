use std::time::Duration;

use crate::theory::Pitch;

// One timed action inside a step.
#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    Trigger { pitches: Vec<Pitch>, duration: Duration },
    // raw symbol or syllable; the player renders it for speech
    Speak(String),
    // answer text, hidden until Reveal
    SetLabel(String),
    Reveal,
    AppendLabel(String),
    SetPhrase {
        cycle: u32,
        step: usize,
        steps: usize,
        notes: Vec<String>,
        tip: Option<String>,
    },
    // -1 while the root sounds
    ActiveNote(i32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedCue {
    pub at: Duration, // offset from step start
    pub cue: Cue,
}

// A step laid out ahead of time: cues in offset order, plus the slot width.
// The next step starts exactly `period` after this one.
#[derive(Clone, Debug, PartialEq)]
pub struct StepPlan {
    pub cues: Vec<TimedCue>,
    pub period: Duration,
}

impl StepPlan {
    pub fn new(period: Duration) -> Self {
        Self {
            cues: Vec::new(),
            period,
        }
    }

    pub fn at(&mut self, at: Duration, cue: Cue) -> &mut Self {
        self.cues.push(TimedCue { at, cue });
        self
    }

    pub fn triggers(&self) -> impl Iterator<Item = (Duration, &[Pitch])> {
        self.cues.iter().filter_map(|c| match &c.cue {
            Cue::Trigger { pitches, .. } => Some((c.at, pitches.as_slice())),
            _ => None,
        })
    }
}

/// Anything that yields steps one at a time. `None` ends the session.
pub trait StepSource {
    fn next_step(&mut self) -> Option<StepPlan>;
}
