// Vocal warm-ups: hold a root, sing a fixed shape on top of it, move the
// root one semitone, repeat across the range.

use std::time::Duration;

use crate::error::SessionError;
use crate::theory::patterns::{expand, root_walk};
use crate::theory::Pitch;

use super::plan::{Cue, StepPlan, StepSource};
use super::spec::{VocalPatternSpec, MIN_STEP_PERIOD};

pub struct VocalProgram {
    spec: VocalPatternSpec,
    phrases: Vec<(Pitch, Vec<Pitch>)>, // root, pattern notes
    index: usize,
    cycles_completed: u32,
    steps_started: usize,
    rng: fastrand::Rng,
}

impl VocalProgram {
    // Expands every phrase in the walk up front; a pattern that leaves the
    // pitch range is rejected here rather than mid-session.
    pub fn new(spec: VocalPatternSpec, rng: fastrand::Rng) -> Result<Self, SessionError> {
        if spec.offsets.is_empty() {
            return Err(SessionError::EmptyTargetSet);
        }
        let phrases = root_walk(spec.start, spec.end)
            .into_iter()
            .map(|root| Ok((root, expand(root, &spec.offsets)?)))
            .collect::<Result<Vec<_>, SessionError>>()?;
        Ok(Self {
            spec,
            phrases,
            index: 0,
            cycles_completed: 0,
            steps_started: 0,
            rng,
        })
    }

    #[cfg(test)]
    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    fn note_duration(&self, i: usize, len: usize) -> Duration {
        if i == 0 {
            self.spec.first_note
        } else if i + 1 == len {
            self.spec.last_note
        } else {
            self.spec.interior_note
        }
    }

    fn pick_tip(&mut self) -> Option<String> {
        let tips = &self.spec.tips;
        if tips.is_empty() {
            return None;
        }
        // tips[0] opens the session; later phrases draw from the rest
        let i = if self.steps_started == 0 || tips.len() == 1 {
            0
        } else {
            1 + self.rng.usize(..tips.len() - 1)
        };
        Some(tips[i].clone())
    }
}

impl StepSource for VocalProgram {
    fn next_step(&mut self) -> Option<StepPlan> {
        if self.index == self.phrases.len() {
            self.index = 0;
            self.cycles_completed += 1;
        }
        if self.spec.loop_count > 0 && self.cycles_completed >= self.spec.loop_count {
            return None;
        }

        let tip = self.pick_tip();
        let (root, notes) = self.phrases[self.index].clone();
        let mut plan = StepPlan::new(Duration::ZERO);
        let mut t = Duration::ZERO;

        plan.at(t, Cue::SetPhrase {
            cycle: self.cycles_completed + 1,
            step: self.index + 1,
            steps: self.phrases.len(),
            notes: notes.iter().map(|p| p.to_string()).collect(),
            tip,
        });
        plan.at(t, Cue::ActiveNote(-1));
        plan.at(t, Cue::Trigger {
            pitches: vec![root],
            duration: self.spec.root_hold,
        });
        t += self.spec.root_hold;

        for (i, note) in notes.iter().enumerate() {
            let duration = self.note_duration(i, notes.len());
            plan.at(t, Cue::ActiveNote(i as i32));
            plan.at(t, Cue::Trigger {
                pitches: vec![*note],
                duration,
            });
            t += duration;
        }

        plan.period = (t + self.spec.post_phrase_wait).max(MIN_STEP_PERIOD);
        self.index += 1;
        self.steps_started += 1;
        Some(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn program(spec: VocalPatternSpec) -> VocalProgram {
        VocalProgram::new(spec, fastrand::Rng::with_seed(3)).unwrap()
    }

    fn small() -> VocalPatternSpec {
        VocalPatternSpec {
            start: "C4".parse().unwrap(),
            end: "D4".parse().unwrap(),
            ..VocalPatternSpec::ma()
        }
    }

    #[test]
    fn phrase_is_root_then_pattern() {
        let mut p = program(small());
        let plan = p.next_step().unwrap();
        let played: Vec<(Duration, String)> = plan
            .triggers()
            .map(|(at, pitches)| (at, pitches[0].to_string()))
            .collect();
        assert_eq!(
            played,
            [
                (ms(0), "C4".to_string()),
                (ms(1500), "G4".to_string()),
                (ms(3000), "F4".to_string()),
                (ms(3500), "E4".to_string()),
                (ms(4000), "D4".to_string()),
                (ms(4500), "C4".to_string()),
            ]
        );
        // last note 1500 plus the 1000 wait
        assert_eq!(plan.period, ms(7000));
    }

    #[test]
    fn walks_the_range_for_each_loop() {
        let mut p = program(small());
        assert_eq!(p.phrase_count(), 3);
        let mut roots = Vec::new();
        while let Some(plan) = p.next_step() {
            roots.push(plan.triggers().next().unwrap().1[0].to_string());
        }
        // ma preset loops twice
        assert_eq!(roots, ["C4", "C#4", "D4", "C4", "C#4", "D4"]);
    }

    #[test]
    fn display_cues_track_position() {
        let mut p = program(small());
        p.next_step();
        let plan = p.next_step().unwrap();
        let phrase = plan
            .cues
            .iter()
            .find_map(|c| match &c.cue {
                Cue::SetPhrase { cycle, step, steps, notes, .. } => {
                    Some((*cycle, *step, *steps, notes.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(phrase, (1, 2, 3, vec!["G#4".into(), "F#4".into(), "F4".into(), "D#4".into(), "C#4".into()]));

        let active: Vec<i32> = plan
            .cues
            .iter()
            .filter_map(|c| match c.cue {
                Cue::ActiveNote(i) => Some(i),
                _ => None,
            })
            .collect();
        assert_eq!(active, [-1, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn first_tip_opens_the_session() {
        let mut p = program(small());
        let plan = p.next_step().unwrap();
        let tip = plan.cues.iter().find_map(|c| match &c.cue {
            Cue::SetPhrase { tip, .. } => tip.clone(),
            _ => None,
        });
        assert_eq!(tip.as_deref(), Some(VocalPatternSpec::ma().tips[0].as_str()));
    }

    #[test]
    fn opening_tip_is_not_repeated() {
        let spec = small();
        assert!(spec.tips.len() > 1);
        let opening = spec.tips[0].clone();
        let mut p = program(VocalPatternSpec {
            loop_count: 0,
            ..spec
        });
        p.next_step();
        for _ in 0..40 {
            let plan = p.next_step().unwrap();
            let tip = plan.cues.iter().find_map(|c| match &c.cue {
                Cue::SetPhrase { tip, .. } => tip.clone(),
                _ => None,
            });
            assert_ne!(tip.as_deref(), Some(opening.as_str()));
        }
    }

    #[test]
    fn zero_loops_runs_forever() {
        let mut p = program(VocalPatternSpec {
            loop_count: 0,
            ..small()
        });
        for _ in 0..20 {
            assert!(p.next_step().is_some());
        }
    }

    #[test]
    fn out_of_range_pattern_is_rejected() {
        let spec = VocalPatternSpec {
            start: Pitch(120),
            end: Pitch(124),
            offsets: vec![0, 12],
            ..VocalPatternSpec::ma()
        };
        assert!(matches!(
            VocalProgram::new(spec, fastrand::Rng::new()),
            Err(SessionError::InvalidRange(_))
        ));
        let empty = VocalPatternSpec {
            offsets: vec![],
            ..VocalPatternSpec::ma()
        };
        assert!(matches!(
            VocalProgram::new(empty, fastrand::Rng::new()),
            Err(SessionError::EmptyTargetSet)
        ));
    }
}
