// Tone training: play a target (optionally after a reference note), wait,
// then reveal and announce it.

use std::time::Duration;

use crate::error::SessionError;
use crate::speech::{numeral, solfege};
use crate::theory::{chord_pitches, Pitch};

use super::plan::{Cue, StepPlan, StepSource};
use super::spec::{PlaybackSpec, ToneKind};

// Where the session is in the target set.
pub struct PlaybackCursor {
    len: usize,
    position: usize,
    loops_completed: u32,
    loop_count: u32,
    random: bool,
    rng: fastrand::Rng,
}

impl PlaybackCursor {
    pub fn new(len: usize, loop_count: u32, random: bool, rng: fastrand::Rng) -> Self {
        Self {
            len,
            position: 0,
            loops_completed: 0,
            loop_count,
            random,
            rng,
        }
    }

    #[cfg(test)]
    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    // Index of the next target, or `None` once the loop budget is spent.
    // Random mode draws independently but still counts `len` draws per loop.
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if self.position == self.len {
            self.position = 0;
            self.loops_completed += 1;
        }
        if self.loop_count > 0 && self.loops_completed >= self.loop_count {
            return None;
        }
        let index = if self.random {
            self.rng.usize(..self.len)
        } else {
            self.position
        };
        self.position += 1;
        Some(index)
    }
}

struct Target {
    symbol: String,
    pitches: Vec<Pitch>,
}

pub struct TrainingProgram {
    spec: PlaybackSpec,
    targets: Vec<Target>,
    reference: Option<Pitch>,
    cursor: PlaybackCursor,
    period: Duration,
}

impl TrainingProgram {
    // Resolve every symbol up front so a bad target fails before anything
    // is scheduled.
    pub fn new(spec: PlaybackSpec, rng: fastrand::Rng) -> Result<Self, SessionError> {
        if spec.symbols.is_empty() {
            return Err(SessionError::EmptyTargetSet);
        }
        let targets = spec
            .symbols
            .iter()
            .map(|symbol| {
                Ok(Target {
                    symbol: symbol.clone(),
                    pitches: resolve(symbol, spec.tone_kind)?,
                })
            })
            .collect::<Result<Vec<_>, SessionError>>()?;

        let reference = if spec.reference.enabled {
            let symbol = &spec.reference.symbol;
            Some(symbol.parse::<Pitch>().map_err(|source| SessionError::InvalidSymbol {
                symbol: symbol.clone(),
                source,
            })?)
        } else {
            None
        };

        let cursor = PlaybackCursor::new(targets.len(), spec.loop_count, spec.random, rng);
        let period = spec.step_period();
        Ok(Self {
            spec,
            targets,
            reference,
            cursor,
            period,
        })
    }

    fn plan(&self, target: &Target) -> StepPlan {
        let spec = &self.spec;
        let mut plan = StepPlan::new(self.period);
        let mut t = Duration::ZERO;

        plan.at(t, Cue::SetLabel(target.symbol.clone()));
        if let Some(reference) = self.reference {
            plan.at(t, Cue::Trigger {
                pitches: vec![reference],
                duration: spec.tone_duration,
            });
            t += spec.tone_duration + spec.tone_wait;
        }

        plan.at(t, Cue::Trigger {
            pitches: target.pitches.clone(),
            duration: spec.tone_duration,
        });
        t += spec.tone_duration;

        if !spec.speech.enabled {
            plan.at(t, Cue::Reveal);
            return plan;
        }

        t += spec.tone_wait;
        plan.at(t, Cue::Reveal);
        plan.at(t, Cue::Speak(target.symbol.clone()));

        // chords are announced by name only
        if spec.tone_kind == ToneKind::Notes {
            if spec.speech.solfege {
                t += spec.solfege_wait;
                if let Some(syllable) = solfege(&target.symbol) {
                    plan.at(t, Cue::Speak(syllable.clone()));
                    plan.at(t, Cue::AppendLabel(syllable));
                }
            }
            if spec.speech.numeral {
                t += spec.numeral_wait;
                if let Some(number) = numeral(&target.symbol) {
                    plan.at(t, Cue::Speak(number.clone()));
                    plan.at(t, Cue::AppendLabel(number));
                }
            }
        }
        plan
    }
}

impl StepSource for TrainingProgram {
    fn next_step(&mut self) -> Option<StepPlan> {
        let index = self.cursor.advance()?;
        Some(self.plan(&self.targets[index]))
    }
}

// Pitches struck for one target. Only chord mode reads chord symbols, so a
// note like "C5" is never mistaken for a power chord.
fn resolve(symbol: &str, kind: ToneKind) -> Result<Vec<Pitch>, SessionError> {
    if kind == ToneKind::Chords {
        if let Some(pitches) = chord_pitches(symbol) {
            return Ok(pitches);
        }
    }
    let pitch = symbol
        .parse::<Pitch>()
        .map_err(|source| SessionError::InvalidSymbol {
            symbol: symbol.to_string(),
            source,
        })?;
    Ok(vec![pitch])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::plan::TimedCue;
    use crate::sequencing::spec::SpeechOptions;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn spec(symbols: &[&str]) -> PlaybackSpec {
        PlaybackSpec {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            random: false,
            loop_count: 1,
            tone_duration: ms(1000),
            tone_wait: ms(1500),
            answer_wait: ms(2000),
            solfege_wait: ms(500),
            numeral_wait: ms(500),
            speech: SpeechOptions {
                enabled: false,
                ..SpeechOptions::default()
            },
            ..PlaybackSpec::default()
        }
    }

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(7)
    }

    fn drain(program: &mut TrainingProgram) -> Vec<StepPlan> {
        std::iter::from_fn(|| program.next_step()).collect()
    }

    fn first_target(plan: &StepPlan) -> Vec<String> {
        plan.triggers()
            .last()
            .unwrap()
            .1
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn sequential_cycles_then_completes() {
        let mut s = spec(&["A4", "B4", "C5"]);
        s.loop_count = 2;
        let mut program = TrainingProgram::new(s, rng()).unwrap();
        let played: Vec<_> = drain(&mut program).iter().map(|p| first_target(p)[0].clone()).collect();
        assert_eq!(played, ["A4", "B4", "C5", "A4", "B4", "C5"]);
        // stays finished
        assert!(program.next_step().is_none());
    }

    #[test]
    fn infinite_loop_keeps_going() {
        let mut s = spec(&["C4"]);
        s.loop_count = 0;
        let mut program = TrainingProgram::new(s, rng()).unwrap();
        for _ in 0..50 {
            assert!(program.next_step().is_some());
        }
        assert_eq!(program.cursor.loops_completed(), 49);
    }

    #[test]
    fn random_mode_counts_set_size_per_loop() {
        let mut s = spec(&["C4", "D4", "E4", "F4"]);
        s.random = true;
        s.loop_count = 3;
        let mut program = TrainingProgram::new(s, rng()).unwrap();
        let plans = drain(&mut program);
        assert_eq!(plans.len(), 12);
        for plan in &plans {
            assert!(["C4", "D4", "E4", "F4"].contains(&first_target(plan)[0].as_str()));
        }
    }

    #[test]
    fn chord_tones_are_struck_together() {
        let mut s = spec(&["Am7"]);
        s.tone_kind = ToneKind::Chords;
        let mut program = TrainingProgram::new(s, rng()).unwrap();
        let plan = program.next_step().unwrap();
        let triggers: Vec<_> = plan.triggers().collect();
        assert_eq!(triggers.len(), 1);
        assert_eq!(first_target(&plan), ["A3", "C4", "E4", "G4"]);
    }

    #[test]
    fn note_mode_never_reads_chords() {
        let mut s = spec(&["C5"]);
        s.tone_kind = ToneKind::Notes;
        let plan = TrainingProgram::new(s.clone(), rng()).unwrap().next_step().unwrap();
        assert_eq!(first_target(&plan), ["C5"]);

        // in chord mode a plain note still plays as itself
        s.tone_kind = ToneKind::Chords;
        s.symbols = vec!["E4".into()];
        let plan = TrainingProgram::new(s, rng()).unwrap().next_step().unwrap();
        assert_eq!(first_target(&plan), ["E4"]);
    }

    #[test]
    fn reference_precedes_target() {
        let mut s = spec(&["G4"]);
        s.reference.enabled = true;
        s.reference.symbol = "C4".into();
        let plan = TrainingProgram::new(s, rng()).unwrap().next_step().unwrap();
        let triggers: Vec<_> = plan
            .triggers()
            .map(|(at, p)| (at, p[0].to_string()))
            .collect();
        assert_eq!(triggers, [(ms(0), "C4".to_string()), (ms(2500), "G4".to_string())]);
        assert_eq!(plan.period, ms(7000));
    }

    #[test]
    fn silent_mode_reveals_when_target_ends() {
        let plan = TrainingProgram::new(spec(&["D4"]), rng()).unwrap().next_step().unwrap();
        assert!(plan.cues.contains(&TimedCue { at: ms(1000), cue: Cue::Reveal }));
        assert!(!plan.cues.iter().any(|c| matches!(c.cue, Cue::Speak(_))));
    }

    #[test]
    fn announcement_chain_for_notes() {
        let mut s = spec(&["F#4"]);
        s.speech = SpeechOptions {
            enabled: true,
            slowness: 1.0,
            solfege: true,
            numeral: true,
        };
        let plan = TrainingProgram::new(s, rng()).unwrap().next_step().unwrap();
        let spoken: Vec<_> = plan
            .cues
            .iter()
            .filter_map(|c| match &c.cue {
                Cue::Speak(text) => Some((c.at, text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            spoken,
            [(ms(2500), "F#4"), (ms(3000), "raised Fa"), (ms(3500), "raised 4")]
        );
        assert!(plan.cues.contains(&TimedCue {
            at: ms(3000),
            cue: Cue::AppendLabel("raised Fa".into()),
        }));
    }

    #[test]
    fn chords_are_announced_by_name_only() {
        let mut s = spec(&["Dm"]);
        s.tone_kind = ToneKind::Chords;
        s.speech = SpeechOptions {
            enabled: true,
            slowness: 1.0,
            solfege: true,
            numeral: true,
        };
        let plan = TrainingProgram::new(s, rng()).unwrap().next_step().unwrap();
        let speaks = plan.cues.iter().filter(|c| matches!(c.cue, Cue::Speak(_))).count();
        assert_eq!(speaks, 1);
    }

    #[test]
    fn bad_targets_fail_up_front() {
        assert!(matches!(
            TrainingProgram::new(spec(&[]), rng()),
            Err(SessionError::EmptyTargetSet)
        ));
        assert!(matches!(
            TrainingProgram::new(spec(&["C4", "Q9"]), rng()),
            Err(SessionError::InvalidSymbol { ref symbol, .. }) if symbol == "Q9"
        ));
        let mut s = spec(&["C4"]);
        s.reference.enabled = true;
        s.reference.symbol = "nope".into();
        assert!(TrainingProgram::new(s, rng()).is_err());
    }
}
