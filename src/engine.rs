//! Mole lifecycle and input-matching engine.
//!
//! The engine owns every piece of mutable game state: the set of active
//! targets, their deadlines, the score, the pause flag, and the transient
//! wrong-key indicator. It never blocks and never touches the browser; all
//! temporal behavior goes through the [`Scheduler`](crate::scheduler) and all
//! side effects come out as [`Command`]s the host executes fire-and-forget.
//! Timer firings re-enter the engine as letter-keyed events and are
//! re-validated against current state, never against captured references.

use crate::catalog::{self, Animal};
use crate::scheduler::{Scheduler, TimerHandle};

/// Delay between a correct press and the replacement spawn, so rounds feel
/// discrete instead of instant.
pub const RESPAWN_DEBOUNCE_MS: f64 = 500.0;
/// How long the wrong-key indicator stays up unless superseded.
pub const WRONG_KEY_DISPLAY_MS: f64 = 2000.0;
/// Cue text played on a correct press.
pub const CORRECT_CUE: &str = "答对了";

/// Picks an index in `0..len`; injected so tests can be deterministic while
/// the browser host supplies real randomness.
pub type IndexPicker = Box<dyn FnMut(usize) -> usize>;

/// Engine configuration. The three presets correspond to the game's modes;
/// any other combination of the same knobs is equally valid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub max_concurrent_targets: usize,
    /// `None` means targets wait forever for a keypress.
    pub lifetime_ms: Option<f64>,
    /// Spawn a replacement immediately when a target expires unpressed.
    pub auto_advance_on_expiry: bool,
    /// `Some(ms)` re-plays the current target's name cue on this period.
    pub hint_repeat_ms: Option<f64>,
    /// Whether a miss shows feedback and announces the correct letter.
    pub wrong_key_feedback: bool,
}

impl EngineConfig {
    /// Single patient target with repeating name cues and wrong-key feedback.
    pub fn classic() -> Self {
        Self {
            max_concurrent_targets: 1,
            lifetime_ms: None,
            auto_advance_on_expiry: false,
            hint_repeat_ms: Some(3_000.0),
            wrong_key_feedback: true,
        }
    }

    /// Single target on a 10 s countdown that auto-advances when it runs out.
    pub fn countdown() -> Self {
        Self {
            max_concurrent_targets: 1,
            lifetime_ms: Some(10_000.0),
            auto_advance_on_expiry: true,
            hint_repeat_ms: None,
            wrong_key_feedback: true,
        }
    }

    /// Several independent countdown targets; misses are silently ignored.
    pub fn frenzy() -> Self {
        Self {
            max_concurrent_targets: 5,
            lifetime_ms: Some(10_000.0),
            auto_advance_on_expiry: true,
            hint_repeat_ms: None,
            wrong_key_feedback: false,
        }
    }

    fn single_target(&self) -> bool {
        self.max_concurrent_targets == 1
    }
}

/// Side-effect request emitted by the engine and consumed by the host.
/// Playback failure must never flow back into game state.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    PlayCue { text: String },
}

/// Timer payloads. Letter-keyed so the handler looks up live state instead of
/// holding a snapshot of it.
#[derive(Clone, Copy, Debug, PartialEq)]
enum TimerEvent {
    Expire(char),
    HintRepeat(char),
    WrongKeyClear,
    Respawn,
}

/// A timer suspended by pause, remembered as a remaining duration rather than
/// an absolute deadline since wall-clock time keeps advancing while paused.
#[derive(Clone, Copy, Debug)]
enum Suspended {
    Expiry { letter: char, remaining: f64 },
    Hint { letter: char, remaining: f64 },
    WrongClear { remaining: f64 },
    Respawn { remaining: f64 },
}

struct Target {
    animal: &'static Animal,
    activated_at: f64,
    expiry: Option<TimerHandle>,
    hint: Option<TimerHandle>,
}

/// Observable view of one active target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ActiveTarget {
    pub letter: char,
    pub name: &'static str,
    pub name_en: &'static str,
    pub emoji: &'static str,
    /// Logical timestamp at which the target appeared.
    pub activated_at: f64,
    /// Milliseconds until expiry, `None` for wait-forever targets.
    pub remaining_ms: Option<f64>,
}

/// Read-only state snapshot re-emitted after every engine operation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    pub targets: Vec<ActiveTarget>,
    pub score: u32,
    pub paused: bool,
    pub wrong_key: Option<char>,
    /// Mirrors the sole active target in single-target configurations.
    pub hint: Option<ActiveTarget>,
}

pub struct MoleEngine {
    catalog: &'static [Animal],
    config: EngineConfig,
    sched: Scheduler<TimerEvent>,
    pick: IndexPicker,
    active: Vec<Target>,
    score: u32,
    paused: bool,
    last_wrong: Option<char>,
    wrong_clear: Option<TimerHandle>,
    respawns: Vec<TimerHandle>,
    suspended: Vec<Suspended>,
    commands: Vec<Command>,
}

impl MoleEngine {
    pub fn new(catalog: &'static [Animal], config: EngineConfig, pick: IndexPicker) -> Self {
        Self {
            catalog,
            config,
            sched: Scheduler::new(0.0),
            pick,
            active: Vec::new(),
            score: 0,
            paused: false,
            last_wrong: None,
            wrong_clear: None,
            respawns: Vec::new(),
            suspended: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Begin a session: move the clock to `now` and fill every free slot.
    pub fn start(&mut self, now: f64) {
        self.tick(now);
        self.fill();
    }

    /// Spawn targets until the concurrency bound is reached or the catalog
    /// runs out of unused letters.
    pub fn fill(&mut self) {
        while self.spawn() {}
    }

    /// Spawn one target if a slot and an unused letter are available.
    /// Returns whether a target was created.
    pub fn spawn(&mut self) -> bool {
        if self.paused || self.active.len() >= self.config.max_concurrent_targets {
            return false;
        }
        let exclude: Vec<char> = self.active.iter().map(|t| t.animal.letter).collect();
        let Some(animal) = catalog::pick_random(self.catalog, &exclude, &mut self.pick) else {
            return false;
        };
        let letter = animal.letter;
        let expiry = self
            .config
            .lifetime_ms
            .map(|ms| self.sched.after(ms, TimerEvent::Expire(letter)));
        let hint = self
            .config
            .hint_repeat_ms
            .map(|ms| self.sched.every(ms, TimerEvent::HintRepeat(letter)));
        self.active.push(Target {
            animal,
            activated_at: self.sched.now(),
            expiry,
            hint,
        });
        self.clear_wrong_key();
        self.play_cue(animal.name.to_string());
        true
    }

    /// Resolve a raw keypress. Non-letter input and presses while paused are
    /// no-ops by contract, not errors.
    pub fn resolve_key(&mut self, key: char) -> Snapshot {
        let letter = key.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() || self.paused {
            return self.snapshot();
        }
        if let Some(pos) = self.active.iter().position(|t| t.animal.letter == letter) {
            let target = self.active.remove(pos);
            // Cancel synchronously so a stale expiry can never fire for a
            // letter that has been resolved (and possibly reused).
            if let Some(h) = target.expiry {
                self.sched.cancel(h);
            }
            if let Some(h) = target.hint {
                self.sched.cancel(h);
            }
            self.clear_wrong_key();
            self.score += 1;
            self.play_cue(CORRECT_CUE.to_string());
            let h = self.sched.after(RESPAWN_DEBOUNCE_MS, TimerEvent::Respawn);
            self.respawns.push(h);
        } else if self.config.wrong_key_feedback {
            // Feedback needs a correct letter to announce; with no active
            // target (respawn debounce window) the press falls through.
            if let Some(current) = self.active.first() {
                let correct = current.animal.letter;
                self.last_wrong = Some(letter);
                if let Some(h) = self.wrong_clear.take() {
                    self.sched.cancel(h);
                }
                self.wrong_clear = Some(
                    self.sched
                        .after(WRONG_KEY_DISPLAY_MS, TimerEvent::WrongKeyClear),
                );
                self.play_cue(format!("按错了哦，要按{correct}"));
            }
        }
        self.snapshot()
    }

    /// Advance the logical clock and dispatch every timer that came due.
    pub fn tick(&mut self, now: f64) {
        let fired = self.sched.advance_to(now);
        for event in fired {
            self.on_timer(event);
        }
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Expire(letter) => self.expire(letter),
            TimerEvent::HintRepeat(letter) => {
                // Hint timers are canceled with their target, so a miss here
                // means a same-batch race; just ignore it.
                if !self.paused {
                    let cue = self
                        .active
                        .iter()
                        .find(|t| t.animal.letter == letter)
                        .map(|t| t.animal.name.to_string());
                    if let Some(cue) = cue {
                        self.play_cue(cue);
                    }
                }
            }
            TimerEvent::WrongKeyClear => {
                self.last_wrong = None;
                self.wrong_clear = None;
            }
            TimerEvent::Respawn => {
                self.respawns.retain(|h| self.sched.remaining(*h) > 0.0);
                self.spawn();
            }
        }
    }

    /// Remove a target whose deadline fired. Re-validates by letter lookup:
    /// resolution cancels expiry timers synchronously, but a stale firing is
    /// still ignored here rather than trusted.
    fn expire(&mut self, letter: char) {
        if self.paused {
            return;
        }
        let Some(pos) = self.active.iter().position(|t| t.animal.letter == letter) else {
            return;
        };
        let target = self.active.remove(pos);
        if let Some(h) = target.hint {
            self.sched.cancel(h);
        }
        if self.config.auto_advance_on_expiry {
            self.spawn();
        }
    }

    /// Flip the pause flag. Pausing suspends every pending timer with its
    /// remaining duration; resuming replays the hint cue once and re-arms the
    /// timers with those durations.
    pub fn toggle_pause(&mut self) -> Snapshot {
        if self.paused {
            self.resume();
        } else {
            self.suspend();
        }
        self.snapshot()
    }

    fn suspend(&mut self) {
        self.paused = true;
        for target in &mut self.active {
            let letter = target.animal.letter;
            if let Some(h) = target.expiry.take() {
                self.suspended.push(Suspended::Expiry {
                    letter,
                    remaining: self.sched.remaining(h),
                });
                self.sched.cancel(h);
            }
            if let Some(h) = target.hint.take() {
                self.suspended.push(Suspended::Hint {
                    letter,
                    remaining: self.sched.remaining(h),
                });
                self.sched.cancel(h);
            }
        }
        if let Some(h) = self.wrong_clear.take() {
            self.suspended.push(Suspended::WrongClear {
                remaining: self.sched.remaining(h),
            });
            self.sched.cancel(h);
        }
        for h in std::mem::take(&mut self.respawns) {
            self.suspended.push(Suspended::Respawn {
                remaining: self.sched.remaining(h),
            });
            self.sched.cancel(h);
        }
    }

    fn resume(&mut self) {
        self.paused = false;
        if self.config.single_target() {
            let cue = self.active.first().map(|t| t.animal.name.to_string());
            if let Some(cue) = cue {
                self.play_cue(cue);
            }
        }
        for entry in std::mem::take(&mut self.suspended) {
            match entry {
                Suspended::Expiry { letter, remaining } => {
                    let h = self.sched.after(remaining, TimerEvent::Expire(letter));
                    if let Some(t) = self.active.iter_mut().find(|t| t.animal.letter == letter) {
                        t.expiry = Some(h);
                    } else {
                        self.sched.cancel(h);
                    }
                }
                Suspended::Hint { letter, remaining } => {
                    let period = self.config.hint_repeat_ms.unwrap_or(remaining);
                    let h = self
                        .sched
                        .repeating_after(remaining, period, TimerEvent::HintRepeat(letter));
                    if let Some(t) = self.active.iter_mut().find(|t| t.animal.letter == letter) {
                        t.hint = Some(h);
                    } else {
                        self.sched.cancel(h);
                    }
                }
                Suspended::WrongClear { remaining } => {
                    self.wrong_clear =
                        Some(self.sched.after(remaining, TimerEvent::WrongKeyClear));
                }
                Suspended::Respawn { remaining } => {
                    let h = self.sched.after(remaining, TimerEvent::Respawn);
                    self.respawns.push(h);
                }
            }
        }
    }

    /// Clear everything back to a fresh session: no targets, no timers, zero
    /// score, unpaused. Also the teardown path — nothing can fire afterwards.
    pub fn reset(&mut self) {
        self.sched.clear();
        self.active.clear();
        self.score = 0;
        self.paused = false;
        self.last_wrong = None;
        self.wrong_clear = None;
        self.respawns.clear();
        self.suspended.clear();
        self.commands.clear();
    }

    /// Take the queued side-effect commands for the host to execute.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn snapshot(&self) -> Snapshot {
        let targets: Vec<ActiveTarget> = self
            .active
            .iter()
            .map(|t| ActiveTarget {
                letter: t.animal.letter,
                name: t.animal.name,
                name_en: t.animal.name_en,
                emoji: t.animal.emoji,
                activated_at: t.activated_at,
                remaining_ms: self.remaining_for(t),
            })
            .collect();
        let hint = if self.config.single_target() {
            targets.first().cloned()
        } else {
            None
        };
        Snapshot {
            targets,
            score: self.score,
            paused: self.paused,
            wrong_key: self.last_wrong,
            hint,
        }
    }

    fn remaining_for(&self, target: &Target) -> Option<f64> {
        self.config.lifetime_ms?;
        if let Some(h) = target.expiry {
            return Some(self.sched.remaining(h));
        }
        // Paused: the live timer is gone, report the remembered remainder.
        self.suspended.iter().find_map(|s| match s {
            Suspended::Expiry { letter, remaining } if *letter == target.animal.letter => {
                Some(*remaining)
            }
            _ => None,
        })
    }

    fn clear_wrong_key(&mut self) {
        self.last_wrong = None;
        if let Some(h) = self.wrong_clear.take() {
            self.sched.cancel(h);
        }
    }

    fn play_cue(&mut self, text: String) {
        self.commands.push(Command::PlayCue { text });
    }
}
