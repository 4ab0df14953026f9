use rand::{rngs::StdRng, SeedableRng};
use std::fmt;
use std::time::Instant;

use crate::difficulty::{schedule, Difficulty};
use crate::input::InputTracker;
use crate::score::ScoreStore;
use crate::sequence;
use crate::timer::CountdownTimer;

/// Keys the game distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Start control, never part of a sequence
    Enter,
    Char(char),
    /// Any other key, by name (`"Backspace"`, `"Left"`, ...)
    Named(&'static str),
}

/// Raw keyboard stimulus forwarded by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Down { key: Key, repeat: bool },
    Up(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    WrongInput { pressed: Key, expected: Option<char> },
    LetGo { released: char },
    TimedOut,
}

/// Why the last attempt was lost, and what it looked like at that moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub cause: FailureCause,
    pub level: u32,
    pub sequence: String,
}

/// Transition produced by a handled stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Started,
    Won { level: u32, new_best: bool },
    Lost(FailureCause),
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub level: u32,
    pub sequence: String,
    pub input: String,
    pub running: bool,
    pub seconds_remaining: u64,
    pub failure: Option<Failure>,
    pub best_score: u32,
}

impl Snapshot {
    /// One entry per target character, flagged when it has been pressed
    pub fn keycaps(&self) -> impl Iterator<Item = (char, bool)> + '_ {
        self.sequence
            .chars()
            .map(move |c| (c, self.input.contains(c)))
    }
}

/// The reflex challenge: one level, one target sequence, one attempt at a time
pub struct Game {
    pub level: u32,
    pub sequence: String,
    pub input: InputTracker,
    pub status: Status,
    pub failure: Option<Failure>,
    pub best_score: u32,
    pub timer: CountdownTimer,
    store: Box<dyn ScoreStore>,
    rng: StdRng,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("level", &self.level)
            .field("sequence", &self.sequence)
            .field("input", &self.input)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .field("best_score", &self.best_score)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Game {
    pub fn new(store: Box<dyn ScoreStore>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    pub fn with_seed(store: Box<dyn ScoreStore>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(store: Box<dyn ScoreStore>, rng: StdRng) -> Self {
        let best_score = store.load();
        let mut game = Self {
            level: 1,
            sequence: String::new(),
            input: InputTracker::new(),
            status: Status::Idle,
            failure: None,
            best_score,
            timer: CountdownTimer::new(schedule(1).time_budget_secs),
            store,
            rng,
        };
        game.regenerate();
        game
    }

    pub fn difficulty(&self) -> Difficulty {
        schedule(self.level)
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn handle(&mut self, input: KeyInput, now: Instant) -> Option<Outcome> {
        match input {
            KeyInput::Down { key, repeat } => self.key_down(key, repeat, now),
            KeyInput::Up(key) => self.key_up(key, now),
        }
    }

    pub fn key_down(&mut self, key: Key, repeat: bool, now: Instant) -> Option<Outcome> {
        if let Some(outcome) = self.tick(now) {
            return Some(outcome);
        }

        match (self.status, key) {
            (Status::Idle, Key::Enter) => Some(self.start(now)),
            (Status::Idle, _) => None,
            (Status::Running, _) if repeat => None,
            (Status::Running, Key::Enter) => None,
            (Status::Running, Key::Char(c)) => self.press(c),
            (Status::Running, Key::Named(_)) => Some(self.reject(key)),
        }
    }

    pub fn key_up(&mut self, key: Key, now: Instant) -> Option<Outcome> {
        if let Some(outcome) = self.tick(now) {
            return Some(outcome);
        }

        match (self.status, key) {
            (Status::Running, Key::Char(c))
                if self.input.contains(c) && self.input.as_str() != self.sequence =>
            {
                Some(self.fail(FailureCause::LetGo { released: c }))
            }
            _ => None,
        }
    }

    /// Advance the countdown; a running attempt is lost when it expires.
    pub fn tick(&mut self, now: Instant) -> Option<Outcome> {
        if self.timer.tick(now) {
            return self.expire();
        }
        None
    }

    pub fn expire(&mut self) -> Option<Outcome> {
        if !self.is_running() {
            return None;
        }
        Some(self.fail(FailureCause::TimedOut))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            level: self.level,
            sequence: self.sequence.clone(),
            input: self.input.as_str().to_string(),
            running: self.is_running(),
            seconds_remaining: self.timer.seconds_remaining(),
            failure: self.failure.clone(),
            best_score: self.best_score,
        }
    }

    fn start(&mut self, now: Instant) -> Outcome {
        self.failure = None;
        self.input.reset();
        self.timer.arm(self.difficulty().time_budget_secs, now);
        self.status = Status::Running;
        log::info!("level {} started, sequence {:?}", self.level, self.sequence);
        Outcome::Started
    }

    fn press(&mut self, c: char) -> Option<Outcome> {
        self.input.append(c);

        if let Some(idx) = self.input.mismatch_at(&self.sequence) {
            let expected = self.sequence.chars().nth(idx);
            return Some(self.fail(FailureCause::WrongInput {
                pressed: Key::Char(c),
                expected,
            }));
        }

        if self
            .input
            .is_complete(&self.sequence, self.difficulty().sequence_length)
        {
            return Some(self.win());
        }

        None
    }

    /// A key that can never be part of a sequence
    fn reject(&mut self, key: Key) -> Outcome {
        let expected = self.sequence.chars().nth(self.input.len());
        self.fail(FailureCause::WrongInput {
            pressed: key,
            expected,
        })
    }

    fn win(&mut self) -> Outcome {
        let completed = self.level;
        let new_best = completed > self.best_score;

        if new_best {
            self.best_score = completed;
            if let Err(e) = self.store.save(completed) {
                log::warn!("failed to save best score {completed}: {e}");
            }
        }

        log::info!("level {completed} cleared (best {})", self.best_score);
        self.finish_attempt(completed.saturating_add(1));
        Outcome::Won {
            level: completed,
            new_best,
        }
    }

    fn fail(&mut self, cause: FailureCause) -> Outcome {
        log::info!("level {} lost: {:?}", self.level, cause);
        self.failure = Some(Failure {
            cause,
            level: self.level,
            sequence: self.sequence.clone(),
        });
        self.finish_attempt(1);
        Outcome::Lost(cause)
    }

    fn finish_attempt(&mut self, next_level: u32) {
        self.status = Status::Idle;
        self.level = next_level;
        self.input.reset();
        self.timer.reset(self.difficulty().time_budget_secs);
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.sequence = sequence::generate(self.difficulty().sequence_length, &mut self.rng);
    }
}
