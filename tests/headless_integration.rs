use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

use tatsumakeeb::game::{FailureCause, Game, Key, KeyInput, Outcome, Status};
use tatsumakeeb::runtime::{map_key, Action, ChannelEventSource, GameEvent, Runner};
use tatsumakeeb::score::{MemoryScoreStore, ScoreStore};

// Headless integration using the internal runtime + Game without a TTY.
// Each Tick advances a synthetic clock by 100ms so countdowns are deterministic;
// inputs are handled at the synthetic time rather than their reader stamp.

fn key(code: KeyCode, kind: KeyEventKind) -> GameEvent {
    let action = map_key(&KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind,
        state: KeyEventState::NONE,
    })
    .unwrap();
    GameEvent::Input {
        action,
        at: Instant::now(),
    }
}

fn press(c: char) -> GameEvent {
    key(KeyCode::Char(c), KeyEventKind::Press)
}

fn release(c: char) -> GameEvent {
    key(KeyCode::Char(c), KeyEventKind::Release)
}

fn enter() -> GameEvent {
    key(KeyCode::Enter, KeyEventKind::Press)
}

/// Drive `game` for up to `max_steps` runner steps, or until `stop` returns true.
/// Returns every outcome the game produced, in order.
fn drive(
    game: &mut Game,
    events: Vec<GameEvent>,
    max_steps: u32,
    stop: impl Fn(&[Outcome]) -> bool,
) -> Vec<Outcome> {
    let (tx, rx) = mpsc::channel();
    for ev in events {
        tx.send(ev).unwrap();
    }
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));

    let mut now = Instant::now();
    let mut outcomes = Vec::new();

    for _ in 0..max_steps {
        let outcome = match runner.step() {
            GameEvent::Tick => {
                now += Duration::from_millis(100);
                None
            }
            GameEvent::Resize | GameEvent::Closed => None,
            GameEvent::Input { action, .. } => match action {
                Action::Game(input) => game.handle(input, now),
                Action::Quit => None,
            },
        };
        outcomes.extend(outcome);
        outcomes.extend(game.tick(now));

        if stop(outcomes.as_slice()) {
            break;
        }
    }
    outcomes
}

fn game_with_sequence(sequence: &str, store: Rc<MemoryScoreStore>) -> Game {
    let mut game = Game::with_seed(Box::new(store), 5);
    game.sequence = sequence.to_string();
    game
}

#[test]
fn headless_win_flow_advances_level() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = game_with_sequence("q7z", Rc::clone(&store));

    let outcomes = drive(
        &mut game,
        vec![enter(), press('q'), press('7'), press('z')],
        50,
        |o| o.iter().any(|x| matches!(x, Outcome::Won { .. })),
    );

    assert_eq!(
        outcomes,
        vec![
            Outcome::Started,
            Outcome::Won {
                level: 1,
                new_best: true
            }
        ]
    );
    assert_eq!(game.level, 2);
    assert_eq!(store.load(), 1);
    assert!(game.input.is_empty());
}

#[test]
fn headless_release_before_finishing_loses() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = game_with_sequence("xy2", store);

    let outcomes = drive(
        &mut game,
        vec![enter(), press('x'), release('x'), press('y')],
        50,
        |o| o.len() >= 2,
    );

    assert_matches!(
        outcomes.as_slice(),
        [
            Outcome::Started,
            Outcome::Lost(FailureCause::LetGo { released: 'x' })
        ]
    );
    assert_eq!(game.status, Status::Idle);
    assert_eq!(game.level, 1);
}

#[test]
fn headless_repeat_events_are_ignored() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = game_with_sequence("abc", store);

    let outcomes = drive(
        &mut game,
        vec![
            enter(),
            press('a'),
            key(KeyCode::Char('a'), KeyEventKind::Repeat),
            key(KeyCode::Char('a'), KeyEventKind::Repeat),
            press('b'),
            press('c'),
        ],
        50,
        |o| o.len() >= 2,
    );

    assert_matches!(outcomes.as_slice(), [Outcome::Started, Outcome::Won { level: 1, .. }]);
}

#[test]
fn headless_countdown_expires() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = game_with_sequence("m4n", store);

    // Level 1 allows 5 seconds: 50 synthetic ticks of 100ms
    let outcomes = drive(&mut game, vec![enter(), press('m')], 200, |o| o.len() >= 2);

    assert_eq!(
        outcomes,
        vec![Outcome::Started, Outcome::Lost(FailureCause::TimedOut)]
    );
    let failure = game.failure.clone().unwrap();
    assert_eq!(failure.sequence, "m4n");
    assert_eq!(game.level, 1);
    assert!(game.input.is_empty());
}

#[test]
fn headless_several_levels_then_failure_keeps_best() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = Game::with_seed(Box::new(Rc::clone(&store)), 21);
    let now = Instant::now();

    for _ in 0..6 {
        assert_eq!(
            game.handle(
                KeyInput::Down {
                    key: Key::Enter,
                    repeat: false
                },
                now
            ),
            Some(Outcome::Started)
        );
        let sequence: Vec<char> = game.sequence.chars().collect();
        for c in sequence {
            game.key_down(Key::Char(c), false, now);
        }
    }
    assert_eq!(game.level, 7);
    // Level 5 is the first step up in length
    assert_eq!(game.sequence.chars().count(), 4);

    game.key_down(Key::Enter, false, now);
    game.key_down(Key::Char('#'), false, now);

    assert_eq!(game.level, 1);
    assert_eq!(game.best_score, 6);
    assert_eq!(store.load(), 6);
    assert_eq!(game.snapshot().best_score, 6);
}

#[test]
fn headless_backspace_mid_round_loses() {
    let store = Rc::new(MemoryScoreStore::new(0));
    let mut game = game_with_sequence("k2p", store);

    let outcomes = drive(
        &mut game,
        vec![
            enter(),
            press('k'),
            key(KeyCode::Backspace, KeyEventKind::Press),
        ],
        50,
        |o| o.len() >= 2,
    );

    assert_eq!(
        outcomes,
        vec![
            Outcome::Started,
            Outcome::Lost(FailureCause::WrongInput {
                pressed: Key::Named("Backspace"),
                expected: Some('2'),
            })
        ]
    );
}
