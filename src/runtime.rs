use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::{Key, KeyInput};

/// What the main loop reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A mapped key, stamped with the instant the reader saw it
    Input { action: Action, at: Instant },
    Resize,
    /// No input within one tick interval
    Tick,
    /// The input source is gone; nothing more will arrive
    Closed,
}

/// What a terminal key event means to the app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    Game(KeyInput),
}

const FUNCTION_KEYS: [&str; 12] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// Name for a key that produces no character. Lock and modifier keys have none.
fn key_name(code: KeyCode) -> Option<&'static str> {
    let name = match code {
        KeyCode::Backspace => "Backspace",
        KeyCode::Left => "Left",
        KeyCode::Right => "Right",
        KeyCode::Up => "Up",
        KeyCode::Down => "Down",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Tab => "Tab",
        KeyCode::BackTab => "BackTab",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        KeyCode::F(n) => FUNCTION_KEYS
            .get(usize::from(n).wrapping_sub(1))
            .copied()
            .unwrap_or("Function"),
        _ => return None,
    };
    Some(name)
}

/// Translate a crossterm key event. Keys the game has no use for map to `None`.
pub fn map_key(key: &KeyEvent) -> Option<Action> {
    let pressed = key.kind != KeyEventKind::Release;

    if pressed
        && (key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)))
    {
        return Some(Action::Quit);
    }

    let game_key = match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(c) => Key::Char(c),
        code => Key::Named(key_name(code)?),
    };

    let input = match key.kind {
        KeyEventKind::Press => KeyInput::Down {
            key: game_key,
            repeat: false,
        },
        KeyEventKind::Repeat => KeyInput::Down {
            key: game_key,
            repeat: true,
        },
        KeyEventKind::Release => KeyInput::Up(game_key),
    };
    Some(Action::Game(input))
}

/// Where the runner pulls events from
pub trait GameEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Events delivered over an mpsc channel
pub struct ChannelEventSource {
    rx: Receiver<GameEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a reader thread translating terminal events.
    ///
    /// The reader stamps each key before it is queued, so a key pressed in
    /// time still counts as in time even when the main loop is busy drawing.
    /// Keys without a meaning (see [`map_key`]) never leave the reader.
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => match map_key(&key) {
                    Some(action) => GameEvent::Input {
                        action,
                        at: Instant::now(),
                    },
                    None => continue,
                },
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("terminal event reader stopped: {e}");
                    break;
                }
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl GameEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one event per step, falling back to `Tick` after `tick_rate`
pub struct Runner<E: GameEventSource> {
    events: E,
    tick_rate: Duration,
}

impl<E: GameEventSource> Runner<E> {
    pub fn new(events: E, tick_rate: Duration) -> Self {
        Self { events, tick_rate }
    }

    pub fn step(&self) -> GameEvent {
        match self.events.recv_timeout(self.tick_rate) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => GameEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => GameEvent::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use std::sync::mpsc;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn runner(rx: mpsc::Receiver<GameEvent>) -> Runner<ChannelEventSource> {
        Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1))
    }

    #[test]
    fn idle_step_ticks() {
        let (_tx, rx) = mpsc::channel();

        assert_eq!(runner(rx).step(), GameEvent::Tick);
    }

    #[test]
    fn inputs_keep_order_and_stamp() {
        let (tx, rx) = mpsc::channel();
        let t0 = Instant::now();
        let enter = Action::Game(KeyInput::Down {
            key: Key::Enter,
            repeat: false,
        });
        tx.send(GameEvent::Input {
            action: enter,
            at: t0,
        })
        .unwrap();
        tx.send(GameEvent::Input {
            action: Action::Quit,
            at: t0 + Duration::from_millis(30),
        })
        .unwrap();
        let runner = runner(rx);

        assert_eq!(
            runner.step(),
            GameEvent::Input {
                action: enter,
                at: t0
            }
        );
        assert_eq!(
            runner.step(),
            GameEvent::Input {
                action: Action::Quit,
                at: t0 + Duration::from_millis(30)
            }
        );
        assert_eq!(runner.step(), GameEvent::Tick);
    }

    #[test]
    fn queued_events_drain_before_close() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        drop(tx);
        let runner = runner(rx);

        assert_eq!(runner.step(), GameEvent::Resize);
        assert_eq!(runner.step(), GameEvent::Closed);
        assert_eq!(runner.step(), GameEvent::Closed);
    }

    #[test]
    fn map_char_press_repeat_release() {
        assert_eq!(
            map_key(&key(KeyCode::Char('a'), KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Char('a'),
                repeat: false
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('a'), KeyEventKind::Repeat)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Char('a'),
                repeat: true
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('a'), KeyEventKind::Release)),
            Some(Action::Game(KeyInput::Up(Key::Char('a'))))
        );
    }

    #[test]
    fn map_enter() {
        assert_eq!(
            map_key(&key(KeyCode::Enter, KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Enter,
                repeat: false
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::Enter, KeyEventKind::Release)),
            Some(Action::Game(KeyInput::Up(Key::Enter)))
        );
    }

    #[test]
    fn map_quit_keys() {
        assert_eq!(
            map_key(&key(KeyCode::Esc, KeyEventKind::Press)),
            Some(Action::Quit)
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_c), Some(Action::Quit));

        // Releasing Esc must not quit a second time
        assert_eq!(map_key(&key(KeyCode::Esc, KeyEventKind::Release)), None);
    }

    #[test]
    fn map_non_character_keys_by_name() {
        assert_eq!(
            map_key(&key(KeyCode::Backspace, KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Named("Backspace"),
                repeat: false
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::Tab, KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Named("Tab"),
                repeat: false
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::Left, KeyEventKind::Release)),
            Some(Action::Game(KeyInput::Up(Key::Named("Left"))))
        );
        assert_eq!(
            map_key(&key(KeyCode::F(5), KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Named("F5"),
                repeat: false
            }))
        );
        assert_eq!(
            map_key(&key(KeyCode::F(0), KeyEventKind::Press)),
            Some(Action::Game(KeyInput::Down {
                key: Key::Named("Function"),
                repeat: false
            }))
        );
    }

    #[test]
    fn map_lock_keys_to_nothing() {
        assert_eq!(map_key(&key(KeyCode::CapsLock, KeyEventKind::Press)), None);
        assert_eq!(map_key(&key(KeyCode::Null, KeyEventKind::Press)), None);
    }

    #[test]
    fn map_keeps_raw_case() {
        let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(
            map_key(&shifted),
            Some(Action::Game(KeyInput::Down {
                key: Key::Char('A'),
                repeat: false
            }))
        );
    }
}
