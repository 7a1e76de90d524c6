use crate::keyboard::{KeySource, Keyboard};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// terminals never report key releases, so a key counts as held until it
/// has gone this long without repeating. must outlast the auto-repeat delay
/// (typically 250-600ms) or held keys flicker
const KEY_HOLD: Duration = Duration::from_millis(650);

/// something that happened on the host side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(char),
    KeyUp(char),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that has happened since the last call, without blocking
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// what a terminal key event means to us, if anything
fn classify(evt: &KeyEvent) -> Option<InputEvent> {
    match evt.code {
        KeyCode::Esc => Some(InputEvent::Quit),
        // raw mode swallows SIGINT
        KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Char(key) => Some(InputEvent::KeyDown(key.to_ascii_lowercase())),
        _ => None,
    }
}

/// fakes key-up events from the time each key was last seen
struct HeldKeys {
    last_seen: HashMap<char, Instant>,
}

impl HeldKeys {
    fn new() -> Self {
        HeldKeys {
            last_seen: HashMap::new(),
        }
    }

    /// true if this is a fresh press rather than a repeat
    fn press(&mut self, key: char, now: Instant) -> bool {
        self.last_seen.insert(key, now).is_none()
    }

    fn release_expired(&mut self, now: Instant) -> Vec<InputEvent> {
        let expired: Vec<char> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) >= KEY_HOLD)
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            self.last_seen.remove(key);
        }
        expired.into_iter().map(InputEvent::KeyUp).collect()
    }
}

/// Input from the terminal via crossterm. Puts the terminal in raw mode for
/// as long as it lives.
pub struct TerminalInput {
    held: HeldKeys,
}

impl TerminalInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TerminalInput {
            held: HeldKeys::new(),
        })
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TerminalInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match classify(&evt) {
                    Some(InputEvent::KeyDown(key)) => {
                        if self.held.press(key, Instant::now()) {
                            events.push(InputEvent::KeyDown(key));
                        }
                    }
                    Some(event) => events.push(event),
                    None => log::warn!("ignoring key {:?}", evt.code),
                },
                _ => log::debug!("ignoring non-key terminal event"),
            }
        }
        events.extend(self.held.release_expired(Instant::now()));
        Ok(events)
    }
}

/// Blocking key source for Fx0A, reading straight from the terminal.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn wait_for_key(&mut self, keyboard: &Keyboard) -> Option<u8> {
        loop {
            let evt = match read() {
                Ok(Event::Key(evt)) => evt,
                Ok(_) => continue,
                Err(e) => panic!("lost the terminal while waiting for a key: {}", e),
            };
            match classify(&evt) {
                Some(InputEvent::KeyDown(key)) => match keyboard.map(key) {
                    Some(index) => return Some(index),
                    None => log::warn!("can't map {:?} to a CHIP-8 key", key),
                },
                Some(InputEvent::Quit) => {
                    log::info!("quit while waiting for a key");
                    return None;
                }
                _ => {}
            }
        }
    }
}

/// dummy Input implementation for testing; hands out one batch per poll
pub struct DummyInput {
    batches: Vec<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: &[&[InputEvent]]) -> Self {
        DummyInput {
            batches: batches.iter().rev().map(|b| b.to_vec()).collect(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop().unwrap_or_default())
    }
}
