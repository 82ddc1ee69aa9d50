//! Key bindings and per-tick input snapshots.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Without release events, a fresh press counts as held this long: it has to cover the
/// auto-repeat delay before the first Repeat arrives (250-660 ms on common systems).
const REPEAT_DELAY_MS: u64 = 500;
/// Once repeats are flowing, the key counts as held this long after the last one.
const REPEAT_INTERVAL_MS: u64 = 120;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Place,
    Menu,
    Quit,
    None,
}

/// Map key event to game action. Arrows or h/l move; Space/Enter places; Esc opens the menu.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Esc => Action::Menu,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Char(' ') | KeyCode::Enter => Action::Place,
        _ => Action::None,
    }
}

/// What the session sees for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub place: bool,
    pub menu: bool,
}

/// Last press or repeat seen for a movement key.
#[derive(Debug, Clone, Copy)]
struct HeldKey {
    at: Instant,
    repeating: bool,
}

impl HeldKey {
    fn window(self) -> Duration {
        if self.repeating {
            Duration::from_millis(REPEAT_INTERVAL_MS)
        } else {
            Duration::from_millis(REPEAT_DELAY_MS)
        }
    }
}

/// Tracks held movement keys across terminal events and collects one-shot requests
/// until the next tick drains them.
#[derive(Debug, Default)]
pub struct InputState {
    left_seen: Option<HeldKey>,
    right_seen: Option<HeldKey>,
    /// Set once the terminal has sent a Release; from then on keys are held until released.
    release_events: bool,
    place: bool,
    menu: bool,
}

impl InputState {
    /// Feed one key event. Returns the mapped action so the caller can react to Quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        let action = key_to_action(key);
        match key.kind {
            KeyEventKind::Release => {
                self.release_events = true;
                match action {
                    Action::MoveLeft => self.left_seen = None,
                    Action::MoveRight => self.right_seen = None,
                    _ => {}
                }
            }
            KeyEventKind::Press | KeyEventKind::Repeat => match action {
                Action::MoveLeft => self.left_seen = Some(held(key.kind, now)),
                Action::MoveRight => self.right_seen = Some(held(key.kind, now)),
                // Ignore auto-repeat so a held Space does not place a stream of blocks.
                Action::Place if key.kind == KeyEventKind::Press => self.place = true,
                Action::Menu if key.kind == KeyEventKind::Press => self.menu = true,
                _ => {}
            },
        }
        action
    }

    fn is_held(&self, seen: Option<HeldKey>, now: Instant) -> bool {
        match seen {
            Some(_) if self.release_events => true,
            Some(k) => now.saturating_duration_since(k.at) <= k.window(),
            None => false,
        }
    }

    /// Snapshot for one tick; one-shot requests are consumed.
    pub fn take_frame(&mut self, now: Instant) -> InputFrame {
        let frame = InputFrame {
            left: self.is_held(self.left_seen, now),
            right: self.is_held(self.right_seen, now),
            place: self.place,
            menu: self.menu,
        };
        self.place = false;
        self.menu = false;
        frame
    }

    /// Forget everything (e.g. on screen changes).
    pub fn clear(&mut self) {
        let release_events = self.release_events;
        *self = Self {
            release_events,
            ..Self::default()
        };
    }
}

fn held(kind: KeyEventKind, at: Instant) -> HeldKey {
    HeldKey {
        at,
        repeating: kind == KeyEventKind::Repeat,
    }
}
