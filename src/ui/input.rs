/// Keyboard state tracker.
///
/// Terminals report key presses, not key states, so "held" is inferred:
///   - a key is held from its Press until its Release, when the terminal
///     reports releases (keyboard enhancement confirmed)
///   - otherwise until `HOLD_TIMEOUT` passes without a Press/Repeat
///
/// Fresh presses (not held → held) are kept per frame for the edge-triggered
/// actions: jump, attack, restart.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use clockrunner::domain::vec2::Vec2;
use clockrunner::sim::ports::FrameInput;

use super::gamepad::GamepadState;

/// Without release events a key counts as held this long after its last repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_ATTACK: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J'), KeyCode::Char('x'), KeyCode::Char('X')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
    /// Trust Release events. Only set once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain every pending terminal event. Call once per frame, before the frame tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        if !self.honor_release {
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    fn apply(&mut self, key: KeyEvent, at: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'C')) {
            self.ctrl_c = true;
        }
        match key.kind {
            KeyEventKind::Release => {
                if self.honor_release { self.last_active.remove(&key.code); }
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, at);
                if !was_held { self.fresh_presses.push(key.code); }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => t.elapsed() < HOLD_TIMEOUT,
            None => false,
        }
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Edge trigger: pressed this frame.
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }
}

/// Merge keyboard and gamepad into one frame's input.
/// The stick wins over keys when it is deflected at all; the player's own
/// deadzone decides whether that deflection moves anything.
pub fn frame_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let mut x = gp.axis_x();
    if x == 0.0 {
        if kb.any_held(KEYS_LEFT) { x -= 1.0; }
        if kb.any_held(KEYS_RIGHT) { x += 1.0; }
    }
    FrameInput {
        axis: Vec2::new(x, 0.0),
        jump_pressed: kb.any_pressed(KEYS_JUMP) || gp.jump_pressed(),
        attack_pressed: kb.any_pressed(KEYS_ATTACK) || gp.attack_pressed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut kb = InputState::new();
        let t = Instant::now();
        kb.apply(press(KeyCode::Char('j')), t);
        assert!(kb.any_pressed(KEYS_ATTACK));
        kb.fresh_presses.clear();
        kb.apply(press(KeyCode::Char('j')), t);
        assert!(!kb.any_pressed(KEYS_ATTACK));
        assert!(kb.any_held(KEYS_ATTACK));
    }

    #[test]
    fn release_honored_when_enabled() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        kb.apply(press(KeyCode::Left), Instant::now());
        assert!(kb.any_held(KEYS_LEFT));
        let mut up = press(KeyCode::Left);
        up.kind = KeyEventKind::Release;
        kb.apply(up, Instant::now());
        assert!(!kb.any_held(KEYS_LEFT));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut kb = InputState::new();
        kb.apply(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut kb = InputState::new();
        let gp = GamepadState::disconnected();
        let t = Instant::now();
        kb.apply(press(KeyCode::Left), t);
        kb.apply(press(KeyCode::Right), t);
        assert_eq!(frame_input(&kb, &gp).axis.x, 0.0);
    }

    #[test]
    fn keys_map_to_actions() {
        let mut kb = InputState::new();
        let gp = GamepadState::disconnected();
        kb.apply(press(KeyCode::Char(' ')), Instant::now());
        kb.apply(press(KeyCode::Char('d')), Instant::now());
        let input = frame_input(&kb, &gp);
        assert!(input.jump_pressed);
        assert!(!input.attack_pressed);
        assert_eq!(input.axis.x, 1.0);
    }
}
