//! Logical input and edge latching
//!
//! Platform code writes key transitions into an [`InputLatch`] from any
//! thread; the scheduler snapshots it once per iteration into a
//! [`TickInput`] so a single press is seen by at most one fixed step.

use std::sync::{Arc, Mutex, MutexGuard};

/// Logical keys the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    MoveLeft,
    MoveRight,
    Launch,
    Pause,
    Confirm,
    Back,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::MoveLeft,
        Key::MoveRight,
        Key::Launch,
        Key::Pause,
        Key::Confirm,
        Key::Back,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

const KEY_COUNT: usize = Key::ALL.len();

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    held: [bool; KEY_COUNT],
    pressed: [bool; KEY_COUNT],
}

impl TickInput {
    /// Key is currently held down
    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    /// Key went down since the previous latch
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    /// Builder: mark a key as held
    pub fn hold(mut self, key: Key) -> Self {
        self.held[key.index()] = true;
        self
    }

    /// Builder: mark a key as just pressed (and held)
    pub fn press(mut self, key: Key) -> Self {
        self.held[key.index()] = true;
        self.pressed[key.index()] = true;
        self
    }

    /// Same held state with every edge cleared
    pub fn without_edges(mut self) -> Self {
        self.pressed = [false; KEY_COUNT];
        self
    }

    /// Horizontal intent: -1 left, 1 right, 0 stop (both or neither held)
    pub fn horizontal(&self) -> i8 {
        match (self.is_held(Key::MoveLeft), self.is_held(Key::MoveRight)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Default)]
struct InputState {
    held: [bool; KEY_COUNT],
    pending: [bool; KEY_COUNT],
}

/// Shared, concurrently written key state
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    inner: Arc<Mutex<InputState>>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InputState> {
        // A writer panicking mid-update leaves plain bools behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Key down. Auto-repeat while held does not produce another edge.
    pub fn press(&self, key: Key) {
        let mut state = self.state();
        let i = key.index();
        if !state.held[i] {
            state.pending[i] = true;
        }
        state.held[i] = true;
    }

    pub fn release(&self, key: Key) {
        self.state().held[key.index()] = false;
    }

    /// Press and release in one go: an edge with nothing left held
    pub fn tap(&self, key: Key) {
        self.press(key);
        self.release(key);
    }

    /// Snapshot held keys and consume pending presses
    pub fn latch(&self) -> TickInput {
        let mut state = self.state();
        let input = TickInput {
            held: state.held,
            pressed: state.pending,
        };
        state.pending = [false; KEY_COUNT];
        input
    }

    pub fn reset_all(&self) {
        let mut state = self.state();
        *state = InputState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_latched_once() {
        let latch = InputLatch::new();
        latch.press(Key::Launch);

        let first = latch.latch();
        assert!(first.was_pressed(Key::Launch));
        assert!(first.is_held(Key::Launch));

        let second = latch.latch();
        assert!(!second.was_pressed(Key::Launch));
        assert!(second.is_held(Key::Launch));
    }

    #[test]
    fn test_repeat_while_held_is_not_an_edge() {
        let latch = InputLatch::new();
        latch.press(Key::Pause);
        latch.latch();
        latch.press(Key::Pause);
        assert!(!latch.latch().was_pressed(Key::Pause));

        latch.release(Key::Pause);
        latch.press(Key::Pause);
        assert!(latch.latch().was_pressed(Key::Pause));
    }

    #[test]
    fn test_tap_between_latches_is_kept() {
        let latch = InputLatch::new();
        latch.press(Key::Confirm);
        latch.release(Key::Confirm);
        let input = latch.latch();
        assert!(input.was_pressed(Key::Confirm));
        assert!(!input.is_held(Key::Confirm));
    }

    #[test]
    fn test_horizontal_intent() {
        let none = TickInput::default();
        assert_eq!(none.horizontal(), 0);
        assert_eq!(none.hold(Key::MoveLeft).horizontal(), -1);
        assert_eq!(none.hold(Key::MoveRight).horizontal(), 1);
        assert_eq!(
            none.hold(Key::MoveLeft).hold(Key::MoveRight).horizontal(),
            0
        );
    }

    #[test]
    fn test_without_edges_keeps_held() {
        let input = TickInput::default().press(Key::Launch).hold(Key::MoveLeft);
        let drained = input.without_edges();
        assert!(!drained.was_pressed(Key::Launch));
        assert!(drained.is_held(Key::Launch));
        assert!(drained.is_held(Key::MoveLeft));
    }

    #[test]
    fn test_reset_all() {
        let latch = InputLatch::new();
        latch.press(Key::MoveRight);
        latch.reset_all();
        assert_eq!(latch.latch(), TickInput::default());
    }
}
