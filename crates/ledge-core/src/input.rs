use serde::{Deserialize, Serialize};

/// Logical actions the physics core reads from the host's input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
}

impl Action {
    fn bit(self) -> u8 {
        match self {
            Action::MoveLeft => 1 << 0,
            Action::MoveRight => 1 << 1,
            Action::Jump => 1 << 2,
        }
    }
}

/// Read-only view of the current tick's input intent.
pub trait InputSource {
    /// Whether the action is held this tick.
    fn pressed(&self, action: Action) -> bool;

    /// Whether the action went from released to held this tick.
    fn just_pressed(&self, action: Action) -> bool;

    /// Horizontal intent: -1 (left), 0, or +1 (right). Opposing keys cancel.
    fn move_axis(&self) -> f32 {
        let left = self.pressed(Action::MoveLeft) as i8;
        let right = self.pressed(Action::MoveRight) as i8;
        f32::from(right - left)
    }
}

/// One tick of input intent, recorded as held and just-pressed bitmasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    held: u8,
    just_pressed: u8,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` as held without a press edge.
    pub fn hold(mut self, action: Action) -> Self {
        self.held |= action.bit();
        self
    }

    /// Mark `action` as held and newly pressed this tick.
    pub fn press(mut self, action: Action) -> Self {
        self.held |= action.bit();
        self.just_pressed |= action.bit();
        self
    }

    /// Same held state with every press edge cleared. Used when one frame of
    /// input drives several fixed ticks: the edge belongs to the first tick only.
    pub fn without_edges(self) -> Self {
        Self {
            held: self.held,
            just_pressed: 0,
        }
    }

    /// Fold a newer frame into this one: held state follows `newer`, press
    /// edges from both are kept so a tap between ticks is not lost.
    pub fn accumulate(self, newer: InputFrame) -> Self {
        Self {
            held: newer.held,
            just_pressed: self.just_pressed | newer.just_pressed,
        }
    }
}

impl InputSource for InputFrame {
    fn pressed(&self, action: Action) -> bool {
        self.held & action.bit() != 0
    }

    fn just_pressed(&self, action: Action) -> bool {
        self.just_pressed & action.bit() != 0
    }
}

/// Derives press edges from raw held state sampled once per tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InputTracker {
    previous: u8,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build this tick's frame from the actions currently held.
    pub fn sample(&mut self, held: &[Action]) -> InputFrame {
        let mask = held.iter().fold(0u8, |acc, a| acc | a.bit());
        let frame = InputFrame {
            held: mask,
            just_pressed: mask & !self.previous,
        };
        self.previous = mask;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_implies_held() {
        let frame = InputFrame::new().press(Action::Jump);
        assert!(frame.pressed(Action::Jump));
        assert!(frame.just_pressed(Action::Jump));
        assert!(!frame.pressed(Action::MoveLeft));
    }

    #[test]
    fn opposing_directions_cancel() {
        let frame = InputFrame::new()
            .hold(Action::MoveLeft)
            .hold(Action::MoveRight);
        assert_eq!(frame.move_axis(), 0.0);
        assert_eq!(InputFrame::new().hold(Action::MoveLeft).move_axis(), -1.0);
        assert_eq!(InputFrame::new().hold(Action::MoveRight).move_axis(), 1.0);
    }

    #[test]
    fn tracker_reports_edge_once() {
        let mut tracker = InputTracker::new();
        let first = tracker.sample(&[Action::Jump]);
        let second = tracker.sample(&[Action::Jump]);
        let released = tracker.sample(&[]);
        let again = tracker.sample(&[Action::Jump, Action::MoveRight]);

        assert!(first.just_pressed(Action::Jump));
        assert!(!second.just_pressed(Action::Jump));
        assert!(second.pressed(Action::Jump));
        assert!(!released.pressed(Action::Jump));
        assert!(again.just_pressed(Action::Jump));
        assert!(again.just_pressed(Action::MoveRight));
    }

    #[test]
    fn without_edges_keeps_held_state() {
        let frame = InputFrame::new().press(Action::Jump).without_edges();
        assert!(frame.pressed(Action::Jump));
        assert!(!frame.just_pressed(Action::Jump));
    }

    #[test]
    fn accumulate_keeps_tap_released_before_tick() {
        let tapped = InputFrame::new().press(Action::Jump);
        let released = InputFrame::new().hold(Action::MoveLeft);
        let merged = tapped.accumulate(released);
        assert!(merged.just_pressed(Action::Jump));
        assert!(!merged.pressed(Action::Jump));
        assert!(merged.pressed(Action::MoveLeft));
    }
}
