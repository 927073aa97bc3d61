pub mod config;
pub mod geom;
pub mod input;
pub mod roles;
pub mod time;

pub use geom::{Aabb, Body, Vec2};
pub use input::{Action, InputFrame, InputSource, InputTracker};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::input::{Action, InputFrame};

    /// Input frame with nothing held.
    pub fn idle() -> InputFrame {
        InputFrame::new()
    }

    /// Input frame holding every action in `actions`, with no press edges.
    pub fn held(actions: &[Action]) -> InputFrame {
        actions.iter().fold(InputFrame::new(), |f, &a| f.hold(a))
    }

    /// Input frame where jump is pressed this tick, plus any held actions.
    pub fn jump_tap(actions: &[Action]) -> InputFrame {
        held(actions).press(Action::Jump)
    }

    /// Assert two floats are within `eps` of each other.
    #[track_caller]
    pub fn assert_close(actual: f32, expected: f32, eps: f32, what: &str) {
        assert!(
            (actual - expected).abs() <= eps,
            "{what}: expected {expected} (±{eps}), got {actual}"
        );
    }
}
