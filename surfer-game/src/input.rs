/// Input levels for one frame. The core derives press edges itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub restart: bool,
    /// Scroll accumulated since the last frame, positive away from the user
    pub scroll: f32,
}

/// Buttons that went from released to pressed between two frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub jump: bool,
    pub restart: bool,
}

impl InputState {
    pub fn edges_since(&self, previous: &InputState) -> Edges {
        Edges {
            jump: self.jump && !previous.jump,
            restart: self.restart && !previous.restart,
        }
    }

    /// -1 for back, 1 for forward, 0 for both or neither.
    pub fn throttle(&self) -> f32 {
        axis(self.back, self.forward)
    }

    /// -1 for left, 1 for right, 0 for both or neither.
    pub fn strafe(&self) -> f32 {
        axis(self.left, self.right)
    }

    pub fn end_frame(&mut self) {
        self.scroll = 0.0;
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    positive as i32 as f32 - negative as i32 as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_fire_only_on_press() {
        let released = InputState::default();
        let held = InputState {
            jump: true,
            ..Default::default()
        };
        assert!(held.edges_since(&released).jump);
        assert!(!held.edges_since(&held).jump);
        assert!(!released.edges_since(&held).jump);
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = InputState {
            left: true,
            right: true,
            forward: true,
            ..Default::default()
        };
        assert_eq!(input.strafe(), 0.0);
        assert_eq!(input.throttle(), 1.0);
    }
}
