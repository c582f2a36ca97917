use serde::Serialize;

/// Position within the scene sequence. Moves are clamped to
/// `0..scene_count`; each move reports whether the index changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    current: usize,
    scene_count: usize,
}

impl NavigationState {
    pub fn new(scene_count: usize) -> Self {
        Self {
            current: 0,
            scene_count: scene_count.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn scene_count(&self) -> usize {
        self.scene_count
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.scene_count
    }

    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn jump(&mut self, index: usize) -> bool {
        let target = index.min(self.scene_count - 1);
        if target == self.current {
            return false;
        }
        self.current = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_at_both_ends() {
        let mut nav = NavigationState::new(6);
        assert!(!nav.prev());
        assert_eq!(nav.current(), 0);
        for _ in 0..5 {
            assert!(nav.next());
        }
        assert_eq!(nav.current(), 5);
        assert!(!nav.next());
        assert_eq!(nav.current(), 5);
        assert!(nav.is_last());
    }

    #[test]
    fn jump_clamps_to_last_scene() {
        let mut nav = NavigationState::new(3);
        assert!(nav.jump(7));
        assert_eq!(nav.current(), 2);
        assert!(!nav.jump(2));
        assert!(nav.jump(0));
        assert!(nav.is_first());
    }

    #[test]
    fn zero_scenes_still_yields_one_position() {
        let nav = NavigationState::new(0);
        assert_eq!(nav.scene_count(), 1);
        assert!(nav.is_first() && nav.is_last());
    }
}
