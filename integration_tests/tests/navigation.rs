mod common;

use proptest::prelude::*;
use story_core::{update, AppEvent, Effect, NavigationState, Update};

#[test]
fn six_scene_walkthrough_clamps_at_both_ends() {
    let state = common::fixture_state().expect("fixture state");
    assert_eq!(state.navigation().scene_count(), 6);

    let Update { mut state, effect } = update(state, AppEvent::Prev);
    assert_eq!(effect, Effect::None);
    assert_eq!(state.navigation().current(), 0);

    for _ in 0..5 {
        let step = update(state, AppEvent::Next);
        assert_eq!(step.effect, Effect::Rerender);
        state = step.state;
    }
    assert_eq!(state.navigation().current(), 5);
    assert_eq!(state.current_scene().id, "explore");

    let Update { state, effect } = update(state, AppEvent::Next);
    assert_eq!(effect, Effect::None);
    assert_eq!(state.navigation().current(), 5);
}

#[test]
fn jump_past_the_end_lands_on_last_scene() {
    let state = common::fixture_state().expect("fixture state");
    let Update { state, effect } = update(state, AppEvent::JumpTo(40));
    assert_eq!(effect, Effect::Rerender);
    assert!(state.navigation().is_last());
}

proptest! {
    #[test]
    fn repeated_next_never_passes_last_scene(count in 1usize..12, presses in 0usize..64) {
        let mut navigation = NavigationState::new(count);
        for _ in 0..presses {
            navigation.next();
            prop_assert!(navigation.current() <= count - 1);
        }
        prop_assert_eq!(navigation.current(), presses.min(count - 1));
    }

    #[test]
    fn repeated_prev_never_goes_below_zero(
        count in 1usize..12,
        start in 0usize..12,
        presses in 0usize..64,
    ) {
        let mut navigation = NavigationState::new(count);
        navigation.jump(start);
        let from = navigation.current();
        for _ in 0..presses {
            navigation.prev();
        }
        prop_assert_eq!(navigation.current(), from.saturating_sub(presses));
    }

    #[test]
    fn reducer_navigation_stays_in_range(steps in proptest::collection::vec(any::<bool>(), 0..40)) {
        let mut state = common::fixture_state().expect("fixture state");
        for forward in steps {
            let event = if forward { AppEvent::Next } else { AppEvent::Prev };
            state = update(state, event).state;
            prop_assert!(state.navigation().current() < state.navigation().scene_count());
        }
    }
}
