use genwatch_core::{update, AppState, EventSource, JobStatus, JobUpdate, Msg, TimerKind};

#[test]
fn stale_timer_leaves_state_untouched() {
    let (state, _) = update(AppState::new(), Msg::GenerationSubmitted);
    let (mut state, _) = update(
        state,
        Msg::JobObserved {
            source: EventSource::Push,
            update: JobUpdate::status("j1", JobStatus::Processing),
        },
    );
    assert!(state.consume_dirty());
    let generation = state.indicator().generation();

    for timer in [TimerKind::Minimize, TimerKind::Dwell] {
        let (mut next, effects) = update(
            state.clone(),
            Msg::TimerElapsed {
                timer,
                generation: generation - 1,
            },
        );
        assert!(effects.is_empty(), "{timer:?}");
        assert!(!next.consume_dirty(), "{timer:?}");
        assert_eq!(next, state);
    }
}
