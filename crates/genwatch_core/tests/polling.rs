use genwatch_core::{
    update, AppState, Effect, EventSource, Job, JobId, JobStatus, JobUpdate, Msg, Phase,
};

fn job(id: &str, status: JobStatus) -> Job {
    Job::new(JobId::from(id), status)
}

fn poll(state: AppState, update_: JobUpdate) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::JobObserved {
            source: EventSource::Poll,
            update: update_,
        },
    )
}

#[test]
fn empty_initial_fetch_stays_idle_without_polling() {
    let (mut state, effects) = update(AppState::new(), Msg::ActiveJobFetched(None));

    assert!(effects.is_empty());
    assert!(!state.is_active_polling());
    assert_eq!(state.view().indicator.phase, Phase::Idle);
    assert!(!state.consume_dirty());
}

#[test]
fn active_job_on_initial_load_shows_pending_and_polls() {
    let (state, effects) = update(
        AppState::new(),
        Msg::ActiveJobFetched(Some(job("j1", JobStatus::Pending))),
    );

    assert_eq!(state.view().indicator.phase, Phase::Pending);
    assert_eq!(
        state.view().active_job.map(|job| job.id),
        Some(JobId::from("j1"))
    );
    assert!(effects.contains(&Effect::WatchJob(JobId::from("j1"))));
    assert!(effects.contains(&Effect::StartActivePolling));
    assert!(state.is_active_polling());
}

#[test]
fn terminal_initial_fetch_short_circuits_polling() {
    let (state, effects) = update(
        AppState::new(),
        Msg::ActiveJobFetched(Some(job("fast", JobStatus::Completed))),
    );

    assert!(!effects.contains(&Effect::StartActivePolling));
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::WatchJob(_))));
    assert_eq!(state.tracker().status(&JobId::from("fast")), Some(JobStatus::Completed));
    assert_eq!(state.view().indicator.phase, Phase::Idle);
}

#[test]
fn submission_polls_until_the_job_settles() {
    let (state, effects) = update(AppState::new(), Msg::GenerationSubmitted);
    assert!(effects.contains(&Effect::StartActivePolling));

    let (state, effects) = update(
        state,
        Msg::ActiveJobFetched(Some(job("j1", JobStatus::Pending))),
    );
    assert!(!effects.contains(&Effect::StartActivePolling));
    assert!(effects.contains(&Effect::WatchJob(JobId::from("j1"))));

    let (state, effects) = poll(state, JobUpdate::status("j1", JobStatus::Processing));
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::WatchJob(_) | Effect::StopActivePolling)));

    let (state, effects) = poll(state, JobUpdate::status("j1", JobStatus::Completed));
    assert!(effects.contains(&Effect::UnwatchJob(JobId::from("j1"))));
    assert!(effects.contains(&Effect::StopActivePolling));
    assert!(!state.is_active_polling());
    assert!(!state.is_watching(&JobId::from("j1")));
}

#[test]
fn late_poll_after_push_terminal_changes_nothing() {
    let (state, _) = poll(AppState::new(), JobUpdate::status("j1", JobStatus::Processing));
    let (state, _) = update(
        state,
        Msg::JobObserved {
            source: EventSource::Push,
            update: JobUpdate::status("j1", JobStatus::Failed),
        },
    );

    let (state, effects) = poll(state, JobUpdate::status("j1", JobStatus::Processing));
    assert!(effects.is_empty());
    assert_eq!(state.tracker().status(&JobId::from("j1")), Some(JobStatus::Failed));
}

#[test]
fn in_flight_poll_completes_a_bare_completed_push() {
    let (state, _) = poll(AppState::new(), JobUpdate::status("j1", JobStatus::Processing));
    let (mut state, effects) = update(
        state,
        Msg::JobObserved {
            source: EventSource::Push,
            update: JobUpdate::status("j1", JobStatus::Completed),
        },
    );
    assert!(effects.contains(&Effect::UnwatchJob(JobId::from("j1"))));
    assert!(state.consume_dirty());

    let mut polled = job("j1", JobStatus::Completed);
    polled.result_url = Some("/r/1.png".to_string());
    let (mut state, effects) = poll(state, polled.into());

    assert!(state.consume_dirty());
    assert_eq!(effects.len(), 1, "{effects:?}");
    let Effect::CacheJob(cached) = &effects[0] else {
        panic!("expected a cache write, got {effects:?}");
    };
    assert_eq!(cached.result_url.as_deref(), Some("/r/1.png"));
    assert_eq!(
        state.tracker().job(&JobId::from("j1")).unwrap().result_url.as_deref(),
        Some("/r/1.png")
    );
}

#[test]
fn explicit_watch_only_for_unfinished_jobs() {
    let (state, effects) = update(AppState::new(), Msg::WatchRequested(JobId::from("j5")));
    assert_eq!(effects, vec![Effect::WatchJob(JobId::from("j5"))]);

    let (state, effects) = update(state, Msg::WatchRequested(JobId::from("j5")));
    assert!(effects.is_empty());

    let (state, effects) = poll(state, JobUpdate::status("j5", JobStatus::Completed));
    assert!(effects.contains(&Effect::UnwatchJob(JobId::from("j5"))));

    let (_, effects) = update(state, Msg::WatchRequested(JobId::from("j5")));
    assert!(effects.is_empty());
}

#[test]
fn publish_requires_completed_job_and_guards_reentry() {
    let (state, effects) = update(AppState::new(), Msg::PublishRequested(JobId::from("j1")));
    assert!(effects.is_empty());

    let (state, _) = poll(state, JobUpdate::status("j1", JobStatus::Processing));
    let (state, effects) = update(state, Msg::PublishRequested(JobId::from("j1")));
    assert!(effects.is_empty());

    let (state, _) = poll(state, JobUpdate::status("j1", JobStatus::Completed));
    let (state, effects) = update(state, Msg::PublishRequested(JobId::from("j1")));
    assert_eq!(effects, vec![Effect::Publish(JobId::from("j1"))]);
    assert_eq!(state.view().publishing, vec![JobId::from("j1")]);

    let (state, effects) = update(state, Msg::PublishRequested(JobId::from("j1")));
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::PublishSettled {
            job_id: JobId::from("j1"),
            accepted: true,
        },
    );
    assert!(effects.contains(&Effect::Invalidate(
        genwatch_core::CacheTarget::GenerationHistory
    )));
    assert!(effects.contains(&Effect::Invalidate(genwatch_core::CacheTarget::Publications)));
    assert!(state.tracker().job(&JobId::from("j1")).unwrap().is_published);

    let (_, effects) = update(state, Msg::PublishRequested(JobId::from("j1")));
    assert!(effects.is_empty());
}

#[test]
fn rejected_publish_leaves_job_unpublished() {
    let (state, _) = poll(AppState::new(), JobUpdate::status("j1", JobStatus::Completed));
    let (state, _) = update(state, Msg::PublishRequested(JobId::from("j1")));
    let (state, effects) = update(
        state,
        Msg::PublishSettled {
            job_id: JobId::from("j1"),
            accepted: false,
        },
    );

    assert!(effects.is_empty());
    assert!(!state.tracker().job(&JobId::from("j1")).unwrap().is_published);
    assert!(state.view().publishing.is_empty());
}
