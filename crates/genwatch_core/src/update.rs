use crate::{AppState, CacheTarget, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::GenerationSubmitted => state.submit(&mut effects),
        // Push and poll share one ordering rule; the source is informational.
        Msg::JobObserved { update, .. } => state.observe(update, &mut effects),
        Msg::ActiveJobFetched(Some(job)) => state.observe(job.into(), &mut effects),
        Msg::ActiveJobFetched(None) => {
            // Jobs still believed active are settled by their own watchers.
        }
        Msg::WatchRequested(job_id) => state.request_watch(job_id, &mut effects),
        Msg::TimerElapsed { timer, generation } => {
            let before = state.indicator().clone();
            state
                .indicator_mut()
                .timer_elapsed(timer, generation, &mut effects);
            if *state.indicator() != before {
                state.mark_dirty();
            }
        }
        Msg::Scrolled { offset } => {
            let was_hidden = state.indicator().hidden_by_scroll();
            state.indicator_mut().scrolled(offset);
            if state.indicator().hidden_by_scroll() != was_hidden {
                state.mark_dirty();
            }
        }
        Msg::LikesLoaded(entries) => {
            for (publication_id, like) in entries {
                state.likes_mut().seed(publication_id, like);
            }
            state.mark_dirty();
        }
        Msg::LikeClicked(publication_id) => {
            if let Some(next) = state.likes_mut().begin(&publication_id) {
                effects.push(Effect::SendLike {
                    publication_id,
                    liked: next.liked,
                });
                state.mark_dirty();
            }
        }
        Msg::LikeSettled {
            publication_id,
            accepted,
        } => {
            if state.likes_mut().settle(&publication_id, accepted).is_some() && !accepted {
                state.mark_dirty();
            }
        }
        Msg::FollowsLoaded(entries) => {
            for (user_id, follow) in entries {
                state.follows_mut().seed(user_id, follow);
            }
            state.mark_dirty();
        }
        Msg::FollowClicked(user_id) => {
            if let Some(next) = state.follows_mut().begin(&user_id) {
                effects.push(Effect::SendFollow {
                    user_id,
                    following: next.following,
                });
                state.mark_dirty();
            }
        }
        Msg::FollowSettled { user_id, accepted } => {
            if state.follows_mut().settle(&user_id, accepted).is_some() && !accepted {
                state.mark_dirty();
            }
        }
        Msg::PublishRequested(job_id) => {
            if state.begin_publish(&job_id) {
                effects.push(Effect::Publish(job_id));
                state.mark_dirty();
            }
        }
        Msg::PublishSettled { job_id, accepted } => {
            if let Some(job) = state.finish_publish(&job_id, accepted) {
                effects.push(Effect::CacheJob(job));
                effects.push(Effect::Invalidate(CacheTarget::GenerationHistory));
                effects.push(Effect::Invalidate(CacheTarget::Publications));
            }
            state.mark_dirty();
        }
    }

    state.sync_active_polling(&mut effects);
    (state, effects)
}
