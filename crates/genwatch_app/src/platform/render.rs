use genwatch_core::{AppViewModel, IndicatorView, Phase};

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![render_indicator(&view.indicator)];

    if let Some(job) = &view.active_job {
        let service = job
            .service
            .map_or_else(|| "-".to_string(), |service| service.to_string());
        lines.push(format!("active job {} [{}] via {}", job.id, job.status, service));
    }
    for (publication_id, like) in &view.likes {
        let mark = if like.liked { "liked" } else { "not liked" };
        lines.push(format!("publication {publication_id}: {mark}, {} likes", like.like_count));
    }
    for (user_id, follow) in &view.follows {
        let mark = if follow.following { "following" } else { "not following" };
        lines.push(format!("user {user_id}: {mark}"));
    }
    if !view.publishing.is_empty() {
        let ids: Vec<String> = view.publishing.iter().map(ToString::to_string).collect();
        lines.push(format!("publishing {}", ids.join(", ")));
    }
    lines
}

fn render_indicator(indicator: &IndicatorView) -> String {
    if !indicator.is_visible() {
        return "indicator: hidden".to_string();
    }
    let mut text = format!("indicator: {}", indicator.message);
    if let Some(job_id) = &indicator.job_id {
        text.push_str(&format!(" (job {job_id})"));
    }
    if let (Phase::Failed, Some(error)) = (indicator.phase, &indicator.error) {
        text.push_str(&format!(": {error}"));
    }
    if indicator.minimized {
        text.push_str(" [minimized]");
    }
    if indicator.hidden_by_scroll {
        text.push_str(" [scrolled away]");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use genwatch_core::{JobId, LikeState};
    use pretty_assertions::assert_eq;

    #[test]
    fn idle_indicator_is_hidden() {
        let lines = render(&AppViewModel::default());
        assert_eq!(lines, vec!["indicator: hidden".to_string()]);
    }

    #[test]
    fn failed_indicator_shows_provider_error() {
        let view = AppViewModel {
            indicator: IndicatorView {
                phase: Phase::Failed,
                job_id: Some(JobId::from("j1")),
                message: Phase::Failed.message(),
                error: Some("quota exceeded".to_string()),
                ..IndicatorView::default()
            },
            likes: vec![(
                "p1".to_string(),
                LikeState {
                    liked: true,
                    like_count: 2,
                },
            )],
            ..AppViewModel::default()
        };

        assert_eq!(
            render(&view),
            vec![
                "indicator: Generation failed. (job j1): quota exceeded".to_string(),
                "publication p1: liked, 2 likes".to_string(),
            ]
        );
    }
}
