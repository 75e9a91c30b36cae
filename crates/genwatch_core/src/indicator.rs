use std::collections::VecDeque;
use std::time::Duration;

use crate::{Effect, JobId, JobStatus};

/// How long a completed/failed result stays on screen.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(4_500);
/// How long a pending/processing indicator stays expanded.
pub const DEFAULT_MINIMIZE_AFTER: Duration = Duration::from_secs(8);
/// Downward scroll, in pixels, needed between two samples to hide the indicator.
pub const DEFAULT_SCROLL_THRESHOLD: i64 = 10;

// Superseded or finished jobs whose late events must not resurface.
const SETTLED_MEMORY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    pub fn is_running(self) -> bool {
        matches!(self, Phase::Pending | Phase::Processing)
    }

    pub fn message(self) -> &'static str {
        match self {
            Phase::Idle => "",
            Phase::Pending => "Queued...",
            Phase::Processing => "Generating magic...",
            Phase::Completed => "Generation complete!",
            Phase::Failed => "Generation failed.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Returns a completed/failed indicator to idle.
    Dwell,
    /// Collapses a long-running pending/processing indicator.
    Minimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub dwell: Duration,
    pub minimize_after: Duration,
    pub scroll_threshold: i64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            dwell: DEFAULT_DWELL,
            minimize_after: DEFAULT_MINIMIZE_AFTER,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }
}

/// Status indicator: a phase plus two orthogonal presentation flags.
///
/// Every phase change bumps `generation`. Timers are armed with the
/// generation current at the time, and a timer whose generation has moved on
/// is ignored when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Indicator {
    settings: IndicatorSettings,
    phase: Phase,
    tracked: Option<JobId>,
    minimized: bool,
    hidden_by_scroll: bool,
    last_scroll: Option<i64>,
    generation: u64,
    error: Option<String>,
    settled: VecDeque<JobId>,
}

impl Indicator {
    pub fn new(settings: IndicatorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tracked(&self) -> Option<&JobId> {
        self.tracked.as_ref()
    }

    pub fn minimized(&self) -> bool {
        self.minimized
    }

    pub fn hidden_by_scroll(&self) -> bool {
        self.hidden_by_scroll
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A submission was announced and no job record exists for it yet.
    pub fn awaiting_job(&self) -> bool {
        self.phase == Phase::Pending && self.tracked.is_none()
    }

    /// The user submitted a new generation. The last submission always wins.
    pub fn submitted(&mut self, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.tracked.take() {
            self.settle(previous);
        }
        self.minimized = false;
        self.error = None;
        effects.push(Effect::CancelTimer(TimerKind::Dwell));
        self.enter(Phase::Pending, effects);
    }

    /// An accepted status transition for `job_id`.
    pub fn observed(
        &mut self,
        job_id: &JobId,
        status: JobStatus,
        error: Option<&str>,
        effects: &mut Vec<Effect>,
    ) {
        if self.settled.contains(job_id) {
            return;
        }
        match &self.tracked {
            Some(tracked) if tracked != job_id => return,
            Some(_) => {}
            None => {
                let adoptable = match self.phase {
                    Phase::Idle => !status.is_terminal(),
                    Phase::Pending => true,
                    // A terminal phase is owned by the job it shows.
                    Phase::Processing | Phase::Completed | Phase::Failed => false,
                };
                if !adoptable {
                    return;
                }
                self.tracked = Some(job_id.clone());
            }
        }

        match (self.phase, status) {
            (Phase::Idle, JobStatus::Pending) => self.enter(Phase::Pending, effects),
            (Phase::Idle | Phase::Pending, JobStatus::Processing) => {
                self.enter(Phase::Processing, effects)
            }
            (Phase::Pending | Phase::Processing, JobStatus::Completed) => {
                self.settle(job_id.clone());
                self.enter(Phase::Completed, effects);
            }
            (Phase::Pending | Phase::Processing, JobStatus::Failed) => {
                self.error = error.map(ToOwned::to_owned);
                self.settle(job_id.clone());
                self.enter(Phase::Failed, effects);
            }
            _ => {}
        }
    }

    pub fn timer_elapsed(&mut self, timer: TimerKind, generation: u64, effects: &mut Vec<Effect>) {
        if generation != self.generation {
            return;
        }
        match timer {
            TimerKind::Dwell if self.phase.is_terminal() => self.enter(Phase::Idle, effects),
            TimerKind::Minimize if self.phase.is_running() => self.minimized = true,
            TimerKind::Dwell | TimerKind::Minimize => {}
        }
    }

    /// Compares a scroll sample with the previous one.
    pub fn scrolled(&mut self, offset: i64) {
        let delta = self.last_scroll.map_or(0, |last| offset - last);
        self.hidden_by_scroll = delta > self.settings.scroll_threshold;
        self.last_scroll = Some(offset);
    }

    fn enter(&mut self, phase: Phase, effects: &mut Vec<Effect>) {
        self.generation += 1;
        self.phase = phase;
        match phase {
            Phase::Pending | Phase::Processing => {
                effects.push(Effect::ScheduleTimer {
                    timer: TimerKind::Minimize,
                    generation: self.generation,
                    after: self.settings.minimize_after,
                });
            }
            Phase::Completed | Phase::Failed => {
                self.minimized = false;
                effects.push(Effect::CancelTimer(TimerKind::Minimize));
                effects.push(Effect::ScheduleTimer {
                    timer: TimerKind::Dwell,
                    generation: self.generation,
                    after: self.settings.dwell,
                });
            }
            Phase::Idle => {
                self.minimized = false;
                self.tracked = None;
                self.error = None;
                effects.push(Effect::CancelTimer(TimerKind::Minimize));
            }
        }
    }

    fn settle(&mut self, job_id: JobId) {
        if self.settled.contains(&job_id) {
            return;
        }
        if self.settled.len() == SETTLED_MEMORY {
            self.settled.pop_front();
        }
        self.settled.push_back(job_id);
    }
}
