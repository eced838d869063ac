//! WeeklyScheduler: runs the full cross-product match once a week.
//!
//! The scheduler is an explicit state object: `Idle` with no timer, or
//! `Armed` with exactly one outstanding timer task. The first run fires at
//! the next configured weekday/hour/minute in a fixed UTC offset. Every later
//! run fires exactly 7×24h after the previous fire instant and is not
//! recomputed from the calendar. Daylight-saving changes in the operator's
//! local time are therefore not followed after the first run.
//!
//! A failed run is logged and the next one is still armed. `stop` prevents
//! future runs but never interrupts one already in progress.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Result};
use async_trait::async_trait;
use chrono::{
    DateTime, Datelike, Duration as ChronoDuration, FixedOffset, NaiveTime, Utc, Weekday,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::matching::runner::{BatchMatchRunner, BatchReport, RunError};

pub const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Work fired by the scheduler. Implemented by `BatchMatchRunner`.
#[async_trait]
pub trait MatchJob: Send + Sync {
    async fn run(&self) -> Result<BatchReport, RunError>;
}

#[async_trait]
impl MatchJob for BatchMatchRunner {
    async fn run(&self) -> Result<BatchReport, RunError> {
        self.run_all().await
    }
}

/// Weekday/hour/minute at which the weekly run fires, in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    at: NaiveTime,
    offset: FixedOffset,
}

impl WeeklySchedule {
    /// `day_of_week` counts from Sunday = 0 through Saturday = 6.
    pub fn new(day_of_week: u32, hour: u32, minute: u32, utc_offset_minutes: i32) -> Result<Self> {
        ensure!(
            day_of_week <= 6,
            "day of week must be 0-6 (0 = Sunday), got {day_of_week}"
        );
        ensure!(hour <= 23, "hour must be 0-23, got {hour}");
        ensure!(minute <= 59, "minute must be 0-59, got {minute}");

        let weekday = match day_of_week {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        };
        let at = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid time {hour:02}:{minute:02}"))?;
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow::anyhow!("UTC offset out of range: {utc_offset_minutes} minutes")
            })?;

        Ok(Self {
            weekday,
            at,
            offset,
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The next instant strictly after `now` that falls on the scheduled
    /// weekday and time. If that slot is today but at or before `now`
    /// (including the current minute), the run rolls to the same slot next week.
    pub fn next_run_after(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let now = now.with_timezone(&self.offset);
        let today = now.date_naive();

        let mut days_ahead = (self.weekday.num_days_from_sunday() + 7
            - today.weekday().num_days_from_sunday())
            % 7;
        if days_ahead == 0 && today.and_time(self.at) <= now.naive_local() {
            days_ahead = 7;
        }

        let target = (today + ChronoDuration::days(i64::from(days_ahead))).and_time(self.at);
        now + (target - now.naive_local())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Idle,
    Armed,
}

struct ArmedTimer {
    first_run_at: DateTime<FixedOffset>,
    stop_tx: oneshot::Sender<()>,
    // Kept so the task is owned by the scheduler; stopping never aborts it.
    _task: JoinHandle<()>,
}

pub struct WeeklyScheduler {
    schedule: WeeklySchedule,
    armed: Option<ArmedTimer>,
}

impl WeeklyScheduler {
    pub fn new(schedule: WeeklySchedule) -> Self {
        Self {
            schedule,
            armed: None,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        if self.armed.is_some() {
            SchedulerStatus::Armed
        } else {
            SchedulerStatus::Idle
        }
    }

    /// When the first run of the current arming fires, if armed.
    pub fn first_run_at(&self) -> Option<DateTime<FixedOffset>> {
        self.armed.as_ref().map(|a| a.first_run_at)
    }

    pub fn start(&mut self, job: Arc<dyn MatchJob>) {
        let now = Utc::now().with_timezone(&self.schedule.offset());
        self.start_from(now, job);
    }

    /// Arms the timer as if the current time were `now`. No-op when already armed.
    pub fn start_from(&mut self, now: DateTime<FixedOffset>, job: Arc<dyn MatchJob>) {
        if self.armed.is_some() {
            warn!("Weekly match scheduler already armed; ignoring start");
            return;
        }

        let first_run_at = self.schedule.next_run_after(now);
        let first_delay = (first_run_at - now).to_std().unwrap_or(Duration::ZERO);
        info!("Weekly match run scheduled @ {}", first_run_at.to_rfc3339());

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(job, Instant::now() + first_delay, stop_rx));

        self.armed = Some(ArmedTimer {
            first_run_at,
            stop_tx,
            _task: task,
        });
    }

    /// Cancels the outstanding timer and returns to `Idle`.
    /// A run that is already executing completes; no further run is armed.
    pub fn stop(&mut self) {
        if let Some(armed) = self.armed.take() {
            let _ = armed.stop_tx.send(());
            info!("Weekly match scheduler stopped");
        }
    }
}

async fn run_loop(
    job: Arc<dyn MatchJob>,
    mut fire_at: Instant,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            // Resolves on an explicit stop and when the scheduler is dropped.
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep_until(fire_at) => {}
        }

        run_scheduled(job.as_ref()).await;

        fire_at += WEEK;
        info!(
            "Next weekly match run in {}h",
            fire_at.saturating_duration_since(Instant::now()).as_secs() / 3600
        );
    }
}

/// Runs one scheduled batch and logs its outcome. Never fails.
async fn run_scheduled(job: &dyn MatchJob) {
    let started_at = Utc::now();
    let clock = Instant::now();
    info!("Weekly match run start @ {}", started_at.to_rfc3339());

    match job.run().await {
        Ok(report) => {
            info!(
                "Weekly match run results: subjects={}, targets={}, comparisons={}, matches={}, cached={}, new={}, failed={}",
                report.total_subjects,
                report.total_targets,
                report.total_comparisons,
                report.total_matches,
                report.cached_comparisons,
                report.new_comparisons,
                report.failed_comparisons
            );
            for subject in &report.subject_matches {
                info!(
                    "Subject {}: {} matches",
                    subject.subject_id, subject.match_count
                );
            }
        }
        Err(e) => error!("Weekly match run failed: {e}"),
    }

    info!(
        "Weekly match run end @ {} ({:.2}s)",
        Utc::now().to_rfc3339(),
        clock.elapsed().as_secs_f64()
    );
}
