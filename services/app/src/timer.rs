//! services/app/src/timer.rs
//!
//! The pomodoro timer: a work/break state machine advanced one second per
//! `tick`, and an async runner that drives it on a tokio interval and records
//! finished work intervals through the `Session`.

use serde::Serialize;
use std::time::Duration;
use study_focus_core::{PortResult, Session};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Emitted by `tick` when a phase runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerEvent {
    WorkCompleted { minutes: u32 },
    BreakCompleted,
}

#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    work_minutes: u32,
    break_minutes: u32,
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    completed_work: u32,
}

impl PomodoroTimer {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            work_minutes,
            break_minutes,
            phase: Phase::Work,
            remaining_secs: work_minutes.saturating_mul(60),
            running: false,
            completed_work: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Work intervals finished since the timer was created.
    pub fn completed_work(&self) -> u32 {
        self.completed_work
    }

    /// `MM:SS` of the time left in the current phase.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to a stopped, full-length work phase.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_secs = self.work_minutes.saturating_mul(60);
    }

    /// Advances one second. When the phase runs out the timer stops and is
    /// primed with the next phase.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        self.running = false;
        match self.phase {
            Phase::Work => {
                self.completed_work += 1;
                self.phase = Phase::Break;
                self.remaining_secs = self.break_minutes.saturating_mul(60);
                Some(TimerEvent::WorkCompleted {
                    minutes: self.work_minutes,
                })
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.remaining_secs = self.work_minutes.saturating_mul(60);
                Some(TimerEvent::BreakCompleted)
            }
        }
    }
}

/// Starts `timer` and ticks it every `period` until the current phase ends or
/// `cancel` fires.
///
/// A finished work interval is logged and awarded through `session` before
/// this returns, so store writes never overlap. On cancellation the timer is
/// paused where it stood and `None` is returned.
pub async fn run_phase(
    session: &Session,
    timer: &mut PomodoroTimer,
    period: Duration,
    cancel: &CancellationToken,
) -> PortResult<Option<TimerEvent>> {
    timer.start();
    info!(phase = ?timer.phase(), remaining = %timer.display(), "timer started");

    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                timer.pause();
                info!(remaining = %timer.display(), "timer cancelled");
                return Ok(None);
            }
            _ = ticks.tick() => {
                let Some(event) = timer.tick() else {
                    continue;
                };
                if let TimerEvent::WorkCompleted { minutes } = event {
                    match session.complete_work_interval(minutes).await? {
                        Some(outcome) => info!(
                            xp = outcome.award.xp,
                            level = outcome.award.level,
                            "work interval recorded"
                        ),
                        None => debug!("work interval finished without a signed-in user"),
                    }
                }
                return Ok(Some(event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_out(timer: &mut PomodoroTimer) -> Option<TimerEvent> {
        timer.start();
        loop {
            if let Some(event) = timer.tick() {
                return Some(event);
            }
            if !timer.is_running() {
                return None;
            }
        }
    }

    #[test]
    fn idle_timer_does_not_move() {
        let mut timer = PomodoroTimer::new(25, 5);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.display(), "25:00");
        assert_eq!(timer.phase().label(), "Focus Time");
    }

    #[test]
    fn phases_alternate_and_stop_between() {
        let mut timer = PomodoroTimer::new(1, 1);
        assert_eq!(run_out(&mut timer), Some(TimerEvent::WorkCompleted { minutes: 1 }));
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.display(), "01:00");

        assert_eq!(run_out(&mut timer), Some(TimerEvent::BreakCompleted));
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.completed_work(), 1);
    }

    #[test]
    fn oversized_intervals_saturate() {
        let mut timer = PomodoroTimer::new(u32::MAX, u32::MAX);
        assert_eq!(timer.remaining_secs(), u32::MAX);
        timer.start();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), u32::MAX - 1);
    }

    #[test]
    fn pause_and_reset() {
        let mut timer = PomodoroTimer::new(25, 5);
        timer.start();
        for _ in 0..90 {
            timer.tick();
        }
        timer.pause();
        timer.tick();
        assert_eq!(timer.display(), "23:30");

        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 25 * 60);
    }
}
