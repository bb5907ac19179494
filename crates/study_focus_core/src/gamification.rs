//! crates/study_focus_core/src/gamification.rs
//!
//! Experience points, levels and badges. Everything here is a state
//! transition on a `UserRecord`; persisting the result is the caller's job.

use crate::domain::UserRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

pub const TASK_FINISHER: &str = "Task Finisher";
pub const FOCUSED_LEARNER: &str = "Focused Learner";

const XP_PER_LEVEL: u64 = 100;

/// A named trigger that grants experience and a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardEvent {
    TaskCompleted,
    StudySession,
}

impl AwardEvent {
    pub fn xp(self) -> u64 {
        match self {
            AwardEvent::TaskCompleted => 10,
            AwardEvent::StudySession => 15,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            AwardEvent::TaskCompleted => TASK_FINISHER,
            AwardEvent::StudySession => FOCUSED_LEARNER,
        }
    }
}

impl FromStr for AwardEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task_completed" => Ok(AwardEvent::TaskCompleted),
            "study_session" => Ok(AwardEvent::StudySession),
            other => Err(format!("unknown award event '{other}'")),
        }
    }
}

/// What a single award changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardOutcome {
    pub xp_gained: u64,
    pub xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    /// Badges that were not held before this award, in award order.
    pub new_badges: Vec<String>,
}

/// `floor(1 + xp / 100)`.
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Grants `points` and re-derives the level. Crossing into a higher level
/// earns a `"Level {n} Achieved"` badge.
pub fn award_xp(user: &mut UserRecord, points: u64) -> AwardOutcome {
    let previous = user.level;
    user.xp = user.xp.saturating_add(points);
    let level = level_for_xp(user.xp);
    user.level = level;

    let mut outcome = AwardOutcome {
        xp_gained: points,
        xp: user.xp,
        level,
        leveled_up: level > previous,
        new_badges: Vec::new(),
    };
    if outcome.leveled_up {
        let badge = format!("Level {level} Achieved");
        if user.badges.insert(badge.clone()) {
            outcome.new_badges.push(badge);
        }
        info!(user_id = %user.id, level, "level up");
    }
    outcome
}

/// Adds a badge; repeated names are ignored. Returns whether it was new.
pub fn add_badge(user: &mut UserRecord, name: &str) -> bool {
    user.badges.insert(name)
}

/// Applies the xp and badge for `event`.
pub fn award(user: &mut UserRecord, event: AwardEvent) -> AwardOutcome {
    let mut outcome = award_xp(user, event.xp());
    if add_badge(user, event.badge()) {
        outcome.new_badges.push(event.badge().to_string());
    }
    info!(
        user_id = %user.id,
        ?event,
        xp = outcome.xp,
        level = outcome.level,
        "award applied"
    );
    outcome
}
