//! Objective tracking
//!
//! One tracker per objective definition of the bound level. Trackers consume
//! discrete gameplay events and elapsed time, and only ever move forward:
//! progress never decreases and a tracker leaves `InProgress` at most once
//! per reset. Status changes are queued as [`ObjectiveNotice`]s which the
//! session drains after the step instead of being called back mid-update.

use serde::{Deserialize, Serialize};

use crate::level::{LevelSchema, ObjectiveDefinition};

/// Objective types understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveKind {
    Score,
    ClearTaggedBricks,
    DeliverCollectibles,
    MoveLimit,
}

impl ObjectiveKind {
    /// Parse the level-file type string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "score" => Some(ObjectiveKind::Score),
            "clear-tagged-bricks" => Some(ObjectiveKind::ClearTaggedBricks),
            "deliver-collectibles" => Some(ObjectiveKind::DeliverCollectibles),
            "move-limit" => Some(ObjectiveKind::MoveLimit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveKind::Score => "score",
            ObjectiveKind::ClearTaggedBricks => "clear-tagged-bricks",
            ObjectiveKind::DeliverCollectibles => "deliver-collectibles",
            ObjectiveKind::MoveLimit => "move-limit",
        }
    }
}

/// Gameplay events fed to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveEvent {
    ScoreAwarded {
        points: u32,
    },
    BrickCleared {
        column: u32,
        row: u32,
        brick_type: String,
        tags: Vec<String>,
    },
    CollectibleDelivered {
        collectible_id: String,
        source_tag: Option<String>,
    },
    MoveConsumed,
    /// Level-wide timer ran out: fails every tracker still in progress
    TimerExpired,
}

/// Tracker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveStatus {
    InProgress,
    Completed,
    Failed,
}

/// Read-only view of one tracker (HUD)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveState {
    pub id: String,
    pub kind: ObjectiveKind,
    pub optional: bool,
    pub status: ObjectiveStatus,
    pub progress: u32,
    pub target: u32,
    pub ratio: f32,
    pub time_remaining: Option<f32>,
    pub tags: Vec<String>,
}

/// Outbound status change, drained by the session after each step
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveNotice {
    Progress(ObjectiveState),
    Completed(ObjectiveState),
    Failed(ObjectiveState),
}

#[derive(Debug, Clone)]
struct Tracker {
    definition: ObjectiveDefinition,
    target: u32,
    /// `None` when the objective is untimed
    time_limit: Option<f32>,
    progress: u32,
    status: ObjectiveStatus,
    time_remaining: f32,
}

impl Tracker {
    fn new(definition: &ObjectiveDefinition) -> Self {
        let time_limit = definition
            .target
            .time_limit_seconds
            .filter(|limit| *limit > 0.0);
        let mut tracker = Self {
            target: definition.target.amount,
            definition: definition.clone(),
            time_limit,
            progress: 0,
            status: ObjectiveStatus::InProgress,
            time_remaining: 0.0,
        };
        tracker.reset();
        tracker
    }

    fn reset(&mut self) {
        self.progress = 0;
        self.status = if self.target == 0 {
            ObjectiveStatus::Completed
        } else {
            ObjectiveStatus::InProgress
        };
        self.time_remaining = self.time_limit.unwrap_or(0.0);
    }

    fn is_active(&self) -> bool {
        self.status == ObjectiveStatus::InProgress
    }

    fn kind(&self) -> ObjectiveKind {
        self.definition.kind
    }

    fn increment(&mut self, amount: u32, notices: &mut Vec<ObjectiveNotice>) {
        if !self.is_active() || amount == 0 {
            return;
        }
        let previous = self.progress;
        self.progress = self.progress.saturating_add(amount).min(self.target);
        notices.push(ObjectiveNotice::Progress(self.state()));
        if self.progress >= self.target && previous < self.target {
            self.status = ObjectiveStatus::Completed;
            notices.push(ObjectiveNotice::Completed(self.state()));
        }
    }

    fn fail(&mut self, notices: &mut Vec<ObjectiveNotice>) {
        if !self.is_active() {
            return;
        }
        self.status = ObjectiveStatus::Failed;
        notices.push(ObjectiveNotice::Failed(self.state()));
    }

    fn tick(&mut self, dt: f32, notices: &mut Vec<ObjectiveNotice>) {
        if !self.is_active() || self.time_limit.is_none() || dt <= 0.0 {
            return;
        }
        self.time_remaining = (self.time_remaining - dt).max(0.0);
        if self.time_remaining <= 0.0 {
            self.fail(notices);
        }
    }

    fn state(&self) -> ObjectiveState {
        let ratio = if self.target > 0 {
            (self.progress as f32 / self.target as f32).min(1.0)
        } else if self.status == ObjectiveStatus::Completed {
            1.0
        } else {
            0.0
        };
        ObjectiveState {
            id: self.definition.id.clone(),
            kind: self.kind(),
            optional: self.definition.optional,
            status: self.status,
            progress: self.progress,
            target: self.target,
            ratio,
            time_remaining: self.time_limit.map(|_| self.time_remaining),
            tags: self.definition.tags.clone(),
        }
    }

    /// An empty filter matches everything; otherwise any shared non-blank
    /// tag matches
    fn matches(&self, event_tags: &[String]) -> bool {
        let tracked = &self.definition.target.tracked_tags;
        if tracked.is_empty() {
            return true;
        }
        tracked
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| event_tags.contains(t))
    }
}

/// Registry of trackers for the bound level
#[derive(Debug, Clone, Default)]
pub struct ObjectiveEngine {
    trackers: Vec<Tracker>,
    notices: Vec<ObjectiveNotice>,
}

impl ObjectiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild trackers from the level's objective list
    pub fn bind(&mut self, level: &LevelSchema) {
        self.trackers = level.objectives.iter().map(Tracker::new).collect();
        self.notices.clear();
    }

    /// Zero progress on every tracker without rebinding
    pub fn reset_progress(&mut self) {
        for tracker in &mut self.trackers {
            tracker.reset();
        }
        self.notices.clear();
    }

    pub fn handle_event(&mut self, event: &ObjectiveEvent) {
        let notices = &mut self.notices;
        match event {
            ObjectiveEvent::ScoreAwarded { points } => {
                for tracker in self.trackers.iter_mut() {
                    if tracker.kind() == ObjectiveKind::Score {
                        tracker.increment(*points, notices);
                    }
                }
            }
            ObjectiveEvent::BrickCleared { tags, .. } => {
                for tracker in self.trackers.iter_mut() {
                    if tracker.kind() == ObjectiveKind::ClearTaggedBricks && tracker.matches(tags) {
                        tracker.increment(1, notices);
                    }
                }
            }
            ObjectiveEvent::CollectibleDelivered {
                collectible_id,
                source_tag,
            } => {
                let mut tags = vec![collectible_id.clone()];
                if let Some(source) = source_tag.as_ref().filter(|s| !s.is_empty()) {
                    tags.push(source.clone());
                }
                for tracker in self.trackers.iter_mut() {
                    if tracker.kind() == ObjectiveKind::DeliverCollectibles && tracker.matches(&tags)
                    {
                        tracker.increment(1, notices);
                    }
                }
            }
            ObjectiveEvent::MoveConsumed => {
                for tracker in self.trackers.iter_mut() {
                    if tracker.kind() == ObjectiveKind::MoveLimit {
                        tracker.increment(1, notices);
                    }
                }
            }
            ObjectiveEvent::TimerExpired => {
                for tracker in self.trackers.iter_mut() {
                    tracker.fail(notices);
                }
            }
        }
    }

    /// Advance time-limited trackers
    pub fn update(&mut self, dt: f32) {
        for tracker in &mut self.trackers {
            tracker.tick(dt, &mut self.notices);
        }
    }

    /// At least one tracker, and every non-optional tracker completed
    pub fn are_primary_objectives_met(&self) -> bool {
        !self.trackers.is_empty()
            && self
                .trackers
                .iter()
                .filter(|t| !t.definition.optional)
                .all(|t| t.status == ObjectiveStatus::Completed)
    }

    pub fn snapshot(&self) -> Vec<ObjectiveState> {
        self.trackers.iter().map(Tracker::state).collect()
    }

    pub fn drain_notices(&mut self) -> Vec<ObjectiveNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
