use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::same_week;

/// A unit of relationship-building work shared by a couple.
///
/// Challenge-only and routine-only fields live inside [`QuestKind`], so a
/// challenge can never carry a streak and a routine can never carry a date
/// range. The kind is fixed at creation; switching kind in an edit discards
/// the kind-specific fields and reinitializes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub status: QuestStatus,
    #[serde(flatten)]
    pub kind: QuestKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Available,
    InProgress,
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Transition rules: `available -> in_progress` always, explicit
    /// completion from `in_progress`, and `completed` is terminal. Editing
    /// a quest never moves its status; deletion is allowed from any state.
    pub fn can_transition_to(&self, next: QuestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::InProgress) | (Self::InProgress, Self::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestKind {
    Challenge {
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        restrictions: Option<String>,
    },
    Routine {
        frequency: Frequency,
        weekly_goal: u8,
        progress: RoutineProgress,
    },
}

impl QuestKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Challenge { .. } => "challenge",
            Self::Routine { .. } => "routine",
        }
    }

    pub fn is_routine(&self) -> bool {
        matches!(self, Self::Routine { .. })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// Check-in bookkeeping for a routine quest.
///
/// `completed_this_week` only ever holds days inside the week window of the
/// most recent check-in; it is reset to a singleton whenever a check-in
/// lands in a different week than `last_completed_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutineProgress {
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    pub completed_this_week: BTreeSet<NaiveDate>,
}

impl RoutineProgress {
    /// Computes the progress after a check-in on `today`, without mutating
    /// the input.
    ///
    /// Idempotent under retries: a quest already checked in on `today`
    /// comes back unchanged. A weekly routine whose current-week set
    /// already meets `weekly_goal` also comes back unchanged, so a replayed
    /// or directly-invoked check-in can never exceed the goal.
    pub fn check_in(&self, frequency: Frequency, weekly_goal: u8, today: NaiveDate) -> Self {
        if self.last_completed_date == Some(today) {
            return self.clone();
        }

        let in_current_week = self
            .last_completed_date
            .is_some_and(|last| same_week(last, today));

        if frequency == Frequency::Weekly
            && in_current_week
            && self.completed_this_week.len() >= weekly_goal as usize
        {
            return self.clone();
        }

        let streak = match frequency {
            Frequency::Daily => {
                let yesterday = today - Days::new(1);
                if self.last_completed_date == Some(yesterday) {
                    self.streak + 1
                } else {
                    1
                }
            }
            // Weekly routines track the per-week set, not a streak.
            Frequency::Weekly => self.streak,
        };

        let completed_this_week = if in_current_week {
            let mut week = self.completed_this_week.clone();
            week.insert(today);
            week
        } else {
            BTreeSet::from([today])
        };

        Self {
            streak,
            last_completed_date: Some(today),
            completed_this_week,
        }
    }

    /// Whether the UI should offer a check-in on `today`.
    pub fn can_check_in(&self, frequency: Frequency, weekly_goal: u8, today: NaiveDate) -> bool {
        if self.last_completed_date == Some(today) {
            return false;
        }
        if frequency == Frequency::Weekly {
            let in_current_week = self
                .last_completed_date
                .is_some_and(|last| same_week(last, today));
            if in_current_week && self.completed_this_week.len() >= weekly_goal as usize {
                return false;
            }
        }
        true
    }
}

impl Quest {
    /// Applies a routine check-in, returning the updated quest. Returns
    /// `None` for challenge quests; the caller routes those to the explicit
    /// completion action instead.
    pub fn check_in(&self, today: NaiveDate) -> Option<Quest> {
        match &self.kind {
            QuestKind::Routine {
                frequency,
                weekly_goal,
                progress,
            } => {
                let progress = progress.check_in(*frequency, *weekly_goal, today);
                let mut next = self.clone();
                next.kind = QuestKind::Routine {
                    frequency: *frequency,
                    weekly_goal: *weekly_goal,
                    progress,
                };
                Some(next)
            }
            QuestKind::Challenge { .. } => None,
        }
    }
}

/// The three presentation buckets derived from the flat quest collection.
/// Order within each bucket is the input order; recomputed on every render.
#[derive(Debug, Default)]
pub struct QuestBuckets<'a> {
    pub in_progress: Vec<&'a Quest>,
    pub available: Vec<&'a Quest>,
    pub completed: Vec<&'a Quest>,
}

pub fn partition_quests(quests: &[Quest]) -> QuestBuckets<'_> {
    let mut buckets = QuestBuckets::default();
    for quest in quests {
        match quest.status {
            QuestStatus::InProgress => buckets.in_progress.push(quest),
            QuestStatus::Available => buckets.available.push(quest),
            QuestStatus::Completed => buckets.completed.push(quest),
        }
    }
    buckets
}

/// Kind-specific fields as supplied by a create or edit form. Carries no
/// progress bookkeeping; [`NewQuestKind::into_kind`] initializes that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewQuestKind {
    Challenge {
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        restrictions: Option<String>,
    },
    Routine {
        frequency: Frequency,
        weekly_goal: Option<u8>,
    },
}

impl NewQuestKind {
    pub fn into_kind(self) -> QuestKind {
        match self {
            Self::Challenge {
                start_date,
                end_date,
                restrictions,
            } => QuestKind::Challenge {
                start_date,
                end_date,
                restrictions,
            },
            Self::Routine {
                frequency,
                weekly_goal,
            } => QuestKind::Routine {
                frequency,
                weekly_goal: weekly_goal.unwrap_or(3),
                progress: RoutineProgress::default(),
            },
        }
    }

    fn matches(&self, kind: &QuestKind) -> bool {
        matches!(
            (self, kind),
            (Self::Challenge { .. }, QuestKind::Challenge { .. })
                | (Self::Routine { .. }, QuestKind::Routine { .. })
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestInput {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    /// `available` or `in_progress`; creating straight into `completed`
    /// is rejected.
    pub status: Option<QuestStatus>,
    #[serde(flatten)]
    pub kind: NewQuestKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuestInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// When present with a different kind than the quest's current one,
    /// the old kind-specific fields are discarded and the new kind starts
    /// from its defaults (routine frequency defaults to daily).
    #[serde(flatten)]
    pub kind: Option<NewQuestKind>,
}

impl Quest {
    pub fn new(couple_id: Uuid, created_by: Uuid, input: CreateQuestInput) -> Quest {
        Quest {
            id: Uuid::new_v4(),
            couple_id,
            created_by,
            title: input.title,
            category: input.category,
            description: input.description,
            status: input.status.unwrap_or(QuestStatus::Available),
            kind: input.kind.into_kind(),
            created_at: Utc::now(),
        }
    }

    /// Applies an edit. Status is untouched; a kind switch reinitializes
    /// the kind-specific fields, while an update within the same kind
    /// keeps routine progress intact.
    pub fn apply_update(&self, input: UpdateQuestInput) -> Quest {
        let mut next = self.clone();
        if let Some(title) = input.title {
            next.title = title;
        }
        if let Some(category) = input.category {
            next.category = category;
        }
        if let Some(description) = input.description {
            next.description = Some(description);
        }
        if let Some(new_kind) = input.kind {
            next.kind = if new_kind.matches(&self.kind) {
                match (new_kind, &self.kind) {
                    (
                        NewQuestKind::Routine {
                            frequency,
                            weekly_goal,
                        },
                        QuestKind::Routine {
                            weekly_goal: old_goal,
                            progress,
                            ..
                        },
                    ) => QuestKind::Routine {
                        frequency,
                        weekly_goal: weekly_goal.unwrap_or(*old_goal),
                        progress: progress.clone(),
                    },
                    (challenge, _) => challenge.into_kind(),
                }
            } else {
                new_kind.into_kind()
            };
        }
        next
    }
}
