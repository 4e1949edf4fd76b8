use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A planned (or merely wished-for) shared activity. An activity without a
/// date sits in the idea bin; setting a date moves it to the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub category: String,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

/// Derived planner bucket for an activity, relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityBucket {
    IdeaBin,
    Upcoming,
    Past,
}

impl Activity {
    pub fn bucket(&self, today: NaiveDate) -> ActivityBucket {
        match self.date {
            None => ActivityBucket::IdeaBin,
            Some(date) if date >= today => ActivityBucket::Upcoming,
            Some(_) => ActivityBucket::Past,
        }
    }
}

#[derive(Debug, Default)]
pub struct ActivityBuckets<'a> {
    pub idea_bin: Vec<&'a Activity>,
    pub upcoming: Vec<&'a Activity>,
    pub past: Vec<&'a Activity>,
}

pub fn partition_activities(activities: &[Activity], today: NaiveDate) -> ActivityBuckets<'_> {
    let mut buckets = ActivityBuckets::default();
    for activity in activities {
        match activity.bucket(today) {
            ActivityBucket::IdeaBin => buckets.idea_bin.push(activity),
            ActivityBucket::Upcoming => buckets.upcoming.push(activity),
            ActivityBucket::Past => buckets.past.push(activity),
        }
    }
    buckets
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityInput {
    pub title: String,
    pub category: String,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActivityInput {
    pub title: Option<String>,
    pub category: Option<String>,
    /// Absent means "leave as is"; an explicit `null` clears the date and
    /// sends the activity back to the idea bin.
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
    pub done: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NaiveDate>::deserialize(deserializer).map(Some)
}
