use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub memory_date: NaiveDate,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemoryInput {
    pub title: String,
    pub description: Option<String>,
    pub memory_date: NaiveDate,
    pub photo_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemoryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub memory_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub location: Option<String>,
}
