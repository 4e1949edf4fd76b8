use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The daily connection question shared by a couple: one row per couple per
/// day, each partner answering independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyConnection {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub day: NaiveDate,
    pub question: String,
    pub answers: Vec<ConnectionAnswer>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionAnswer {
    pub user_id: Uuid,
    pub text: String,
    pub answered_at: DateTime<Utc>,
}

impl DailyConnection {
    pub fn answer_for(&self, user_id: Uuid) -> Option<&ConnectionAnswer> {
        self.answers.iter().find(|a| a.user_id == user_id)
    }

    /// Records or replaces one partner's answer.
    pub fn with_answer(&self, user_id: Uuid, text: String) -> DailyConnection {
        let mut next = self.clone();
        next.answers.retain(|a| a.user_id != user_id);
        next.answers.push(ConnectionAnswer {
            user_id,
            text,
            answered_at: Utc::now(),
        });
        next
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConnectionInput {
    pub text: String,
}
