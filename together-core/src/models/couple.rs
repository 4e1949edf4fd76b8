use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A couple record. `partner_b` stays empty until the second partner
/// redeems an invite code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Couple {
    pub id: Uuid,
    pub partner_a: Uuid,
    pub partner_b: Option<Uuid>,
    pub anniversary: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Couple {
    pub fn is_connected(&self) -> bool {
        self.partner_b.is_some()
    }

    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.partner_a == user_id {
            self.partner_b
        } else if self.partner_b == Some(user_id) {
            Some(self.partner_a)
        } else {
            None
        }
    }
}

/// A shareable join code. The code is an opaque token embedded in an invite
/// URL; redeeming it fills the couple's second partner slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    pub couple_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

/// Random 10-character alphanumeric join code.
pub fn new_invite_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..10].to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCoupleInput {
    pub anniversary: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCoupleInput {
    pub anniversary: Option<NaiveDate>,
}
