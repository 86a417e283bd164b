//! Wire records exchanged with the backend API.
//!
//! These mirror the JSON the backend sends and accepts. Nothing here is
//! validated; see [`crate::model`] for the checked types the engine uses.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

pub type MemberId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: MemberId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<UserProfile>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-side aggregate for the calling user. Only trusted when the
    /// expenses of the group were not fetched.
    #[serde(default)]
    pub current_user_balance: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    #[default]
    Equal,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub group_id: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    pub paid_by: Option<UserProfile>,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub participants: Vec<UserProfile>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Envelope some backend routes wrap their payload in.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Body of `POST api/expenses`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub group_id: String,
    pub description: String,
    pub amount: Money,
    pub paid_by: MemberId,
    pub participant_ids: Vec<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemberInvite {
    pub email: String,
}

/// Body of `POST api/groups`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_description: Option<String>,
    pub members: Vec<MemberInvite>,
}
