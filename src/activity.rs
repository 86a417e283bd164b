//! Activity feed of a user: the expenses they paid or share in.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerError,
    model::{Expense, Group},
    money::Money,
};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    /// The user paid; `amount` is what they paid.
    ExpenseCreated,
    /// The user shares in somebody else's expense; `amount` is their share.
    ExpenseInvolved,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub description: String,
    pub group: String,
    pub group_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub amount: Money,
    pub date: DateTime<Utc>,
}

/// Builds the feed of `current_user` over the given groups, newest first.
pub fn activity_for(current_user: &str, ledgers: &[(Group, Vec<Expense>)]) -> Vec<Activity> {
    let mut activities: Vec<Activity> = ledgers
        .iter()
        .flat_map(|(group, expenses)| {
            expenses
                .iter()
                .filter_map(move |expense| entry(current_user, group, expense))
        })
        .collect();
    activities.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    activities
}

fn entry(current_user: &str, group: &Group, expense: &Expense) -> Option<Activity> {
    let (kind, amount) = if expense.payer() == current_user {
        (ActivityKind::ExpenseCreated, expense.amount())
    } else if expense.participates(current_user) {
        (ActivityKind::ExpenseInvolved, expense.share_of(current_user))
    } else {
        return None;
    };
    Some(Activity {
        id: expense.id().to_string(),
        description: expense.description().to_string(),
        group: group.name.clone(),
        group_id: group.id.clone(),
        kind,
        amount,
        date: expense.created_at(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn first_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl PageRequest {
    /// Pages are 1-based and at most [`MAX_LIMIT`] entries long.
    pub fn validate(self) -> Result<Self, LedgerError> {
        if self.page == 0 {
            return Err(LedgerError::InvalidPage("page starts at 1".to_string()));
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(LedgerError::InvalidPage(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(self)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: first_page(),
            limit: default_limit(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Cuts one page out of the feed. Pages are 1-based; a page past the end is
/// empty rather than an error.
pub fn paginate(activities: Vec<Activity>, request: PageRequest) -> Result<ActivityPage, LedgerError> {
    let PageRequest { page, limit } = request.validate()?;

    let total = activities.len();
    let total_pages = total.div_ceil(limit).max(1);
    let activities = activities
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Ok(ActivityPage {
        activities,
        page,
        limit,
        total,
        total_pages,
    })
}
