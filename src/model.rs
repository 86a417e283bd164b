//! Validated domain types.
//!
//! Wire records from [`crate::schemas`] are converted with `TryFrom`; a
//! record that would make the balance engine divide by zero or credit a
//! nobody is rejected here instead of producing garbage later.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::LedgerError,
    money::Money,
    schemas::{ExpenseRecord, GroupRecord, MemberId, SplitType, UserProfile},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub username: String,
}

impl From<UserProfile> for Member {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
        }
    }
}

/// Rejects amounts an expense cannot carry: zero, negative, or above
/// [`Money::MAX_EXPENSE`].
pub fn check_expense_amount(id: &str, amount: Money) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount(format!(
            "expense \"{id}\" has non-positive amount {amount}"
        )));
    }
    if amount > Money::MAX_EXPENSE {
        return Err(LedgerError::InvalidAmount(format!(
            "expense \"{id}\" exceeds the maximum of {}",
            Money::MAX_EXPENSE
        )));
    }
    Ok(())
}

/// An expense split equally among its participants.
///
/// Invariants: `0 < amount <= Money::MAX_EXPENSE`, the payer id is not
/// empty, and `participants` is non-empty, sorted by id and free of
/// duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: String,
    group_id: String,
    description: String,
    amount: Money,
    payer: MemberId,
    participants: Vec<MemberId>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

impl Expense {
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        amount: Money,
        payer: impl Into<MemberId>,
        participants: impl IntoIterator<Item = MemberId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let id = id.into();
        let payer = payer.into();
        check_expense_amount(&id, amount)?;
        if payer.trim().is_empty() {
            return Err(LedgerError::MissingPayer(id));
        }
        let mut participants: Vec<MemberId> = participants
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        participants.sort();
        participants.dedup();
        if participants.is_empty() {
            return Err(LedgerError::NoParticipants(id));
        }

        Ok(Self {
            id,
            group_id: group_id.into(),
            description: String::new(),
            amount,
            payer,
            participants,
            created_at,
            category: None,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payer(&self) -> &str {
        &self.payer
    }

    pub fn participants(&self) -> &[MemberId] {
        &self.participants
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn involves(&self, member: &str) -> bool {
        self.payer == member || self.participates(member)
    }

    pub fn participates(&self, member: &str) -> bool {
        self.participants.binary_search_by(|p| p.as_str().cmp(member)).is_ok()
    }

    /// Each participant with the share of the amount they owe.
    pub fn shares(&self) -> impl Iterator<Item = (&str, Money)> {
        self.participants
            .iter()
            .map(String::as_str)
            .zip(self.amount.split_evenly(self.participants.len()))
    }

    /// The share `member` owes, zero when they do not participate.
    pub fn share_of(&self, member: &str) -> Money {
        self.shares()
            .find(|(id, _)| *id == member)
            .map(|(_, share)| share)
            .unwrap_or(Money::ZERO)
    }
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = LedgerError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        if record.split_type == SplitType::Custom {
            return Err(LedgerError::UnsupportedSplit(format!(
                "expense \"{}\" uses a custom split",
                record.id
            )));
        }
        let amount = Money::from_major(record.amount)?;
        if amount.is_zero() && record.amount > 0.0 {
            return Err(LedgerError::InvalidAmount(format!(
                "expense \"{}\" amount {} is below one cent",
                record.id, record.amount
            )));
        }
        let payer = record.paid_by.map(|p| p.id).unwrap_or_default();
        let participants = record.participants.into_iter().map(|p| p.id);

        Ok(Expense::new(
            record.id,
            record.group_id,
            amount,
            payer,
            participants,
            record.created_at,
        )?
        .with_description(record.description)
        .with_category(record.category))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Balance of the calling user as reported by the backend. Approximate:
    /// the authoritative figure is recomputed from the expenses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_balance: Option<Money>,
}

impl Group {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn has_member(&self, id: &str) -> bool {
        self.member(id).is_some()
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = LedgerError;

    fn try_from(record: GroupRecord) -> Result<Self, Self::Error> {
        let reported_balance = record
            .current_user_balance
            .map(Money::from_major)
            .transpose()?;
        let mut members: Vec<Member> = Vec::with_capacity(record.members.len());
        for profile in record.members {
            if !members.iter().any(|m| m.id == profile.id) {
                members.push(profile.into());
            }
        }

        Ok(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            members,
            created_at: record.created_at,
            reported_balance,
        })
    }
}
