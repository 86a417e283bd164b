//! Dashboard figures across all of a user's groups.
//!
//! A group's balance is recomputed from its expenses whenever they were
//! fetched. Only when they were not does the backend's `currentUserBalance`
//! stand in, and the result is then marked approximate. A group with
//! neither is left out of the totals and counted as unavailable.
use serde::Serialize;

use crate::{
    balance::member_balance,
    error::LedgerError,
    model::{Expense, Group},
    money::Money,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceOrigin {
    Recomputed,
    Reported,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBalance {
    pub group_id: String,
    pub group_name: String,
    pub balance: Money,
    pub origin: BalanceOrigin,
}

impl GroupBalance {
    pub fn is_approximate(&self) -> bool {
        self.origin == BalanceOrigin::Reported
    }
}

/// Balance of `current_user` in `group`.
///
/// Returns `None` when the expenses were not fetched and the backend did not
/// report a figure either.
pub fn group_balance(
    current_user: &str,
    group: &Group,
    expenses: Option<&[Expense]>,
) -> Result<Option<GroupBalance>, LedgerError> {
    let (balance, origin) = match (expenses, group.reported_balance) {
        (Some(expenses), _) => (member_balance(current_user, expenses)?, BalanceOrigin::Recomputed),
        (None, Some(reported)) => (reported, BalanceOrigin::Reported),
        (None, None) => return Ok(None),
    };
    Ok(Some(GroupBalance {
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        balance,
        origin,
    }))
}

/// Sum of the per-group balances. Groups are never netted against each
/// other beyond this headline figure.
pub fn multi_group_balance(balances: &[GroupBalance]) -> Result<Money, LedgerError> {
    Money::try_sum(balances.iter().map(|b| b.balance))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    FullySettled,
    OwesYou,
    YouOwe,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_groups: usize,
    /// What the user owes across the groups where they are a debtor.
    pub total_owed: Money,
    /// What the user is owed across the groups where they are a creditor.
    pub total_lent: Money,
    pub net_balance: Money,
    pub status: SettlementStatus,
    /// Groups counted in `total_groups` that have no balance at all.
    pub unavailable_groups: usize,
    /// Set when any figure is a reported fallback or a group is missing.
    pub approximate: bool,
}

/// Totals over `balances`. `total_groups` may exceed `balances.len()` when
/// some groups had no figure; the summary is then approximate.
pub fn overall_summary(
    total_groups: usize,
    balances: &[GroupBalance],
) -> Result<OverallSummary, LedgerError> {
    let total_owed = Money::try_sum(
        balances
            .iter()
            .filter(|b| b.balance.is_negative())
            .map(|b| b.balance.abs()),
    )?;
    let total_lent = Money::try_sum(
        balances
            .iter()
            .filter(|b| b.balance.is_positive())
            .map(|b| b.balance),
    )?;
    let net_balance = multi_group_balance(balances)?;
    let unavailable_groups = total_groups.saturating_sub(balances.len());
    let status = if net_balance.is_negative() {
        SettlementStatus::YouOwe
    } else if net_balance.is_positive() {
        SettlementStatus::OwesYou
    } else {
        SettlementStatus::FullySettled
    };

    Ok(OverallSummary {
        total_groups,
        total_owed,
        total_lent,
        net_balance,
        status,
        unavailable_groups,
        approximate: unavailable_groups > 0 || balances.iter().any(GroupBalance::is_approximate),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn group(id: &str, reported: Option<i64>) -> Group {
        Group {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            members: Vec::new(),
            created_at: None,
            reported_balance: reported.map(Money::new),
        }
    }

    fn expense(group_id: &str, amount: i64, payer: &str, participants: &[&str]) -> Expense {
        Expense::new(
            format!("{group_id}-{amount}"),
            group_id,
            Money::new(amount),
            payer,
            participants.iter().map(|p| p.to_string()),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .unwrap()
    }

    #[test]
    fn recomputed_balance_wins_over_reported() {
        let expenses = [expense("flat", 60_00, "bob", &["alice", "bob"])];
        let balance = group_balance("alice", &group("flat", Some(99_00)), Some(&expenses[..]))
            .unwrap()
            .unwrap();
        assert_eq!(balance.balance, Money::new(-30_00));
        assert_eq!(balance.origin, BalanceOrigin::Recomputed);
        assert!(!balance.is_approximate());
    }

    #[test]
    fn reported_balance_is_the_fallback() {
        let balance = group_balance("alice", &group("flat", Some(12_00)), None)
            .unwrap()
            .unwrap();
        assert_eq!(balance.balance, Money::new(12_00));
        assert!(balance.is_approximate());

        assert_eq!(group_balance("alice", &group("flat", None), None), Ok(None));
    }

    #[test]
    fn overall_summary_splits_owed_and_lent() {
        let trip = [expense("trip", 90_00, "alice", &["alice", "bob", "carol"])];
        let flat = [expense("flat", 40_00, "bob", &["alice", "bob"])];
        let balances = vec![
            group_balance("alice", &group("trip", None), Some(&trip[..])).unwrap().unwrap(),
            group_balance("alice", &group("flat", None), Some(&flat[..])).unwrap().unwrap(),
            group_balance("alice", &group("club", Some(-5_00)), None).unwrap().unwrap(),
        ];

        let summary = overall_summary(3, &balances).unwrap();
        assert_eq!(summary.total_groups, 4);
        assert_eq!(summary.total_lent, Money::new(60_00));
        assert_eq!(summary.total_owed, Money::new(25_00));
        assert_eq!(summary.net_balance, Money::new(35_00));
        assert_eq!(multi_group_balance(&balances), Ok(Money::new(35_00)));
        assert_eq!(summary.status, SettlementStatus::OwesYou);
        assert_eq!(summary.unavailable_groups, 0);
        assert!(summary.approximate);
    }

    #[test]
    fn missing_group_makes_totals_approximate() {
        let flat = [expense("flat", 40_00, "alice", &["alice", "bob"])];
        let balances: Vec<GroupBalance> = [
            group_balance("alice", &group("trip", None), None).unwrap(),
            group_balance("alice", &group("flat", None), Some(&flat[..])).unwrap(),
        ]
        .into_iter()
        .flatten()
        .collect();
        assert_eq!(balances.len(), 1);
        assert!(!balances[0].is_approximate());

        let summary = overall_summary(2, &balances).unwrap();
        assert_eq!(summary.net_balance, Money::new(20_00));
        assert_eq!(summary.unavailable_groups, 1);
        assert!(summary.approximate);
    }

    #[test]
    fn no_groups_is_fully_settled() {
        let summary = overall_summary(0, &[]).unwrap();
        assert_eq!(summary.net_balance, Money::ZERO);
        assert_eq!(summary.status, SettlementStatus::FullySettled);
        assert!(!summary.approximate);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "fully_settled");
    }
}
