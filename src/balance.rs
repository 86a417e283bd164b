//! The balance engine.
//!
//! Every function here is pure: balances are derived from the expense list
//! each time and never stored.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    error::LedgerError,
    model::{Expense, Group},
    money::Money,
    schemas::MemberId,
};

pub type Balance = BTreeMap<MemberId, Money>;

/// Where a member stands once all expenses are accounted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Owes,
    Owed,
    Settled,
}

pub fn classify(net_balance: Money) -> Standing {
    if net_balance.is_negative() {
        Standing::Owes
    } else if net_balance.is_positive() {
        Standing::Owed
    } else {
        Standing::Settled
    }
}

pub fn total_spent(expenses: &[Expense]) -> Result<Money, LedgerError> {
    Money::try_sum(expenses.iter().map(Expense::amount))
}

/// What a single expense does to `member`'s net balance.
fn contribution(member: &str, expense: &Expense) -> Money {
    // A share never exceeds the amount, so this cannot overflow.
    let share = expense.share_of(member);
    if expense.payer() == member {
        expense.amount() - share
    } else {
        -share
    }
}

/// Net balance of `member`: negative when they owe, positive when owed.
pub fn member_balance(member: &str, expenses: &[Expense]) -> Result<Money, LedgerError> {
    Money::try_sum(expenses.iter().map(|expense| contribution(member, expense)))
}

/// Balances of everyone who appears as payer or participant.
pub fn compute_balance(expenses: &[Expense]) -> Result<Balance, LedgerError> {
    let mut balance = Balance::new();
    for expense in expenses {
        let payer = balance.entry(expense.payer().to_string()).or_default();
        *payer = payer.checked_add(expense.amount()).ok_or(LedgerError::Overflow)?;
        for (participant, share) in expense.shares() {
            let entry = balance.entry(participant.to_string()).or_default();
            *entry = entry.checked_sub(share).ok_or(LedgerError::Overflow)?;
        }
    }
    Ok(balance)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub total_spent: Money,
    pub per_member: BTreeMap<MemberId, Money>,
    pub classification: BTreeMap<MemberId, Standing>,
}

impl GroupSummary {
    pub fn balance_of(&self, member: &str) -> Money {
        self.per_member.get(member).copied().unwrap_or(Money::ZERO)
    }
}

/// Summarises `group` from its expenses.
///
/// Every roster member gets an entry, settled when untouched by the
/// expenses. Ids that appear in expenses but not in the roster (members who
/// left) are kept so the balances still add up to zero.
pub fn summarize_group(group: &Group, expenses: &[Expense]) -> Result<GroupSummary, LedgerError> {
    if let Some(foreign) = expenses.iter().find(|e| e.group_id() != group.id) {
        return Err(LedgerError::ForeignExpense {
            expense: foreign.id().to_string(),
            expected: group.id.clone(),
            found: foreign.group_id().to_string(),
        });
    }

    let total_spent = total_spent(expenses)?;
    let mut per_member = compute_balance(expenses)?;
    for (id, _) in per_member.iter().filter(|(id, _)| !group.has_member(id)) {
        tracing::warn!(group = %group.id, member = %id, "expense references a non-member");
    }
    for member in &group.members {
        per_member.entry(member.id.clone()).or_default();
    }

    let classification = per_member
        .iter()
        .map(|(id, balance)| (id.clone(), classify(*balance)))
        .collect();

    Ok(GroupSummary {
        total_spent,
        per_member,
        classification,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::model::Member;

    fn expense(id: &str, amount: i64, payer: &str, participants: &[&str]) -> Expense {
        Expense::new(
            id,
            "trip",
            Money::new(amount),
            payer,
            participants.iter().map(|p| p.to_string()),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .unwrap()
    }

    fn group(members: &[&str]) -> Group {
        Group {
            id: "trip".to_string(),
            name: "Trip".to_string(),
            description: None,
            members: members
                .iter()
                .map(|id| Member {
                    id: id.to_string(),
                    username: id.to_string(),
                })
                .collect(),
            created_at: None,
            reported_balance: None,
        }
    }

    #[test]
    fn empty_list_is_zero() {
        assert_eq!(total_spent(&[]).unwrap(), Money::ZERO);
        assert_eq!(member_balance("alice", &[]).unwrap(), Money::ZERO);
        assert!(compute_balance(&[]).unwrap().is_empty());
    }

    #[test]
    fn payer_and_participant_split_in_half() {
        let expenses = [expense("e1", 100_00, "alice", &["alice", "bob"])];
        assert_eq!(member_balance("alice", &expenses).unwrap(), Money::new(50_00));
        assert_eq!(member_balance("bob", &expenses).unwrap(), Money::new(-50_00));
        assert_eq!(total_spent(&expenses).unwrap(), Money::new(100_00));
    }

    #[test]
    fn second_expense_offsets_the_first() {
        let expenses = [
            expense("e1", 100_00, "alice", &["alice", "bob"]),
            expense("e2", 50_00, "bob", &["alice", "bob"]),
        ];
        assert_eq!(member_balance("alice", &expenses).unwrap(), Money::new(25_00));
        assert_eq!(member_balance("bob", &expenses).unwrap(), Money::new(-25_00));
        assert_eq!(total_spent(&expenses).unwrap(), Money::new(150_00));
    }

    #[test]
    fn payer_outside_the_split_is_credited_in_full() {
        let expenses = [expense("e1", 30_00, "alice", &["bob"])];
        assert_eq!(member_balance("alice", &expenses).unwrap(), Money::new(30_00));
        assert_eq!(member_balance("bob", &expenses).unwrap(), Money::new(-30_00));
    }

    #[test]
    fn three_way_split() {
        let expenses = [expense("e1", 30_00, "alice", &["alice", "bob", "carol"])];
        let balance = compute_balance(&expenses).unwrap();
        assert_eq!(balance["alice"], Money::new(20_00));
        assert_eq!(balance["bob"], Money::new(-10_00));
        assert_eq!(balance["carol"], Money::new(-10_00));
    }

    #[test]
    fn uneven_split_stays_zero_sum() {
        let expenses = [
            expense("e1", 100_00, "alice", &["alice", "bob", "carol"]),
            expense("e2", 1, "bob", &["alice", "carol"]),
        ];
        let balance = compute_balance(&expenses).unwrap();
        assert_eq!(Money::try_sum(balance.values().copied()), Ok(Money::ZERO));
        for (id, net) in &balance {
            assert_eq!(member_balance(id, &expenses).unwrap(), *net);
        }
    }

    #[test]
    fn bystander_is_settled() {
        let expenses = [expense("e1", 30_00, "alice", &["bob"])];
        assert_eq!(member_balance("dave", &expenses).unwrap(), Money::ZERO);
        assert_eq!(classify(member_balance("dave", &expenses).unwrap()), Standing::Settled);
    }

    #[test]
    fn huge_totals_fail_instead_of_wrapping() {
        let largest = expense("e1", Money::MAX_EXPENSE.cents(), "alice", &["bob"]);
        let expenses = vec![largest; 100_000];
        assert_eq!(total_spent(&expenses), Err(LedgerError::Overflow));
        assert_eq!(member_balance("alice", &expenses), Err(LedgerError::Overflow));
        assert_eq!(compute_balance(&expenses), Err(LedgerError::Overflow));
        assert_eq!(
            summarize_group(&group(&["alice", "bob"]), &expenses),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn classify_follows_sign() {
        assert_eq!(classify(Money::new(-1)), Standing::Owes);
        assert_eq!(classify(Money::new(1)), Standing::Owed);
        assert_eq!(classify(Money::ZERO), Standing::Settled);
    }

    #[test]
    fn summary_covers_roster_and_former_members() {
        let expenses = [
            expense("e1", 100_00, "alice", &["alice", "bob"]),
            expense("e2", 10_00, "zed", &["alice"]),
        ];
        let summary = summarize_group(&group(&["alice", "bob", "carol"]), &expenses).unwrap();

        assert_eq!(summary.total_spent, Money::new(110_00));
        assert_eq!(summary.balance_of("alice"), Money::new(40_00));
        assert_eq!(summary.balance_of("bob"), Money::new(-50_00));
        assert_eq!(summary.balance_of("carol"), Money::ZERO);
        assert_eq!(summary.balance_of("zed"), Money::new(10_00));
        assert_eq!(summary.classification["carol"], Standing::Settled);
        assert_eq!(summary.classification["bob"], Standing::Owes);
        assert_eq!(Money::try_sum(summary.per_member.values().copied()), Ok(Money::ZERO));
    }

    #[test]
    fn summary_rejects_expenses_of_another_group() {
        let stray = Expense::new(
            "e9",
            "other",
            Money::new(5_00),
            "alice",
            ["alice".to_string()],
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .unwrap();
        assert_eq!(
            summarize_group(&group(&["alice"]), &[stray]),
            Err(LedgerError::ForeignExpense {
                expense: "e9".to_string(),
                expected: "trip".to_string(),
                found: "other".to_string(),
            })
        );
    }

    #[test]
    fn summary_serializes_for_presentation() {
        let expenses = [expense("e1", 100_00, "alice", &["alice", "bob"])];
        let summary = summarize_group(&group(&["alice", "bob"]), &expenses).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalSpent"], 100.0);
        assert_eq!(json["perMember"]["bob"], -50.0);
        assert_eq!(json["classification"]["alice"], "owed");
    }
}
