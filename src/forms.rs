//! Validation of user input before anything is sent to the backend.
//!
//! A draft that passes validation turns into the request payload; nothing
//! that would later break the balance engine gets that far.
use serde::Deserialize;

use crate::{
    error::LedgerError,
    model::Group,
    money::Money,
    schemas::{MemberId, MemberInvite, NewExpense, NewGroup},
};

/// Add-expense form as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub amount: String,
    pub description: String,
    pub paid_by: MemberId,
    #[serde(default)]
    pub participants: Vec<MemberId>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ExpenseDraft {
    pub fn validate(&self, group: &Group) -> Result<NewExpense, LedgerError> {
        let amount: Money = self.amount.parse()?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if amount > Money::MAX_EXPENSE {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must not exceed {}",
                Money::MAX_EXPENSE
            )));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        if self.paid_by.trim().is_empty() {
            return Err(LedgerError::MissingPayer(description.to_string()));
        }
        if !group.has_member(&self.paid_by) {
            return Err(LedgerError::UnknownMember(self.paid_by.clone()));
        }

        let mut participants: Vec<MemberId> = Vec::with_capacity(self.participants.len());
        for id in &self.participants {
            if !group.has_member(id) {
                return Err(LedgerError::UnknownMember(id.clone()));
            }
            if !participants.contains(id) {
                participants.push(id.clone());
            }
        }
        if participants.is_empty() {
            return Err(LedgerError::NoParticipants(description.to_string()));
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(NewExpense {
            group_id: group.id.clone(),
            description: description.to_string(),
            amount,
            paid_by: self.paid_by.clone(),
            participant_ids: participants,
            category,
        })
    }
}

/// Create-group form. The creator is added by the backend, so `members`
/// only lists the other people to invite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_emails: Vec<String>,
}

impl GroupDraft {
    pub fn validate(&self) -> Result<NewGroup, LedgerError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyGroupName);
        }

        let mut members: Vec<MemberInvite> = Vec::new();
        for email in self.member_emails.iter().map(|e| e.trim()) {
            if email.is_empty() {
                continue;
            }
            if !looks_like_email(email) {
                return Err(LedgerError::InvalidEmail(email.to_string()));
            }
            if !members.iter().any(|m| m.email.eq_ignore_ascii_case(email)) {
                members.push(MemberInvite {
                    email: email.to_string(),
                });
            }
        }

        Ok(NewGroup {
            group_name: name.to_string(),
            group_description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            members,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Member;

    fn group() -> Group {
        Group {
            id: "g1".to_string(),
            name: "Flat".to_string(),
            description: None,
            members: ["alice", "bob"]
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

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            amount: "12,50".to_string(),
            description: "  Pizza ".to_string(),
            paid_by: "alice".to_string(),
            participants: vec!["alice".to_string(), "bob".to_string(), "bob".to_string()],
            category: Some(" ".to_string()),
        }
    }

    #[test]
    fn valid_draft_becomes_payload() {
        let payload = draft().validate(&group()).unwrap();
        assert_eq!(payload.group_id, "g1");
        assert_eq!(payload.amount, Money::new(1250));
        assert_eq!(payload.description, "Pizza");
        assert_eq!(payload.participant_ids, ["alice", "bob"]);
        assert_eq!(payload.category, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["paidBy"], "alice");
        assert_eq!(json["amount"], 12.5);
    }

    #[test]
    fn amount_must_be_a_positive_number() {
        for amount in ["", "abc", "0", "-4", "1.234", "1000000000001"] {
            let draft = ExpenseDraft {
                amount: amount.to_string(),
                ..draft()
            };
            assert!(
                matches!(draft.validate(&group()), Err(LedgerError::InvalidAmount(_))),
                "{amount:?} accepted"
            );
        }
    }

    #[test]
    fn description_is_required() {
        let draft = ExpenseDraft {
            description: "   ".to_string(),
            ..draft()
        };
        assert_eq!(draft.validate(&group()), Err(LedgerError::EmptyDescription));
    }

    #[test]
    fn payer_and_participants_must_be_members() {
        let outsider_payer = ExpenseDraft {
            paid_by: "mallory".to_string(),
            ..draft()
        };
        assert_eq!(
            outsider_payer.validate(&group()),
            Err(LedgerError::UnknownMember("mallory".to_string()))
        );

        let no_payer = ExpenseDraft {
            paid_by: String::new(),
            ..draft()
        };
        assert!(matches!(no_payer.validate(&group()), Err(LedgerError::MissingPayer(_))));

        let nobody = ExpenseDraft {
            participants: Vec::new(),
            ..draft()
        };
        assert!(matches!(nobody.validate(&group()), Err(LedgerError::NoParticipants(_))));
    }

    #[test]
    fn group_draft_drops_blank_and_duplicate_emails() {
        let draft = GroupDraft {
            name: " Goa Trip ".to_string(),
            description: Some(String::new()),
            member_emails: vec![
                "ann@example.com".to_string(),
                " ".to_string(),
                "ANN@example.com".to_string(),
                "raj@example.org".to_string(),
            ],
        };
        let payload = draft.validate().unwrap();
        assert_eq!(payload.group_name, "Goa Trip");
        assert_eq!(payload.group_description, None);
        assert_eq!(
            payload.members,
            vec![
                MemberInvite {
                    email: "ann@example.com".to_string()
                },
                MemberInvite {
                    email: "raj@example.org".to_string()
                },
            ]
        );
    }

    #[test]
    fn group_draft_rejects_bad_input() {
        assert_eq!(GroupDraft::default().validate(), Err(LedgerError::EmptyGroupName));

        for email in ["ann", "@example.com", "ann@", "ann@example", "a n@example.com", "ann@x@y.com"] {
            let draft = GroupDraft {
                name: "Flat".to_string(),
                member_emails: vec![email.to_string()],
                ..GroupDraft::default()
            };
            assert_eq!(
                draft.validate(),
                Err(LedgerError::InvalidEmail(email.to_string())),
                "{email} accepted"
            );
        }
    }
}
