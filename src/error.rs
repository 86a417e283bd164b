//! Errors raised while validating input or computing balances.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Expense \"{0}\" has no payer")]
    MissingPayer(String),
    #[error("Expense \"{0}\" has no participants")]
    NoParticipants(String),
    #[error("Unsupported split: {0}")]
    UnsupportedSplit(String),
    #[error("\"{0}\" is not a member of the group")]
    UnknownMember(String),
    #[error("Expense \"{expense}\" belongs to group \"{found}\", not \"{expected}\"")]
    ForeignExpense {
        expense: String,
        expected: String,
        found: String,
    },
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Group name must not be empty")]
    EmptyGroupName,
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Amounts add up to more than can be represented")]
    Overflow,
    #[error("Invalid page: {0}")]
    InvalidPage(String),
}
