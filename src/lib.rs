//! Shared-expense balances for ShareBill groups.
//!
//! The core is the [`balance`] engine: a pure computation of who owes what
//! inside a group, from expenses split equally among their participants.
//! Around it sit the validated [`model`], the [`client`] for the backend that
//! stores groups and expenses, and the [`server`] routes that expose the
//! computed views.
pub mod activity;
pub mod auth;
pub mod balance;
pub mod client;
pub mod error;
pub mod forms;
pub mod model;
pub mod money;
pub mod schemas;
pub mod server;
pub mod settings;
pub mod summary;

pub use balance::{classify, compute_balance, member_balance, summarize_group, total_spent, Standing};
pub use error::LedgerError;
pub use model::{Expense, Group, Member};
pub use money::Money;
