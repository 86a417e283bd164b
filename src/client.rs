//! Thin client for the backend API that owns groups, expenses and users.
//!
//! Every call takes the caller's [`Session`] explicitly. Responses are
//! converted into validated [`model`](crate::model) types on the way in, so
//! a malformed expense surfaces here as [`ClientError::InvalidRecord`].
use reqwest::{RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

use crate::{
    auth::Session,
    error::LedgerError,
    model::{Expense, Group, Member},
    schemas::{Envelope, ExpenseRecord, GroupRecord, NewExpense, NewGroup, UserProfile},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not authorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected by backend: {0}")]
    Rejected(String),
    #[error("backend error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] LedgerError),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn me(&self, session: &Session) -> Result<Member, ClientError> {
        let url = self.endpoint(&["api", "users", "me"])?;
        let profile: UserProfile = self.send(self.http.get(url), session).await?;
        Ok(profile.into())
    }

    pub async fn groups(&self, session: &Session) -> Result<Vec<Group>, ClientError> {
        let url = self.endpoint(&["api", "groups"])?;
        let records: Vec<GroupRecord> = self.send(self.http.get(url), session).await?;
        Ok(records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?)
    }

    pub async fn group(&self, session: &Session, group_id: &str) -> Result<Group, ClientError> {
        let url = self.endpoint(&["api", "groups", group_id])?;
        let record: GroupRecord = self.send(self.http.get(url), session).await?;
        Ok(Group::try_from(record)?)
    }

    pub async fn group_expenses(
        &self,
        session: &Session,
        group_id: &str,
    ) -> Result<Vec<Expense>, ClientError> {
        let url = self.endpoint(&["api", "expenses", "group", group_id])?;
        let records: Vec<ExpenseRecord> = self.send(self.http.get(url), session).await?;
        Ok(records
            .into_iter()
            .map(Expense::try_from)
            .collect::<Result<_, _>>()?)
    }

    /// Fetches a group and its expenses side by side.
    ///
    /// The two requests are independent; the backend gives no guarantee that
    /// they observe the same moment.
    pub async fn group_with_expenses(
        &self,
        session: &Session,
        group_id: &str,
    ) -> Result<(Group, Vec<Expense>), ClientError> {
        futures::try_join!(
            self.group(session, group_id),
            self.group_expenses(session, group_id)
        )
    }

    pub async fn create_group(&self, session: &Session, payload: &NewGroup) -> Result<Group, ClientError> {
        let url = self.endpoint(&["api", "groups"])?;
        let record: GroupRecord = self.send(self.http.post(url).json(payload), session).await?;
        Ok(Group::try_from(record)?)
    }

    pub async fn add_expense(
        &self,
        session: &Session,
        payload: &NewExpense,
    ) -> Result<Expense, ClientError> {
        let url = self.endpoint(&["api", "expenses"])?;
        let record: ExpenseRecord = self.send(self.http.post(url).json(payload), session).await?;
        Ok(Expense::try_from(record)?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        session: &Session,
    ) -> Result<T, ClientError> {
        let res = request.bearer_auth(session.token()).send().await?;
        let status = res.status();
        let url = res.url().clone();
        let body = res.bytes().await?;
        tracing::debug!(%url, status = status.as_u16(), "backend responded");

        if status.is_success() {
            return decode(&body);
        }

        let message = serde_json::from_slice::<ErrorResponse>(&body)
            .ok()
            .and_then(|err| err.message.or(err.error))
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        let err = match status.as_u16() {
            401 | 403 => ClientError::Unauthorized,
            404 => ClientError::NotFound(message),
            400..=499 => ClientError::Rejected(message),
            _ => ClientError::Server(message),
        };
        tracing::warn!(%url, "backend call failed: {err}");
        Err(err)
    }
}

/// Decodes a success body, unwrapping a `{ success, message, data }`
/// envelope when the backend sent one.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let enveloped = value
        .get("success")
        .is_some_and(serde_json::Value::is_boolean);
    if !enveloped {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope<T> = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ClientError::Rejected(
            envelope.message.unwrap_or_else(|| "request rejected".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Rejected("response carried no data".to_string()))
}
