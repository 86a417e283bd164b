//! HTTP routes serving balance views computed from the backend's data.
use actix_web::{
    get,
    http::StatusCode,
    post,
    web::{self, ServiceConfig},
    HttpRequest, HttpResponse, ResponseError,
};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use thiserror::Error;

use crate::{
    activity::{activity_for, paginate, PageRequest},
    auth::{session_from_request, Session},
    balance::{classify, summarize_group, GroupSummary, Standing},
    client::{ApiClient, ClientError},
    error::LedgerError,
    forms::{ExpenseDraft, GroupDraft},
    model::{Expense, Member},
    money::Money,
    summary::{group_balance, overall_summary, GroupBalance, OverallSummary},
};

pub struct AppState {
    pub client: ApiClient,
    pub recompute_balances: bool,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("missing or invalid session")]
    Unauthenticated,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            // Raised while computing over data the backend sent.
            ServerError::Ledger(LedgerError::ForeignExpense { .. } | LedgerError::Overflow) => {
                StatusCode::BAD_GATEWAY
            }
            ServerError::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Client(err) => match err {
                ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
                ClientError::NotFound(_) => StatusCode::NOT_FOUND,
                ClientError::Rejected(_) => StatusCode::BAD_REQUEST,
                ClientError::InvalidBaseUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::Server(_)
                | ClientError::Transport(_)
                | ClientError::Decode(_)
                | ClientError::InvalidRecord(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!("request failed: {}", self);
            "backend unavailable".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { error })
    }
}

fn require_session(request: &HttpRequest) -> Result<Session, ServerError> {
    session_from_request(request).ok_or(ServerError::Unauthenticated)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberBalance {
    member_id: String,
    balance: Money,
    standing: Standing,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupDetail {
    group_id: String,
    name: String,
    members: Vec<Member>,
    expenses: Vec<Expense>,
    summary: GroupSummary,
    current_user: MemberBalance,
}

#[get("/groups/{id}/balance")]
async fn get_balance(
    state: web::Data<AppState>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let session = require_session(&request)?;
    let group_id = id.into_inner();
    let (me, (group, mut expenses)) = futures::try_join!(
        state.client.me(&session),
        state.client.group_with_expenses(&session, &group_id)
    )?;

    let summary = summarize_group(&group, &expenses)?;
    let balance = summary.balance_of(&me.id);
    expenses.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

    Ok(HttpResponse::Ok().json(GroupDetail {
        group_id: group.id,
        name: group.name,
        members: group.members,
        expenses,
        summary,
        current_user: MemberBalance {
            member_id: me.id,
            balance,
            standing: classify(balance),
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    user: Member,
    groups: Vec<GroupBalance>,
    /// Ids of groups with neither fetched expenses nor a reported balance.
    unavailable: Vec<String>,
    summary: OverallSummary,
}

#[get("/dashboard")]
async fn get_dashboard(
    state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse, ServerError> {
    let session = require_session(&request)?;
    let client = &state.client;
    let (me, groups) = futures::try_join!(client.me(&session), client.groups(&session))?;

    let expense_lists: Vec<Option<Vec<Expense>>> = if state.recompute_balances {
        join_all(groups.iter().map(|group| client.group_expenses(&session, &group.id)))
            .await
            .into_iter()
            .zip(&groups)
            .map(|(result, group)| match result {
                Ok(expenses) => Some(expenses),
                Err(err) => {
                    tracing::warn!(group = %group.id, "falling back to reported balance: {err}");
                    None
                }
            })
            .collect()
    } else {
        vec![None; groups.len()]
    };

    let mut balances = Vec::with_capacity(groups.len());
    let mut unavailable = Vec::new();
    for (group, expenses) in groups.iter().zip(&expense_lists) {
        match group_balance(&me.id, group, expenses.as_deref())? {
            Some(balance) => balances.push(balance),
            None => {
                tracing::warn!(group = %group.id, "no balance available for group");
                unavailable.push(group.id.clone());
            }
        }
    }
    let summary = overall_summary(groups.len(), &balances)?;

    Ok(HttpResponse::Ok().json(Dashboard {
        user: me,
        groups: balances,
        unavailable,
        summary,
    }))
}

#[get("/activity")]
async fn get_activity(
    state: web::Data<AppState>,
    request: HttpRequest,
    query: web::Query<PageRequest>,
) -> Result<HttpResponse, ServerError> {
    let session = require_session(&request)?;
    let page_request = query.into_inner().validate()?;
    let client = &state.client;
    let (me, groups) = futures::try_join!(client.me(&session), client.groups(&session))?;

    let session = &session;
    let ledgers = try_join_all(groups.into_iter().map(|group| async move {
        let expenses = client.group_expenses(session, &group.id).await?;
        Ok::<_, ClientError>((group, expenses))
    }))
    .await?;

    let page = paginate(activity_for(&me.id, &ledgers), page_request)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/groups")]
async fn create_group(
    state: web::Data<AppState>,
    request: HttpRequest,
    draft: web::Json<GroupDraft>,
) -> Result<HttpResponse, ServerError> {
    let session = require_session(&request)?;
    let payload = draft.validate()?;
    let group = state.client.create_group(&session, &payload).await?;
    tracing::info!(group = %group.id, "group created");
    Ok(HttpResponse::Created().json(group))
}

#[post("/groups/{id}/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    request: HttpRequest,
    id: web::Path<String>,
    draft: web::Json<ExpenseDraft>,
) -> Result<HttpResponse, ServerError> {
    let session = require_session(&request)?;
    let group = state.client.group(&session, &id).await?;
    let payload = draft.validate(&group)?;
    let expense = state.client.add_expense(&session, &payload).await?;
    tracing::info!(group = %group.id, expense = %expense.id(), "expense added");
    Ok(HttpResponse::Created().json(expense))
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(get_balance)
        .service(get_dashboard)
        .service(get_activity)
        .service(create_group)
        .service(add_expense);
}
