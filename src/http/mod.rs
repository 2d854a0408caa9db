//! HTTP surface: two routes under `/clientes/{id}`.
//!
//! Handlers only extract the raw path and body, hand them to the validation and
//! service layer, and map the outcome to a status code.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{AppError, ErrorKind, LedgerService, parse_account_id, parse_transaction};
use crate::domain::{BalanceAfter, Cents, Direction, Extract, Transaction};

/// Body of a successful `POST /clientes/{id}/transacoes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "saldo")]
    pub balance: Cents,
    #[serde(rename = "limite")]
    pub limit: Cents,
}

impl From<BalanceAfter> for BalanceResponse {
    fn from(after: BalanceAfter) -> Self {
        Self {
            balance: after.balance,
            limit: after.limit,
        }
    }
}

/// Body of a successful `GET /clientes/{id}/extrato`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(rename = "saldo")]
    pub summary: ExtractSummary,
    #[serde(rename = "ultimas_transacoes")]
    pub recent: Vec<ExtractEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSummary {
    pub total: Cents,
    #[serde(rename = "data_extrato")]
    pub taken_at: DateTime<Utc>,
    #[serde(rename = "limite")]
    pub limit: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractEntry {
    #[serde(rename = "valor")]
    pub value: Cents,
    #[serde(rename = "tipo")]
    pub direction: Direction,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "realizada_em")]
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for ExtractEntry {
    fn from(tx: Transaction) -> Self {
        Self {
            value: tx.value,
            direction: tx.direction,
            description: tx.description,
            created_at: tx.created_at,
        }
    }
}

impl From<Extract> for ExtractResponse {
    fn from(extract: Extract) -> Self {
        Self {
            summary: ExtractSummary {
                total: extract.balance,
                taken_at: extract.taken_at,
                limit: extract.limit,
            },
            recent: extract.transactions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind() == ErrorKind::Infrastructure {
            log::error!("{}", self);
        } else {
            log::debug!("Rejected request: {}", self);
        }

        let status = status_for(&self);
        let message = match self {
            AppError::InvalidAccountId(_) | AppError::AccountNotFound(_) => None,
            AppError::InvalidTransaction(_) => Some("Invalid inputs. Please check your inputs"),
            AppError::InsufficientFunds { .. } => Some("Saldo insuficiente"),
            AppError::Timeout(_) | AppError::Database(_) => Some("Internal Server Error"),
        };

        match message {
            Some(message) => (status, Json(ErrorBody { message })).into_response(),
            None => status.into_response(),
        }
    }
}

/// Status code an error is reported with.
pub fn status_for(err: &AppError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the application router.
pub fn router(service: LedgerService) -> Router {
    Router::new()
        .route("/clientes/{id}/extrato", get(get_extract))
        .route("/clientes/{id}/transacoes", post(post_transaction))
        .with_state(service)
}

async fn get_extract(
    State(service): State<LedgerService>,
    Path(id): Path<String>,
) -> Result<Json<ExtractResponse>, AppError> {
    let account_id = parse_account_id(&id)?;
    let extract = service.extract(account_id).await?;
    Ok(Json(extract.into()))
}

async fn post_transaction(
    State(service): State<LedgerService>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<BalanceResponse>, AppError> {
    let account_id = parse_account_id(&id)?;
    let transaction = parse_transaction(&body)?;
    let after = service.record_transaction(account_id, transaction).await?;
    Ok(Json(after.into()))
}
