// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use saldo::application::LedgerService;
use saldo::domain::{Account, AccountId, Cents, NewTransaction};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Replace an account's balance and limit
pub async fn provision(
    service: &LedgerService,
    id: AccountId,
    limit: Cents,
    balance: Cents,
) -> Result<()> {
    service
        .store()
        .provision_account(&Account::new(id, limit).with_balance(balance))
        .await
}

pub fn credit(value: Cents, description: &str) -> NewTransaction {
    NewTransaction::credit(value, description).unwrap()
}

pub fn debit(value: Cents, description: &str) -> NewTransaction {
    NewTransaction::debit(value, description).unwrap()
}

/// Send one request through the router and collect the response body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> Result<(StatusCode, Bytes)> {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request.body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, bytes))
}

pub fn transaction_body(valor: i64, tipo: &str, descricao: &str) -> String {
    serde_json::json!({ "valor": valor, "tipo": tipo, "descricao": descricao }).to_string()
}
