use serde::Deserialize;

use crate::domain::{AccountId, Cents, Direction, NewTransaction, TransactionError, is_known_account};

use super::AppError;

/// Request body for recording a transaction, as sent by clients.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub valor: Cents,
    pub tipo: String,
    pub descricao: String,
}

impl TryFrom<TransactionRequest> for NewTransaction {
    type Error = TransactionError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        let direction = Direction::from_str(&request.tipo)
            .ok_or(TransactionError::UnknownDirection(request.tipo))?;
        NewTransaction::new(request.valor, direction, request.descricao)
    }
}

/// Parse a path segment into an account id served by this deployment.
///
/// Non-numeric input is invalid; a well-formed id outside the known set is not found.
pub fn parse_account_id(raw: &str) -> Result<AccountId, AppError> {
    let id: AccountId = raw
        .parse()
        .map_err(|_| AppError::InvalidAccountId(raw.to_string()))?;
    ensure_known_account(id)?;
    Ok(id)
}

pub fn ensure_known_account(id: AccountId) -> Result<(), AppError> {
    if is_known_account(id) {
        Ok(())
    } else {
        Err(AppError::AccountNotFound(id))
    }
}

/// Decode and validate a JSON transaction body.
pub fn parse_transaction(body: &[u8]) -> Result<NewTransaction, AppError> {
    let request: TransactionRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidTransaction(e.to_string()))?;
    Ok(NewTransaction::try_from(request)?)
}
