use lazy_static::lazy_static;
use tiktoken_rs::{o200k_base, CoreBPE};
use tracing::warn;

use crate::{ai::models::Model, config::AiConfig, error::ApiError, users::repo::User};

lazy_static! {
    static ref O200K: CoreBPE = o200k_base().unwrap();
}

/// Operation kinds with distinct minimum-balance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Ask,
    Essay,
}

pub fn minimum_balance_for(kind: OperationKind, config: &AiConfig) -> i64 {
    match kind {
        OperationKind::Ask => config.min_tokens_for_ai,
        OperationKind::Essay => config.min_tokens_for_essay,
    }
}

/// Usage units the response consumed, counted with the model's tokenizer.
/// Models without a registered tokenizer are charged zero; that free pass is
/// deliberate and logged so it stays visible in operations.
pub fn cost_of(text: &str, model: Model) -> i64 {
    match model {
        Model::Gpt4oMini => O200K.encode_ordinary(text).len() as i64,
        other => {
            warn!(model = %other, "no tokenizer registered for model, charging zero");
            0
        }
    }
}

/// Pre-check that the balance clears the threshold for this operation kind.
/// No funds are held; the atomic debit is what protects the floor.
pub fn ensure_balance(
    user: &User,
    kind: OperationKind,
    config: &AiConfig,
) -> Result<(), ApiError> {
    if user.tokens_count < minimum_balance_for(kind, config) {
        return Err(ApiError::InsufficientBalance);
    }
    Ok(())
}
