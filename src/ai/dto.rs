use serde::{Deserialize, Serialize};

use crate::ai::models::Model;

/// Request body for a plain generation call.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub text: String,
    #[serde(default)]
    pub model: Model,
}

/// Generated text plus the usage units it cost.
#[derive(Debug, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    pub tokens: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MinimumTokensResponse {
    pub tokens: i64,
}

/// Request body for the essay composer.
#[derive(Debug, Deserialize)]
pub struct ComposeEssayRequest {
    pub theme: String,
    pub author: String,
    pub word_count: i64,
    pub additional_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_model_defaults_to_gpt_4o_mini() {
        let req: AskRequest = serde_json::from_str(r#"{"text": "Hi"}"#).unwrap();
        assert_eq!(req.model, Model::Gpt4oMini);
    }

    #[test]
    fn ask_request_accepts_explicit_model() {
        let req: AskRequest =
            serde_json::from_str(r#"{"text": "Hi", "model": "gpt-4o"}"#).unwrap();
        assert_eq!(req.model, Model::Gpt4o);
    }

    #[test]
    fn compose_essay_request_allows_missing_additional_info() {
        let req: ComposeEssayRequest = serde_json::from_str(
            r#"{"theme": "t", "author": "a", "word_count": 100}"#,
        )
        .unwrap();
        assert!(req.additional_info.is_none());
    }
}
