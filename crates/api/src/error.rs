//! Error responses.
//!
//! Every failure leaves the API as `{"error": "<CODE>", "message": "<text>"}`
//! with the status of its [`ErrorCategory`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mizan_core::accounts::AccountError;
use mizan_core::commission::CommissionError;
use mizan_core::ledger::LedgerError;
use mizan_core::payout::PayoutError;
use mizan_core::reconciliation::ReconciliationError;
use mizan_core::settlement::SettlementError;
use mizan_shared::{AppError, ErrorCategory, MoneyError};
use serde_json::json;
use tracing::{error, warn};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    category: ErrorCategory,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(category: ErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// HTTP status for the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.category.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code, error = %self.message, "request failed");
        } else {
            warn!(code = self.code, error = %self.message, "request rejected");
        }
        // Storage failures are not echoed back.
        let message = if self.code == "DATABASE_ERROR" {
            "An error occurred".to_string()
        } else {
            self.message
        };

        (
            status,
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}

macro_rules! from_domain_error {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    Self::new(err.category(), err.error_code(), err.to_string())
                }
            }
        )+
    };
}

from_domain_error!(
    AccountError,
    LedgerError,
    CommissionError,
    SettlementError,
    PayoutError,
    ReconciliationError,
    AppError,
);

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        AppError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_shared::VoucherId;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::from(LedgerError::AlreadyPosted(VoucherId::new())), StatusCode::CONFLICT, "ALREADY_POSTED")]
    #[case(ApiError::from(LedgerError::InsufficientLines), StatusCode::BAD_REQUEST, "INSUFFICIENT_LINES")]
    #[case(
        ApiError::from(ReconciliationError::Database("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR"
    )]
    #[case(
        ApiError::from(MoneyError::Overflow),
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR"
    )]
    fn test_status_follows_category(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        assert_eq!(err.status(), status);
        assert_eq!(err.code(), code);
    }

    #[tokio::test]
    async fn test_database_message_is_masked() {
        use http_body_util::BodyExt;

        let response = ApiError::from(ReconciliationError::Database("relation missing".into()))
            .into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "An error occurred");
    }
}
