use thiserror::Error;

/// Errors raised while driving an order or applying its ledger effect.
///
/// Each variant is caught at its point of origin and converted into a
/// user-visible notice; none of them may escape `submit` as a panic.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("payment canceled by user")]
    SdkCanceled,
    #[error("payment provider error (code {code})")]
    SdkError { code: i32 },
    #[error("balance write failed after transaction was recorded: {0}")]
    LedgerWriteFailed(String),
    #[error("user lookup failed: {0}")]
    UserLookupFailed(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    /// Short status string shown on the terminal notification screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            PaymentError::GatewayUnavailable(_) => "order creation failed",
            PaymentError::SdkCanceled => "payment canceled",
            PaymentError::SdkError { .. } => "payment failed",
            PaymentError::LedgerWriteFailed(_) => "balance update failed",
            PaymentError::UserLookupFailed(_) => "could not load user profile",
            _ => "payment failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
