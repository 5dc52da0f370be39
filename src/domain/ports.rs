use super::account::{CoinBalance, UserAccount, UserId};
use super::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gateway reply to a create-order request.
///
/// Field names follow the provider's JSON contract; `return_code == "1"`
/// is the only success signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub return_code: String,
    #[serde(rename = "zp_trans_token")]
    pub trans_token: String,
}

impl GatewayResponse {
    pub const SUCCESS_CODE: &'static str = "1";

    pub fn approved(token: impl Into<String>) -> Self {
        Self {
            return_code: Self::SUCCESS_CODE.to_string(),
            trans_token: token.into(),
        }
    }

    pub fn declined(code: impl Into<String>) -> Self {
        Self {
            return_code: code.into(),
            trans_token: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.return_code == Self::SUCCESS_CODE
    }
}

/// Terminal outcome reported by the on-device payment SDK for one
/// `pay_order` session. Exactly one of these fires per session.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Succeeded {
        provider_order_id: String,
        provider_trans_id: String,
    },
    Canceled {
        provider_order_id: String,
    },
    Error {
        code: i32,
        provider_order_id: String,
    },
}

/// External payment-processing service issuing transaction tokens.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a payment session for `wire_amount`, a decimal string
    /// without thousands separators.
    async fn create_order(&self, wire_amount: &str) -> Result<GatewayResponse>;
}

/// On-device payment library that drives the user through the provider
/// UI and reports a single terminal outcome.
#[async_trait]
pub trait PaymentSdk: Send + Sync {
    async fn pay_order(&self, trans_token: &str, callback_url: &str) -> Result<PaymentOutcome>;
}

/// Remote document store holding user profiles keyed by id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user: &UserId) -> Result<Option<UserAccount>>;
    async fn put(&self, account: UserAccount) -> Result<()>;
    /// Field-level update of the stored balance. Updating an absent
    /// user is an error, matching document-store semantics.
    async fn set_balance(&self, user: &UserId, balance: CoinBalance) -> Result<()>;
    /// Every stored account, for the end-of-run report.
    async fn all(&self) -> Result<Vec<UserAccount>>;
}

/// Append-only purchase history keyed by user id.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append(&self, record: TransactionRecord) -> Result<()>;
    async fn for_user(&self, user: &UserId) -> Result<Vec<TransactionRecord>>;
}

pub type UserStoreArc = Arc<dyn UserStore>;
pub type TransactionLogArc = Arc<dyn TransactionLog>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type PaymentSdkBox = Box<dyn PaymentSdk>;
