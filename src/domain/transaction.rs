use super::account::{Amount, CoinAmount, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of one successful purchase.
///
/// Written before the balance update and never rolled back, so the log
/// can run ahead of the stored balance when the balance write fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user: UserId,
    /// Signed coin movement; purchases are always positive.
    pub coin_delta: i64,
    pub amount_paid: Amount,
    pub recorded_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Builds a purchase record stamped with the current wall-clock time.
    pub fn purchase(user: UserId, coins: CoinAmount, amount_paid: Amount) -> Self {
        Self {
            user,
            coin_delta: coins.into(),
            amount_paid,
            recorded_at: Utc::now(),
        }
    }
}
