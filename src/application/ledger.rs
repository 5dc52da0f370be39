use crate::domain::account::{Amount, CoinAmount, CoinBalance, UserId};
use crate::domain::ports::{TransactionLogArc, UserStoreArc};
use crate::domain::transaction::TransactionRecord;
use crate::error::{PaymentError, Result};
use tracing::{debug, warn};

/// Applies a successful payment to the stored ledger: one transaction
/// record, then one balance write.
///
/// The two writes are independent remote operations. The record append
/// is attempted first and never rolled back, so a balance-write failure
/// leaves the record in place and surfaces as `LedgerWriteFailed`.
pub struct LedgerUpdater {
    users: UserStoreArc,
    log: TransactionLogArc,
}

impl LedgerUpdater {
    pub fn new(users: UserStoreArc, log: TransactionLogArc) -> Self {
        Self { users, log }
    }

    /// Credits `coins` to the user by writing `balance_before + coins`.
    ///
    /// `balance_before` is the once-per-order snapshot taken at submit.
    /// No re-read and no concurrency check happen here: an order that
    /// completed for the same user since the snapshot is overwritten,
    /// last write wins on the value that was read.
    pub async fn apply(
        &self,
        user: &UserId,
        coins: CoinAmount,
        amount_paid: Amount,
        balance_before: CoinBalance,
    ) -> Result<CoinBalance> {
        let record = TransactionRecord::purchase(user.clone(), coins, amount_paid);
        // Record first. A failed append does not stop the balance write;
        // only the attempt ordering is guaranteed.
        if let Err(e) = self.log.append(record).await {
            warn!(user = %user, error = %e, "transaction record append failed");
        }

        let new_balance = balance_before.credited(coins);
        self.users
            .set_balance(user, new_balance)
            .await
            .map_err(|e| PaymentError::LedgerWriteFailed(e.to_string()))?;

        debug!(user = %user, balance = %new_balance, "balance updated");
        Ok(new_balance)
    }
}
