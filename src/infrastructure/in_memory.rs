use crate::domain::account::{CoinBalance, UserAccount, UserId};
use crate::domain::ports::{TransactionLog, UserStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory user store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. The default
/// store for tests and the replay binary.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, UserAccount>>>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, user: &UserId) -> Result<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.get(user).cloned())
    }

    async fn put(&self, account: UserAccount) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(account.id.clone(), account);
        Ok(())
    }

    async fn set_balance(&self, user: &UserId, balance: CoinBalance) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(user) {
            Some(account) => {
                account.coin_balance = balance;
                Ok(())
            }
            // A field update cannot create the document.
            None => Err(PaymentError::StorageError(format!(
                "no user document for {user}"
            ))),
        }
    }

    async fn all(&self) -> Result<Vec<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}

/// A thread-safe in-memory transaction log, keyed by user id.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLog {
    records: Arc<RwLock<HashMap<UserId, Vec<TransactionRecord>>>>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty in-memory transaction log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.entry(record.user.clone()).or_default().push(record);
        Ok(())
    }

    async fn for_user(&self, user: &UserId) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(user).cloned().unwrap_or_default())
    }
}
