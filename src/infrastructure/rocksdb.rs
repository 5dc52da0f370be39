use crate::domain::account::{CoinBalance, UserAccount, UserId};
use crate::domain::ports::{TransactionLog, UserStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing user documents.
pub const CF_USERS: &str = "users";
/// Column Family for storing per-user purchase history.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `UserAccount` documents and `TransactionRecord`
/// history using separate Column Families, keyed by user id in both cases.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("users" and "transactions") exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_users = ColumnFamilyDescriptor::new(CF_USERS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_users, cf_transactions])
            .map_err(|e| PaymentError::StorageError(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn get(&self, user: &UserId) -> Result<Option<UserAccount>> {
        let cf = self
            .db
            .cf_handle(CF_USERS)
            .ok_or_else(|| PaymentError::StorageError("users column family not found".into()))?;

        let result = self
            .db
            .get_cf(&cf, user.as_str().as_bytes())
            .map_err(|e| PaymentError::StorageError(e.to_string()))?;

        if let Some(bytes) = result {
            let account = serde_json::from_slice(&bytes)
                .map_err(|e| PaymentError::StorageError(format!("deserialization error: {e}")))?;
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, account: UserAccount) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_USERS)
            .ok_or_else(|| PaymentError::StorageError("users column family not found".into()))?;

        let key = account.id.as_str().as_bytes().to_vec();
        let value = serde_json::to_vec(&account)
            .map_err(|e| PaymentError::StorageError(format!("serialization error: {e}")))?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| PaymentError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn set_balance(&self, user: &UserId, balance: CoinBalance) -> Result<()> {
        // A field update cannot create the document.
        let mut account = self
            .get(user)
            .await?
            .ok_or_else(|| PaymentError::StorageError(format!("no user document for {user}")))?;

        account.coin_balance = balance;
        self.put(account).await
    }

    async fn all(&self) -> Result<Vec<UserAccount>> {
        let cf = self
            .db
            .cf_handle(CF_USERS)
            .ok_or_else(|| PaymentError::StorageError("users column family not found".into()))?;

        let mut accounts = Vec::new();
        let iter = self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start);

        for item in iter {
            let (_key, value) =
                item.map_err(|e| PaymentError::StorageError(format!("iteration error: {e}")))?;
            let account: UserAccount = serde_json::from_slice(&value)
                .map_err(|e| PaymentError::StorageError(format!("deserialization error: {e}")))?;
            accounts.push(account);
        }

        Ok(accounts)
    }
}

#[async_trait]
impl TransactionLog for RocksDBStore {
    async fn append(&self, record: TransactionRecord) -> Result<()> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            PaymentError::StorageError("transactions column family not found".into())
        })?;

        let key = record.user.as_str().as_bytes().to_vec();
        let mut records = match self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| PaymentError::StorageError(e.to_string()))?
        {
            Some(bytes) => serde_json::from_slice::<Vec<TransactionRecord>>(&bytes)
                .map_err(|e| PaymentError::StorageError(format!("deserialization error: {e}")))?,
            None => Vec::new(),
        };
        records.push(record);

        let value = serde_json::to_vec(&records)
            .map_err(|e| PaymentError::StorageError(format!("serialization error: {e}")))?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| PaymentError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn for_user(&self, user: &UserId) -> Result<Vec<TransactionRecord>> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            PaymentError::StorageError("transactions column family not found".into())
        })?;

        let result = self
            .db
            .get_cf(&cf, user.as_str().as_bytes())
            .map_err(|e| PaymentError::StorageError(e.to_string()))?;

        match result {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PaymentError::StorageError(format!("deserialization error: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}
