use super::ledger::LedgerUpdater;
use crate::config::GatewayConfig;
use crate::domain::account::{Amount, CoinAmount, CoinBalance, UserAccount, UserId};
use crate::domain::order::{Order, OrderId, OrderNotice, OrderStatus};
use crate::domain::ports::{
    PaymentGatewayBox, PaymentOutcome, PaymentSdkBox, TransactionLogArc, UserStoreArc,
};
use crate::error::{PaymentError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Notice shown when an order completes and its ledger effect lands.
pub const PAYMENT_COMPLETED: &str = "payment completed";

/// Drives purchases from submission to a terminal state.
///
/// Every collaborator is injected; the coordinator owns the only code
/// path that mutates an order's status, and each terminal transition is
/// reported once on the notice channel handed out by
/// [`OrderCoordinator::new`].
pub struct OrderCoordinator {
    users: UserStoreArc,
    ledger: LedgerUpdater,
    gateway: PaymentGatewayBox,
    sdk: PaymentSdkBox,
    config: GatewayConfig,
    notices: mpsc::UnboundedSender<OrderNotice>,
    next_order: AtomicU64,
}

impl OrderCoordinator {
    /// Builds a coordinator and the single-consumer channel its
    /// terminal notices arrive on.
    pub fn new(
        users: UserStoreArc,
        log: TransactionLogArc,
        gateway: PaymentGatewayBox,
        sdk: PaymentSdkBox,
        config: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<OrderNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        info!(
            app_id = config.app_id,
            environment = %config.environment,
            "payment provider initialized"
        );
        let ledger = LedgerUpdater::new(users.clone(), log);
        let coordinator = Self {
            users,
            ledger,
            gateway,
            sdk,
            config,
            notices,
            next_order: AtomicU64::new(1),
        };
        (coordinator, receiver)
    }

    /// Runs one order to a terminal state and reports it.
    ///
    /// Never panics and never returns an error to the caller: every
    /// failure folds into a `Failed` or `Canceled` order plus a notice.
    pub async fn submit(&self, user: &UserId, amount: Amount, coins: CoinAmount) -> Order {
        let id = OrderId(self.next_order.fetch_add(1, Ordering::Relaxed));
        debug!(order = %id, user = %user, amount = %amount, coins = %coins, "order submitted");

        // Snapshot the account once per order. A failed lookup ends the
        // order before any gateway traffic.
        let account = match self.snapshot(user).await {
            Ok(account) => account,
            Err(e) => {
                warn!(order = %id, user = %user, error = %e, "user snapshot failed");
                let order = Order::new(id, user.clone(), amount, coins, CoinBalance::ZERO);
                return self.fail(order, &e);
            }
        };

        let mut order = Order::new(id, user.clone(), amount, coins, account.coin_balance);
        order.advance(OrderStatus::AwaitingGatewayToken);

        let token = match self.request_token(&order).await {
            Ok(token) => token,
            Err(e) => {
                warn!(order = %id, error = %e, "gateway rejected order");
                return self.fail(order, &e);
            }
        };

        order.advance(OrderStatus::AwaitingSdkResult);
        debug!(order = %id, "payment session started");

        match self.sdk.pay_order(&token, &self.config.callback_url).await {
            Ok(PaymentOutcome::Succeeded {
                provider_trans_id, ..
            }) => {
                order.advance(OrderStatus::Succeeded);
                info!(order = %id, trans = %provider_trans_id, "payment succeeded");
                // Exactly one ledger attempt per success. Its result
                // selects the notice but never the order status.
                let message = match self
                    .ledger
                    .apply(user, coins, amount, order.balance_before)
                    .await
                {
                    Ok(balance) => {
                        debug!(order = %id, balance = %balance, "ledger updated");
                        PAYMENT_COMPLETED.to_string()
                    }
                    Err(e) => {
                        warn!(order = %id, error = %e, "ledger update failed");
                        e.user_message().to_string()
                    }
                };
                self.notify(&order, message);
                order
            }
            Ok(PaymentOutcome::Canceled { .. }) => {
                order.advance(OrderStatus::Canceled);
                info!(order = %id, "payment canceled by user");
                self.notify(&order, PaymentError::SdkCanceled.user_message().to_string());
                order
            }
            Ok(PaymentOutcome::Error { code, .. }) => {
                warn!(order = %id, code, "payment provider reported an error");
                self.fail(order, &PaymentError::SdkError { code })
            }
            Err(e) => {
                warn!(order = %id, error = %e, "payment session failed");
                self.fail(order, &e)
            }
        }
    }

    async fn snapshot(&self, user: &UserId) -> Result<UserAccount> {
        match self.users.get(user).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(PaymentError::UserLookupFailed(format!(
                "no such user: {user}"
            ))),
            Err(e) => Err(PaymentError::UserLookupFailed(e.to_string())),
        }
    }

    async fn request_token(&self, order: &Order) -> Result<String> {
        // Any transport-level failure reads as an unavailable gateway.
        let response = self
            .gateway
            .create_order(&order.amount.wire())
            .await
            .map_err(|e| match e {
                PaymentError::GatewayUnavailable(_) => e,
                other => PaymentError::GatewayUnavailable(other.to_string()),
            })?;

        if response.is_success() {
            Ok(response.trans_token)
        } else {
            Err(PaymentError::GatewayUnavailable(format!(
                "gateway returned code {}",
                response.return_code
            )))
        }
    }

    fn fail(&self, mut order: Order, error: &PaymentError) -> Order {
        order.advance(OrderStatus::Failed);
        self.notify(&order, error.user_message().to_string());
        order
    }

    fn notify(&self, order: &Order, message: String) {
        let notice = OrderNotice {
            order: order.id,
            user: order.user.clone(),
            status: order.status,
            message,
        };
        // The receiver may already be gone during shutdown.
        if self.notices.send(notice).is_err() {
            debug!(order = %order.id, "notice receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{TransactionLog, UserStore};
    use crate::domain::transaction::TransactionRecord;
    use crate::infrastructure::in_memory::{InMemoryTransactionLog, InMemoryUserStore};
    use crate::infrastructure::sandbox::{SandboxProvider, ScriptedOutcome};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Harness {
        coordinator: OrderCoordinator,
        notices: mpsc::UnboundedReceiver<OrderNotice>,
        users: Arc<InMemoryUserStore>,
        log: Arc<InMemoryTransactionLog>,
        provider: SandboxProvider,
    }

    async fn harness(script: &[ScriptedOutcome]) -> Harness {
        let users = Arc::new(InMemoryUserStore::new());
        users
            .put(UserAccount::new("u1", "alice").with_balance(CoinBalance(20)))
            .await
            .unwrap();
        let log = Arc::new(InMemoryTransactionLog::new());
        let provider = SandboxProvider::new(script.to_vec());

        let (coordinator, notices) = OrderCoordinator::new(
            users.clone(),
            log.clone(),
            Box::new(provider.clone()),
            Box::new(provider.clone()),
            GatewayConfig::default(),
        );
        Harness {
            coordinator,
            notices,
            users,
            log,
            provider,
        }
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    fn coins(value: u32) -> CoinAmount {
        CoinAmount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_success_path_credits_balance() {
        let mut h = harness(&[ScriptedOutcome::Success]).await;
        let user = UserId::from("u1");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Succeeded);
        assert_eq!(order.balance_before, CoinBalance(20));

        let stored = h.users.get(&user).await.unwrap().unwrap();
        assert_eq!(stored.coin_balance, CoinBalance(120));

        let records = h.log.for_user(&user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coin_delta, 100);
        assert_eq!(records[0].amount_paid.value(), dec!(50000));

        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.status, OrderStatus::Succeeded);
        assert_eq!(notice.message, PAYMENT_COMPLETED);
    }

    #[tokio::test]
    async fn test_gateway_receives_wire_amount() {
        let h = harness(&[ScriptedOutcome::Success]).await;
        let user = UserId::from("u1");

        h.coordinator
            .submit(&user, amount(dec!(50000.0)), coins(100))
            .await;

        // Decimal string without separators or trailing zeros.
        assert_eq!(h.provider.created_amounts().await, vec!["50000"]);
    }

    #[tokio::test]
    async fn test_declined_gateway_skips_sdk_and_ledger() {
        let mut h = harness(&[ScriptedOutcome::Declined]).await;
        let user = UserId::from("u1");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Failed);
        // No SDK session was started.
        assert!(h.provider.paid_tokens().await.is_empty());
        // No ledger effect.
        let stored = h.users.get(&user).await.unwrap().unwrap();
        assert_eq!(stored.coin_balance, CoinBalance(20));
        assert!(h.log.for_user(&user).await.unwrap().is_empty());

        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.message, "order creation failed");
    }

    #[tokio::test]
    async fn test_unreachable_gateway_fails_order() {
        let mut h = harness(&[ScriptedOutcome::Unreachable]).await;
        let user = UserId::from("u1");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Failed);
        assert!(h.log.for_user(&user).await.unwrap().is_empty());
        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.message, "order creation failed");
    }

    #[tokio::test]
    async fn test_cancel_has_no_ledger_effect() {
        let mut h = harness(&[ScriptedOutcome::Cancel]).await;
        let user = UserId::from("u1");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Canceled);
        let stored = h.users.get(&user).await.unwrap().unwrap();
        assert_eq!(stored.coin_balance, CoinBalance(20));
        assert!(h.log.for_user(&user).await.unwrap().is_empty());

        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.status, OrderStatus::Canceled);
        assert_eq!(notice.message, "payment canceled");
    }

    #[tokio::test]
    async fn test_sdk_error_fails_order() {
        let mut h = harness(&[ScriptedOutcome::Error]).await;
        let user = UserId::from("u1");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Failed);
        assert!(h.log.for_user(&user).await.unwrap().is_empty());

        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.message, "payment failed");
    }

    #[tokio::test]
    async fn test_unknown_user_fails_before_gateway() {
        let mut h = harness(&[ScriptedOutcome::Success]).await;
        let user = UserId::from("nobody");

        let order = h
            .coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.balance_before, CoinBalance::ZERO);
        // The gateway was never contacted.
        assert_eq!(h.provider.created_orders(), 0);

        let notice = h.notices.recv().await.unwrap();
        assert_eq!(notice.message, "could not load user profile");
    }

    #[tokio::test]
    async fn test_balance_write_failure_keeps_status_and_record() {
        struct WriteRefusingStore {
            inner: Arc<InMemoryUserStore>,
        }

        #[async_trait]
        impl UserStore for WriteRefusingStore {
            async fn get(&self, user: &UserId) -> crate::error::Result<Option<UserAccount>> {
                self.inner.get(user).await
            }
            async fn put(&self, account: UserAccount) -> crate::error::Result<()> {
                self.inner.put(account).await
            }
            async fn set_balance(
                &self,
                _user: &UserId,
                _balance: CoinBalance,
            ) -> crate::error::Result<()> {
                Err(PaymentError::StorageError("write refused".to_string()))
            }
            async fn all(&self) -> crate::error::Result<Vec<UserAccount>> {
                self.inner.all().await
            }
        }

        let inner = Arc::new(InMemoryUserStore::new());
        inner
            .put(UserAccount::new("u1", "alice").with_balance(CoinBalance(20)))
            .await
            .unwrap();
        let log = Arc::new(InMemoryTransactionLog::new());
        let provider = SandboxProvider::new(vec![ScriptedOutcome::Success]);

        let (coordinator, mut notices) = OrderCoordinator::new(
            Arc::new(WriteRefusingStore {
                inner: inner.clone(),
            }),
            log.clone(),
            Box::new(provider.clone()),
            Box::new(provider),
            GatewayConfig::default(),
        );

        let user = UserId::from("u1");
        let order = coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        // The payment itself succeeded; only the notice reflects the
        // failed balance write. The record is already in the log.
        assert_eq!(order.status, OrderStatus::Succeeded);
        assert_eq!(log.for_user(&user).await.unwrap().len(), 1);
        assert_eq!(
            inner.get(&user).await.unwrap().unwrap().coin_balance,
            CoinBalance(20)
        );

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.status, OrderStatus::Succeeded);
        assert_eq!(notice.message, "balance update failed");
    }

    #[tokio::test]
    async fn test_sequential_orders_accumulate() {
        let mut h = harness(&[ScriptedOutcome::Success, ScriptedOutcome::Success]).await;
        let user = UserId::from("u1");

        h.coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;
        let second = h
            .coordinator
            .submit(&user, amount(dec!(25000)), coins(50))
            .await;

        // The second order snapshots the balance the first one wrote.
        assert_eq!(second.balance_before, CoinBalance(120));
        let stored = h.users.get(&user).await.unwrap().unwrap();
        assert_eq!(stored.coin_balance, CoinBalance(170));

        let first_notice = h.notices.recv().await.unwrap();
        let second_notice = h.notices.recv().await.unwrap();
        assert_eq!(first_notice.order, OrderId(1));
        assert_eq!(second_notice.order, OrderId(2));
        assert!(first_notice.status.is_terminal());
        assert!(second_notice.status.is_terminal());
    }

    #[tokio::test]
    async fn test_append_failure_still_completes_order() {
        struct AppendRefusingLog;

        #[async_trait]
        impl TransactionLog for AppendRefusingLog {
            async fn append(&self, _record: TransactionRecord) -> crate::error::Result<()> {
                Err(PaymentError::StorageError("append refused".to_string()))
            }
            async fn for_user(
                &self,
                _user: &UserId,
            ) -> crate::error::Result<Vec<TransactionRecord>> {
                Ok(Vec::new())
            }
        }

        let users = Arc::new(InMemoryUserStore::new());
        users
            .put(UserAccount::new("u1", "alice").with_balance(CoinBalance(20)))
            .await
            .unwrap();
        let provider = SandboxProvider::new(vec![ScriptedOutcome::Success]);

        let (coordinator, mut notices) = OrderCoordinator::new(
            users.clone(),
            Arc::new(AppendRefusingLog),
            Box::new(provider.clone()),
            Box::new(provider),
            GatewayConfig::default(),
        );

        let user = UserId::from("u1");
        let order = coordinator
            .submit(&user, amount(dec!(50000)), coins(100))
            .await;

        // The balance write still runs after a failed append.
        assert_eq!(order.status, OrderStatus::Succeeded);
        assert_eq!(
            users.get(&user).await.unwrap().unwrap().coin_balance,
            CoinBalance(120)
        );
        assert_eq!(notices.recv().await.unwrap().message, PAYMENT_COMPLETED);
    }
}
