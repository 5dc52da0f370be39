use super::account::{Amount, CoinAmount, CoinBalance, UserId};
use std::fmt;

/// Locally assigned identifier for one purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of one purchase attempt.
///
/// Linear up to the provider hand-off, then fans out into the three
/// terminal outcomes. Terminal states have no exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    AwaitingGatewayToken,
    AwaitingSdkResult,
    Succeeded,
    Canceled,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Succeeded | OrderStatus::Canceled | OrderStatus::Failed
        )
    }

    /// Whether the machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Created, AwaitingGatewayToken)
                | (Created, Failed)
                | (AwaitingGatewayToken, AwaitingSdkResult)
                | (AwaitingGatewayToken, Failed)
                | (AwaitingSdkResult, Succeeded)
                | (AwaitingSdkResult, Canceled)
                | (AwaitingSdkResult, Failed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Created => "created",
            OrderStatus::AwaitingGatewayToken => "awaiting_gateway_token",
            OrderStatus::AwaitingSdkResult => "awaiting_sdk_result",
            OrderStatus::Succeeded => "succeeded",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One purchase attempt converting currency into coins.
///
/// Immutable except for `status`; the coordinator is the only writer.
/// Discarded once the terminal state has been reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub amount: Amount,
    pub coins: CoinAmount,
    /// Balance snapshot the order was opened against.
    pub balance_before: CoinBalance,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        id: OrderId,
        user: UserId,
        amount: Amount,
        coins: CoinAmount,
        balance_before: CoinBalance,
    ) -> Self {
        Self {
            id,
            user,
            amount,
            coins,
            balance_before,
            status: OrderStatus::Created,
        }
    }

    /// Moves the order along the machine. An invalid move is a
    /// coordinator bug, not an input condition.
    pub fn advance(&mut self, next: OrderStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "invalid order transition {} -> {}",
            self.status,
            next
        );
        self.status = next;
    }
}

/// Terminal notification delivered to the owning UI context.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotice {
    pub order: OrderId,
    pub user: UserId,
    pub status: OrderStatus,
    /// Short status string for the notification screen.
    pub message: String,
}
