use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Identifier of a user document in the user store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A positive currency amount paid for an order.
///
/// Wraps `rust_decimal::Decimal` so order amounts are validated once at
/// the boundary and rendered consistently for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Decimal string without thousands separators, as the gateway expects.
    pub fn wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A positive number of coins bought by one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoinAmount(u32);

impl CoinAmount {
    pub fn new(value: u32) -> Result<Self, PaymentError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "coin amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for CoinAmount {
    type Error = PaymentError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CoinAmount> for i64 {
    fn from(coins: CoinAmount) -> Self {
        coins.0 as i64
    }
}

impl fmt::Display for CoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user's stored coin balance. Never negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CoinBalance(pub u64);

impl CoinBalance {
    pub const ZERO: Self = Self(0);

    pub fn new(coins: u64) -> Self {
        Self(coins)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Balance after crediting one purchase.
    pub fn credited(self, delta: CoinAmount) -> Self {
        Self(self.0 + delta.value() as u64)
    }
}

impl Add for CoinBalance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for CoinBalance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for CoinBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user document as it lives in the remote user store.
///
/// Field names mirror the stored document (`username`, `coin`) so the
/// persisted form stays compatible with the store schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    /// Display name shown on the order screen.
    #[serde(rename = "username")]
    pub display_name: String,
    /// Spendable coin balance.
    #[serde(rename = "coin")]
    pub coin_balance: CoinBalance,
}

impl UserAccount {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            coin_balance: CoinBalance::ZERO,
        }
    }

    pub fn with_balance(mut self, balance: CoinBalance) -> Self {
        self.coin_balance = balance;
        self
    }
}
