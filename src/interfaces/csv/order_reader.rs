use crate::error::{PaymentError, Result};
use crate::infrastructure::sandbox::ScriptedOutcome;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a replay script: a coin purchase to drive through the
/// coordinator, plus the outcome the sandbox provider should script
/// for it.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub user: String,
    pub amount: Decimal,
    pub coins: u32,
    pub outcome: ScriptedOutcome,
}

/// Reads purchase requests from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<PurchaseRequest>`. It handles whitespace trimming and flexible
/// record lengths automatically.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    /// Creates a new `OrderReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests.
    pub fn orders(self) -> impl Iterator<Item = Result<PurchaseRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
