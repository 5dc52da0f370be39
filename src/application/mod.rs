//! Application layer orchestrating the purchase flow.
//!
//! [`coordinator::OrderCoordinator`] drives each order through the state
//! machine and hands successful payments to [`ledger::LedgerUpdater`],
//! which records the purchase and writes the new balance.

pub mod coordinator;
pub mod ledger;
