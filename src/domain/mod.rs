//! Domain model: accounts and coin values, the order state machine, the
//! purchase ledger, and the ports every external collaborator hides
//! behind.

pub mod account;
pub mod order;
pub mod ports;
pub mod transaction;
