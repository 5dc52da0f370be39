//! Adapters implementing the domain ports.
//!
//! Storage comes in two flavors selected at startup: a volatile in-memory
//! store and an optional RocksDB-backed store (feature `storage-rocksdb`).
//! The sandbox provider stands in for the external payment gateway and
//! its on-device SDK.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod sandbox;
