//! Interface adapters for getting orders in and reports out.

pub mod csv;
