pub mod account_writer;
pub mod order_reader;
