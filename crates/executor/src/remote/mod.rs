mod kite_client;

pub use kite_client::{Brokerage, KiteClient, KiteError};

#[cfg(test)]
pub use kite_client::MockBrokerage;
