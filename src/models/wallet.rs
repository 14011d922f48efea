use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::quantize;

/// A persisted `(id, balance)` row. The id is caller-supplied and opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub balance: Decimal,
}

impl Wallet {
    /// A wallet that has just been created: balance zero.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, Decimal::ZERO)
    }

    pub fn new(id: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: id.into(),
            balance: quantize(balance),
        }
    }
}
