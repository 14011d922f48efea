//! Balance mutation kinds. Wire names are the upper-case strings `DEPOSIT` and `WITHDRAW`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::WalletError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Deposit,
    Withdraw,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "DEPOSIT",
            OperationKind::Withdraw => "WITHDRAW",
        }
    }
}

impl FromStr for OperationKind {
    type Err = WalletError;

    /// Anything other than the two known names is an `InvalidOperation`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEPOSIT" => Ok(OperationKind::Deposit),
            "WITHDRAW" => Ok(OperationKind::Withdraw),
            other => Err(WalletError::InvalidOperation(format!(
                "Invalid operation type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
