//! Domain types: the wallet record, operation kinds, and exact-decimal amounts.

pub mod amount;
pub mod operation;
pub mod wallet;

pub use amount::{max_balance, quantize, validate_amount, AmountError, BALANCE_SCALE};
pub use operation::OperationKind;
pub use wallet::Wallet;
