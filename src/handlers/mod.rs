pub mod health;
pub mod wallets;

pub use health::{health_check, root};
pub use wallets::{
    get_wallet,
    perform_operation,
    OperationResponse,
    WalletOperationRequest,
    WalletResponse,
};
