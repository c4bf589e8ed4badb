//! Request handlers.

pub mod health;
pub mod session;
pub mod transactions;

pub use health::health;
pub use session::resolve_session;
pub use transactions::{get_transactions, update_transaction, user_access};
