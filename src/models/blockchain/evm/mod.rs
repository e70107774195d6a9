//! EVM block and transaction views.

mod block;
mod transaction;

pub use block::Block as EvmBlock;
pub use transaction::Transaction as EvmTransaction;
