pub mod bank;
pub mod chain_client;
pub mod composer;
pub mod contracts;
pub mod tx_submitter;

pub use bank::HomoraBank;
pub use chain_client::{ChainClient, RpcChainClient};
pub use composer::{AddLiquidityRequest, TransactionComposer};
pub use tx_submitter::{TransactionSender, TxSubmitter};
