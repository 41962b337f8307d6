pub mod fixed_point;
pub mod listing;
pub mod pool;
pub mod position;
pub mod receipt;
pub mod token;
pub mod valuation;

pub use fixed_point::Q112;
pub use pool::{Dex, PlatformAddresses, Pool, RewardModel, WrapperKind};
pub use position::{Position, PositionDebt, PositionInfo};
pub use receipt::{ReceiptLog, TransactionIntent, TransactionReceipt, TxStage, TxStatus};
pub use token::{Token, TokenRegistry};
pub use valuation::{ApyBreakdown, RewardQuote, TokenExposure, TokenPrice, ValuationSnapshot};
