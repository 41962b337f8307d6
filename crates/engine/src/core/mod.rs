pub mod apy;
pub mod resolver;
pub mod rewards;
pub mod valuer;

pub use resolver::{PlatformDirectory, PositionResolver};
pub use valuer::PositionValuer;
