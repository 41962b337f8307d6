//! External REST feeds consumed as black boxes.

pub mod borrow_rates;
pub mod homora;
pub(crate) mod http;

pub use borrow_rates::{BorrowRateFeed, CreamRatesClient};
pub use homora::{ApyFeed, HomoraApiClient, ProtocolApi};
