pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod execution;
pub mod logging;
pub mod oracle;
pub mod platforms;
pub mod types;

#[cfg(test)]
mod testing;
