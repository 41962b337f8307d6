use thiserror::Error;

/// Typed error hierarchy for the position engine.
///
/// Library-internal errors use specific variants; the binary wraps with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum EngineError {
    // -- Input validation ---------------------------------------------------
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("a signer is required to {action}; set OWNER_PRIVATE_KEY")]
    MissingSigner { action: String },

    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("insufficient {symbol} balance: required {required}, available {available}")]
    InsufficientBalance {
        symbol: String,
        required: String,
        available: String,
    },

    // -- Unavailable data ---------------------------------------------------
    #[error("data source unavailable: {name}: {reason}")]
    DataUnavailable { name: String, reason: String },

    #[error("read timed out after {timeout_ms}ms: {name}")]
    ReadTimeout { name: String, timeout_ms: u64 },

    #[error("could not compute current APY: {0}")]
    ApyUnavailable(#[source] Box<EngineError>),

    #[error("failed to decode {call} output: {reason}")]
    Decode { call: &'static str, reason: String },

    #[error("value out of range: {0}")]
    Overflow(String),

    // -- Position / pool resolution -----------------------------------------
    #[error("position {position_id} owned by {owner} not found (new positions can take a few minutes to be listed)")]
    PositionNotFound { position_id: u64, owner: String },

    #[error("pool resolution failed: {reason}")]
    PoolResolution { reason: String },

    // -- Unsupported configuration ------------------------------------------
    #[error("not implemented: {what} '{identifier}'")]
    NotImplemented { what: String, identifier: String },

    // -- Execution ----------------------------------------------------------
    #[error("transaction simulation failed: {reason}")]
    SimulationFailed { reason: String },

    #[error("transaction signing failed: {reason}")]
    SigningFailed { reason: String },

    #[error("transaction reverted: {reason} (tx: {tx_hash})")]
    TxReverted { tx_hash: String, reason: String },

    #[error("transaction timed out after {timeout_seconds}s (tx: {tx_hash})")]
    TxTimeout { tx_hash: String, timeout_seconds: u64 },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn unavailable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Whether the failure happened before anything was broadcast.
    pub fn is_pre_submission(&self) -> bool {
        !matches!(self, Self::TxReverted { .. } | Self::TxTimeout { .. })
    }
}
