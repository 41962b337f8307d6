use alloy::primitives::Address;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::TokenConfig;
use crate::errors::EngineError;

/// A token resolved against the static reference table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Identifier of the asset on the external price index.
    pub price_index_id: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Read-only symbol/address lookup over the configured token table.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    by_symbol: HashMap<String, Token>,
    by_address: HashMap<Address, String>,
    native_symbol: String,
}

impl TokenRegistry {
    pub fn from_config(
        tokens: &HashMap<String, TokenConfig>,
        native_symbol: &str,
    ) -> Result<Self, EngineError> {
        let mut by_symbol = HashMap::with_capacity(tokens.len());
        let mut by_address = HashMap::with_capacity(tokens.len());

        for (symbol, cfg) in tokens {
            let address: Address = cfg.address.parse().map_err(|e| {
                EngineError::Config(format!("token {symbol}: bad address {}: {e}", cfg.address))
            })?;
            by_address.insert(address, symbol.clone());
            by_symbol.insert(
                symbol.clone(),
                Token {
                    address,
                    symbol: symbol.clone(),
                    decimals: cfg.decimals,
                    price_index_id: cfg.price_index_id.clone(),
                },
            );
        }

        if !by_symbol.contains_key(native_symbol) {
            return Err(EngineError::Config(format!(
                "native reference token {native_symbol} missing from token table"
            )));
        }

        Ok(Self {
            by_symbol,
            by_address,
            native_symbol: native_symbol.to_string(),
        })
    }

    pub fn by_symbol(&self, symbol: &str) -> Result<&Token, EngineError> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownToken(symbol.to_string()))
    }

    pub fn by_address(&self, address: Address) -> Result<&Token, EngineError> {
        self.by_address
            .get(&address)
            .and_then(|symbol| self.by_symbol.get(symbol))
            .ok_or_else(|| EngineError::UnknownToken(address.to_string()))
    }

    /// Parse a listing-supplied address string (any casing) and look it up.
    pub fn by_address_str(&self, address: &str) -> Result<&Token, EngineError> {
        let parsed: Address = address
            .parse()
            .map_err(|_| EngineError::UnknownToken(address.to_string()))?;
        self.by_address(parsed)
    }

    /// The wrapped native asset oracle prices are quoted in.
    pub fn native(&self) -> &Token {
        // Presence checked in `from_config`.
        &self.by_symbol[&self.native_symbol]
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
