// In crates/analytics/src/pips.rs

use std::collections::HashMap;

use core_types::Symbol;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{Error, Result};

/// Resolves the pip size of an instrument. Implementations must return a positive value.
pub trait PipSizeResolver {
    fn pip_size(&self, symbol: &Symbol) -> Decimal;
}

impl<F> PipSizeResolver for F
where
    F: Fn(&Symbol) -> Decimal,
{
    fn pip_size(&self, symbol: &Symbol) -> Decimal {
        self(symbol)
    }
}

/// Pip sizes from configuration: explicit per-symbol overrides, a JPY rule, then a default.
#[derive(Debug, Clone)]
pub struct PipTable {
    default: Decimal,
    overrides: HashMap<String, Decimal>,
}

const JPY_PIP_SIZE: Decimal = dec!(0.01);

impl PipTable {
    pub fn new(default: Decimal, overrides: HashMap<String, Decimal>) -> Result<Self> {
        if default <= Decimal::ZERO {
            return Err(Error::InvalidPipSize { symbol: "<default>".to_string(), size: default });
        }
        if let Some((symbol, size)) = overrides.iter().find(|(_, size)| **size <= Decimal::ZERO) {
            return Err(Error::InvalidPipSize { symbol: symbol.clone(), size: *size });
        }
        let overrides = overrides
            .into_iter()
            .map(|(symbol, size)| (symbol.to_uppercase(), size))
            .collect();
        Ok(Self { default, overrides })
    }
}

impl Default for PipTable {
    fn default() -> Self {
        Self { default: dec!(0.0001), overrides: HashMap::new() }
    }
}

impl PipSizeResolver for PipTable {
    fn pip_size(&self, symbol: &Symbol) -> Decimal {
        let key = symbol.0.to_uppercase();
        if let Some(size) = self.overrides.get(&key) {
            return *size;
        }
        if key.contains("JPY") {
            return JPY_PIP_SIZE;
        }
        self.default
    }
}
