//! The ticker universe a series is generated for.
//!
//! A [`Universe`] fixes the symbol list (in generation order) together with
//! per-symbol starting prices, base volumes and sectors. Symbols without an
//! explicit entry fall back to the universe-wide defaults.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, Symbol};

const DEFAULT_BASE_PRICE: f64 = 100.0;
const DEFAULT_BASE_VOLUME: i64 = 1_000_000;
const FALLBACK_SECTOR: &str = "Technology";

const DEFAULT_SYMBOLS: [(&str, f64); 30] = [
    ("AAPL", 150.0),
    ("GOOGL", 2500.0),
    ("MSFT", 300.0),
    ("TSLA", 800.0),
    ("AMZN", 3200.0),
    ("META", 200.0),
    ("NVDA", 400.0),
    ("NFLX", 400.0),
    ("AMD", 100.0),
    ("INTC", 50.0),
    ("CRM", 200.0),
    ("ORCL", 80.0),
    ("ADBE", 500.0),
    ("PYPL", 100.0),
    ("UBER", 40.0),
    ("LYFT", 30.0),
    ("ZOOM", 100.0),
    ("SHOP", 1000.0),
    ("SQ", 80.0),
    ("ROKU", 60.0),
    ("TWTR", 40.0),
    ("SNAP", 20.0),
    ("PINS", 25.0),
    ("SPOT", 150.0),
    ("ZM", 100.0),
    ("DOCU", 80.0),
    ("OKTA", 100.0),
    ("SNOW", 200.0),
    ("PLTR", 15.0),
    ("COIN", 150.0),
];

const DEFAULT_BASE_VOLUMES: [(&str, i64); 8] = [
    ("AAPL", 50_000_000),
    ("GOOGL", 1_500_000),
    ("MSFT", 30_000_000),
    ("TSLA", 25_000_000),
    ("AMZN", 3_000_000),
    ("META", 20_000_000),
    ("NVDA", 15_000_000),
    ("NFLX", 5_000_000),
];

const DEFAULT_SECTORS: [(&str, &str); 12] = [
    ("AAPL", "Technology"),
    ("GOOGL", "Technology"),
    ("MSFT", "Technology"),
    ("TSLA", "Automotive"),
    ("AMZN", "E-commerce"),
    ("META", "Technology"),
    ("NVDA", "Technology"),
    ("NFLX", "Entertainment"),
    ("AMD", "Technology"),
    ("INTC", "Technology"),
    ("CRM", "Technology"),
    ("ORCL", "Technology"),
];

/// Symbol list plus per-symbol simulation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    /// Symbols in generation order.
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub base_prices: BTreeMap<Symbol, f64>,
    #[serde(default = "default_base_price")]
    pub default_base_price: f64,
    #[serde(default)]
    pub base_volumes: BTreeMap<Symbol, i64>,
    #[serde(default = "default_base_volume")]
    pub default_base_volume: i64,
    #[serde(default)]
    pub sectors: BTreeMap<Symbol, String>,
    #[serde(default = "fallback_sector")]
    pub fallback_sector: String,
}

impl Default for Universe {
    fn default() -> Self {
        let symbol = |name: &str| Symbol::parse(name).expect("built-in symbols are valid");

        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|(name, _)| symbol(name)).collect(),
            base_prices: DEFAULT_SYMBOLS
                .iter()
                .map(|(name, price)| (symbol(name), *price))
                .collect(),
            default_base_price: DEFAULT_BASE_PRICE,
            base_volumes: DEFAULT_BASE_VOLUMES
                .iter()
                .map(|(name, volume)| (symbol(name), *volume))
                .collect(),
            default_base_volume: DEFAULT_BASE_VOLUME,
            sectors: DEFAULT_SECTORS
                .iter()
                .map(|(name, sector)| (symbol(name), (*sector).to_string()))
                .collect(),
            fallback_sector: FALLBACK_SECTOR.to_string(),
        }
    }
}

impl Universe {
    /// A universe over `symbols` using only the universe-wide defaults.
    pub fn with_symbols(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            base_prices: BTreeMap::new(),
            default_base_price: DEFAULT_BASE_PRICE,
            base_volumes: BTreeMap::new(),
            default_base_volume: DEFAULT_BASE_VOLUME,
            sectors: BTreeMap::new(),
            fallback_sector: FALLBACK_SECTOR.to_string(),
        }
    }

    /// Parse and validate a universe from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigurationError> {
        let universe: Self = serde_json::from_str(input)
            .map_err(|error| ConfigurationError::UniverseFile(error.to_string()))?;
        universe.validate()?;
        Ok(universe)
    }

    /// Read, parse and validate a universe JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = fs::read_to_string(path).map_err(|error| {
            ConfigurationError::UniverseFile(format!("{}: {error}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.symbols.is_empty() {
            return Err(ConfigurationError::EmptyUniverse);
        }

        let mut seen = HashSet::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            if !seen.insert(symbol) {
                return Err(ConfigurationError::DuplicateSymbol {
                    symbol: symbol.to_string(),
                });
            }
        }

        let prices = self
            .base_prices
            .iter()
            .map(|(symbol, price)| (symbol.as_str(), *price))
            .chain(std::iter::once(("<default>", self.default_base_price)));
        for (symbol, price) in prices {
            if !price.is_finite() || price <= 0.0 {
                return Err(ConfigurationError::InvalidParameter {
                    name: "base_price",
                    reason: format!("{symbol} has non-positive base price {price}"),
                });
            }
        }

        let volumes = self
            .base_volumes
            .iter()
            .map(|(symbol, volume)| (symbol.as_str(), *volume))
            .chain(std::iter::once(("<default>", self.default_base_volume)));
        for (symbol, volume) in volumes {
            if volume <= 0 {
                return Err(ConfigurationError::InvalidParameter {
                    name: "base_volume",
                    reason: format!("{symbol} has non-positive base volume {volume}"),
                });
            }
        }

        if self.fallback_sector.trim().is_empty() {
            return Err(ConfigurationError::InvalidParameter {
                name: "fallback_sector",
                reason: String::from("must not be empty"),
            });
        }

        Ok(())
    }

    pub fn base_price(&self, symbol: &Symbol) -> f64 {
        self.base_prices
            .get(symbol)
            .copied()
            .unwrap_or(self.default_base_price)
    }

    pub fn base_volume(&self, symbol: &Symbol) -> i64 {
        self.base_volumes
            .get(symbol)
            .copied()
            .unwrap_or(self.default_base_volume)
    }

    pub fn sector(&self, symbol: &Symbol) -> &str {
        self.sectors
            .get(symbol)
            .map(String::as_str)
            .unwrap_or(self.fallback_sector.as_str())
    }
}

fn default_base_price() -> f64 {
    DEFAULT_BASE_PRICE
}

fn default_base_volume() -> i64 {
    DEFAULT_BASE_VOLUME
}

fn fallback_sector() -> String {
    FALLBACK_SECTOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str) -> Symbol {
        Symbol::parse(name).unwrap()
    }

    #[test]
    fn default_universe_has_thirty_symbols_in_order() {
        let universe = Universe::default();
        universe.validate().expect("default universe is valid");
        assert_eq!(universe.symbols.len(), 30);
        assert_eq!(universe.symbols[0].as_str(), "AAPL");
        assert_eq!(universe.symbols[29].as_str(), "COIN");
    }

    #[test]
    fn lookups_fall_back_to_defaults() {
        let universe = Universe::default();
        assert_eq!(universe.base_price(&symbol("GOOGL")), 2500.0);
        assert_eq!(universe.base_volume(&symbol("AAPL")), 50_000_000);
        assert_eq!(universe.base_volume(&symbol("PLTR")), 1_000_000);
        assert_eq!(universe.sector(&symbol("TSLA")), "Automotive");
        assert_eq!(universe.sector(&symbol("SNOW")), "Technology");
        assert_eq!(universe.base_price(&symbol("XYZ")), 100.0);
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let universe = Universe::from_json_str(
            r#"{
                "symbols": ["xom", "cvx"],
                "base_prices": {"XOM": 110.5},
                "sectors": {"XOM": "Energy"},
                "fallback_sector": "Energy"
            }"#,
        )
        .expect("valid universe");

        assert_eq!(universe.symbols, vec![symbol("XOM"), symbol("CVX")]);
        assert_eq!(universe.base_price(&symbol("XOM")), 110.5);
        assert_eq!(universe.base_price(&symbol("CVX")), 100.0);
        assert_eq!(universe.base_volume(&symbol("CVX")), 1_000_000);
        assert_eq!(universe.sector(&symbol("CVX")), "Energy");
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let err = Universe::from_json_str(r#"{"symbols": ["AMD", "amd"]}"#).expect_err("must fail");
        assert_eq!(
            err,
            ConfigurationError::DuplicateSymbol {
                symbol: String::from("AMD")
            }
        );
    }

    #[test]
    fn rejects_empty_universe() {
        let err = Universe::from_json_str(r#"{"symbols": []}"#).expect_err("must fail");
        assert_eq!(err, ConfigurationError::EmptyUniverse);
    }

    #[test]
    fn rejects_invalid_symbol_in_file() {
        let err = Universe::from_json_str(r#"{"symbols": ["1BAD"]}"#).expect_err("must fail");
        assert!(matches!(err, ConfigurationError::UniverseFile(_)));
    }

    #[test]
    fn rejects_non_positive_base_price() {
        let mut universe = Universe::with_symbols(vec![symbol("AMD")]);
        universe.base_prices.insert(symbol("AMD"), 0.0);
        let err = universe.validate().expect_err("must fail");
        assert!(matches!(
            err,
            ConfigurationError::InvalidParameter {
                name: "base_price",
                ..
            }
        ));
    }
}
