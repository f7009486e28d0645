use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Upper-cased ticker such as `AAPL` or `BRK.B`.
///
/// Deserialization goes through [`Symbol::parse`], so universe files and CSV
/// backups are validated like any other input. Orders alphabetically and
/// borrows as `str` for map lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, upper-case and validate `input`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();

        let mut len = 0;
        for (index, ch) in ticker.chars().enumerate() {
            len += 1;
            if index == 0 && !ch.is_ascii_alphabetic() {
                return Err(ValidationError::SymbolInvalidStart { ch });
            }
            if !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-')) {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        match len {
            0 => Err(ValidationError::EmptySymbol),
            len if len > MAX_SYMBOL_LEN => Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            }),
            _ => Ok(Self(ticker)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn tickers_are_trimmed_and_upper_cased() {
        assert_eq!(Symbol::parse(" nvda ").unwrap().as_str(), "NVDA");
        assert_eq!("brk.b".parse::<Symbol>().unwrap().as_str(), "BRK.B");
    }

    #[test]
    fn blank_and_oversized_tickers_are_rejected() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert_eq!(
            Symbol::parse("ABCDEFGHIJKLMNOP"),
            Err(ValidationError::SymbolTooLong { len: 16, max: 15 })
        );
    }

    #[test]
    fn tickers_must_start_with_a_letter() {
        let err = Symbol::parse("3M").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidStart { ch: '3' }));
    }

    #[test]
    fn quotes_and_punctuation_are_rejected() {
        let err = Symbol::parse("O'NEIL").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: '\'', index: 1 }));
    }

    #[test]
    fn serde_revalidates_on_the_way_in() {
        let parsed: Symbol = serde_json::from_str("\"tsla\"").unwrap();
        assert_eq!(parsed.as_str(), "TSLA");
        assert!(serde_json::from_str::<Symbol>("\"9TSLA\"").is_err());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"TSLA\"");
    }

    #[test]
    fn maps_keyed_by_symbol_accept_str_lookups() {
        let sectors: BTreeMap<Symbol, &str> = [
            ("ZM", "Technology"),
            ("AMZN", "Consumer Discretionary"),
        ]
        .into_iter()
        .map(|(name, sector)| (Symbol::parse(name).unwrap(), sector))
        .collect();
        assert_eq!(sectors.get("AMZN"), Some(&"Consumer Discretionary"));
        let names: Vec<&str> = sectors.keys().map(Symbol::as_str).collect();
        assert_eq!(names, ["AMZN", "ZM"]);
    }
}
