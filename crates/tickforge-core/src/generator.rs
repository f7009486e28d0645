//! Synthetic daily price series.
//!
//! Each symbol gets an independent multiplicative random walk sampled on
//! evenly spaced dates. Close prices come straight from the walk, opens are
//! the close perturbed by a small overnight gap, and highs/lows widen the
//! open/close body by a half-normal fraction. Volumes and fundamentals are
//! statistical filler bounded by [`GeneratorConfig`].
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use tickforge_core::{DateRange, GeneratorConfig, MarketSeriesGenerator, Universe};
//! use time::macros::{date, datetime};
//!
//! let generator = MarketSeriesGenerator::new(GeneratorConfig {
//!     num_rows: 60,
//!     ..GeneratorConfig::default()
//! })?;
//! let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 12 - 31))?;
//! let records = generator.generate_with_rng(
//!     &Universe::default(),
//!     &range,
//!     datetime!(2025-01-01 00:00:00 UTC),
//!     &mut StdRng::seed_from_u64(7),
//! )?;
//! assert_eq!(records.len(), 60);
//! # Ok::<(), tickforge_core::ConfigurationError>(())
//! ```

use rand::distributions::{Bernoulli, Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::{ConfigurationError, DailyPriceRecord, DateRange, Universe};

/// Parameters of the per-step log-return distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalk {
    /// Mean daily return.
    pub drift: f64,
    /// Standard deviation of the daily return.
    pub volatility: f64,
    /// Lowest price the walk may reach.
    pub price_floor: f64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            drift: 0.001,
            volatility: 0.02,
            price_floor: 1.0,
        }
    }
}

/// Closed interval for uniformly drawn values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Ranges and null probabilities for the fundamental columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsConfig {
    pub market_cap: ValueRange,
    pub market_cap_null_probability: f64,
    pub pe_ratio: ValueRange,
    pub pe_ratio_null_probability: f64,
    pub dividend_yield: ValueRange,
    /// Probability that a non-null dividend yield is exactly zero.
    pub dividend_yield_zero_probability: f64,
    pub dividend_yield_null_probability: f64,
}

impl Default for FundamentalsConfig {
    fn default() -> Self {
        Self {
            market_cap: ValueRange::new(1.0e9, 5.0e10),
            market_cap_null_probability: 0.0,
            pe_ratio: ValueRange::new(10.0, 50.0),
            pe_ratio_null_probability: 0.1,
            dividend_yield: ValueRange::new(0.0, 0.05),
            dividend_yield_zero_probability: 0.3,
            dividend_yield_null_probability: 0.0,
        }
    }
}

/// Full generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total rows across all symbols.
    pub num_rows: usize,
    pub walk: RandomWalk,
    /// Standard deviation of the relative open-vs-close gap.
    pub open_gap_stddev: f64,
    /// Standard deviation of the half-normal high/low expansion.
    pub range_stddev: f64,
    /// Standard deviation of the relative volume noise.
    pub volume_noise_stddev: f64,
    pub min_volume: i64,
    pub fundamentals: FundamentalsConfig,
    /// Seed for reproducible output; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_rows: 10_000,
            walk: RandomWalk::default(),
            open_gap_stddev: 0.005,
            range_stddev: 0.015,
            volume_noise_stddev: 0.3,
            min_volume: 100_000,
            fundamentals: FundamentalsConfig::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_rows == 0 {
            return Err(ConfigurationError::ZeroRows);
        }

        ensure_finite("walk.drift", self.walk.drift)?;
        ensure_stddev("walk.volatility", self.walk.volatility)?;
        ensure_stddev("open_gap_stddev", self.open_gap_stddev)?;
        ensure_stddev("range_stddev", self.range_stddev)?;
        ensure_stddev("volume_noise_stddev", self.volume_noise_stddev)?;

        if !self.walk.price_floor.is_finite() || self.walk.price_floor <= 0.0 {
            return Err(invalid("walk.price_floor", "must be a positive number"));
        }
        if self.min_volume <= 0 {
            return Err(invalid("min_volume", "must be positive"));
        }

        let fundamentals = &self.fundamentals;
        ensure_range("fundamentals.market_cap", fundamentals.market_cap)?;
        ensure_range("fundamentals.pe_ratio", fundamentals.pe_ratio)?;
        ensure_range("fundamentals.dividend_yield", fundamentals.dividend_yield)?;
        ensure_probability(
            "fundamentals.market_cap_null_probability",
            fundamentals.market_cap_null_probability,
        )?;
        ensure_probability(
            "fundamentals.pe_ratio_null_probability",
            fundamentals.pe_ratio_null_probability,
        )?;
        ensure_probability(
            "fundamentals.dividend_yield_zero_probability",
            fundamentals.dividend_yield_zero_probability,
        )?;
        ensure_probability(
            "fundamentals.dividend_yield_null_probability",
            fundamentals.dividend_yield_null_probability,
        )?;

        Ok(())
    }
}

/// Split `num_rows` across `symbol_count` symbols.
///
/// Every symbol gets `num_rows / symbol_count` rows and the first
/// `num_rows % symbol_count` symbols get one more, so the total is always
/// `num_rows`.
pub fn allocate_rows(num_rows: usize, symbol_count: usize) -> Vec<usize> {
    if symbol_count == 0 {
        return Vec::new();
    }
    let per_symbol = num_rows / symbol_count;
    let remainder = num_rows % symbol_count;
    (0..symbol_count)
        .map(|index| per_symbol + usize::from(index < remainder))
        .collect()
}

/// Generates [`DailyPriceRecord`]s for a universe and date range.
#[derive(Debug, Clone)]
pub struct MarketSeriesGenerator {
    config: GeneratorConfig,
}

impl MarketSeriesGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate using the configured seed, or OS entropy when unseeded.
    pub fn generate(
        &self,
        universe: &Universe,
        range: &DateRange,
        created_at: OffsetDateTime,
    ) -> Result<Vec<DailyPriceRecord>, ConfigurationError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_with_rng(universe, range, created_at, &mut rng)
    }

    /// Generate drawing every random value from `rng`.
    pub fn generate_with_rng<R: Rng>(
        &self,
        universe: &Universe,
        range: &DateRange,
        created_at: OffsetDateTime,
        rng: &mut R,
    ) -> Result<Vec<DailyPriceRecord>, ConfigurationError> {
        universe.validate()?;

        let allocation = allocate_rows(self.config.num_rows, universe.symbols.len());
        let busiest = allocation.iter().copied().max().unwrap_or_default();
        if busiest > range.day_count() {
            return Err(ConfigurationError::DateRangeTooShort {
                requested: busiest,
                available: range.day_count(),
            });
        }

        let samplers = Samplers::new(&self.config)?;
        let floor = self.config.walk.price_floor;
        let mut records = Vec::with_capacity(self.config.num_rows);

        for (symbol, rows) in universe.symbols.iter().zip(allocation) {
            if rows == 0 {
                continue;
            }

            let base_volume = universe.base_volume(symbol) as f64;
            let sector = universe.sector(symbol);
            let mut price = universe.base_price(symbol);

            for date in range.evenly_spaced(rows)? {
                price = (price * (1.0 + samplers.daily_return.sample(rng))).max(floor);

                let close_price = round_to(price, 2).max(floor);
                let open_price =
                    round_to(close_price * (1.0 + samplers.open_gap.sample(rng)), 2).max(0.0);

                let expansion = samplers.daily_range.sample(rng).abs();
                let body_high = open_price.max(close_price);
                let body_low = open_price.min(close_price);
                let high_price = round_to(body_high * (1.0 + expansion), 2).max(body_high);
                let low_price = round_to(body_low * (1.0 - expansion), 2)
                    .min(body_low)
                    .max(0.0);

                let noisy_volume = base_volume * (1.0 + samplers.volume_noise.sample(rng));
                let volume = (noisy_volume as i64).max(self.config.min_volume);

                let (market_cap, pe_ratio, dividend_yield) = samplers.fundamentals(rng);

                records.push(DailyPriceRecord {
                    date,
                    symbol: symbol.clone(),
                    open_price,
                    high_price,
                    low_price,
                    close_price,
                    volume,
                    market_cap,
                    pe_ratio,
                    dividend_yield,
                    sector: Some(sector.to_string()),
                    created_at,
                });
            }

            debug!(symbol = %symbol, rows, final_price = price, "generated symbol series");
        }

        Ok(records)
    }
}

/// Distributions built once per run from a validated config.
struct Samplers {
    daily_return: Normal<f64>,
    open_gap: Normal<f64>,
    daily_range: Normal<f64>,
    volume_noise: Normal<f64>,
    market_cap: Uniform<f64>,
    market_cap_null: Bernoulli,
    pe_ratio: Uniform<f64>,
    pe_ratio_null: Bernoulli,
    dividend_yield: Uniform<f64>,
    dividend_yield_zero: Bernoulli,
    dividend_yield_null: Bernoulli,
}

impl Samplers {
    fn new(config: &GeneratorConfig) -> Result<Self, ConfigurationError> {
        let fundamentals = &config.fundamentals;
        Ok(Self {
            daily_return: normal("walk.volatility", config.walk.drift, config.walk.volatility)?,
            open_gap: normal("open_gap_stddev", 0.0, config.open_gap_stddev)?,
            daily_range: normal("range_stddev", 0.0, config.range_stddev)?,
            volume_noise: normal("volume_noise_stddev", 0.0, config.volume_noise_stddev)?,
            market_cap: uniform(fundamentals.market_cap),
            market_cap_null: bernoulli(
                "fundamentals.market_cap_null_probability",
                fundamentals.market_cap_null_probability,
            )?,
            pe_ratio: uniform(fundamentals.pe_ratio),
            pe_ratio_null: bernoulli(
                "fundamentals.pe_ratio_null_probability",
                fundamentals.pe_ratio_null_probability,
            )?,
            dividend_yield: uniform(fundamentals.dividend_yield),
            dividend_yield_zero: bernoulli(
                "fundamentals.dividend_yield_zero_probability",
                fundamentals.dividend_yield_zero_probability,
            )?,
            dividend_yield_null: bernoulli(
                "fundamentals.dividend_yield_null_probability",
                fundamentals.dividend_yield_null_probability,
            )?,
        })
    }

    fn fundamentals<R: Rng>(&self, rng: &mut R) -> (Option<f64>, Option<f64>, Option<f64>) {
        let market_cap = if self.market_cap_null.sample(rng) {
            None
        } else {
            Some(self.market_cap.sample(rng).round())
        };

        let pe_ratio = if self.pe_ratio_null.sample(rng) {
            None
        } else {
            Some(round_to(self.pe_ratio.sample(rng), 2))
        };

        let dividend_yield = if self.dividend_yield_null.sample(rng) {
            None
        } else if self.dividend_yield_zero.sample(rng) {
            Some(0.0)
        } else {
            Some(round_to(self.dividend_yield.sample(rng), 4))
        };

        (market_cap, pe_ratio, dividend_yield)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn normal(name: &'static str, mean: f64, std_dev: f64) -> Result<Normal<f64>, ConfigurationError> {
    Normal::new(mean, std_dev).map_err(|error| invalid(name, error.to_string()))
}

fn bernoulli(name: &'static str, probability: f64) -> Result<Bernoulli, ConfigurationError> {
    Bernoulli::new(probability).map_err(|error| invalid(name, error.to_string()))
}

fn uniform(range: ValueRange) -> Uniform<f64> {
    Uniform::new_inclusive(range.min, range.max)
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn ensure_finite(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, "must be finite"))
    }
}

fn ensure_stddev(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("standard deviation must be >= 0, got {value}")))
    }
}

fn ensure_probability(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, format!("probability must be within [0, 1], got {value}")))
    }
}

fn ensure_range(name: &'static str, range: ValueRange) -> Result<(), ConfigurationError> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(invalid(name, "bounds must be finite"));
    }
    if range.min < 0.0 {
        return Err(invalid(name, format!("lower bound must be >= 0, got {}", range.min)));
    }
    if range.min > range.max {
        return Err(invalid(
            name,
            format!("lower bound {} exceeds upper bound {}", range.min, range.max),
        ));
    }
    Ok(())
}
