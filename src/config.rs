// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `PowerGraph`.

/// Largest resistance, in Ohm, accepted for a series resistor by default.
pub const DEFAULT_MAX_SERIES_RESISTANCE: f64 = 10.0;

/// Longest chain of consecutive series resistors solved by default.
pub const DEFAULT_MAX_SERIES_CHAIN: usize = 4;

/// Configuration options for the `PowerGraph`.
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetConfig {
    /// Upper bound, inclusive, for the `R` key of series resistor sections.
    pub max_series_resistance: f64,

    /// Maximum number of consecutive series resistors between a load or
    /// regulator and the voltage source feeding the chain.
    pub max_series_chain: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_series_resistance: DEFAULT_MAX_SERIES_RESISTANCE,
            max_series_chain: DEFAULT_MAX_SERIES_CHAIN,
        }
    }
}
