//! Land Unit Conversion
//!
//! Converts areas between the units used in land records. The multiplier
//! table is derived at compile time from one square-metre size per unit, so
//! `convert(convert(v, a, b), b, a)` returns `v` up to float rounding.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const SQFT_IN_SQM: f64 = 0.092_903_04;

/// Maximum number of conversions kept in history
pub const HISTORY_LIMIT: usize = 10;

/// Area units supported by the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandUnit {
    Sqft,
    Acre,
    Hectare,
    Sqm,
    Bigha,
    Cent,
    Guntha,
}

impl LandUnit {
    pub const ALL: [LandUnit; 7] = [
        LandUnit::Sqft,
        LandUnit::Acre,
        LandUnit::Hectare,
        LandUnit::Sqm,
        LandUnit::Bigha,
        LandUnit::Cent,
        LandUnit::Guntha,
    ];

    /// Size of one unit in square metres
    pub const fn square_metres(self) -> f64 {
        match self {
            LandUnit::Sqft => SQFT_IN_SQM,
            LandUnit::Acre => 43_560.0 * SQFT_IN_SQM,
            LandUnit::Hectare => 10_000.0,
            LandUnit::Sqm => 1.0,
            LandUnit::Bigha => 27_000.0 * SQFT_IN_SQM,
            LandUnit::Cent => 435.6 * SQFT_IN_SQM,
            LandUnit::Guntha => 1_089.0 * SQFT_IN_SQM,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            LandUnit::Sqft => "sqft",
            LandUnit::Acre => "acre",
            LandUnit::Hectare => "hectare",
            LandUnit::Sqm => "sqm",
            LandUnit::Bigha => "bigha",
            LandUnit::Cent => "cent",
            LandUnit::Guntha => "gunta",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LandUnit::Sqft => "Sq Ft",
            LandUnit::Acre => "Acre",
            LandUnit::Hectare => "Hectare",
            LandUnit::Sqm => "Sq M",
            LandUnit::Bigha => "Bigha",
            LandUnit::Cent => "Cent",
            LandUnit::Guntha => "Gunta",
        }
    }
}

impl FromStr for LandUnit {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqft" | "sq ft" | "square-foot" | "square_foot" => Ok(LandUnit::Sqft),
            "acre" | "acres" => Ok(LandUnit::Acre),
            "hectare" | "ha" => Ok(LandUnit::Hectare),
            "sqm" | "sq m" | "square-meter" | "square_meter" | "square-metre" => Ok(LandUnit::Sqm),
            "bigha" => Ok(LandUnit::Bigha),
            "cent" | "cents" => Ok(LandUnit::Cent),
            "gunta" | "guntha" => Ok(LandUnit::Guntha),
            other => Err(ClientError::Config(format!("unknown land unit '{}'", other))),
        }
    }
}

impl fmt::Display for LandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const fn build_table() -> [[f64; 7]; 7] {
    let mut table = [[0.0; 7]; 7];
    let mut from = 0;
    while from < 7 {
        let mut to = 0;
        while to < 7 {
            table[from][to] = if from == to {
                1.0
            } else {
                LandUnit::ALL[from].square_metres() / LandUnit::ALL[to].square_metres()
            };
            to += 1;
        }
        from += 1;
    }
    table
}

/// `CONVERSION_TABLE[from][to]` multiplies a `from` quantity into `to`
pub const CONVERSION_TABLE: [[f64; 7]; 7] = build_table();

/// Multiply `value` by the table entry for `from -> to`
pub fn convert(value: f64, from: LandUnit, to: LandUnit) -> f64 {
    value * CONVERSION_TABLE[from.index()][to.index()]
}

/// Parse user input the way the converter's text box accepts it: digits with
/// at most one decimal point. Anything else counts as no value.
pub fn parse_input(input: &str) -> Option<f64> {
    let dots = input.chars().filter(|c| *c == '.').count();
    let digits_only = input.chars().all(|c| c.is_ascii_digit() || c == '.');
    if input.is_empty() || dots > 1 || !digits_only {
        return None;
    }
    input.parse().ok()
}

/// Round to the 6 decimal places shown to the user
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// A recorded conversion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub value: f64,
    pub from: LandUnit,
    pub to: LandUnit,
    pub result: f64,
    pub at: DateTime<Utc>,
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {} {}",
            self.value,
            self.from.label(),
            self.result,
            self.to.label()
        )
    }
}

/// In-memory history, newest first, bounded to [`HISTORY_LIMIT`]
#[derive(Clone, Debug, Default)]
pub struct ConversionHistory {
    entries: VecDeque<Conversion>,
}

impl ConversionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, conversion: Conversion) {
        self.entries.push_front(conversion);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Conversion> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Converter state: the selected unit pair plus the history
#[derive(Clone, Debug)]
pub struct LandConverter {
    pub from: LandUnit,
    pub to: LandUnit,
    history: ConversionHistory,
}

impl Default for LandConverter {
    fn default() -> Self {
        Self::new(LandUnit::Sqft, LandUnit::Acre)
    }
}

impl LandConverter {
    pub fn new(from: LandUnit, to: LandUnit) -> Self {
        Self {
            from,
            to,
            history: ConversionHistory::new(),
        }
    }

    /// Live preview for the current input; invalid input yields `0.0`
    pub fn preview(&self, input: &str) -> f64 {
        parse_input(input).map_or(0.0, |v| round6(convert(v, self.from, self.to)))
    }

    /// Convert and record. Non-numeric input returns `0.0` and is not recorded.
    pub fn calculate(&mut self, input: &str) -> f64 {
        let Some(value) = parse_input(input) else {
            return 0.0;
        };
        let result = round6(convert(value, self.from, self.to));
        tracing::debug!(value, from = self.from.key(), to = self.to.key(), result, "Land conversion");
        self.history.push(Conversion {
            value,
            from: self.from,
            to: self.to,
            result,
            at: Utc::now(),
        });
        result
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    pub fn history(&self) -> &ConversionHistory {
        &self.history
    }
}
