use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical holding. Exactly one is current at any time.
///
/// `Qqq` and `Spy` are the two primary instruments the decision engine rotates
/// between (momentum leg and defensive/trend leg). The remaining instruments are
/// alternatives: they can be the final target of a move out of cash but are never
/// used as a hop between the two primary legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    #[default]
    Cash,
    /// Instrument A (Nasdaq-100), the momentum leg.
    Qqq,
    /// Instrument B (S&P 500), the defensive/trend leg.
    Spy,
    /// Inverse S&P 500.
    Sh,
    /// Inverse Nasdaq-100.
    Psq,
    /// Aggregate bond ETF.
    Agg,
    /// Corporate bond ETF.
    Lqd,
    /// Treasury bond ETF.
    Tlt,
    /// Gold ETF.
    Gld,
}

impl Position {
    /// The alternative instruments, in the order they are offered to an operator.
    pub const ALTERNATIVES: [Position; 6] = [
        Position::Sh,
        Position::Psq,
        Position::Agg,
        Position::Lqd,
        Position::Tlt,
        Position::Gld,
    ];

    /// The ticker-style name used in storage and in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Cash => "CASH",
            Position::Qqq => "QQQ",
            Position::Spy => "SPY",
            Position::Sh => "SH",
            Position::Psq => "PSQ",
            Position::Agg => "AGG",
            Position::Lqd => "LQD",
            Position::Tlt => "TLT",
            Position::Gld => "GLD",
        }
    }

    pub fn is_cash(&self) -> bool {
        matches!(self, Position::Cash)
    }

    /// True for the two instruments the automatic engine trades.
    pub fn is_primary(&self) -> bool {
        matches!(self, Position::Qqq | Position::Spy)
    }

    pub fn is_alternative(&self) -> bool {
        !self.is_cash() && !self.is_primary()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Position::Cash),
            "QQQ" => Ok(Position::Qqq),
            "SPY" => Ok(Position::Spy),
            "SH" => Ok(Position::Sh),
            "PSQ" => Ok(Position::Psq),
            "AGG" => Ok(Position::Agg),
            "LQD" => Ok(Position::Lqd),
            "TLT" => Ok(Position::Tlt),
            "GLD" => Ok(Position::Gld),
            other => Err(CoreError::InvalidInput(
                "position".to_string(),
                format!("unknown position '{other}'"),
            )),
        }
    }
}

/// Direction of an externally computed trend (moving-average slope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl FromStr for Trend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rising" => Ok(Trend::Rising),
            "falling" => Ok(Trend::Falling),
            "stable" => Ok(Trend::Stable),
            other => Err(CoreError::InvalidInput(
                "trend".to_string(),
                format!("expected rising, falling or stable, got '{other}'"),
            )),
        }
    }
}

/// Classification of a change in the sign of `N - V` between two observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Crossover {
    Up,
    Down,
    None,
}

impl Crossover {
    pub fn as_str(&self) -> &'static str {
        match self {
            Crossover::Up => "UP",
            Crossover::Down => "DOWN",
            Crossover::None => "NONE",
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crossover {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Crossover::Up),
            "DOWN" => Ok(Crossover::Down),
            "NONE" => Ok(Crossover::None),
            other => Err(CoreError::InvalidInput(
                "crossover".to_string(),
                format!("unknown crossover '{other}'"),
            )),
        }
    }
}

/// The kind of record a cycle emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Entry,
    Exit,
    None,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Entry => "ENTRY",
            SignalType::Exit => "EXIT",
            SignalType::None => "NONE",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY" => Ok(SignalType::Entry),
            "EXIT" => Ok(SignalType::Exit),
            "NONE" => Ok(SignalType::None),
            other => Err(CoreError::InvalidInput(
                "signal_type".to_string(),
                format!("unknown signal type '{other}'"),
            )),
        }
    }
}

/// Identifies which decision policy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum StrategyId {
    /// Ratio-threshold crossover with the secondary trend condition only.
    RatioThreshold,
    /// Same transitions, gated by RSI, trend and fear-score confirmation.
    EnhancedRatioThreshold,
}
