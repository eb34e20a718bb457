// Rank-based pricing and band classification.
//
// The curated table below is paired with a 500M budget. The cheaper linear
// `(101 - rank)` pricing with a 900M budget is a different game and must not
// be mixed with this table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Total currency a team may spend across all selected players.
pub const BUDGET: u64 = 500_000_000;

/// Maximum number of selections per band.
pub const MAX_PER_BAND: usize = 3;

/// Lowest valid rank (best player).
pub const MIN_RANK: u32 = 1;

/// Highest priced rank.
pub const MAX_RANK: u32 = 100;

const MILLION: u64 = 1_000_000;

/// Cost in millions, indexed by `rank - 1`.
const COST_BY_RANK_M: [u64; 100] = [
    160, 160, 100, 90, 80, 75, 70, 65, 60, 55, //
    62, 61, 58, 56, 54, 52, 50, 48, 46, 44, //
    42, 40, 38, 36, 34, 32, 30, 28, 26, 24, //
    30, 29, 28, 27, 26, 25, 25, 24, 24, 23, //
    23, 22, 22, 22, 21, 21, 21, 20, 20, 20, //
    23, 22, 22, 21, 21, 21, 20, 20, 20, 20, //
    19, 19, 19, 19, 18, 18, 18, 18, 17, 17, //
    17, 17, 16, 16, 16, 16, 16, 16, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, //
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("rank {rank} is outside the priced range 1-100")]
    InvalidRank { rank: u32 },
}

/// Selection quota tier derived from rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    A,
    B,
    C,
    D,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::A, Band::B, Band::C, Band::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::A => "A",
            Band::B => "B",
            Band::C => "C",
            Band::D => "D",
        }
    }

    /// Inclusive rank range covered by this band, for display.
    pub fn rank_range(&self) -> (u32, u32) {
        match self {
            Band::A => (1, 10),
            Band::B => (11, 30),
            Band::C => (31, 50),
            Band::D => (51, 100),
        }
    }

    /// Position in `Band::ALL`.
    pub fn index(&self) -> usize {
        match self {
            Band::A => 0,
            Band::B => 1,
            Band::C => 2,
            Band::D => 3,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown band `{0}`, expected one of A, B, C, D")]
pub struct ParseBandError(pub String);

impl FromStr for Band {
    type Err = ParseBandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Band::A),
            "B" => Ok(Band::B),
            "C" => Ok(Band::C),
            "D" => Ok(Band::D),
            _ => Err(ParseBandError(s.to_string())),
        }
    }
}

/// Acquisition cost of a player with the given rank.
pub fn cost(rank: u32) -> Result<u64, PricingError> {
    if !(MIN_RANK..=MAX_RANK).contains(&rank) {
        return Err(PricingError::InvalidRank { rank });
    }
    Ok(COST_BY_RANK_M[(rank - 1) as usize] * MILLION)
}

/// Band of a player with the given rank. Breakpoints are 10/30/50/100.
pub fn band(rank: u32) -> Result<Band, PricingError> {
    match rank {
        1..=10 => Ok(Band::A),
        11..=30 => Ok(Band::B),
        31..=50 => Ok(Band::C),
        51..=100 => Ok(Band::D),
        _ => Err(PricingError::InvalidRank { rank }),
    }
}

/// Render an amount in millions with at most one decimal, e.g. `160M`,
/// `12.5M`, `-3M`. Halves round up.
pub fn format_millions(amount: i64) -> String {
    let tenths = (amount as f64 / 100_000.0 + 0.5).floor() as i64;
    if tenths % 10 == 0 {
        format!("{}M", tenths / 10)
    } else {
        format!("{:.1}M", tenths as f64 / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_valid_rank_has_positive_cost_and_band() {
        for rank in MIN_RANK..=MAX_RANK {
            assert!(cost(rank).unwrap() > 0, "rank {rank} has no cost");
            assert!(band(rank).is_ok(), "rank {rank} has no band");
        }
    }

    #[test]
    fn out_of_range_ranks_rejected() {
        for rank in [0, 101, 150, u32::MAX] {
            assert_eq!(cost(rank), Err(PricingError::InvalidRank { rank }));
            assert_eq!(band(rank), Err(PricingError::InvalidRank { rank }));
        }
    }

    #[test]
    fn band_breakpoints() {
        assert_eq!(band(1), Ok(Band::A));
        assert_eq!(band(10), Ok(Band::A));
        assert_eq!(band(11), Ok(Band::B));
        assert_eq!(band(30), Ok(Band::B));
        assert_eq!(band(31), Ok(Band::C));
        assert_eq!(band(50), Ok(Band::C));
        assert_eq!(band(51), Ok(Band::D));
        assert_eq!(band(100), Ok(Band::D));
    }

    #[test]
    fn table_is_not_monotonic() {
        // Rank 11 costs more than rank 10, and rank 51 more than rank 50.
        assert_eq!(cost(1), Ok(160_000_000));
        assert_eq!(cost(10), Ok(55_000_000));
        assert_eq!(cost(11), Ok(62_000_000));
        assert_eq!(cost(50), Ok(20_000_000));
        assert_eq!(cost(51), Ok(23_000_000));
        assert_eq!(cost(100), Ok(15_000_000));
    }

    #[test]
    fn band_rank_ranges_agree_with_band_fn() {
        for b in Band::ALL {
            let (lo, hi) = b.rank_range();
            assert_eq!(band(lo), Ok(b));
            assert_eq!(band(hi), Ok(b));
        }
    }

    #[test]
    fn parse_band() {
        assert_eq!("a".parse::<Band>(), Ok(Band::A));
        assert_eq!(" D ".parse::<Band>(), Ok(Band::D));
        assert!("E".parse::<Band>().is_err());
    }

    #[test]
    fn format_millions_rounds_to_tenths() {
        assert_eq!(format_millions(160_000_000), "160M");
        assert_eq!(format_millions(12_500_000), "12.5M");
        assert_eq!(format_millions(12_549_999), "12.5M");
        assert_eq!(format_millions(0), "0M");
        assert_eq!(format_millions(-3_000_000), "-3M");
    }
}
