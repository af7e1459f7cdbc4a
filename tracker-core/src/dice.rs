//! Dice notation and rolling.
//!
//! Supports sums of `XdY` terms and flat modifiers, e.g. `1d20+3` or
//! `2d6 - 1d4 + 2`. Initiative checks are built on [`d20_check`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Standard tabletop die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// One `XdY` term, negative when subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub count: u32,
    pub die_type: DieType,
    pub negative: bool,
}

/// A parsed dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub terms: Vec<DiceTerm>,
    pub modifier: i32,
}

impl DiceExpression {
    /// A single d20 plus a flat modifier.
    pub fn d20(modifier: i32) -> Self {
        Self {
            terms: vec![DiceTerm {
                count: 1,
                die_type: DieType::D20,
                negative: false,
            }],
            modifier,
        }
    }

    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let compact: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut expr = DiceExpression {
            terms: Vec::new(),
            modifier: 0,
        };

        let mut negative = false;
        let mut start = 0;
        for (i, ch) in compact.char_indices() {
            if ch != '+' && ch != '-' {
                continue;
            }
            if i > start {
                expr.push_term(&compact[start..i], negative)?;
            } else if i > 0 {
                // two signs in a row
                return Err(DiceError::InvalidNotation(notation.to_string()));
            }
            negative = ch == '-';
            start = i + 1;
        }
        if start >= compact.len() {
            return Err(DiceError::InvalidNotation(notation.to_string()));
        }
        expr.push_term(&compact[start..], negative)?;

        Ok(expr)
    }

    fn push_term(&mut self, term: &str, negative: bool) -> Result<(), DiceError> {
        let invalid = || DiceError::InvalidNotation(term.to_string());

        match term.split_once('d') {
            Some((count, sides)) => {
                let count: u32 = if count.is_empty() {
                    1
                } else {
                    count.parse().map_err(|_| invalid())?
                };
                let sides: u32 = sides.parse().map_err(|_| invalid())?;
                let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;
                if count == 0 {
                    return Err(DiceError::NoDice);
                }
                self.terms.push(DiceTerm {
                    count,
                    die_type,
                    negative,
                });
            }
            None => {
                let value: i32 = term.parse().map_err(|_| invalid())?;
                self.modifier += if negative { -value } else { value };
            }
        }
        Ok(())
    }

    /// Roll the expression.
    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        let mut rolls = Vec::new();
        let mut total = self.modifier;

        for term in &self.terms {
            for _ in 0..term.count {
                let face = rng.gen_range(1..=term.die_type.sides());
                rolls.push((term.die_type, face));
                if term.negative {
                    total -= face as i32;
                } else {
                    total += face as i32;
                }
            }
        }

        RollResult {
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if term.negative {
                write!(f, "-")?;
            } else if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}{}", term.count, term.die_type)?;
        }
        match self.modifier {
            0 if !self.terms.is_empty() => Ok(()),
            m if m >= 0 && !self.terms.is_empty() => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Result of rolling a [`DiceExpression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub rolls: Vec<(DieType, u32)>,
    pub modifier: i32,
    pub total: i32,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.rolls.iter().map(|(_, face)| face.to_string()).collect();
        write!(f, "[{}]", faces.join(", "))?;
        if self.modifier > 0 {
            write!(f, " + {}", self.modifier)?;
        } else if self.modifier < 0 {
            write!(f, " - {}", self.modifier.abs())?;
        }
        write!(f, " = {}", self.total)
    }
}

/// Roll `1d20 + modifier`.
pub fn d20_check<R: Rng + ?Sized>(modifier: i32, rng: &mut R) -> i32 {
    DiceExpression::d20(modifier).roll_with_rng(rng).total
}

/// Format a modifier with an explicit sign, e.g. `+2` or `-1`.
pub fn modifier_string(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}
