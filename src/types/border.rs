use std::str::FromStr;

use thiserror::Error as ThisError;

/// One end of a score range: `5` (inclusive), `(5` (exclusive), `-inf` or `+inf`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoreBorder {
    NegativeInfinity,
    PositiveInfinity,
    Value { value: f64, exclusive: bool },
}

#[derive(Debug, ThisError, PartialEq)]
#[error("min or max is not a float")]
pub struct ParseScoreBorderError;

impl ScoreBorder {
    pub fn inclusive(value: f64) -> Self {
        Self::Value {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self::Value {
            value,
            exclusive: true,
        }
    }

    /// Whether `score` lies at or below this border, i.e. satisfies it as an upper bound.
    pub fn greater(&self, score: f64) -> bool {
        match *self {
            Self::NegativeInfinity => false,
            Self::PositiveInfinity => true,
            Self::Value { value, exclusive } if exclusive => value > score,
            Self::Value { value, .. } => value >= score,
        }
    }

    /// Whether `score` lies at or above this border, i.e. satisfies it as a lower bound.
    pub fn less(&self, score: f64) -> bool {
        match *self {
            Self::NegativeInfinity => true,
            Self::PositiveInfinity => false,
            Self::Value { value, exclusive } if exclusive => value < score,
            Self::Value { value, .. } => value <= score,
        }
    }

    /// Whether any score at all can satisfy `min` as lower bound and `max` as upper bound.
    pub fn is_satisfiable(min: &ScoreBorder, max: &ScoreBorder) -> bool {
        match (min, max) {
            (Self::PositiveInfinity, _) | (_, Self::NegativeInfinity) => false,
            (Self::NegativeInfinity, _) | (_, Self::PositiveInfinity) => true,
            (
                Self::Value {
                    value: low,
                    exclusive: low_exclusive,
                },
                Self::Value {
                    value: high,
                    exclusive: high_exclusive,
                },
            ) => low < high || (low == high && !low_exclusive && !high_exclusive),
        }
    }
}

impl FromStr for ScoreBorder {
    type Err = ParseScoreBorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inf" | "+inf" => return Ok(Self::PositiveInfinity),
            "-inf" => return Ok(Self::NegativeInfinity),
            _ => {}
        }

        let (number, exclusive) = match s.strip_prefix('(') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let value = number
            .parse::<f64>()
            .map_err(|_| ParseScoreBorderError)?;
        if value.is_nan() {
            return Err(ParseScoreBorderError);
        }

        Ok(Self::Value { value, exclusive })
    }
}
