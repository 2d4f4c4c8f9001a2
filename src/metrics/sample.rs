use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FormatError;

// ─── CSV layout ──────────────────────────────────────────────────

pub const DELIMITER: char = ',';

/// Column names, in record order.
pub const ELAPSED_COLUMN: &str = "elapsedMillis";
pub const RATE_COLUMN: &str = "ratePerSecond";

pub const HEADER: &str = "elapsedMillis,ratePerSecond";

// ─── Sample ──────────────────────────────────────────────────────

/// One throughput observation: how fast the run's counter was
/// advancing at `elapsed_millis` into the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub elapsed_millis: u64,
    pub rate_per_second: u64,
}

impl Sample {
    pub fn new(elapsed_millis: u64, rate_per_second: u64) -> Self {
        Self {
            elapsed_millis,
            rate_per_second,
        }
    }

    /// `"<elapsedMillis>,<ratePerSecond>"`, no quoting.
    pub fn to_csv_line(&self) -> String {
        self.to_string()
    }

    pub fn from_csv_line(line: &str) -> Result<Self, FormatError> {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        let [elapsed, rate] = fields.as_slice() else {
            return Err(FormatError::FieldCount {
                found: fields.len(),
            });
        };

        Ok(Self {
            elapsed_millis: parse_field(ELAPSED_COLUMN, elapsed)?,
            rate_per_second: parse_field(RATE_COLUMN, rate)?,
        })
    }
}

/// Plain digits only: `u64::from_str` would also take a leading `+`.
fn parse_field(column: &'static str, value: &str) -> Result<u64, FormatError> {
    if value.starts_with('+') {
        return Err(FormatError::ExplicitSign {
            column,
            value: value.to_owned(),
        });
    }
    value.parse().map_err(|source| FormatError::InvalidInteger {
        column,
        value: value.to_owned(),
        source,
    })
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}",
            self.elapsed_millis, self.rate_per_second
        )
    }
}

impl FromStr for Sample {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_csv_line(s)
    }
}
