//! Coverage report parsing and color banding

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Derived-state key the extracted percentage is stored under
pub const COVERAGE_KEY: &str = "coverage";

/// Derived-state key the color band is stored under
pub const COLOR_KEY: &str = "color";

/// Errors while parsing a coverage report
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("coverage report has no TOTAL line")]
    MissingTotal,

    #[error("TOTAL line has no trailing percentage")]
    MissingPercent,
}

/// Color band for a coverage percentage.
///
/// Band names follow the shields.io palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Red,
    Orange,
    Yellow,
    YellowGreen,
    Green,
    BrightGreen,
}

impl Band {
    /// Map a percentage to its band. Thresholds are inclusive upper bounds.
    pub fn of(percent: u8) -> Self {
        match percent {
            0..=50 => Band::Red,
            51..=60 => Band::Orange,
            61..=70 => Band::Yellow,
            71..=80 => Band::YellowGreen,
            81..=90 => Band::Green,
            _ => Band::BrightGreen,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Red => "red",
            Band::Orange => "orange",
            Band::Yellow => "yellow",
            Band::YellowGreen => "yellowgreen",
            Band::Green => "green",
            Band::BrightGreen => "brightgreen",
        }
    }
}

/// Extracted coverage: the overall percentage and its color band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub percent: u8,
    pub band: Band,
}

impl Coverage {
    /// Percentage formatted for display and badge messages, e.g. "67%"
    pub fn message(&self) -> String {
        format!("{}%", self.percent)
    }
}

fn total_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // A coverage.py style summary line: "TOTAL   120   40   67%"
        Regex::new(r"(?m)^TOTAL\b.*?(\d+)%\s*$").unwrap()
    })
}

/// Parse a textual coverage report and return its overall percentage.
///
/// The report is expected to end with a `TOTAL` summary row whose last
/// column is the percentage. Anything else is a parse error, which the
/// executor treats as a step failure.
pub fn extract(report: &str) -> Result<Coverage, ExtractError> {
    if !report.lines().any(|line| line.starts_with("TOTAL")) {
        return Err(ExtractError::MissingTotal);
    }

    let captures = total_line_pattern()
        .captures(report)
        .ok_or(ExtractError::MissingPercent)?;

    // The regex only matches digit runs, so this cannot fail for values
    // under 256; coverage caps at 100.
    let percent: u8 = captures[1].parse().map_err(|_| ExtractError::MissingPercent)?;

    Ok(Coverage {
        percent,
        band: Band::of(percent),
    })
}
