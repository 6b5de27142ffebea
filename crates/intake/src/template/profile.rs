//! Declarative scoring profiles for template detection.
//!
//! A profile is a list of weighted structural signals plus optional gates.
//! The detector evaluates every profile the same way, so a new template
//! type only needs a new profile, not new control flow.

use serde::{Deserialize, Serialize};

use crate::detect::TableAnalysis;

/// Inclusive count range; `max = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl CountRange {
    /// At least `min`.
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Between `min` and `max`, inclusive.
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Whether `n` falls in the range.
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }
}

/// A structural fact about a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    /// Number of date-tagged columns in range.
    DateColumns { range: CountRange },
    /// Number of numeric-tagged columns in range.
    NumericColumns { range: CountRange },
    /// Number of text-tagged columns in range.
    TextColumns { range: CountRange },
    /// Total number of columns in range.
    TotalColumns { range: CountRange },
    /// More than `rows` data rows.
    RowsAbove { rows: usize },
    /// A date column with a small median day gap.
    SequentialDates,
    /// A single-signed, low-variation numeric column.
    RunningBalance,
    /// A text column of consistently formatted codes.
    AccountNumbers,
    /// Two numeric columns that are mostly mutually exclusive.
    DebitCreditPair,
    /// Several numeric columns with aging keywords in their headers.
    AgingBuckets,
}

impl Signal {
    /// Whether the signal holds for the analyzed table.
    pub fn holds(&self, analysis: &TableAnalysis) -> bool {
        match self {
            Signal::DateColumns { range } => range.contains(analysis.date_columns.len()),
            Signal::NumericColumns { range } => range.contains(analysis.numeric_columns.len()),
            Signal::TextColumns { range } => range.contains(analysis.text_columns.len()),
            Signal::TotalColumns { range } => range.contains(analysis.num_columns),
            Signal::RowsAbove { rows } => analysis.num_rows > *rows,
            Signal::SequentialDates => analysis.has_sequential_dates,
            Signal::RunningBalance => analysis.has_running_balance,
            Signal::AccountNumbers => analysis.has_account_numbers,
            Signal::DebitCreditPair => analysis.has_debit_credit,
            Signal::AgingBuckets => analysis.has_aging_buckets,
        }
    }
}

/// A signal that zeroes the score when violated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", content = "when", rename_all = "snake_case")]
pub enum Gate {
    /// Score is zero unless the signal holds.
    Requires(Signal),
    /// Score is zero if the signal holds.
    Excludes(Signal),
}

impl Gate {
    fn passes(&self, analysis: &TableAnalysis) -> bool {
        match self {
            Gate::Requires(signal) => signal.holds(analysis),
            Gate::Excludes(signal) => !signal.holds(analysis),
        }
    }
}

/// A signal and the score it contributes when it holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedSignal {
    #[serde(flatten)]
    pub signal: Signal,
    pub weight: f64,
}

impl WeightedSignal {
    pub fn new(signal: Signal, weight: f64) -> Self {
        Self { signal, weight }
    }
}

/// Additive scoring function for one template type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gates: Vec<Gate>,
    pub signals: Vec<WeightedSignal>,
}

impl ScoringProfile {
    /// Score the analysis, clamped to [0, 1].
    pub fn score(&self, analysis: &TableAnalysis) -> f64 {
        if !self.gates.iter().all(|g| g.passes(analysis)) {
            return 0.0;
        }

        let total: f64 = self
            .signals
            .iter()
            .filter(|s| s.signal.holds(analysis))
            .map(|s| s.weight)
            .sum();

        total.clamp(0.0, 1.0)
    }

    /// Sum of all weights (the best achievable score before clamping).
    pub fn max_score(&self) -> f64 {
        self.signals.iter().map(|s| s.weight).sum()
    }
}
