//! The closed set of template types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Known financial export layouts.
///
/// Declaration order matters: it is the tie-break order for detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateType {
    #[serde(rename = "BankStatement")]
    BankStatement,
    #[serde(rename = "TrialBalance")]
    TrialBalance,
    #[serde(rename = "AP_OpenItems")]
    ApOpenItems,
    #[serde(rename = "AR_Aging")]
    ArAging,
    #[serde(rename = "POS_Sales")]
    PosSales,
}

impl TemplateType {
    /// All template types in declaration order.
    pub const ALL: [TemplateType; 5] = [
        TemplateType::BankStatement,
        TemplateType::TrialBalance,
        TemplateType::ApOpenItems,
        TemplateType::ArAging,
        TemplateType::PosSales,
    ];

    /// All template types in declaration order.
    pub fn all() -> &'static [TemplateType] {
        &Self::ALL
    }

    /// Wire label (e.g. `AP_OpenItems`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::BankStatement => "BankStatement",
            TemplateType::TrialBalance => "TrialBalance",
            TemplateType::ApOpenItems => "AP_OpenItems",
            TemplateType::ArAging => "AR_Aging",
            TemplateType::PosSales => "POS_Sales",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            TemplateType::BankStatement => {
                "Bank statement with transactions, dates, and running balance"
            }
            TemplateType::TrialBalance => {
                "General ledger trial balance with accounts, debits, and credits"
            }
            TemplateType::ApOpenItems => "Accounts payable open items with vendors and due dates",
            TemplateType::ArAging => {
                "Accounts receivable aging report with customers and aging buckets"
            }
            TemplateType::PosSales => {
                "Point-of-sale transactions with products, quantities, and amounts"
            }
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-', ' '], "").to_lowercase();
        TemplateType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().replace('_', "").to_lowercase() == wanted)
            .ok_or_else(|| {
                IntakeError::Config(format!(
                    "Unknown template type: {}. Use: BankStatement, TrialBalance, AP_OpenItems, AR_Aging, POS_Sales.",
                    s
                ))
            })
    }
}
