//! Per-template schema catalog.
//!
//! Each template type owns an ordered list of canonical fields, the raw
//! header synonyms known for each field, the required subset, and the
//! scoring profile used by the detector. The catalog is plain data and can
//! be replaced wholesale through configuration.

use serde::{Deserialize, Serialize};

use super::profile::{CountRange, Gate, ScoringProfile, Signal, WeightedSignal};
use super::types::TemplateType;
use crate::error::{IntakeError, Result};

/// A canonical field of a template schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical name (e.g. `transaction_date`).
    pub name: String,
    /// Known raw-header variants.
    pub synonyms: Vec<String>,
    /// Whether the field must be mapped for the file to be usable.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &str, required: bool, synonyms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            required,
        }
    }
}

/// Schema and detection profile for one template type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub template: TemplateType,
    /// Fields in schema-declaration order.
    pub fields: Vec<FieldSpec>,
    pub profile: ScoringProfile,
}

impl TemplateSpec {
    /// Canonical field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Required field names in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Look up a field by canonical name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The full catalog, one spec per template type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    templates: Vec<TemplateSpec>,
}

impl SchemaRegistry {
    /// Build a registry from explicit specs.
    ///
    /// Every template type must appear exactly once.
    pub fn from_specs(templates: Vec<TemplateSpec>) -> Result<Self> {
        let registry = Self { templates };
        registry.validate()?;
        Ok(registry)
    }

    /// Check that every template type has exactly one non-empty spec.
    pub fn validate(&self) -> Result<()> {
        for template in TemplateType::all() {
            let count = self
                .templates
                .iter()
                .filter(|s| s.template == *template)
                .count();
            if count != 1 {
                return Err(IntakeError::Config(format!(
                    "Schema registry must define {} exactly once (found {})",
                    template, count
                )));
            }
        }

        for spec in &self.templates {
            if spec.fields.is_empty() {
                return Err(IntakeError::Config(format!(
                    "Schema for {} has no fields",
                    spec.template
                )));
            }
            if let Some(field) = spec.fields.iter().find(|f| f.synonyms.is_empty()) {
                return Err(IntakeError::Config(format!(
                    "Field {}.{} has no synonyms",
                    spec.template, field.name
                )));
            }
        }

        Ok(())
    }

    /// Spec for a template type. Always `Some` on a validated registry.
    pub fn spec(&self, template: TemplateType) -> Option<&TemplateSpec> {
        self.templates.iter().find(|s| s.template == template)
    }

    /// Specs in template declaration order.
    pub fn specs(&self) -> impl Iterator<Item = &TemplateSpec> {
        TemplateType::all().iter().filter_map(|t| self.spec(*t))
    }

    /// Required field names for a template type.
    pub fn required_fields(&self, template: TemplateType) -> Vec<String> {
        self.spec(template)
            .map(|s| s.required_fields().map(String::from).collect())
            .unwrap_or_default()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            templates: vec![
                bank_statement(),
                trial_balance(),
                ap_open_items(),
                ar_aging(),
                pos_sales(),
            ],
        }
    }
}

fn dates(range: CountRange) -> Signal {
    Signal::DateColumns { range }
}

fn numerics(range: CountRange) -> Signal {
    Signal::NumericColumns { range }
}

fn texts(range: CountRange) -> Signal {
    Signal::TextColumns { range }
}

fn total(range: CountRange) -> Signal {
    Signal::TotalColumns { range }
}

fn bank_statement() -> TemplateSpec {
    TemplateSpec {
        template: TemplateType::BankStatement,
        fields: vec![
            FieldSpec::new(
                "transaction_date",
                true,
                &[
                    "date",
                    "trans date",
                    "transaction date",
                    "posting date",
                    "value date",
                    "post date",
                    "dt",
                ],
            ),
            FieldSpec::new(
                "description",
                true,
                &[
                    "description",
                    "desc",
                    "narrative",
                    "details",
                    "transaction details",
                    "memo",
                    "reference",
                ],
            ),
            FieldSpec::new(
                "debit_amount",
                false,
                &[
                    "debit",
                    "withdrawal",
                    "withdrawals",
                    "outgoing",
                    "payments",
                    "dr",
                    "amount dr",
                    "debit amount",
                ],
            ),
            FieldSpec::new(
                "credit_amount",
                false,
                &[
                    "credit",
                    "deposit",
                    "deposits",
                    "incoming",
                    "receipts",
                    "cr",
                    "amount cr",
                    "credit amount",
                ],
            ),
            FieldSpec::new(
                "balance",
                false,
                &[
                    "balance",
                    "running balance",
                    "ending balance",
                    "closing balance",
                    "bal",
                    "available balance",
                ],
            ),
            FieldSpec::new(
                "reference_number",
                false,
                &[
                    "reference",
                    "ref",
                    "check number",
                    "cheque number",
                    "transaction id",
                    "trans id",
                ],
            ),
        ],
        profile: ScoringProfile {
            gates: vec![Gate::Requires(dates(CountRange::at_least(1)))],
            signals: vec![
                WeightedSignal::new(dates(CountRange::at_least(1)), 0.3),
                WeightedSignal::new(Signal::SequentialDates, 0.2),
                WeightedSignal::new(Signal::RunningBalance, 0.2),
                WeightedSignal::new(texts(CountRange::at_least(1)), 0.1),
                WeightedSignal::new(numerics(CountRange::between(1, 3)), 0.1),
                WeightedSignal::new(total(CountRange::between(3, 6)), 0.1),
            ],
        },
    }
}

fn trial_balance() -> TemplateSpec {
    TemplateSpec {
        template: TemplateType::TrialBalance,
        fields: vec![
            FieldSpec::new(
                "account_code",
                true,
                &[
                    "account",
                    "account number",
                    "account no",
                    "gl account",
                    "gl code",
                    "acct",
                ],
            ),
            FieldSpec::new(
                "account_name",
                true,
                &[
                    "account name",
                    "account description",
                    "description",
                    "name",
                    "gl name",
                ],
            ),
            FieldSpec::new(
                "debit_amount",
                false,
                &["debit", "dr", "debit balance", "debit amount"],
            ),
            FieldSpec::new(
                "credit_amount",
                false,
                &["credit", "cr", "credit balance", "credit amount"],
            ),
            FieldSpec::new(
                "balance",
                false,
                &["balance", "ending balance", "net balance"],
            ),
        ],
        profile: ScoringProfile {
            gates: vec![Gate::Excludes(Signal::SequentialDates)],
            signals: vec![
                WeightedSignal::new(Signal::AccountNumbers, 0.3),
                WeightedSignal::new(Signal::DebitCreditPair, 0.4),
                WeightedSignal::new(texts(CountRange::at_least(1)), 0.15),
                WeightedSignal::new(total(CountRange::between(3, 5)), 0.15),
            ],
        },
    }
}

fn ap_open_items() -> TemplateSpec {
    TemplateSpec {
        template: TemplateType::ApOpenItems,
        fields: vec![
            FieldSpec::new(
                "vendor_name",
                true,
                &["vendor", "vendor name", "supplier", "supplier name", "payee"],
            ),
            FieldSpec::new(
                "vendor_code",
                false,
                &[
                    "vendor code",
                    "vendor id",
                    "vendor number",
                    "supplier code",
                    "supplier id",
                ],
            ),
            FieldSpec::new(
                "invoice_number",
                true,
                &[
                    "invoice",
                    "invoice number",
                    "invoice no",
                    "inv no",
                    "document number",
                ],
            ),
            FieldSpec::new(
                "invoice_date",
                false,
                &["invoice date", "inv date", "document date", "date"],
            ),
            FieldSpec::new(
                "due_date",
                false,
                &["due date", "payment due", "maturity date"],
            ),
            FieldSpec::new(
                "amount",
                true,
                &[
                    "amount",
                    "invoice amount",
                    "total",
                    "open amount",
                    "outstanding",
                ],
            ),
            FieldSpec::new("currency", false, &["currency", "curr", "ccy"]),
        ],
        profile: ScoringProfile {
            gates: vec![],
            signals: vec![
                WeightedSignal::new(dates(CountRange::at_least(1)), 0.2),
                WeightedSignal::new(texts(CountRange::at_least(1)), 0.25),
                WeightedSignal::new(Signal::AgingBuckets, 0.3),
                WeightedSignal::new(numerics(CountRange::at_least(2)), 0.15),
                WeightedSignal::new(total(CountRange::between(4, 8)), 0.1),
            ],
        },
    }
}

fn ar_aging() -> TemplateSpec {
    TemplateSpec {
        template: TemplateType::ArAging,
        fields: vec![
            FieldSpec::new(
                "customer_name",
                true,
                &["customer", "customer name", "client", "client name"],
            ),
            FieldSpec::new(
                "customer_code",
                false,
                &[
                    "customer code",
                    "customer id",
                    "customer number",
                    "client code",
                ],
            ),
            FieldSpec::new(
                "invoice_number",
                true,
                &["invoice", "invoice number", "invoice no", "inv no"],
            ),
            FieldSpec::new("invoice_date", false, &["invoice date", "inv date", "date"]),
            FieldSpec::new("due_date", false, &["due date", "payment due"]),
            FieldSpec::new(
                "amount",
                true,
                &["amount", "invoice amount", "total", "outstanding"],
            ),
            FieldSpec::new("current", false, &["current", "0-30", "not due"]),
            FieldSpec::new("days_30", false, &["30 days", "31-60", "1-30"]),
            FieldSpec::new("days_60", false, &["60 days", "61-90", "31-60"]),
            FieldSpec::new("days_90_plus", false, &["90+ days", "over 90", ">90", "90+"]),
        ],
        profile: ScoringProfile {
            gates: vec![],
            signals: vec![
                WeightedSignal::new(dates(CountRange::at_least(1)), 0.2),
                WeightedSignal::new(texts(CountRange::at_least(1)), 0.25),
                WeightedSignal::new(Signal::AgingBuckets, 0.35),
                WeightedSignal::new(numerics(CountRange::at_least(2)), 0.1),
                WeightedSignal::new(total(CountRange::between(4, 8)), 0.1),
            ],
        },
    }
}

fn pos_sales() -> TemplateSpec {
    TemplateSpec {
        template: TemplateType::PosSales,
        fields: vec![
            FieldSpec::new(
                "transaction_date",
                true,
                &["date", "sale date", "trans date", "transaction date"],
            ),
            FieldSpec::new(
                "store_code",
                false,
                &["store", "store code", "store number", "location", "store id"],
            ),
            FieldSpec::new(
                "product_code",
                true,
                &["product", "product code", "sku", "item code", "item number"],
            ),
            FieldSpec::new(
                "product_name",
                false,
                &["product name", "item name", "description", "item desc"],
            ),
            FieldSpec::new(
                "quantity",
                true,
                &["quantity", "qty", "units", "units sold"],
            ),
            FieldSpec::new(
                "unit_price",
                false,
                &["price", "unit price", "selling price", "retail price"],
            ),
            FieldSpec::new(
                "total_amount",
                true,
                &["amount", "total", "total amount", "sales amount", "revenue"],
            ),
        ],
        profile: ScoringProfile {
            gates: vec![Gate::Requires(dates(CountRange::at_least(1)))],
            signals: vec![
                WeightedSignal::new(dates(CountRange::at_least(1)), 0.2),
                WeightedSignal::new(texts(CountRange::at_least(2)), 0.2),
                WeightedSignal::new(numerics(CountRange::at_least(2)), 0.2),
                WeightedSignal::new(Signal::RowsAbove { rows: 100 }, 0.2),
                WeightedSignal::new(total(CountRange::between(4, 10)), 0.2),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_is_valid() {
        let registry = SchemaRegistry::default();
        registry.validate().unwrap();
        assert_eq!(registry.specs().count(), 5);
    }

    #[test]
    fn test_required_fields() {
        let registry = SchemaRegistry::default();
        assert_eq!(
            registry.required_fields(TemplateType::ApOpenItems),
            vec!["vendor_name", "invoice_number", "amount"]
        );
        assert_eq!(
            registry.required_fields(TemplateType::PosSales),
            vec!["transaction_date", "product_code", "quantity", "total_amount"]
        );
    }

    #[test]
    fn test_profiles_sum_to_one() {
        for spec in SchemaRegistry::default().specs() {
            let max = spec.profile.max_score();
            assert!((max - 1.0).abs() < 1e-9, "{} sums to {}", spec.template, max);
        }
    }

    #[test]
    fn test_registry_rejects_missing_template() {
        let mut specs = SchemaRegistry::default().templates;
        specs.retain(|s| s.template != TemplateType::ArAging);
        let err = SchemaRegistry::from_specs(specs).unwrap_err();
        assert!(err.to_string().contains("AR_Aging"));
    }

    #[test]
    fn test_registry_survives_json_round_trip() {
        let registry = SchemaRegistry::default();
        let json = serde_json::to_string(&registry).unwrap();
        let parsed: SchemaRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, registry);
    }
}
