//! Template detection: score every profile and pick the best one.

use serde::{Deserialize, Serialize};

use super::analysis::TableAnalysis;
use crate::config::{DetectionConfig, IntakeConfig};
use crate::input::DataTable;
use crate::template::{SchemaRegistry, TemplateType};

/// Outcome of detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Detection {
    /// A template reached the acceptance threshold.
    Matched {
        template: TemplateType,
        confidence: f64,
    },
    /// Nothing reached the threshold. Carries the best candidate for
    /// diagnostics; it must not be used as a match.
    NoMatch {
        best_candidate: Option<TemplateType>,
        best_score: f64,
    },
}

impl Detection {
    /// The matched template, if any.
    pub fn template(&self) -> Option<TemplateType> {
        match self {
            Detection::Matched { template, .. } => Some(*template),
            Detection::NoMatch { .. } => None,
        }
    }

    /// Confidence of the match; zero when nothing matched.
    pub fn confidence(&self) -> f64 {
        match self {
            Detection::Matched { confidence, .. } => *confidence,
            Detection::NoMatch { .. } => 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Detection::Matched { .. })
    }
}

/// Score of one template type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateScore {
    pub template: TemplateType,
    pub score: f64,
}

/// Full detection output: the analysis, every score and the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub analysis: TableAnalysis,
    /// Scores in template declaration order.
    pub scores: Vec<TemplateScore>,
    pub detection: Detection,
}

/// Classifies tables against the registry's scoring profiles.
#[derive(Debug, Clone)]
pub struct TemplateDetector {
    config: DetectionConfig,
    registry: SchemaRegistry,
}

impl TemplateDetector {
    pub fn new(config: DetectionConfig, registry: SchemaRegistry) -> Self {
        Self { config, registry }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.detection.clone(), config.registry.clone())
    }

    /// Detect the template type of a table.
    pub fn detect(&self, table: &DataTable) -> Detection {
        self.detect_with_scores(table).detection
    }

    /// Detect and keep the analysis and per-template scores.
    pub fn detect_with_scores(&self, table: &DataTable) -> DetectionReport {
        if table.row_count() == 0 || table.column_count() == 0 {
            return DetectionReport {
                analysis: TableAnalysis::default(),
                scores: self
                    .registry
                    .specs()
                    .map(|spec| TemplateScore {
                        template: spec.template,
                        score: 0.0,
                    })
                    .collect(),
                detection: Detection::NoMatch {
                    best_candidate: None,
                    best_score: 0.0,
                },
            };
        }

        let analysis = TableAnalysis::analyze(table, &self.config);
        let scores: Vec<TemplateScore> = self
            .registry
            .specs()
            .map(|spec| TemplateScore {
                template: spec.template,
                score: spec.profile.score(&analysis),
            })
            .collect();

        for s in &scores {
            tracing::debug!("Template score {}: {:.2}", s.template, s.score);
        }

        let detection = decide(&scores, self.config.acceptance_threshold);
        DetectionReport {
            analysis,
            scores,
            detection,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.acceptance_threshold
    }
}

/// Pick the highest score, earliest template on ties, if it clears the threshold.
pub fn decide(scores: &[TemplateScore], threshold: f64) -> Detection {
    let mut best: Option<TemplateScore> = None;
    for s in scores {
        if best.is_none_or(|b| s.score > b.score) {
            best = Some(*s);
        }
    }

    match best {
        Some(b) if b.score >= threshold && b.score > 0.0 => Detection::Matched {
            template: b.template,
            confidence: b.score,
        },
        Some(b) => Detection::NoMatch {
            best_candidate: (b.score > 0.0).then_some(b.template),
            best_score: b.score,
        },
        None => Detection::NoMatch {
            best_candidate: None,
            best_score: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Column;

    fn score(template: TemplateType, score: f64) -> TemplateScore {
        TemplateScore { template, score }
    }

    #[test]
    fn test_decide_ties_go_to_declaration_order() {
        let scores = vec![
            score(TemplateType::BankStatement, 0.5),
            score(TemplateType::TrialBalance, 0.7),
            score(TemplateType::ApOpenItems, 0.7),
        ];
        assert_eq!(
            decide(&scores, 0.3),
            Detection::Matched {
                template: TemplateType::TrialBalance,
                confidence: 0.7
            }
        );
    }

    #[test]
    fn test_decide_below_threshold_is_no_match() {
        let scores = vec![
            score(TemplateType::BankStatement, 0.1),
            score(TemplateType::PosSales, 0.25),
        ];
        let detection = decide(&scores, 0.3);
        assert_eq!(detection.template(), None);
        assert_eq!(detection.confidence(), 0.0);
        assert_eq!(
            detection,
            Detection::NoMatch {
                best_candidate: Some(TemplateType::PosSales),
                best_score: 0.25
            }
        );
    }

    #[test]
    fn test_empty_table_is_no_match() {
        let detector = TemplateDetector::from_config(&IntakeConfig::default());
        let table = DataTable::new(vec![]);
        let report = detector.detect_with_scores(&table);
        assert!(!report.detection.is_match());
        assert!(report.scores.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn test_all_text_table_is_no_match() {
        let detector = TemplateDetector::from_config(&IntakeConfig::default());
        let table = DataTable::new(vec![
            Column::from_raw("Name", &["Alice", "Bob"]),
            Column::from_raw("Notes", &["likes tea", "likes coffee"]),
        ]);
        let report = detector.detect_with_scores(&table);
        assert_eq!(report.scores.len(), 5);
        // Only "text column" style evidence is present: below threshold.
        assert!(!report.detection.is_match());
    }
}
