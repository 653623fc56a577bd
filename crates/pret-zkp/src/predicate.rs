//! # Compliance Predicates
//!
//! A predicate is a named conjunction of clauses, each over one registry
//! slot. Evaluation is total: a missing attribute fails its clause, it does
//! not raise an error.
//!
//! String comparison trims both sides and ignores ASCII case, so `Active`
//! from a corporate registry satisfies a clause expecting `ACTIVE`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pret_core::{FieldSlot, RecordKind, Timestamp};

use crate::traits::ProofError;

/// A single condition over one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Clause {
    /// The attribute equals `value`.
    Equals { slot: FieldSlot, value: String },
    /// The attribute equals one of `values`.
    OneOf { slot: FieldSlot, values: Vec<String> },
    /// The attribute is present.
    Present { slot: FieldSlot },
    /// The attribute is a date at or after the evaluation time.
    NotBefore { slot: FieldSlot },
}

impl Clause {
    /// The slot this clause reads.
    pub fn slot(&self) -> FieldSlot {
        match self {
            Self::Equals { slot, .. }
            | Self::OneOf { slot, .. }
            | Self::Present { slot }
            | Self::NotBefore { slot } => *slot,
        }
    }

    fn holds(&self, attributes: &BTreeMap<FieldSlot, String>, at: Timestamp) -> bool {
        let value = attributes.get(&self.slot()).map(|v| v.trim());
        match (self, value) {
            (_, None) => false,
            (Self::Equals { value: expected, .. }, Some(v)) => {
                v.eq_ignore_ascii_case(expected.trim())
            }
            (Self::OneOf { values, .. }, Some(v)) => {
                values.iter().any(|e| v.eq_ignore_ascii_case(e.trim()))
            }
            (Self::Present { .. }, Some(v)) => !v.is_empty(),
            (Self::NotBefore { .. }, Some(v)) => Timestamp::parse_date_or_datetime(v)
                .map(|date| date >= at)
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals { slot, value } => write!(f, "{} == {value:?}", slot.name()),
            Self::OneOf { slot, values } => write!(f, "{} in {values:?}", slot.name()),
            Self::Present { slot } => write!(f, "{} present", slot.name()),
            Self::NotBefore { slot } => write!(f, "{} not before now", slot.name()),
        }
    }
}

/// Outcome of evaluating a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateEvaluation {
    /// Clauses that held.
    pub satisfied: usize,
    /// Total clauses.
    pub total: usize,
    /// Rendered clauses that failed, in declaration order.
    pub failed: Vec<String>,
}

impl PredicateEvaluation {
    /// Compliant iff every clause held.
    pub fn is_compliant(&self) -> bool {
        self.total > 0 && self.satisfied == self.total
    }

    /// Integer percentage of satisfied clauses, 0 to 100.
    pub fn score(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(self.satisfied * 100 / self.total).unwrap_or(100)
    }
}

/// A named conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPredicate")]
pub struct CompliancePredicate {
    name: String,
    clauses: Vec<Clause>,
}

#[derive(Deserialize)]
struct RawPredicate {
    name: String,
    clauses: Vec<Clause>,
}

impl TryFrom<RawPredicate> for CompliancePredicate {
    type Error = ProofError;

    fn try_from(raw: RawPredicate) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.clauses)
    }
}

impl CompliancePredicate {
    /// A predicate with at least one clause.
    pub fn new(name: impl Into<String>, clauses: Vec<Clause>) -> Result<Self, ProofError> {
        let name = name.into();
        if clauses.is_empty() {
            return Err(ProofError::InvalidInputs(format!(
                "predicate {name:?} has no clauses"
            )));
        }
        Ok(Self { name, clauses })
    }

    /// Entity status `ACTIVE` and LEI registration `ISSUED`.
    pub fn gleif_active() -> Self {
        Self {
            name: "gleif_active".into(),
            clauses: vec![
                Clause::Equals {
                    slot: FieldSlot::ENTITY_STATUS,
                    value: "ACTIVE".into(),
                },
                Clause::Equals {
                    slot: FieldSlot::REGISTRATION_STATUS,
                    value: "ISSUED".into(),
                },
            ],
        }
    }

    /// Import-export code status `ACTIVE` or `VALID`.
    pub fn exim_active() -> Self {
        Self {
            name: "exim_active".into(),
            clauses: vec![Clause::OneOf {
                slot: FieldSlot::IEC_STATUS,
                values: vec!["ACTIVE".into(), "VALID".into()],
            }],
        }
    }

    /// Company status `ACTIVE` with a recorded incorporation date.
    pub fn corporate_registration_active() -> Self {
        Self {
            name: "corporate_registration_active".into(),
            clauses: vec![
                Clause::Equals {
                    slot: FieldSlot::COMPANY_STATUS,
                    value: "ACTIVE".into(),
                },
                Clause::Present {
                    slot: FieldSlot::DATE_OF_INCORPORATION,
                },
            ],
        }
    }

    /// The built-in predicate for a record kind.
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Gleif => Self::gleif_active(),
            RecordKind::Exim => Self::exim_active(),
            RecordKind::CorporateRegistration => Self::corporate_registration_active(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluate against slot-keyed attributes at time `at`.
    pub fn evaluate(
        &self,
        attributes: &BTreeMap<FieldSlot, String>,
        at: Timestamp,
    ) -> PredicateEvaluation {
        let mut satisfied = 0;
        let mut failed = Vec::new();
        for clause in &self.clauses {
            if clause.holds(attributes, at) {
                satisfied += 1;
            } else {
                failed.push(clause.to_string());
            }
        }
        PredicateEvaluation {
            satisfied,
            total: self.clauses.len(),
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> Timestamp {
        Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
    }

    fn attrs(pairs: &[(FieldSlot, &str)]) -> BTreeMap<FieldSlot, String> {
        pairs.iter().map(|(s, v)| (*s, v.to_string())).collect()
    }

    #[test]
    fn test_gleif_active_holds() {
        let a = attrs(&[
            (FieldSlot::ENTITY_STATUS, "ACTIVE"),
            (FieldSlot::REGISTRATION_STATUS, "ISSUED"),
        ]);
        let eval = CompliancePredicate::gleif_active().evaluate(&a, at());
        assert!(eval.is_compliant());
        assert_eq!(eval.score(), 100);
        assert!(eval.failed.is_empty());
    }

    #[test]
    fn test_partial_match_scores_half() {
        let a = attrs(&[
            (FieldSlot::ENTITY_STATUS, "ACTIVE"),
            (FieldSlot::REGISTRATION_STATUS, "LAPSED"),
        ]);
        let eval = CompliancePredicate::gleif_active().evaluate(&a, at());
        assert!(!eval.is_compliant());
        assert_eq!(eval.score(), 50);
        assert_eq!(eval.failed, vec!["registration_status == \"ISSUED\"".to_string()]);
    }

    #[test]
    fn test_missing_attribute_fails_clause() {
        let eval = CompliancePredicate::exim_active().evaluate(&BTreeMap::new(), at());
        assert!(!eval.is_compliant());
        assert_eq!(eval.score(), 0);
    }

    #[test]
    fn test_comparison_ignores_case_and_whitespace() {
        let a = attrs(&[
            (FieldSlot::COMPANY_STATUS, " Active "),
            (FieldSlot::DATE_OF_INCORPORATION, "10/02/2022"),
        ]);
        let eval = CompliancePredicate::corporate_registration_active().evaluate(&a, at());
        assert!(eval.is_compliant());
    }

    #[test]
    fn test_not_before_clause() {
        let p = CompliancePredicate::new(
            "renewal_current",
            vec![Clause::NotBefore {
                slot: FieldSlot::NEXT_RENEWAL_DATE,
            }],
        )
        .unwrap();
        let future = attrs(&[(FieldSlot::NEXT_RENEWAL_DATE, "2027-01-12T10:15:00+05:30")]);
        let past = attrs(&[(FieldSlot::NEXT_RENEWAL_DATE, "2025-01-12")]);
        let garbage = attrs(&[(FieldSlot::NEXT_RENEWAL_DATE, "soon")]);
        assert!(p.evaluate(&future, at()).is_compliant());
        assert!(!p.evaluate(&past, at()).is_compliant());
        assert!(!p.evaluate(&garbage, at()).is_compliant());
    }

    #[test]
    fn test_empty_predicate_rejected() {
        assert!(matches!(
            CompliancePredicate::new("nothing", vec![]),
            Err(ProofError::InvalidInputs(_))
        ));
        let json = r#"{"name":"nothing","clauses":[]}"#;
        assert!(serde_json::from_str::<CompliancePredicate>(json).is_err());
    }

    #[test]
    fn test_predicate_deserializes_from_config() {
        let json = r#"{"name":"custom","clauses":[{"op":"equals","slot":17,"value":"ACTIVE"}]}"#;
        let p: CompliancePredicate = serde_json::from_str(json).unwrap();
        assert_eq!(p.name(), "custom");
        assert_eq!(p.clauses()[0].slot(), FieldSlot::IEC_STATUS);
    }
}
