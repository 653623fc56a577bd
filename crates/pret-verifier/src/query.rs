//! # Free-Text Queries
//!
//! Routes a request such as `check EXIM status for Palani Trading Company`
//! to the record kind to fetch and the entity to fetch it for.
//!
//! The entity is the first LEI, then the first CIN, then the best-effort
//! company name found in the text. The record kind comes from the first
//! registry keyword in the text; without one it follows the key's shape.

use serde::Serialize;

use pret_core::{
    extract_cin, extract_company_name, extract_lei, EntityKey, InputError, KeyKind, RecordKind,
};

/// A parsed verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceQuery {
    pub kind: RecordKind,
    pub key: EntityKey,
}

impl ComplianceQuery {
    /// Parse `text`. Fails with [`InputError::NoEntityInQuery`] when no
    /// identifier can be extracted.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let raw = extract_lei(text)
            .or_else(|| extract_cin(text))
            .or_else(|| extract_company_name(text))
            .ok_or(InputError::NoEntityInQuery)?;
        let key = EntityKey::new(&raw)?;
        let kind = keyword_kind(text).unwrap_or(match key.kind() {
            KeyKind::Cin => RecordKind::CorporateRegistration,
            KeyKind::Lei | KeyKind::CompanyName => RecordKind::Gleif,
        });
        Ok(Self { kind, key })
    }
}

fn keyword_kind(text: &str) -> Option<RecordKind> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .map(str::to_ascii_lowercase)
        .find_map(|word| match word.as_str() {
            "gleif" | "lei" => Some(RecordKind::Gleif),
            "exim" | "iec" | "export" | "import" | "dgft" => Some(RecordKind::Exim),
            "mca" | "cin" | "corporate" | "registrar" => Some(RecordKind::CorporateRegistration),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ComplianceQuery {
        ComplianceQuery::parse(text).unwrap()
    }

    #[test]
    fn test_keyword_selects_kind() {
        let q = parse("Check EXIM status for Palani Trading Company");
        assert_eq!(q.kind, RecordKind::Exim);
        assert_eq!(q.key.as_str(), "Palani Trading Company");

        let q = parse("Get GLEIF data for SREE PALANI ANDAVAR AGROS PRIVATE LIMITED");
        assert_eq!(q.kind, RecordKind::Gleif);
        assert_eq!(q.key.as_str(), "SREE PALANI ANDAVAR AGROS PRIVATE LIMITED");
    }

    #[test]
    fn test_key_shape_selects_kind_without_keyword() {
        let q = parse("verify U01112TZ2022PTC039493 please");
        assert_eq!(q.kind, RecordKind::CorporateRegistration);
        assert_eq!(q.key.kind(), KeyKind::Cin);

        let q = parse("status of 506700ge1g29325qx363?");
        assert_eq!(q.kind, RecordKind::Gleif);
        assert_eq!(q.key.as_str(), "506700GE1G29325QX363");

        let q = parse("is Wipro Limited compliant?");
        assert_eq!(q.kind, RecordKind::Gleif);
        assert_eq!(q.key.as_str(), "Wipro Limited");
    }

    #[test]
    fn test_keyword_overrides_key_shape() {
        let q = parse("MCA filing for \"Infosys Limited\"");
        assert_eq!(q.kind, RecordKind::CorporateRegistration);
        assert_eq!(q.key.as_str(), "Infosys Limited");
    }

    #[test]
    fn test_query_without_entity_is_rejected() {
        assert_eq!(
            ComplianceQuery::parse("what services do you provide?"),
            Err(InputError::NoEntityInQuery)
        );
    }
}
