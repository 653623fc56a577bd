//! # Compliance Records
//!
//! A `ComplianceRecord` is the validated form of a payload fetched from an
//! authoritative source. Records are ephemeral: one is built per
//! verification call and discarded afterwards.
//!
//! Source payloads are loosely shaped JSON. The `from_*` constructors are
//! the only place that JSON is inspected; they extract known attributes
//! into registry slots and reject payloads that lack the fields a record
//! kind cannot do without. Unknown attributes are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::field_index::FieldSlot;
use crate::identity::EntityKey;
use crate::temporal::Timestamp;

/// The authoritative source a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    /// Global Legal Entity Identifier Foundation lookup.
    Gleif,
    /// Export-import registration.
    Exim,
    /// Corporate registry master data, keyed by CIN.
    CorporateRegistration,
}

impl RecordKind {
    /// Every record kind.
    pub fn all() -> &'static [RecordKind] {
        &[Self::Gleif, Self::Exim, Self::CorporateRegistration]
    }

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gleif => "GLEIF",
            Self::Exim => "EXIM",
            Self::CorporateRegistration => "CORPORATE_REGISTRATION",
        }
    }

    /// Numeric code used in the bounded field list. Never reassigned.
    pub fn code(&self) -> u64 {
        match self {
            Self::Gleif => 1,
            Self::Exim => 2,
            Self::CorporateRegistration => 3,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "GLEIF" => Ok(Self::Gleif),
            "EXIM" => Ok(Self::Exim),
            "CORPORATE_REGISTRATION" | "CORPORATEREGISTRATION" | "MCA" => {
                Ok(Self::CorporateRegistration)
            }
            other => Err(format!("unknown record kind: {other:?}")),
        }
    }
}

/// A validated compliance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    identifier: EntityKey,
    kind: RecordKind,
    observed_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<FieldSlot, String>,
}

impl ComplianceRecord {
    /// An empty record for `identifier`, observed at `observed_at`.
    pub fn new(identifier: EntityKey, kind: RecordKind, observed_at: Timestamp) -> Self {
        Self {
            identifier,
            kind,
            observed_at,
            content: None,
            actor: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the free-text content (typically the registered legal name).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = non_empty(content.into());
        self
    }

    /// Set the attesting actor.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = non_empty(actor.into());
        self
    }

    /// Set an attribute. Blank values are treated as absent.
    pub fn with_attribute(mut self, slot: FieldSlot, value: impl Into<String>) -> Self {
        self.set_attribute(slot, value);
        self
    }

    /// Set an attribute in place. Blank values remove the slot.
    pub fn set_attribute(&mut self, slot: FieldSlot, value: impl Into<String>) {
        match non_empty(value.into()) {
            Some(v) => {
                self.attributes.insert(slot, v);
            }
            None => {
                self.attributes.remove(&slot);
            }
        }
    }

    /// Set an attribute by registry name or alias. Returns `false` when the
    /// name is not in the registry.
    pub fn set_attribute_by_name(&mut self, name: &str, value: impl Into<String>) -> bool {
        match FieldSlot::for_name(name) {
            Some(slot) => {
                self.set_attribute(slot, value);
                true
            }
            None => false,
        }
    }

    pub fn identifier(&self) -> &EntityKey {
        &self.identifier
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// The attribute stored at `slot`, if present.
    pub fn attribute(&self, slot: FieldSlot) -> Option<&str> {
        self.attributes.get(&slot).map(String::as_str)
    }

    /// All present attributes in slot order.
    pub fn attributes(&self) -> &BTreeMap<FieldSlot, String> {
        &self.attributes
    }

    // ── Source payloads ────────────────────────────────────────────────

    /// Validate a payload of the given kind.
    pub fn from_payload(
        kind: RecordKind,
        identifier: EntityKey,
        payload: &Value,
        observed_at: Timestamp,
    ) -> Result<Self, FetchError> {
        match kind {
            RecordKind::Gleif => Self::from_gleif(identifier, payload, observed_at),
            RecordKind::Exim => Self::from_exim(identifier, payload, observed_at),
            RecordKind::CorporateRegistration => {
                Self::from_corporate_registration(identifier, payload, observed_at)
            }
        }
    }

    /// Validate a GLEIF lookup response.
    ///
    /// Accepts the JSON:API shape (`data[0].attributes`), optionally wrapped
    /// in an outer `response` object.
    pub fn from_gleif(
        identifier: EntityKey,
        payload: &Value,
        observed_at: Timestamp,
    ) -> Result<Self, FetchError> {
        let data = first_data(unwrap_response(payload), &identifier)?;
        let attrs = object_field(data, "attributes")?;
        let lei = string_field(attrs, "lei")
            .ok_or_else(|| FetchError::Malformed("GLEIF record has no lei".into()))?;
        let entity = attrs
            .get("entity")
            .and_then(Value::as_object)
            .ok_or_else(|| FetchError::Malformed("GLEIF record has no entity object".into()))?;

        let mut record = Self::new(identifier, RecordKind::Gleif, observed_at).with_actor("GLEIF");
        record.set_attribute(FieldSlot::LEI, lei);

        if let Some(name) = entity
            .get("legalName")
            .and_then(Value::as_object)
            .and_then(|n| string_field(n, "name"))
        {
            record.set_attribute(FieldSlot::LEGAL_NAME, name.clone());
            record.content = non_empty(name);
        }
        for (key, slot) in [
            ("status", FieldSlot::ENTITY_STATUS),
            ("jurisdiction", FieldSlot::JURISDICTION),
            ("registeredAs", FieldSlot::REGISTERED_AS),
            ("category", FieldSlot::ENTITY_CATEGORY),
        ] {
            if let Some(v) = string_field(entity, key) {
                record.set_attribute(slot, v);
            }
        }

        if let Some(address) = entity.get("legalAddress").and_then(Value::as_object) {
            if let Some(lines) = address.get("addressLines").and_then(Value::as_array) {
                let joined: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
                record.set_attribute(FieldSlot::ADDRESS_LINES, joined.join(", "));
            }
            for (key, slot) in [
                ("city", FieldSlot::CITY),
                ("region", FieldSlot::REGION),
                ("country", FieldSlot::COUNTRY),
                ("postalCode", FieldSlot::POSTAL_CODE),
            ] {
                if let Some(v) = string_field(address, key) {
                    record.set_attribute(slot, v);
                }
            }
        }

        if let Some(registration) = attrs.get("registration").and_then(Value::as_object) {
            for (key, slot) in [
                ("status", FieldSlot::REGISTRATION_STATUS),
                ("initialRegistrationDate", FieldSlot::INITIAL_REGISTRATION_DATE),
                ("nextRenewalDate", FieldSlot::NEXT_RENEWAL_DATE),
                ("corroborationLevel", FieldSlot::CORROBORATION_LEVEL),
                ("managingLou", FieldSlot::MANAGING_LOU),
            ] {
                if let Some(v) = string_field(registration, key) {
                    record.set_attribute(slot, v);
                }
            }
        }

        Ok(record)
    }

    /// Validate an EXIM registration payload. Requires an `iec`.
    pub fn from_exim(
        identifier: EntityKey,
        payload: &Value,
        observed_at: Timestamp,
    ) -> Result<Self, FetchError> {
        let root = unwrap_response(payload);
        let data = match root.get("data") {
            Some(_) => first_data(root, &identifier)?,
            None => root,
        };
        let obj = data
            .as_object()
            .ok_or_else(|| FetchError::Malformed("EXIM payload is not an object".into()))?;

        let mut record = Self::new(identifier, RecordKind::Exim, observed_at).with_actor("EXIM");
        absorb_flat(&mut record, obj);
        if record.attribute(FieldSlot::IEC).is_none() {
            return Err(FetchError::Malformed("EXIM record has no iec".into()));
        }
        record.content = record.attribute(FieldSlot::LEGAL_NAME).map(str::to_string);
        Ok(record)
    }

    /// Validate a corporate registry payload (`data.company_master_data`).
    pub fn from_corporate_registration(
        identifier: EntityKey,
        payload: &Value,
        observed_at: Timestamp,
    ) -> Result<Self, FetchError> {
        let root = unwrap_response(payload);
        let master = match root.get("data") {
            None | Some(Value::Null) => {
                return Err(FetchError::NotFound {
                    key: identifier.to_string(),
                })
            }
            Some(data) => data.get("company_master_data").and_then(Value::as_object),
        }
        .ok_or_else(|| FetchError::Malformed("missing company_master_data".into()))?;

        let mut record = Self::new(identifier, RecordKind::CorporateRegistration, observed_at)
            .with_actor("CORPORATE_REGISTRY");
        absorb_flat(&mut record, master);
        let name = record
            .attribute(FieldSlot::LEGAL_NAME)
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::Malformed("company master data has no company_name".into())
            })?;
        record.content = Some(name);
        Ok(record)
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn unwrap_response(payload: &Value) -> &Value {
    payload.get("response").unwrap_or(payload)
}

fn first_data<'a>(root: &'a Value, identifier: &EntityKey) -> Result<&'a Value, FetchError> {
    let not_found = || FetchError::NotFound {
        key: identifier.to_string(),
    };
    match root.get("data") {
        Some(Value::Array(items)) => items.first().ok_or_else(not_found),
        Some(Value::Null) => Err(not_found()),
        Some(obj @ Value::Object(_)) => Ok(obj),
        Some(_) => Err(FetchError::Malformed("data is neither list nor object".into())),
        None => Err(FetchError::Malformed("payload has no data".into())),
    }
}

fn object_field<'a>(value: &'a Value, key: &str) -> Result<&'a Map<String, Value>, FetchError> {
    value
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::Malformed(format!("missing object field {key:?}")))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    scalar_to_string(obj.get(key)?)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Copy every scalar field whose name the registry knows.
fn absorb_flat(record: &mut ComplianceRecord, obj: &Map<String, Value>) {
    for (key, value) in obj {
        if let Some(v) = scalar_to_string(value) {
            record.set_attribute_by_name(key, v);
        }
    }
}
