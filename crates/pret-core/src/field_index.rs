//! # Field Index Registry
//!
//! Immutable mapping from canonical attribute names to stable integer slots
//! in `[0, 255]`. Slot commitments are index-addressable: a verifier that
//! knows slot 2 holds the entity status can check a selective opening
//! without seeing any other attribute.
//!
//! ## Security Invariant
//!
//! An assigned slot is never reassigned. Commitments built under registry
//! version N remain valid under every later version, because changes are
//! additive only: a new attribute takes the next unassigned slot and bumps
//! [`REGISTRY_VERSION`]. Slots above the assigned range are reserved.
//!
//! Several names may resolve to one slot (aliases). The first declared name
//! is canonical and is what [`name_for_index`] returns.

use serde::{Deserialize, Serialize};

/// Current registry version. Bumped whenever slots are appended.
pub const REGISTRY_VERSION: u32 = 1;

/// Highest slot number the registry can ever assign.
pub const MAX_SLOT: u8 = u8::MAX;

struct SlotDefinition {
    names: &'static [&'static str],
    since: u32,
}

macro_rules! slots {
    ($($names:expr),* $(,)?) => {
        &[$(SlotDefinition { names: $names, since: 1 }),*]
    };
}

/// Slot table. Position in this table is the slot number. Append only.
static SLOTS: &[SlotDefinition] = slots![
    // GLEIF
    &["lei", "legal_entity_identifier"],
    &["legal_name", "legalName", "company_name", "entityName"],
    &["entity_status", "status", "entityStatus"],
    &["jurisdiction"],
    &["registration_status", "registrationStatus"],
    &["address_lines", "addressLines"],
    &["city"],
    &["region"],
    &["country"],
    &["postal_code", "postalCode"],
    &["registered_as", "registeredAs", "cin"],
    &["initial_registration_date", "initialRegistrationDate"],
    &["next_renewal_date", "nextRenewalDate"],
    &["corroboration_level", "corroborationLevel"],
    &["managing_lou", "managingLou"],
    &["entity_category", "category", "entityCategory"],
    // EXIM
    &["iec", "importExportCode"],
    &["iec_status", "iecStatus"],
    &["date_of_establishment", "dateOfEstablishment"],
    &["pan"],
    // Corporate registration
    &["company_status", "company_status(for_efiling)", "companyStatus"],
    &["company_class", "class_of_company", "companyClass"],
    &["company_category", "companyCategory"],
    &["date_of_incorporation", "dateOfIncorporation"],
    &["registered_office_address", "registered_address", "registeredOfficeAddress"],
    &["email_id", "email", "emailId"],
    &["authorised_capital", "authorised_capital(rs)", "authorisedCapital"],
    &["paid_up_capital", "paid_up_capital(rs)", "paidUpCapital"],
    &["roc_code", "rocCode"],
    &["listing_status", "whether_listed_or_not", "listingStatus"],
];

/// A slot in the field index registry.
///
/// Only constructed for assigned slots, either through [`FieldSlot::for_name`],
/// [`FieldSlot::from_index`] or the named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FieldSlot(u8);

impl FieldSlot {
    pub const LEI: Self = Self(0);
    pub const LEGAL_NAME: Self = Self(1);
    pub const ENTITY_STATUS: Self = Self(2);
    pub const JURISDICTION: Self = Self(3);
    pub const REGISTRATION_STATUS: Self = Self(4);
    pub const ADDRESS_LINES: Self = Self(5);
    pub const CITY: Self = Self(6);
    pub const REGION: Self = Self(7);
    pub const COUNTRY: Self = Self(8);
    pub const POSTAL_CODE: Self = Self(9);
    pub const REGISTERED_AS: Self = Self(10);
    pub const INITIAL_REGISTRATION_DATE: Self = Self(11);
    pub const NEXT_RENEWAL_DATE: Self = Self(12);
    pub const CORROBORATION_LEVEL: Self = Self(13);
    pub const MANAGING_LOU: Self = Self(14);
    pub const ENTITY_CATEGORY: Self = Self(15);
    pub const IEC: Self = Self(16);
    pub const IEC_STATUS: Self = Self(17);
    pub const DATE_OF_ESTABLISHMENT: Self = Self(18);
    pub const PAN: Self = Self(19);
    pub const COMPANY_STATUS: Self = Self(20);
    pub const COMPANY_CLASS: Self = Self(21);
    pub const COMPANY_CATEGORY: Self = Self(22);
    pub const DATE_OF_INCORPORATION: Self = Self(23);
    pub const REGISTERED_OFFICE_ADDRESS: Self = Self(24);
    pub const EMAIL_ID: Self = Self(25);
    pub const AUTHORISED_CAPITAL: Self = Self(26);
    pub const PAID_UP_CAPITAL: Self = Self(27);
    pub const ROC_CODE: Self = Self(28);
    pub const LISTING_STATUS: Self = Self(29);

    /// Resolve an attribute name or alias to its slot.
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn for_name(name: &str) -> Option<Self> {
        let name = name.trim();
        SLOTS
            .iter()
            .position(|def| def.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
            .and_then(|idx| u8::try_from(idx).ok())
            .map(Self)
    }

    /// The slot for an index, if that index is assigned.
    pub fn from_index(n: usize) -> Option<Self> {
        if is_valid_index(n) {
            u8::try_from(n).ok().map(Self)
        } else {
            None
        }
    }

    /// The slot number.
    pub fn index(self) -> u8 {
        self.0
    }

    /// The canonical (first declared) name of this slot.
    pub fn name(self) -> &'static str {
        name_for_index(usize::from(self.0)).unwrap_or("unassigned")
    }

    /// Registry version in which this slot was assigned.
    pub fn since(self) -> u32 {
        SLOTS
            .get(usize::from(self.0))
            .map(|def| def.since)
            .unwrap_or(REGISTRY_VERSION)
    }
}

impl TryFrom<u8> for FieldSlot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(usize::from(value))
            .ok_or_else(|| format!("slot {value} is not assigned in registry v{REGISTRY_VERSION}"))
    }
}

impl From<FieldSlot> for u8 {
    fn from(slot: FieldSlot) -> u8 {
        slot.0
    }
}

impl std::fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name(), self.0)
    }
}

/// True iff `n` is an assigned slot.
pub fn is_valid_index(n: usize) -> bool {
    n < SLOTS.len()
}

/// First declared name for slot `n`, or `None` when unassigned.
pub fn name_for_index(n: usize) -> Option<&'static str> {
    SLOTS.get(n).and_then(|def| def.names.first().copied())
}

/// Number of assigned slots.
pub fn assigned_count() -> usize {
    SLOTS.len()
}

/// Every assigned slot in ascending order.
pub fn assigned_slots() -> impl Iterator<Item = FieldSlot> {
    (0..SLOTS.len()).filter_map(FieldSlot::from_index)
}

/// Every name and alias for a slot, canonical name first.
pub fn aliases(slot: FieldSlot) -> &'static [&'static str] {
    SLOTS
        .get(usize::from(slot.0))
        .map(|def| def.names)
        .unwrap_or(&[])
}
