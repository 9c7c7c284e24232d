//! Input record model.
//!
//! Records arrive as JSON from the extraction step. Each batch element is kept
//! as a [`SourceRecord`] holding its raw JSON so that decoding happens per
//! record: a malformed element fails only itself.
//!
//! # Module layout
//!
//! - **field**: `Field<T>` tri-state (absent / no value / value) and the
//!   lenient `Items<T>` list.
//! - **dates**: `DD/MM/YYYY` and ISO date parsing.
//! - **load**: batch file loading (plain array or extractor envelope).

pub mod dates;
pub mod field;
pub mod load;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapper::MapError;

pub use field::{Field, Items};
pub use load::{load_batch, parse_batch};

// ── Descriptors ──────────────────────────────────────────────────────────────

/// The legal sanctions regime every party in a run is listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegimeDescriptor {
    pub id: String,
    pub name: String,
    pub authority: String,
    pub legal_basis: String,
}

/// The published list (one source document) implementing the regime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDescriptor {
    pub id: String,
    pub name: String,
    pub source_file: String,
    pub authority: String,
}

// ── Party kinds ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PartyKind {
    Person,
    Organisation,
}

impl PartyKind {
    /// Graph label carried by parties of this kind.
    pub fn label(self) -> &'static str {
        match self {
            PartyKind::Person => "Person",
            PartyKind::Organisation => "Organisation",
        }
    }

    /// Alias kind assumed when an alias entry does not carry one.
    pub fn default_alias_kind(self) -> AliasKind {
        match self {
            PartyKind::Person => AliasKind::Unknown,
            PartyKind::Organisation => AliasKind::TradeName,
        }
    }
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartyKind::Person => "individual",
            PartyKind::Organisation => "organisation",
        })
    }
}

// ── Source records ───────────────────────────────────────────────────────────

/// One undecoded batch element.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Position in the batch file, zero-based.
    pub index: usize,
    pub kind: PartyKind,
    pub body: Value,
}

/// A decoded record, one variant per party kind.
#[derive(Debug, Clone)]
pub enum PartyRecord {
    Individual(IndividualRecord),
    Organisation(OrganisationRecord),
}

impl SourceRecord {
    pub fn new(index: usize, kind: PartyKind, body: Value) -> Self {
        Self { index, kind, body }
    }

    /// Best-effort `sanctionId` for reporting, available even when decoding fails.
    pub fn sanction_id_hint(&self) -> Option<String> {
        match self.body.get("sanctionId")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn decode(&self) -> Result<PartyRecord, MapError> {
        if !self.body.is_object() {
            return Err(MapError::InvalidShape(format!(
                "record {} is not a JSON object",
                self.index
            )));
        }
        let shape_err = |e: serde_json::Error| MapError::InvalidShape(e.to_string());
        match self.kind {
            PartyKind::Person => IndividualRecord::deserialize(&self.body)
                .map(PartyRecord::Individual)
                .map_err(shape_err),
            PartyKind::Organisation => OrganisationRecord::deserialize(&self.body)
                .map(PartyRecord::Organisation)
                .map_err(shape_err),
        }
    }
}

// ── Record shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndividualRecord {
    pub sanction_id: Field<String>,
    pub uk_sanctions_ref: Field<String>,
    pub full_name: Field<String>,
    pub first_name: Field<String>,
    pub middle_name: Field<String>,
    pub last_name: Field<String>,
    pub name_non_latin_script: Field<String>,
    pub date_of_birth: Field<String>,
    pub place_of_birth: Field<String>,
    pub gender: Field<String>,
    pub position: Field<String>,
    pub passport_number: Field<String>,
    pub national_identification_number: Field<String>,
    pub nationality: Field<String>,
    pub listed_on: Field<String>,
    pub date_designated: Field<String>,
    pub last_updated: Field<String>,
    pub date_trust_services_sanctions_imposed: Field<String>,
    pub statement_of_reasons: Field<String>,
    pub other_information: Field<String>,
    pub group_id: Field<String>,
    pub address: Field<Items<AddressRecord>>,
    pub aliases: Field<Items<AliasEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganisationRecord {
    pub sanction_id: Field<String>,
    pub uk_sanctions_ref: Field<String>,
    #[serde(alias = "organizationName")]
    pub organisation_name: Field<String>,
    pub name_non_latin_script: Field<String>,
    pub entity_type: Field<String>,
    pub type_of_entity: Field<String>,
    pub registration_number: Field<String>,
    pub parent_company: Field<String>,
    pub subsidiaries: Field<Items<String>>,
    pub related_entities: Field<Items<RelatedEntry>>,
    pub listed_on: Field<String>,
    pub date_designated: Field<String>,
    pub last_updated: Field<String>,
    pub statement_of_reasons: Field<String>,
    pub other_information: Field<String>,
    pub group_id: Field<String>,
    pub address: Field<Items<AddressRecord>>,
    pub aliases: Field<Items<AliasEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRecord {
    pub raw_address: Field<String>,
    pub address_line1: Field<String>,
    pub address_line2: Field<String>,
    pub post_town: Field<String>,
    pub post_code: Field<String>,
    pub region: Field<String>,
    pub country: Field<String>,
}

impl AddressRecord {
    /// `rawAddress`, or the parts joined with ", " when it is missing.
    /// `None` when the address carries no text at all.
    pub fn raw_text(&self) -> Option<String> {
        if let Some(raw) = self.raw_address.value() {
            return Some(raw.clone());
        }
        let parts: Vec<&str> = [
            &self.address_line2,
            &self.address_line1,
            &self.region,
            &self.post_town,
            &self.post_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|f| f.value().map(String::as_str))
        .collect();
        if parts.is_empty() { None } else { Some(parts.join(", ")) }
    }
}

// ── Aliases ──────────────────────────────────────────────────────────────────

/// Alias classification as published on the sanctions list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum AliasKind {
    /// Also known as.
    Aka,
    /// Formerly known as.
    Fka,
    PrimaryNameVariation,
    TradeName,
    Unknown,
}

impl AliasKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AliasKind::Aka => "AKA",
            AliasKind::Fka => "FKA",
            AliasKind::PrimaryNameVariation => "PRIMARY_NAME_VARIATION",
            AliasKind::TradeName => "TRADENAME",
            AliasKind::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for AliasKind {
    fn from(s: String) -> Self {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match folded.as_str() {
            "AKA" | "ALSOKNOWNAS" => AliasKind::Aka,
            "FKA" | "FORMERLYKNOWNAS" => AliasKind::Fka,
            "PRIMARYNAMEVARIATION" => AliasKind::PrimaryNameVariation,
            "TRADENAME" => AliasKind::TradeName,
            _ => AliasKind::Unknown,
        }
    }
}

impl Serialize for AliasKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One `aliases` element: a bare string or `{displayText, kind}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AliasEntry {
    Text(String),
    Detailed {
        #[serde(rename = "displayText", alias = "name")]
        display_text: String,
        #[serde(default)]
        kind: Field<AliasKind>,
    },
}

impl AliasEntry {
    pub fn display_text(&self) -> &str {
        match self {
            AliasEntry::Text(s) => s.trim(),
            AliasEntry::Detailed { display_text, .. } => display_text.trim(),
        }
    }

    pub fn kind_or(&self, default: AliasKind) -> AliasKind {
        match self {
            AliasEntry::Detailed { kind: Field::Value(k), .. } => *k,
            _ => default,
        }
    }
}

// ── Related organisations ────────────────────────────────────────────────────

pub const DEFAULT_RELATION_KIND: &str = "associated";

/// One `relatedEntities` element: a bare name or `{name, kind}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelatedEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        kind: Field<String>,
    },
}

impl RelatedEntry {
    pub fn name(&self) -> &str {
        match self {
            RelatedEntry::Name(n) => n.trim(),
            RelatedEntry::Detailed { name, .. } => name.trim(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            RelatedEntry::Detailed { kind: Field::Value(k), .. } => k.as_str(),
            _ => DEFAULT_RELATION_KIND,
        }
    }
}
