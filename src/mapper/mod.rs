//! Record mapper: one decoded record in, one [`UpsertPlan`] out.
//!
//! Pure apart from logging: no store access. Malformed input (missing
//! `sanctionId`, unparseable listing date) is a [`MapError`]; free text that
//! does not resolve to a country is not an error and only drops the edge.
//!
//! # Module layout
//!
//! - **plan**: `UpsertPlan`, `WriteSet`, `Scope` and omission types.

pub mod plan;

use std::collections::HashSet;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::alias::canonicalize;
use crate::records::dates;
use crate::records::{
    AddressRecord, AliasEntry, Field, IndividualRecord, Items, ListDescriptor,
    OrganisationRecord, PartyKind, PartyRecord, RegimeDescriptor,
};
use crate::reference::{Country, Resolution, normalize_country};
use crate::store::{EdgeUpsert, NodeKind, NodeRef, NodeUpsert, Props, Rel};

pub use plan::{OmitReason, Omission, Scope, ScopedWrites, UpsertPlan, WriteSet};

/// Key prefix of referenced (non-party) organisation nodes.
const ORG_KEY_PREFIX: &str = "org:";
/// Hex digits of the address hash kept in the address id.
const ADDRESS_ID_HEX_LEN: usize = 16;

// ── Errors ───────────────────────────────────────────────────────────────────

/// Why a record is malformed. Mapping fails before anything is written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("required key '{0}' has no value")]
    NoValue(&'static str),

    #[error("unparseable date in '{field}': {text:?}")]
    InvalidDate { field: &'static str, text: String },

    #[error("invalid record shape: {0}")]
    InvalidShape(String),
}

// ── Mapper ───────────────────────────────────────────────────────────────────

/// Maps records listed under one regime and list.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    regime: RegimeDescriptor,
    list: ListDescriptor,
}

impl RecordMapper {
    pub fn new(regime: RegimeDescriptor, list: ListDescriptor) -> Self {
        Self { regime, list }
    }

    pub fn regime_ref(&self) -> NodeRef {
        NodeRef::new(NodeKind::Regime, self.regime.id.clone())
    }

    pub fn list_ref(&self) -> NodeRef {
        NodeRef::new(NodeKind::List, self.list.id.clone())
    }

    pub fn map(&self, record: &PartyRecord) -> Result<UpsertPlan, MapError> {
        match record {
            PartyRecord::Individual(r) => self.map_individual(r),
            PartyRecord::Organisation(r) => self.map_organisation(r),
        }
    }

    fn map_individual(&self, r: &IndividualRecord) -> Result<UpsertPlan, MapError> {
        let sanction_id = required("sanctionId", &r.sanction_id)?;
        let listing = listing_props(&r.listed_on, &r.date_designated, &r.last_updated, &r.statement_of_reasons)?;
        let trust_sanctions = strict_date(
            "dateTrustServicesSanctionsImposed",
            &r.date_trust_services_sanctions_imposed,
        )?;

        let mut props = Props::new();
        props.insert("sanctionId".into(), Value::String(sanction_id.clone()));
        props.insert("partyKind".into(), Value::String(PartyKind::Person.label().into()));
        put(&mut props, "name", &individual_display_name(r));
        put(&mut props, "ukSanctionsRef", &r.uk_sanctions_ref);
        put(&mut props, "fullName", &r.full_name);
        put(&mut props, "firstName", &r.first_name);
        put(&mut props, "middleName", &r.middle_name);
        put(&mut props, "lastName", &r.last_name);
        put(&mut props, "nameNonLatinScript", &r.name_non_latin_script);
        put_birth_date(&mut props, &sanction_id, &r.date_of_birth);
        put(&mut props, "placeOfBirth", &r.place_of_birth);
        put(&mut props, "gender", &r.gender);
        put(&mut props, "position", &r.position);
        put(&mut props, "passportNumber", &r.passport_number);
        put(&mut props, "nationalIdentificationNumber", &r.national_identification_number);
        put(&mut props, "nationality", &r.nationality);
        put(&mut props, "dateTrustServicesSanctionsImposed", &trust_sanctions);
        put(&mut props, "otherInformation", &r.other_information);
        put(&mut props, "groupId", &r.group_id);
        props.extend(listing.clone());

        let mut plan = self.start_plan(&sanction_id, PartyKind::Person, props, listing);

        let nationality = self.add_country_edge(&mut plan, Scope::Nationality, Rel::HasNationality, &r.nationality);
        if let Some(text) = r.place_of_birth.value() {
            match normalize_country(text) {
                Resolution::Resolved(birth) if Some(birth) == nationality => {
                    debug!(sanction_id = %sanction_id, country = birth.code, "birth country equals nationality, edge omitted");
                    plan.omitted.push(Omission {
                        scope: Scope::BirthCountry,
                        rel: Rel::BornIn,
                        reason: OmitReason::SameAsNationality,
                    });
                }
                Resolution::Resolved(birth) => {
                    let writes = country_writes(&plan.party, Rel::BornIn, birth);
                    plan.conditional.push(ScopedWrites { scope: Scope::BirthCountry, writes });
                }
                Resolution::Unresolved => {
                    debug!(sanction_id = %sanction_id, place_of_birth = %text, "birthplace not resolved to a country");
                    plan.omitted.push(Omission {
                        scope: Scope::BirthCountry,
                        rel: Rel::BornIn,
                        reason: OmitReason::Unresolved(text.clone()),
                    });
                }
            }
        }

        self.add_addresses(&mut plan, &r.address);
        self.add_aliases(&mut plan, &r.aliases);
        Ok(plan)
    }

    fn map_organisation(&self, r: &OrganisationRecord) -> Result<UpsertPlan, MapError> {
        let sanction_id = required("sanctionId", &r.sanction_id)?;
        let listing = listing_props(&r.listed_on, &r.date_designated, &r.last_updated, &r.statement_of_reasons)?;

        let mut props = Props::new();
        props.insert("sanctionId".into(), Value::String(sanction_id.clone()));
        props.insert("partyKind".into(), Value::String(PartyKind::Organisation.label().into()));
        put(&mut props, "name", &r.organisation_name);
        put(&mut props, "organisationName", &r.organisation_name);
        put(&mut props, "ukSanctionsRef", &r.uk_sanctions_ref);
        put(&mut props, "nameNonLatinScript", &r.name_non_latin_script);
        put(&mut props, "entityType", &r.entity_type);
        put(&mut props, "typeOfEntity", &r.type_of_entity);
        put(&mut props, "registrationNumber", &r.registration_number);
        put(&mut props, "parentCompany", &r.parent_company);
        put(&mut props, "otherInformation", &r.other_information);
        put(&mut props, "groupId", &r.group_id);
        props.extend(listing.clone());

        let mut plan = self.start_plan(&sanction_id, PartyKind::Organisation, props, listing);

        self.add_addresses(&mut plan, &r.address);
        self.add_aliases(&mut plan, &r.aliases);

        let mut seen = HashSet::new();
        if let Some(name) = r.parent_company.value() {
            if let Some(org) = referenced_org(name) {
                let scope = Scope::Parent(org.key.clone());
                let edge = EdgeUpsert::new(org.node_ref(), Rel::ParentOf, plan.party.clone());
                push_org_scope(&mut plan, &mut seen, scope, org, edge);
            }
        }
        for name in r.subsidiaries.value().into_iter().flatten() {
            if let Some(org) = referenced_org(name) {
                let scope = Scope::Subsidiary(org.key.clone());
                let edge = EdgeUpsert::new(plan.party.clone(), Rel::ParentOf, org.node_ref());
                push_org_scope(&mut plan, &mut seen, scope, org, edge);
            }
        }
        for entry in r.related_entities.value().into_iter().flatten() {
            if let Some(org) = referenced_org(entry.name()) {
                let scope = Scope::Related(org.key.clone());
                let mut kind = Props::new();
                kind.insert("kind".into(), Value::String(entry.kind().to_string()));
                let edge = EdgeUpsert::new(plan.party.clone(), Rel::RelatedTo, org.node_ref()).with_props(kind);
                push_org_scope(&mut plan, &mut seen, scope, org, edge);
            }
        }

        Ok(plan)
    }

    // ── Plan assembly ────────────────────────────────────────────────────

    fn start_plan(&self, sanction_id: &str, kind: PartyKind, props: Props, listing: Props) -> UpsertPlan {
        let party = NodeRef::new(NodeKind::Party, sanction_id);
        let mut party_node = NodeUpsert::new(NodeKind::Party, sanction_id, vec![NodeKind::Party.as_str(), kind.label()]);
        party_node.set = props;

        let regime_ref = self.regime_ref();
        let list_ref = self.list_ref();

        let mandatory = WriteSet {
            nodes: vec![self.regime_node(), self.list_node(), party_node],
            edges: vec![
                EdgeUpsert::new(list_ref.clone(), Rel::Implements, regime_ref.clone()),
                EdgeUpsert::new(party.clone(), Rel::SanctionedUnder, regime_ref).mutable(listing.clone()),
                EdgeUpsert::new(party.clone(), Rel::ListedOn, list_ref).mutable(listing),
            ],
        };

        UpsertPlan {
            sanction_id: sanction_id.to_string(),
            kind,
            party,
            mandatory,
            conditional: Vec::new(),
            fan_out: Vec::new(),
            omitted: Vec::new(),
        }
    }

    fn regime_node(&self) -> NodeUpsert {
        let mut node = NodeUpsert::new(NodeKind::Regime, self.regime.id.clone(), vec![NodeKind::Regime.as_str()]);
        node.set = props_of([
            ("regimeId", &self.regime.id),
            ("name", &self.regime.name),
            ("authority", &self.regime.authority),
            ("legalBasis", &self.regime.legal_basis),
        ]);
        node
    }

    fn list_node(&self) -> NodeUpsert {
        let mut node = NodeUpsert::new(NodeKind::List, self.list.id.clone(), vec![NodeKind::List.as_str()]);
        node.set = props_of([
            ("listId", &self.list.id),
            ("name", &self.list.name),
            ("sourceFile", &self.list.source_file),
            ("authority", &self.list.authority),
            ("regimeId", &self.regime.id),
        ]);
        node
    }

    /// Adds the conditional country set for `field` if it resolves; returns the country.
    fn add_country_edge(
        &self,
        plan: &mut UpsertPlan,
        scope: Scope,
        rel: Rel,
        field: &Field<String>,
    ) -> Option<Country> {
        let text = field.value()?;
        match normalize_country(text) {
            Resolution::Resolved(country) => {
                let writes = country_writes(&plan.party, rel, country);
                plan.conditional.push(ScopedWrites { scope, writes });
                Some(country)
            }
            Resolution::Unresolved => {
                debug!(sanction_id = %plan.sanction_id, text = %text, rel = %rel, "country not resolved, edge omitted");
                plan.omitted.push(Omission {
                    scope,
                    rel,
                    reason: OmitReason::Unresolved(text.clone()),
                });
                None
            }
        }
    }

    fn add_addresses(&self, plan: &mut UpsertPlan, field: &Field<Items<AddressRecord>>) {
        let mut seen = HashSet::new();
        for addr in field.value().into_iter().flatten() {
            let Some(raw) = addr.raw_text() else {
                debug!(sanction_id = %plan.sanction_id, "address without text skipped");
                continue;
            };
            let id = address_id(&plan.sanction_id, &raw);
            if !seen.insert(id.clone()) {
                continue;
            }

            let mut node = NodeUpsert::new(NodeKind::Address, id.clone(), vec![NodeKind::Address.as_str()]);
            node.set.insert("addressId".into(), Value::String(id.clone()));
            node.set.insert("rawAddress".into(), Value::String(raw.clone()));
            put(&mut node.set, "addressLine1", &addr.address_line1);
            put(&mut node.set, "addressLine2", &addr.address_line2);
            put(&mut node.set, "postTown", &addr.post_town);
            put(&mut node.set, "postCode", &addr.post_code);
            put(&mut node.set, "region", &addr.region);
            put(&mut node.set, "country", &addr.country);

            let address_ref = node.node_ref();
            let mut writes = WriteSet {
                nodes: vec![node],
                edges: vec![EdgeUpsert::new(plan.party.clone(), Rel::HasAddress, address_ref.clone())],
            };

            // Without a country field the raw text's last segment often names it.
            let country_text = addr.country.value().unwrap_or(&raw);
            match normalize_country(country_text) {
                Resolution::Resolved(country) => {
                    writes.nodes.push(country_node(country));
                    writes.edges.push(EdgeUpsert::new(
                        address_ref,
                        Rel::LocatedIn,
                        NodeRef::new(NodeKind::Country, country.code),
                    ));
                }
                Resolution::Unresolved => {
                    debug!(sanction_id = %plan.sanction_id, text = %country_text, "address country not resolved");
                    plan.omitted.push(Omission {
                        scope: Scope::Address(id.clone()),
                        rel: Rel::LocatedIn,
                        reason: OmitReason::Unresolved(country_text.clone()),
                    });
                }
            }

            plan.fan_out.push(ScopedWrites { scope: Scope::Address(id), writes });
        }
    }

    fn add_aliases(&self, plan: &mut UpsertPlan, field: &Field<Items<AliasEntry>>) {
        let default_kind = plan.kind.default_alias_kind();
        let mut seen = HashSet::new();

        for entry in field.value().into_iter().flatten() {
            let text = entry.display_text();
            let key = canonicalize(text);
            if key.is_empty() {
                debug!(sanction_id = %plan.sanction_id, alias = %text, "alias without alphanumeric text skipped");
                continue;
            }
            if !seen.insert(key.clone()) {
                continue;
            }
            let kind = entry.kind_or(default_kind);

            let mut node = NodeUpsert::new(NodeKind::Alias, key.clone(), vec![NodeKind::Alias.as_str()]);
            node.set.insert("aliasKey".into(), Value::String(key.clone()));
            node.on_create.insert("displayText".into(), Value::String(text.to_string()));
            node.on_create.insert("kind".into(), Value::String(kind.as_str().into()));

            let mut edge_props = Props::new();
            edge_props.insert("kind".into(), Value::String(kind.as_str().into()));
            let edge = EdgeUpsert::new(plan.party.clone(), Rel::HasAlias, node.node_ref()).with_props(edge_props);

            plan.fan_out.push(ScopedWrites {
                scope: Scope::Alias(key),
                writes: WriteSet { nodes: vec![node], edges: vec![edge] },
            });
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn required(name: &'static str, field: &Field<String>) -> Result<String, MapError> {
    match field {
        Field::Value(v) => Ok(v.clone()),
        Field::NoValue => Err(MapError::NoValue(name)),
        Field::Absent => Err(MapError::MissingKey(name)),
    }
}

/// A listing date must parse when present; it is stored in ISO form.
fn strict_date(name: &'static str, field: &Field<String>) -> Result<Field<String>, MapError> {
    match field {
        Field::Value(text) => dates::to_iso(text)
            .map(Field::Value)
            .ok_or_else(|| MapError::InvalidDate { field: name, text: text.clone() }),
        Field::NoValue => Ok(Field::NoValue),
        Field::Absent => Ok(Field::Absent),
    }
}

/// Temporal metadata shared by the party node and its regime and list edges.
fn listing_props(
    listed_on: &Field<String>,
    date_designated: &Field<String>,
    last_updated: &Field<String>,
    statement_of_reasons: &Field<String>,
) -> Result<Props, MapError> {
    let mut props = Props::new();
    put(&mut props, "listedOn", &strict_date("listedOn", listed_on)?);
    put(&mut props, "dateDesignated", &strict_date("dateDesignated", date_designated)?);
    put(&mut props, "lastUpdated", &strict_date("lastUpdated", last_updated)?);
    put(&mut props, "statementOfReasons", statement_of_reasons);
    Ok(props)
}

/// Partial birth dates are common; unparseable text is kept as `dateOfBirthText`.
fn put_birth_date(props: &mut Props, sanction_id: &str, field: &Field<String>) {
    match field {
        Field::Absent => {}
        Field::NoValue => {
            props.insert("dateOfBirth".into(), Value::Null);
            props.insert("dateOfBirthText".into(), Value::Null);
        }
        Field::Value(text) => match dates::to_iso(text) {
            Some(iso) => {
                props.insert("dateOfBirth".into(), Value::String(iso));
                props.insert("dateOfBirthText".into(), Value::Null);
            }
            None => {
                warn!(sanction_id = %sanction_id, text = %text, "date of birth not parseable, kept as text");
                props.insert("dateOfBirth".into(), Value::Null);
                props.insert("dateOfBirthText".into(), Value::String(text.clone()));
            }
        },
    }
}

fn individual_display_name(r: &IndividualRecord) -> Field<String> {
    if let Field::Value(full) = &r.full_name {
        return Field::Value(full.clone());
    }
    let parts = [&r.first_name, &r.middle_name, &r.last_name];
    let joined: Vec<&str> = parts.iter().filter_map(|f| f.value().map(String::as_str)).collect();
    if !joined.is_empty() {
        return Field::Value(joined.join(" "));
    }
    if r.full_name.is_absent() && parts.iter().all(|f| f.is_absent()) {
        Field::Absent
    } else {
        Field::NoValue
    }
}

fn put(props: &mut Props, name: &str, field: &Field<String>) {
    if let Some(v) = field.to_patch() {
        props.insert(name.to_string(), v);
    }
}

fn props_of<const N: usize>(pairs: [(&str, &String); N]) -> Props {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
        .collect()
}

fn country_node(country: Country) -> NodeUpsert {
    let mut node = NodeUpsert::new(NodeKind::Country, country.code, vec![NodeKind::Country.as_str()]);
    node.set.insert("code".into(), Value::String(country.code.into()));
    node.set.insert("name".into(), Value::String(country.name.into()));
    node
}

fn country_writes(party: &NodeRef, rel: Rel, country: Country) -> WriteSet {
    WriteSet {
        nodes: vec![country_node(country)],
        edges: vec![EdgeUpsert::new(
            party.clone(),
            rel,
            NodeRef::new(NodeKind::Country, country.code),
        )],
    }
}

/// Organisation node for a name mentioned by a record, keyed by its canonical form.
fn referenced_org(name: &str) -> Option<NodeUpsert> {
    let canonical = canonicalize(name);
    if canonical.is_empty() {
        return None;
    }
    let key = format!("{ORG_KEY_PREFIX}{canonical}");
    let mut node = NodeUpsert::new(NodeKind::Organisation, key.clone(), vec![NodeKind::Organisation.as_str()]);
    node.set.insert("orgKey".into(), Value::String(key));
    node.on_create.insert("name".into(), Value::String(name.trim().to_string()));
    Some(node)
}

fn push_org_scope(
    plan: &mut UpsertPlan,
    seen: &mut HashSet<Scope>,
    scope: Scope,
    org: NodeUpsert,
    edge: EdgeUpsert,
) {
    if seen.insert(scope.clone()) {
        plan.fan_out.push(ScopedWrites {
            scope,
            writes: WriteSet { nodes: vec![org], edges: vec![edge] },
        });
    }
}

/// Stable address id: owned by one party, derived from its raw text.
pub fn address_id(sanction_id: &str, raw_address: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sanction_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(raw_address.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("addr-{}", &digest[..ADDRESS_ID_HEX_LEN])
}
