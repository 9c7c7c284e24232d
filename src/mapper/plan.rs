//! `UpsertPlan`: the declarative output of the record mapper.
//!
//! A plan is partitioned by transaction scope: the mandatory set is applied
//! first and alone; every conditional and fan-out set is applied afterwards in
//! its own transaction.

use std::fmt;

use crate::records::PartyKind;
use crate::store::{EdgeUpsert, NodeRef, NodeUpsert, Rel};

/// Transaction scope of one write set. Failures are reported per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Mandatory,
    Nationality,
    BirthCountry,
    /// Address id.
    Address(String),
    /// Alias canonical key.
    Alias(String),
    /// Referenced organisation key of the parent company.
    Parent(String),
    Subsidiary(String),
    Related(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Mandatory => f.write_str("mandatory"),
            Scope::Nationality => f.write_str("nationality"),
            Scope::BirthCountry => f.write_str("birth-country"),
            Scope::Address(id) => write!(f, "address {id}"),
            Scope::Alias(key) => write!(f, "alias '{key}'"),
            Scope::Parent(key) => write!(f, "parent {key}"),
            Scope::Subsidiary(key) => write!(f, "subsidiary {key}"),
            Scope::Related(key) => write!(f, "related {key}"),
        }
    }
}

/// Nodes and edges applied together. Nodes are merged before edges so every
/// edge endpoint exists when the edge is merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSet {
    pub nodes: Vec<NodeUpsert>,
    pub edges: Vec<EdgeUpsert>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedWrites {
    pub scope: Scope,
    pub writes: WriteSet,
}

/// Why a conditional edge was left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmitReason {
    /// The text is not in the reference table.
    Unresolved(String),
    /// Birth country resolved to the nationality country.
    SameAsNationality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Omission {
    pub scope: Scope,
    pub rel: Rel,
    pub reason: OmitReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertPlan {
    pub sanction_id: String,
    pub kind: PartyKind,
    pub party: NodeRef,
    /// Regime, list, party, IMPLEMENTS and the two listing edges.
    pub mandatory: WriteSet,
    /// Nationality and birth-country sets, present only when resolved.
    pub conditional: Vec<ScopedWrites>,
    /// One set per address, alias and organisation relationship.
    pub fan_out: Vec<ScopedWrites>,
    pub omitted: Vec<Omission>,
}

impl UpsertPlan {
    /// Conditional then fan-out sets, in application order.
    pub fn optional_sets(&self) -> impl Iterator<Item = &ScopedWrites> {
        self.conditional.iter().chain(self.fan_out.iter())
    }

    /// Every edge in the plan, mandatory first.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeUpsert> {
        self.mandatory
            .edges
            .iter()
            .chain(self.optional_sets().flat_map(|s| s.writes.edges.iter()))
    }

    pub fn edges_of(&self, rel: Rel) -> Vec<&EdgeUpsert> {
        self.edges().filter(|e| e.rel == rel).collect()
    }
}
