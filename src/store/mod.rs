//! Graph-store interface.
//!
//! The writer talks to the store only through [`GraphStore`] and [`GraphTx`].
//! Every node is identified by `(kind, key)` and every edge by
//! `(source, rel, target)`; the backend enforces both as uniqueness
//! constraints and implements merges on top of them, never as read-then-write.
//!
//! # Module layout
//!
//! - **sqlite**: `SqliteGraphStore`, the rusqlite-backed implementation.

pub mod sqlite;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

pub use sqlite::SqliteGraphStore;

/// Node or edge property map.
pub type Props = Map<String, Value>;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Write lock not acquired in time, or the database was locked.
    #[error("store busy: {0}")]
    Busy(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Only contention is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

// ── Identities ───────────────────────────────────────────────────────────────

/// Merge-key namespace of a node. Each kind has its own uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Keyed by `sanctionId`; labelled `Person` or `Organisation` as well.
    Party,
    /// Organisation named by a party record (parent, subsidiary, related).
    Organisation,
    Address,
    Alias,
    Country,
    Regime,
    List,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Party,
        NodeKind::Organisation,
        NodeKind::Address,
        NodeKind::Alias,
        NodeKind::Country,
        NodeKind::Regime,
        NodeKind::List,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Party => "SanctionedParty",
            NodeKind::Organisation => "Organisation",
            NodeKind::Address => "Address",
            NodeKind::Alias => "Alias",
            NodeKind::Country => "Country",
            NodeKind::Regime => "SanctionsRegime",
            NodeKind::List => "SanctionsList",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub key: String,
}

impl NodeRef {
    pub fn new(kind: NodeKind, key: impl Into<String>) -> Self {
        Self { kind, key: key.into() }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rel {
    HasAddress,
    HasAlias,
    HasNationality,
    BornIn,
    SanctionedUnder,
    ListedOn,
    Implements,
    ParentOf,
    RelatedTo,
    LocatedIn,
}

impl Rel {
    pub fn as_str(self) -> &'static str {
        match self {
            Rel::HasAddress => "HAS_ADDRESS",
            Rel::HasAlias => "HAS_ALIAS",
            Rel::HasNationality => "HAS_NATIONALITY",
            Rel::BornIn => "BORN_IN",
            Rel::SanctionedUnder => "SANCTIONED_UNDER",
            Rel::ListedOn => "LISTED_ON",
            Rel::Implements => "IMPLEMENTS",
            Rel::ParentOf => "PARENT_OF",
            Rel::RelatedTo => "RELATED_TO",
            Rel::LocatedIn => "LOCATED_IN",
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Upserts ──────────────────────────────────────────────────────────────────

/// Create-if-absent-else-update request for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub kind: NodeKind,
    pub key: String,
    /// Replaces the stored label set on every merge.
    pub labels: Vec<&'static str>,
    /// Patched on every merge; a `null` value removes the property.
    pub set: Props,
    /// Written only when the node is created.
    pub on_create: Props,
}

impl NodeUpsert {
    pub fn new(kind: NodeKind, key: impl Into<String>, labels: Vec<&'static str>) -> Self {
        Self {
            kind,
            key: key.into(),
            labels,
            set: Props::new(),
            on_create: Props::new(),
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.kind, self.key.clone())
    }
}

/// Create-if-absent request for one edge. Mutable edges also patch `props`
/// on every merge; immutable edges keep the properties they were created with.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeUpsert {
    pub source: NodeRef,
    pub rel: Rel,
    pub target: NodeRef,
    pub props: Props,
    pub mutable: bool,
}

impl EdgeUpsert {
    pub fn new(source: NodeRef, rel: Rel, target: NodeRef) -> Self {
        Self {
            source,
            rel,
            target,
            props: Props::new(),
            mutable: false,
        }
    }

    pub fn mutable(mut self, props: Props) -> Self {
        self.props = props;
        self.mutable = true;
        self
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
    Unchanged,
}

// ── Statistics ───────────────────────────────────────────────────────────────

/// Node counts per label and relationship totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: u64,
    pub nodes_by_label: BTreeMap<String, u64>,
    pub relationships: u64,
    pub relationships_by_type: BTreeMap<String, u64>,
}

impl GraphStats {
    pub fn label_count(&self, label: &str) -> u64 {
        self.nodes_by_label.get(label).copied().unwrap_or(0)
    }

    pub fn rel_count(&self, rel: Rel) -> u64 {
        self.relationships_by_type.get(rel.as_str()).copied().unwrap_or(0)
    }
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph statistics")?;
        writeln!(f, "  nodes:          {}", self.nodes)?;
        for (label, count) in &self.nodes_by_label {
            writeln!(f, "    {label:<16} {count}")?;
        }
        writeln!(f, "  relationships:  {}", self.relationships)?;
        for (rel, count) in &self.relationships_by_type {
            writeln!(f, "    {rel:<16} {count}")?;
        }
        Ok(())
    }
}

/// What `clear_sanctions_data` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub nodes_deleted: u64,
    pub relationships_deleted: u64,
}

// ── Traits ───────────────────────────────────────────────────────────────────

/// Merge operations available inside one write transaction.
pub trait GraphTx {
    fn merge_node(&mut self, node: &NodeUpsert) -> Result<MergeOutcome, StoreError>;
    fn merge_edge(&mut self, edge: &EdgeUpsert) -> Result<MergeOutcome, StoreError>;
}

/// A graph database reachable through merge transactions.
pub trait GraphStore: Send + Sync {
    /// Create the uniqueness constraints (schema) if missing. Idempotent.
    fn ensure_constraints(&self) -> Result<(), StoreError>;

    /// Run `work` inside one write transaction: commit on `Ok`, roll back on `Err`.
    fn write(
        &self,
        work: &mut dyn FnMut(&mut dyn GraphTx) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    fn stats(&self) -> Result<GraphStats, StoreError>;

    /// Remove parties, referenced organisations, addresses and aliases with
    /// their relationships, then countries nothing links to any more.
    /// Regime and list nodes are kept.
    fn clear_sanctions_data(&self) -> Result<ClearSummary, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_busy_is_transient() {
        assert!(StoreError::Busy("locked".into()).is_transient());
        assert!(!StoreError::Constraint("fk".into()).is_transient());
        assert!(!StoreError::Backend("io".into()).is_transient());
    }

    #[test]
    fn node_kind_round_trips_through_name() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::parse("Person"), None);
    }

    #[test]
    fn mutable_edge_builder() {
        let mut props = Props::new();
        props.insert("listedOn".into(), Value::String("2024-03-25".into()));
        let e = EdgeUpsert::new(
            NodeRef::new(NodeKind::Party, "X1"),
            Rel::SanctionedUnder,
            NodeRef::new(NodeKind::Regime, "cyber"),
        )
        .mutable(props);
        assert!(e.mutable);
        assert_eq!(e.props.len(), 1);
        assert_eq!(e.source.to_string(), "SanctionedParty:X1");
    }

    #[test]
    fn stats_display_lists_labels() {
        let mut stats = GraphStats { nodes: 2, relationships: 1, ..Default::default() };
        stats.nodes_by_label.insert("Alias".into(), 2);
        stats.relationships_by_type.insert("HAS_ALIAS".into(), 1);
        let out = stats.to_string();
        assert!(out.contains("Alias"));
        assert!(out.contains("HAS_ALIAS"));
        assert_eq!(stats.rel_count(Rel::HasAlias), 1);
        assert_eq!(stats.label_count("Country"), 0);
    }
}
