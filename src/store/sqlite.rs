//! SQLite graph store.
//!
//! Two tables carry the whole graph:
//!
//! - `nodes(kind, key, labels, props)`, primary key `(kind, key)`
//! - `edges(src_kind, src_key, rel_type, dst_kind, dst_key, props)`, primary key
//!   over all five identity columns, foreign keys to `nodes`
//!
//! `labels` and `props` are JSON text. Merges are an `INSERT … ON CONFLICT DO
//! NOTHING` followed, when nothing was inserted, by a guarded `UPDATE` that only
//! touches the row if the patch would change it. That keeps merges atomic per
//! key under concurrent writers and lets the caller tell created, updated and
//! unchanged apart.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use tracing::debug;

use super::{
    ClearSummary, EdgeUpsert, GraphStats, GraphStore, GraphTx, MergeOutcome, NodeKind, NodeRef,
    NodeUpsert, Props, StoreError,
};

const SCHEMA_VERSION: i64 = 1;

/// Node kinds removed by `clear_sanctions_data`.
const CLEARED_KINDS: [NodeKind; 4] = [
    NodeKind::Party,
    NodeKind::Organisation,
    NodeKind::Address,
    NodeKind::Alias,
];

// ── Error mapping ────────────────────────────────────────────────────────────

fn store_err(context: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            StoreError::Busy(format!("{context}: {e}"))
        }
        Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(format!("{context}: {e}")),
        _ => StoreError::Backend(format!("{context}: {e}")),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Backend(format!("serialize: {e}")))
}

fn props_from_json(text: &str) -> Result<Props, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Backend(format!("decode props: {e}")))
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Graph store backed by one SQLite file.
///
/// Opens a fresh connection per operation, so one instance can be shared by
/// every worker thread.
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    db_path: PathBuf,
    /// Busy timeout: the longest a transaction waits for the write lock.
    tx_timeout_ms: u64,
}

/// A stored node as read back for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub labels: Vec<String>,
    pub props: Props,
}

/// A stored edge as read back for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEdge {
    pub source: NodeRef,
    pub rel: String,
    pub target: NodeRef,
    pub props: Props,
}

impl SqliteGraphStore {
    /// Open (or create) the database file. Call [`GraphStore::ensure_constraints`]
    /// before the first write.
    pub fn open(db_path: &Path, tx_timeout_ms: u64) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
            tx_timeout_ms,
        };
        store.open_conn()?;
        Ok(store)
    }

    /// Open a connection and apply pragmas.
    ///
    /// - `busy_timeout` bounds the wait for the write lock.
    /// - WAL journal so readers never block the single writer.
    /// - `foreign_keys = ON` so an edge cannot reference a missing node.
    fn open_conn(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path).map_err(store_err("open database"))?;

        conn.pragma_update(None, "busy_timeout", self.tx_timeout_ms)
            .map_err(store_err("set busy_timeout"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(store_err("set journal_mode WAL"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(store_err("set foreign_keys ON"))?;

        Ok(conn)
    }

    /// Read one node, if present.
    pub fn node(&self, kind: NodeKind, key: &str) -> Result<Option<StoredNode>, StoreError> {
        let conn = self.open_conn()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT labels, props FROM nodes WHERE kind = ?1 AND key = ?2",
                params![kind.as_str(), key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(store_err("read node"))?;

        row.map(|(labels, props)| -> Result<StoredNode, StoreError> {
            Ok(StoredNode {
                labels: serde_json::from_str(&labels)
                    .map_err(|e| StoreError::Backend(format!("decode labels: {e}")))?,
                props: props_from_json(&props)?,
            })
        })
        .transpose()
    }

    /// Edges of one relationship type, ordered by identity.
    pub fn edges(&self, rel: super::Rel) -> Result<Vec<StoredEdge>, StoreError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT src_kind, src_key, dst_kind, dst_key, props FROM edges
                 WHERE rel_type = ?1
                 ORDER BY src_kind, src_key, dst_kind, dst_key",
            )
            .map_err(store_err("prepare edges"))?;

        let rows = stmt
            .query_map(params![rel.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(store_err("query edges"))?;

        let mut out = Vec::new();
        for row in rows {
            let (src_kind, src_key, dst_kind, dst_key, props) = row.map_err(store_err("edge row"))?;
            out.push(StoredEdge {
                source: NodeRef::new(parse_kind(&src_kind)?, src_key),
                rel: rel.as_str().to_string(),
                target: NodeRef::new(parse_kind(&dst_kind)?, dst_key),
                props: props_from_json(&props)?,
            });
        }
        Ok(out)
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS nodes (
                kind   TEXT NOT NULL,
                key    TEXT NOT NULL,
                labels TEXT NOT NULL,
                props  TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (kind, key)
            );

            CREATE TABLE IF NOT EXISTS edges (
                src_kind TEXT NOT NULL,
                src_key  TEXT NOT NULL,
                rel_type TEXT NOT NULL,
                dst_kind TEXT NOT NULL,
                dst_key  TEXT NOT NULL,
                props    TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (src_kind, src_key, rel_type, dst_kind, dst_key),
                FOREIGN KEY (src_kind, src_key) REFERENCES nodes (kind, key) ON DELETE CASCADE,
                FOREIGN KEY (dst_kind, dst_key) REFERENCES nodes (kind, key) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS edges_by_dst ON edges (dst_kind, dst_key);

            PRAGMA user_version = 1;
            ",
        )
        .map_err(store_err("initialize schema"))
    }
}

fn parse_kind(s: &str) -> Result<NodeKind, StoreError> {
    NodeKind::parse(s).ok_or_else(|| StoreError::Backend(format!("unknown node kind '{s}'")))
}

impl GraphStore for SqliteGraphStore {
    /// Initialise or validate the schema.
    ///
    /// - `user_version == 0`: fresh DB, run DDL.
    /// - `user_version == SCHEMA_VERSION`: already initialised, skip.
    /// - Anything else: unsupported version, return an error.
    fn ensure_constraints(&self) -> Result<(), StoreError> {
        let conn = self.open_conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(store_err("read schema version"))?;

        if version == 0 {
            Self::init_schema(&conn)?;
            debug!(path = %self.db_path.display(), "graph schema created");
            return Ok(());
        }
        if version != SCHEMA_VERSION {
            return Err(StoreError::Backend(format!(
                "unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        Ok(())
    }

    fn write(
        &self,
        work: &mut dyn FnMut(&mut dyn GraphTx) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut conn = self.open_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(store_err("begin write tx"))?;

        // Dropping an uncommitted transaction rolls it back.
        work(&mut SqliteTx { conn: &tx })?;

        tx.commit().map_err(store_err("commit write tx"))
    }

    fn stats(&self) -> Result<GraphStats, StoreError> {
        let conn = self.open_conn()?;
        let mut stats = GraphStats {
            nodes: conn
                .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
                .map_err(store_err("count nodes"))?,
            relationships: conn
                .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
                .map_err(store_err("count edges"))?,
            ..Default::default()
        };

        stats.nodes_by_label = grouped_counts(
            &conn,
            "SELECT l.value, COUNT(*) FROM nodes, json_each(nodes.labels) AS l GROUP BY l.value",
        )?;
        stats.relationships_by_type = grouped_counts(
            &conn,
            "SELECT rel_type, COUNT(*) FROM edges GROUP BY rel_type",
        )?;
        Ok(stats)
    }

    fn clear_sanctions_data(&self) -> Result<ClearSummary, StoreError> {
        let mut conn = self.open_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(store_err("begin clear tx"))?;

        let edges_before: u64 = tx
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .map_err(store_err("count edges"))?;

        let mut nodes_deleted = 0u64;
        for kind in CLEARED_KINDS {
            // Edges go with their endpoints (ON DELETE CASCADE).
            nodes_deleted += tx
                .execute("DELETE FROM nodes WHERE kind = ?1", params![kind.as_str()])
                .map_err(store_err("delete nodes"))? as u64;
        }
        nodes_deleted += tx
            .execute(
                "DELETE FROM nodes
                 WHERE kind = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM edges
                       WHERE (edges.dst_kind = ?1 AND edges.dst_key = nodes.key)
                          OR (edges.src_kind = ?1 AND edges.src_key = nodes.key)
                   )",
                params![NodeKind::Country.as_str()],
            )
            .map_err(store_err("delete orphaned countries"))? as u64;

        let edges_after: u64 = tx
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .map_err(store_err("count edges"))?;

        tx.commit().map_err(store_err("commit clear tx"))?;

        Ok(ClearSummary {
            nodes_deleted,
            relationships_deleted: edges_before.saturating_sub(edges_after),
        })
    }
}

fn grouped_counts(conn: &Connection, sql: &str) -> Result<BTreeMap<String, u64>, StoreError> {
    let mut stmt = conn.prepare(sql).map_err(store_err("prepare grouped count"))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
        .map_err(store_err("query grouped count"))?;
    rows.map(|r| r.map_err(store_err("grouped count row")))
        .collect()
}

// ── Transaction ──────────────────────────────────────────────────────────────

struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl GraphTx for SqliteTx<'_> {
    fn merge_node(&mut self, node: &NodeUpsert) -> Result<MergeOutcome, StoreError> {
        let labels = to_json(&node.labels)?;
        let set = to_json(&node.set)?;
        let on_create = to_json(&node.on_create)?;

        let inserted = self
            .conn
            .prepare_cached(
                "INSERT INTO nodes (kind, key, labels, props)
                 VALUES (?1, ?2, ?3, json_patch(?4, ?5))
                 ON CONFLICT (kind, key) DO NOTHING",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![node.kind.as_str(), node.key, labels, on_create, set])
            })
            .map_err(store_err("insert node"))?;
        if inserted == 1 {
            return Ok(MergeOutcome::Created);
        }

        let updated = self
            .conn
            .prepare_cached(
                "UPDATE nodes SET labels = ?3, props = json_patch(props, ?4)
                 WHERE kind = ?1 AND key = ?2
                   AND (labels IS NOT ?3 OR props IS NOT json_patch(props, ?4))",
            )
            .and_then(|mut stmt| stmt.execute(params![node.kind.as_str(), node.key, labels, set]))
            .map_err(store_err("update node"))?;

        Ok(if updated == 1 {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Unchanged
        })
    }

    fn merge_edge(&mut self, edge: &EdgeUpsert) -> Result<MergeOutcome, StoreError> {
        let props = to_json(&edge.props)?;

        let inserted = self
            .conn
            .prepare_cached(
                "INSERT INTO edges (src_kind, src_key, rel_type, dst_kind, dst_key, props)
                 VALUES (?1, ?2, ?3, ?4, ?5, json_patch('{}', ?6))
                 ON CONFLICT (src_kind, src_key, rel_type, dst_kind, dst_key) DO NOTHING",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    edge.source.kind.as_str(),
                    edge.source.key,
                    edge.rel.as_str(),
                    edge.target.kind.as_str(),
                    edge.target.key,
                    props,
                ])
            })
            .map_err(store_err("insert edge"))?;
        if inserted == 1 {
            return Ok(MergeOutcome::Created);
        }
        if !edge.mutable {
            return Ok(MergeOutcome::Unchanged);
        }

        let updated = self
            .conn
            .prepare_cached(
                "UPDATE edges SET props = json_patch(props, ?6)
                 WHERE src_kind = ?1 AND src_key = ?2 AND rel_type = ?3
                   AND dst_kind = ?4 AND dst_key = ?5
                   AND props IS NOT json_patch(props, ?6)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    edge.source.kind.as_str(),
                    edge.source.key,
                    edge.rel.as_str(),
                    edge.target.kind.as_str(),
                    edge.target.key,
                    props,
                ])
            })
            .map_err(store_err("update edge"))?;

        Ok(if updated == 1 {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Unchanged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Rel;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SqliteGraphStore {
        let store = SqliteGraphStore::open(&dir.path().join("graph.db"), 1_000).unwrap();
        store.ensure_constraints().unwrap();
        store
    }

    fn props(v: Value) -> Props {
        match v {
            Value::Object(m) => m,
            _ => panic!("props must be an object"),
        }
    }

    fn country(code: &str, name: &str) -> NodeUpsert {
        let mut n = NodeUpsert::new(NodeKind::Country, code, vec!["Country"]);
        n.set = props(json!({"code": code, "name": name}));
        n
    }

    fn merge_node(store: &SqliteGraphStore, node: &NodeUpsert) -> MergeOutcome {
        let mut outcome = None;
        store
            .write(&mut |tx| {
                outcome = Some(tx.merge_node(node)?);
                Ok(())
            })
            .unwrap();
        outcome.unwrap()
    }

    fn merge_edge(store: &SqliteGraphStore, edge: &EdgeUpsert) -> Result<MergeOutcome, StoreError> {
        let mut outcome = None;
        store.write(&mut |tx| {
            outcome = Some(tx.merge_edge(edge)?);
            Ok(())
        })?;
        Ok(outcome.unwrap())
    }

    #[test]
    fn ensure_constraints_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.ensure_constraints().unwrap();
        assert_eq!(store.stats().unwrap().nodes, 0);
    }

    #[test]
    fn node_merge_created_unchanged_updated() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let node = country("RU", "Russia");
        assert_eq!(merge_node(&store, &node), MergeOutcome::Created);
        assert_eq!(merge_node(&store, &node), MergeOutcome::Unchanged);
        assert_eq!(merge_node(&store, &country("RU", "Russian Federation")), MergeOutcome::Updated);

        let stored = store.node(NodeKind::Country, "RU").unwrap().unwrap();
        assert_eq!(stored.props["name"], json!("Russian Federation"));
        assert_eq!(stored.labels, vec!["Country".to_string()]);
    }

    #[test]
    fn null_in_set_clears_property_and_is_not_stored_on_create() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut node = NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty", "Person"]);
        node.set = props(json!({"sanctionId": "X1", "gender": "Male", "position": null}));
        merge_node(&store, &node);
        let stored = store.node(NodeKind::Party, "X1").unwrap().unwrap();
        assert!(!stored.props.contains_key("position"));

        node.set = props(json!({"sanctionId": "X1", "gender": null}));
        assert_eq!(merge_node(&store, &node), MergeOutcome::Updated);
        let stored = store.node(NodeKind::Party, "X1").unwrap().unwrap();
        assert!(!stored.props.contains_key("gender"));
    }

    #[test]
    fn on_create_props_survive_later_merges() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut first = NodeUpsert::new(NodeKind::Alias, "darkon", vec!["Alias"]);
        first.set = props(json!({"aliasKey": "darkon"}));
        first.on_create = props(json!({"displayText": "DARKON"}));
        merge_node(&store, &first);

        let mut second = first.clone();
        second.on_create = props(json!({"displayText": "Darkon"}));
        assert_eq!(merge_node(&store, &second), MergeOutcome::Unchanged);

        let stored = store.node(NodeKind::Alias, "darkon").unwrap().unwrap();
        assert_eq!(stored.props["displayText"], json!("DARKON"));
    }

    #[test]
    fn labels_are_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let person = NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty", "Person"]);
        let org = NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty", "Organisation"]);
        merge_node(&store, &person);
        assert_eq!(merge_node(&store, &org), MergeOutcome::Updated);
        let stats = store.stats().unwrap();
        assert_eq!(stats.label_count("Person"), 0);
        assert_eq!(stats.label_count("Organisation"), 1);
        assert_eq!(stats.nodes, 1);
    }

    #[test]
    fn immutable_edge_created_once() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        merge_node(&store, &country("RU", "Russia"));
        merge_node(&store, &NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty"]));

        let edge = EdgeUpsert::new(
            NodeRef::new(NodeKind::Party, "X1"),
            Rel::HasNationality,
            NodeRef::new(NodeKind::Country, "RU"),
        );
        assert_eq!(merge_edge(&store, &edge).unwrap(), MergeOutcome::Created);
        let changed = edge.clone().with_props(props(json!({"note": "x"})));
        assert_eq!(merge_edge(&store, &changed).unwrap(), MergeOutcome::Unchanged);
        assert_eq!(store.edges(Rel::HasNationality).unwrap().len(), 1);
        assert!(store.edges(Rel::HasNationality).unwrap()[0].props.is_empty());
    }

    #[test]
    fn mutable_edge_props_patched() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        merge_node(&store, &NodeUpsert::new(NodeKind::Regime, "cyber", vec!["SanctionsRegime"]));
        merge_node(&store, &NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty"]));

        let base = EdgeUpsert::new(
            NodeRef::new(NodeKind::Party, "X1"),
            Rel::SanctionedUnder,
            NodeRef::new(NodeKind::Regime, "cyber"),
        );
        let first = base.clone().mutable(props(json!({"listedOn": "2024-03-25"})));
        let second = base.mutable(props(json!({"listedOn": "2024-04-01"})));
        assert_eq!(merge_edge(&store, &first).unwrap(), MergeOutcome::Created);
        assert_eq!(merge_edge(&store, &first).unwrap(), MergeOutcome::Unchanged);
        assert_eq!(merge_edge(&store, &second).unwrap(), MergeOutcome::Updated);

        let edges = store.edges(Rel::SanctionedUnder).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].props["listedOn"], json!("2024-04-01"));
    }

    #[test]
    fn edge_to_missing_node_is_constraint_error() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let edge = EdgeUpsert::new(
            NodeRef::new(NodeKind::Party, "ghost"),
            Rel::HasNationality,
            NodeRef::new(NodeKind::Country, "RU"),
        );
        let err = merge_edge(&store, &edge).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)), "{err:?}");
        assert!(!err.is_transient());
    }

    #[test]
    fn failed_work_rolls_back() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let node = country("RU", "Russia");
        let result = store.write(&mut |tx| {
            tx.merge_node(&node)?;
            Err(StoreError::Backend("boom".into()))
        });
        assert!(result.is_err());
        assert!(store.node(NodeKind::Country, "RU").unwrap().is_none());
    }

    #[test]
    fn held_write_lock_reports_busy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.db");
        let store = SqliteGraphStore::open(&path, 50).unwrap();
        store.ensure_constraints().unwrap();

        let mut blocker = Connection::open(&path).unwrap();
        let _held = blocker
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();

        let err = store.write(&mut |_tx| Ok(())).unwrap_err();
        assert!(err.is_transient(), "{err:?}");
    }

    #[test]
    fn clear_keeps_regime_list_and_linked_countries() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        merge_node(&store, &NodeUpsert::new(NodeKind::Regime, "cyber", vec!["SanctionsRegime"]));
        merge_node(&store, &NodeUpsert::new(NodeKind::List, "uk-cyber", vec!["SanctionsList"]));
        merge_node(&store, &NodeUpsert::new(NodeKind::Party, "X1", vec!["SanctionedParty"]));
        merge_node(&store, &country("RU", "Russia"));
        merge_edge(
            &store,
            &EdgeUpsert::new(
                NodeRef::new(NodeKind::Party, "X1"),
                Rel::HasNationality,
                NodeRef::new(NodeKind::Country, "RU"),
            ),
        )
        .unwrap();
        merge_edge(
            &store,
            &EdgeUpsert::new(
                NodeRef::new(NodeKind::List, "uk-cyber"),
                Rel::Implements,
                NodeRef::new(NodeKind::Regime, "cyber"),
            ),
        )
        .unwrap();

        let summary = store.clear_sanctions_data().unwrap();
        assert_eq!(summary.nodes_deleted, 2);
        assert_eq!(summary.relationships_deleted, 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.rel_count(Rel::Implements), 1);
        assert!(store.node(NodeKind::Country, "RU").unwrap().is_none());
    }
}
