//! SQLite implementation of Graph

use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use crate::storage::helper::unix_timestamp;
use crate::storage::ids::NodeId;
use crate::storage::traits::{Graph, check_endpoints};
use crate::storage::types::{Edge, Node, NodeKind, Props, Relation, StoredNode, stored_editable};

/// Initialize graph schema (nodes and edges tables)
pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS nodes (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            props TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_kind ON nodes(kind);

        CREATE TABLE IF NOT EXISTS edges (
            from_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
            to_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
            relation TEXT NOT NULL,
            metadata TEXT,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (from_id, to_id, relation)
        );

        CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id, relation);
        "#,
    )?;
    Ok(())
}

type NodeRow = (NodeId, String, String, i64, i64);

fn read_node_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_stored((id, kind, props, created_at, updated_at): NodeRow) -> Result<StoredNode> {
    let kind: NodeKind = kind.parse()?;
    let props: Props = serde_json::from_str(&props)?;
    Ok(stored_editable(
        id,
        Node::new(kind, props),
        created_at,
        updated_at,
    ))
}

/// Graph view over a connection or an open transaction
pub struct SqliteGraph<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteGraph<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn linked(&self, sql: &str, id: &NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![id, relation.as_str()], |row| {
            row.get::<_, NodeId>(0)
        })?;
        let ids = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

// ============================================================================
// Graph Implementation
// ============================================================================

impl Graph for SqliteGraph<'_> {
    fn create_node(&mut self, kind: NodeKind, props: Props) -> Result<NodeId> {
        let now = unix_timestamp();
        let id = NodeId::new();
        self.conn.execute(
            "INSERT INTO nodes (id, kind, props, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                kind.as_str(),
                serde_json::to_string(&props)?,
                now,
                now
            ],
        )?;
        Ok(id)
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<StoredNode>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, kind, props, created_at, updated_at FROM nodes WHERE id = ?1",
                params![id],
                read_node_row,
            )
            .optional()?;
        row.map(into_stored).transpose()
    }

    fn find_nodes(&self, kind: NodeKind, filter: &[(&str, &Value)]) -> Result<Vec<StoredNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, props, created_at, updated_at FROM nodes
             WHERE kind = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![kind.as_str()], read_node_row)?;

        let mut nodes = Vec::new();
        for row in rows {
            let node = into_stored(row?)?;
            if node.matches(filter) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn update_node(&mut self, id: &NodeId, props: Props) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE nodes SET props = ?1, updated_at = ?2 WHERE id = ?3",
            params![serde_json::to_string(&props)?, unix_timestamp(), id],
        )?;
        if updated == 0 {
            bail!("node not found: {id}");
        }
        Ok(())
    }

    fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        // Edges go with the node through ON DELETE CASCADE
        let deleted = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
        if deleted == 0 {
            bail!("node not found: {id}");
        }
        Ok(())
    }

    fn connect(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        relation: Relation,
        metadata: Option<Value>,
    ) -> Result<()> {
        check_endpoints(
            relation,
            self.get_node(from)?.as_ref(),
            self.get_node(to)?.as_ref(),
        )?;
        let metadata = metadata.map(|m| serde_json::to_string(&m)).transpose()?;
        self.conn.execute(
            "INSERT INTO edges (from_id, to_id, relation, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(from_id, to_id, relation) DO UPDATE SET metadata = excluded.metadata",
            params![
                from,
                to,
                relation.as_str(),
                metadata,
                unix_timestamp()
            ],
        )?;
        Ok(())
    }

    fn disconnect(&mut self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM edges WHERE from_id = ?1 AND to_id = ?2 AND relation = ?3",
            params![from, to, relation.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn edge(&self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<Option<Edge>> {
        let row = self
            .conn
            .query_row(
                "SELECT metadata, created_at FROM edges
                 WHERE from_id = ?1 AND to_id = ?2 AND relation = ?3",
                params![from, to, relation.as_str()],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((metadata, created_at)) = row else {
            return Ok(None);
        };
        let metadata = metadata
            .map(|m| serde_json::from_str::<Value>(&m))
            .transpose()
            .map_err(|e| anyhow!("invalid metadata on {relation} edge: {e}"))?;
        Ok(Some(Edge {
            from_id: from.clone(),
            to_id: to.clone(),
            relation,
            metadata,
            created_at,
        }))
    }

    fn targets(&self, from: &NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        self.linked(
            "SELECT to_id FROM edges WHERE from_id = ?1 AND relation = ?2 ORDER BY rowid",
            from,
            relation,
        )
    }

    fn sources(&self, to: &NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        self.linked(
            "SELECT from_id FROM edges WHERE to_id = ?1 AND relation = ?2 ORDER BY rowid",
            to,
            relation,
        )
    }
}
