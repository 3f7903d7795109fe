//! SQLite storage backend

use super::traits::{OpenStore, ProvStore, StorageError, StorageResult};
use super::types::{
    ContainerId, Metadata, RawBundle, RawDocument, RawRecord, RecordId, StoredAttributes,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed provenance store
///
/// Uses a single SQLite database file with tables for containers, nodes and
/// edges. Metadata and attributes are stored as JSON columns; identifier and
/// type are duplicated into plain columns for endpoint lookup.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Containers: one per document root (document_id = id) and one per bundle
            CREATE TABLE IF NOT EXISTS containers (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_containers_document
                ON containers(document_id);

            -- Nodes; `represents` is set on bundle entity nodes
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                container_id TEXT NOT NULL,
                identifier TEXT NOT NULL,
                prov_type TEXT NOT NULL,
                represents TEXT,
                metadata_json TEXT NOT NULL,
                attributes_json TEXT NOT NULL,
                FOREIGN KEY (container_id) REFERENCES containers(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_identifier
                ON nodes(container_id, identifier);
            CREATE INDEX IF NOT EXISTS idx_nodes_represents
                ON nodes(represents);

            -- Edges belong to the container of their source node
            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                container_id TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                prov_type TEXT NOT NULL,
                metadata_json TEXT NOT NULL,
                attributes_json TEXT NOT NULL,
                FOREIGN KEY (container_id) REFERENCES containers(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_edges_container
                ON edges(container_id);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Delete a document with all its bundles, nodes and edges
    pub fn delete_document(&self, document_id: &ContainerId) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM containers WHERE document_id = ?1",
            params![document_id.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn insert_container(conn: &Connection, id: &ContainerId, document_id: &ContainerId) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO containers (id, document_id, created_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), document_id.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn container_exists(conn: &Connection, id: &ContainerId) -> StorageResult<bool> {
        let found: Option<String> = conn
            .query_row(
                "SELECT id FROM containers WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_node(
        conn: &Connection,
        container_id: &ContainerId,
        represents: Option<&ContainerId>,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let id = RecordId::new();
        conn.execute(
            r#"
            INSERT INTO nodes (id, container_id, identifier, prov_type, represents, metadata_json, attributes_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id.as_str(),
                container_id.as_str(),
                metadata.identifier,
                metadata.prov_type,
                represents.map(|c| c.as_str()),
                serde_json::to_string(metadata)?,
                serde_json::to_string(attributes)?,
            ],
        )?;
        Ok(id)
    }

    /// Find the node an edge endpoint refers to
    fn find_node(conn: &Connection, container_id: &ContainerId, identifier: &str) -> StorageResult<String> {
        conn.query_row(
            "SELECT id FROM nodes WHERE container_id = ?1 AND identifier = ?2 ORDER BY rowid LIMIT 1",
            params![container_id.as_str(), identifier],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            StorageError::CreateEdge(format!(
                "no node {} in container {}",
                identifier, container_id
            ))
        })
    }

    /// Deserialize a stored record from its JSON columns
    fn row_to_record(metadata_json: &str, attributes_json: &str) -> StorageResult<RawRecord> {
        Ok(RawRecord {
            metadata: serde_json::from_str(metadata_json)?,
            attributes: serde_json::from_str(attributes_json)?,
        })
    }

    /// Nodes (bundle entity nodes excluded) then edges of one container,
    /// each in insertion order
    fn load_container_records(conn: &Connection, container_id: &ContainerId) -> StorageResult<Vec<RawRecord>> {
        let mut records = Vec::new();

        let mut stmt = conn.prepare(
            "SELECT metadata_json, attributes_json FROM nodes
             WHERE container_id = ?1 AND represents IS NULL ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![container_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (metadata, attributes) = row?;
            records.push(Self::row_to_record(&metadata, &attributes)?);
        }

        let mut stmt = conn.prepare(
            "SELECT metadata_json, attributes_json FROM edges
             WHERE container_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![container_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (metadata, attributes) = row?;
            records.push(Self::row_to_record(&metadata, &attributes)?);
        }

        Ok(records)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref()).map_err(|e| {
            StorageError::Connection(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ProvStore for SqliteStore {
    // === Container Operations ===

    fn save_document(&self) -> StorageResult<ContainerId> {
        let conn = self.conn.lock().unwrap();
        let id = ContainerId::new();
        Self::insert_container(&conn, &id, &id)?;
        Ok(id)
    }

    fn save_bundle(
        &self,
        document_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<ContainerId> {
        let mut conn = self.conn.lock().unwrap();
        if !Self::container_exists(&conn, document_id)? {
            return Err(StorageError::DocumentNotFound(document_id.to_string()));
        }

        let bundle_id = ContainerId::new();
        let tx = conn.transaction()?;
        Self::insert_container(&tx, &bundle_id, document_id)?;
        Self::insert_node(&tx, document_id, Some(&bundle_id), attributes, metadata)?;
        tx.commit()?;

        Ok(bundle_id)
    }

    // === Node Operations ===

    fn save_record(
        &self,
        container_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let conn = self.conn.lock().unwrap();
        if !Self::container_exists(&conn, container_id)? {
            return Err(StorageError::CreateNode(format!(
                "unknown container {}",
                container_id
            )));
        }
        Self::insert_node(&conn, container_id, None, attributes, metadata)
    }

    // === Edge Operations ===

    fn save_relation(
        &self,
        from_container: &ContainerId,
        from_identifier: &str,
        to_container: &ContainerId,
        to_identifier: &str,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let conn = self.conn.lock().unwrap();
        let source = Self::find_node(&conn, from_container, from_identifier)?;
        let target = Self::find_node(&conn, to_container, to_identifier)?;

        let id = RecordId::new();
        conn.execute(
            r#"
            INSERT INTO edges (id, container_id, source_id, target_id, prov_type, metadata_json, attributes_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id.as_str(),
                from_container.as_str(),
                source,
                target,
                metadata.prov_type,
                serde_json::to_string(metadata)?,
                serde_json::to_string(attributes)?,
            ],
        )?;
        Ok(id)
    }

    // === Read Operations ===

    fn get_document(&self, document_id: &ContainerId) -> StorageResult<RawDocument> {
        let conn = self.conn.lock().unwrap();

        let root: Option<String> = conn
            .query_row(
                "SELECT id FROM containers WHERE id = ?1 AND document_id = ?1",
                params![document_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if root.is_none() {
            return Err(StorageError::DocumentNotFound(document_id.to_string()));
        }

        let records = Self::load_container_records(&conn, document_id)?;

        let mut stmt = conn.prepare(
            "SELECT c.id, n.metadata_json, n.attributes_json
             FROM containers c JOIN nodes n ON n.represents = c.id
             WHERE c.document_id = ?1 AND c.id != ?1
             ORDER BY c.rowid",
        )?;
        let rows = stmt.query_map(params![document_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut bundles = Vec::new();
        for row in rows {
            let (bundle_id, metadata, attributes) = row?;
            let bundle_id = ContainerId::from(bundle_id);
            bundles.push(RawBundle {
                bundle_record: Self::row_to_record(&metadata, &attributes)?,
                records: Self::load_container_records(&conn, &bundle_id)?,
            });
        }

        Ok(RawDocument { records, bundles })
    }

    fn list_documents(&self) -> StorageResult<Vec<ContainerId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id FROM containers WHERE id = document_id ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(ContainerId::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
