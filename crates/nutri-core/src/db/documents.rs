//! Document storage on SQLite.

use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::{Database, DbError, DbResult};
use crate::store::{
    generate_auto_id, DocumentData, DocumentSnapshot, DocumentStore, StoreError, StoreResult,
};

fn decode_row(doc_id: String, raw: &str) -> DbResult<DocumentSnapshot> {
    let data: DocumentData = serde_json::from_str(raw)?;
    Ok(DocumentSnapshot { id: doc_id, data })
}

/// JSON path for a top-level field, quoted so any field name is safe.
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

impl Database {
    /// Get a document by collection and ID.
    pub fn get_document(&self, collection: &str, doc_id: &str) -> DbResult<Option<DocumentSnapshot>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| decode_row(doc_id.to_string(), &raw)).transpose()
    }

    /// List a collection in insertion order.
    pub fn list_documents(&self, collection: &str) -> DbResult<Vec<DocumentSnapshot>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doc_id, data
            FROM documents
            WHERE collection = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (doc_id, raw) = row?;
            documents.push(decode_row(doc_id, &raw)?);
        }
        Ok(documents)
    }

    /// Documents whose top-level `field` equals `value`.
    pub fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> DbResult<Vec<DocumentSnapshot>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doc_id, data
            FROM documents
            WHERE collection = ?1
              AND json_extract(data, ?2) = json_extract(?3, '$')
            ORDER BY rowid
            "#,
        )?;

        let needle = serde_json::to_string(value)?;
        let rows = stmt.query_map(params![collection, field_path(field), needle], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (doc_id, raw) = row?;
            documents.push(decode_row(doc_id, &raw)?);
        }
        Ok(documents)
    }

    /// Insert a new document. Fails if the ID is taken.
    pub fn insert_document(&self, collection: &str, doc_id: &str, data: &DocumentData) -> DbResult<()> {
        let raw = serde_json::to_string(data)?;
        self.conn
            .execute(
                "INSERT INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3)",
                params![collection, doc_id, raw],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DbError::Constraint(format!("document {}/{} already exists", collection, doc_id))
                }
                other => DbError::Sqlite(other),
            })?;
        Ok(())
    }

    /// Insert or replace a document body, keeping its original position.
    pub fn upsert_document(&self, collection: &str, doc_id: &str, data: &DocumentData) -> DbResult<()> {
        let raw = serde_json::to_string(data)?;
        self.conn.execute(
            r#"
            INSERT INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3)
            ON CONFLICT(collection, doc_id) DO UPDATE SET
                data = excluded.data,
                updated_at = datetime('now')
            "#,
            params![collection, doc_id, raw],
        )?;
        Ok(())
    }

    /// Merge top-level fields into an existing document.
    ///
    /// Returns false if the document does not exist.
    pub fn merge_document(&self, collection: &str, doc_id: &str, fields: DocumentData) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let Some(mut existing) = self.get_document(collection, doc_id)? else {
            return Ok(false);
        };
        existing.data.extend(fields);

        let raw = serde_json::to_string(&existing.data)?;
        tx.execute(
            r#"
            UPDATE documents SET
                data = ?3,
                updated_at = datetime('now')
            WHERE collection = ?1 AND doc_id = ?2
            "#,
            params![collection, doc_id, raw],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Delete a document.
    pub fn delete_document(&self, collection: &str, doc_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, doc_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Number of documents in a collection.
    pub fn count_documents(&self, collection: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            [collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl DocumentStore for Database {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        Ok(self.get_document(collection, id)?)
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(self.list_documents(collection)?)
    }

    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(self.query_documents(collection, field, value)?)
    }

    fn add(&self, collection: &str, data: DocumentData) -> StoreResult<String> {
        let doc_id = generate_auto_id();
        self.insert_document(collection, &doc_id, &data)?;
        tracing::debug!(collection, doc_id = %doc_id, "document created");
        Ok(doc_id)
    }

    fn set(&self, collection: &str, id: &str, data: DocumentData, merge: bool) -> StoreResult<()> {
        if merge && self.merge_document(collection, id, data.clone())? {
            return Ok(());
        }
        self.upsert_document(collection, id, &data)?;
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, data: DocumentData) -> StoreResult<()> {
        if self.merge_document(collection, id, data)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
        }
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        if !self.delete_document(collection, id)? {
            tracing::debug!(collection, doc_id = id, "delete of missing document");
        }
        Ok(())
    }
}
