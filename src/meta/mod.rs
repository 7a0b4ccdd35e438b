//! Project and document storage using SQLite
//!
//! This module owns all durable state:
//! - Projects (named document groupings with isolated search scopes)
//! - Documents (extracted text plus typed metadata, owned by a project)
//! - QA pairs (derived suggestions, replaced wholesale on reprocessing)
//!
//! Every method returns `Result`; a failed write is an error, never an
//! empty value, so callers cannot mistake "store unreachable" for "no
//! rows". Deleting a project cascades to its documents and their QA pairs
//! through foreign keys.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use crate::parse::DocumentMeta;
use crate::qa::QaPair;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

/// A user-created project
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A project row with its live document count
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub doc_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored document
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub project_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_type: String,
    pub content: String,
    pub file_size: i64,
    pub page_count: i64,
    pub upload_date: String,
    pub metadata_json: Option<String>,
}

impl Document {
    /// Parse the stored metadata column back into its typed form
    pub fn meta(&self) -> Option<DocumentMeta> {
        self.metadata_json
            .as_ref()
            .and_then(|j| serde_json::from_str(j).ok())
    }
}

/// A document about to be stored
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub project_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_type: String,
    pub content: String,
    pub file_size: i64,
    pub page_count: i64,
    pub meta: DocumentMeta,
}

/// A stored QA pair
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: i64,
    pub document_id: i64,
    pub question: String,
    pub answer: String,
    pub source: String,
    pub created_at: String,
}

/// Store-wide counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub project_count: usize,
    pub document_count: usize,
    pub qa_count: usize,
}

/// Metadata database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Open (and if needed create) the database at the given path
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='projects'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Project Operations =====

    /// Create a project. The name must be non-empty and unique; a
    /// duplicate name is its own error so callers can report it as such.
    pub async fn create_project(&self, name: &str, description: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidProjectName(
                "name must not be empty".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                info!("Created project '{}'", name);
                Ok(done.last_insert_rowid())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::DuplicateProject(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get project by ID
    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    /// Get project by exact name
    pub async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    /// Resolve a CLI project selector: a name first, a numeric ID second
    pub async fn resolve_project(&self, selector: &str) -> Result<Project> {
        if let Some(project) = self.get_project_by_name(selector).await? {
            return Ok(project);
        }

        if let Ok(id) = selector.parse::<i64>() {
            if let Some(project) = self.get_project(id).await? {
                return Ok(project);
            }
        }

        Err(Error::ProjectNotFound(selector.to_string()))
    }

    /// List all projects with live document counts, newest first
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let projects = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.name, p.description, COUNT(d.id) AS doc_count,
                   p.created_at, p.updated_at
            FROM projects p
            LEFT JOIN project_documents d ON d.project_id = p.id
            GROUP BY p.id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    /// Delete a project; documents and QA pairs cascade
    pub async fn delete_project(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted project {}", id);
        }
        Ok(deleted)
    }

    // ===== Document Operations =====

    /// Insert a document and refresh the owning project's updated_at
    pub async fn save_document(&self, doc: &NewDocument) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let metadata_json = serde_json::to_string(&doc.meta)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO project_documents
                (project_id, filename, original_filename, file_type, content,
                 file_size, page_count, upload_date, metadata_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(doc.project_id)
        .bind(&doc.filename)
        .bind(&doc.original_filename)
        .bind(&doc.file_type)
        .bind(&doc.content)
        .bind(doc.file_size)
        .bind(doc.page_count)
        .bind(&now)
        .bind(&metadata_json)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE projects SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(doc.project_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            "Saved document '{}' to project {}",
            doc.original_filename, doc.project_id
        );
        Ok(result.last_insert_rowid())
    }

    /// Get document by ID
    pub async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM project_documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// List a project's documents, most recently uploaded first
    pub async fn get_project_documents(&self, project_id: i64) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM project_documents WHERE project_id = ? ORDER BY upload_date DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Delete a single document; its QA pairs cascade
    pub async fn delete_document(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ===== QA Operations =====

    /// Replace a document's QA pairs with a freshly generated set.
    ///
    /// Delete-then-insert in one transaction: pairs are derived data and
    /// never accumulate across runs.
    pub async fn save_document_qa_pairs(&self, document_id: i64, pairs: &[QaPair]) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_qa WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        for pair in pairs {
            sqlx::query(
                r#"
                INSERT INTO document_qa (document_id, question, answer, source, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(document_id)
            .bind(&pair.question)
            .bind(&pair.answer)
            .bind(&pair.source)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!("Stored {} QA pairs for document {}", pairs.len(), document_id);
        Ok(())
    }

    /// Get QA pairs for a single document
    pub async fn get_document_qa_pairs(&self, document_id: i64) -> Result<Vec<QaRecord>> {
        let pairs = sqlx::query_as::<_, QaRecord>(
            "SELECT * FROM document_qa WHERE document_id = ? ORDER BY id",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pairs)
    }

    /// Get QA pairs across a project's documents, most recent first
    pub async fn get_project_qa_pairs(&self, project_id: i64, limit: usize) -> Result<Vec<QaRecord>> {
        let pairs = sqlx::query_as::<_, QaRecord>(
            r#"
            SELECT q.id, q.document_id, q.question, q.answer, q.source, q.created_at
            FROM document_qa q
            JOIN project_documents d ON q.document_id = d.id
            WHERE d.project_id = ?
            ORDER BY q.id DESC
            LIMIT ?
            "#,
        )
        .bind(project_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(pairs)
    }

    // ===== Statistics =====

    /// Store-wide counts
    pub async fn stats(&self) -> Result<StoreStats> {
        let project_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;

        let document_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_documents")
            .fetch_one(&self.pool)
            .await?;

        let qa_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_qa")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            project_count: project_count as usize,
            document_count: document_count as usize,
            qa_count: qa_count as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (MetaDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = MetaDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    fn test_document(project_id: i64, name: &str, content: &str) -> NewDocument {
        NewDocument {
            project_id,
            filename: format!("doc-{}-{}", project_id, name),
            original_filename: name.to_string(),
            file_type: "txt".to_string(),
            content: content.to_string(),
            file_size: content.len() as i64,
            page_count: 1,
            meta: DocumentMeta {
                filename: name.to_string(),
                file_type: "txt".to_string(),
                file_size: content.len() as u64,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_project_crud() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Research", "papers and notes").await.unwrap();
        assert!(id > 0);

        let loaded = db.get_project(id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Research");
        assert_eq!(loaded.description, "papers and notes");

        let by_name = db.get_project_by_name("Research").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);

        assert!(db.delete_project(id).await.unwrap());
        assert!(db.get_project(id).await.unwrap().is_none());
        assert!(!db.delete_project(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_project_name_rejected() {
        let (db, _tmp) = setup_test_db().await;

        let first = db.create_project("Research", "").await.unwrap();
        let err = db.create_project("Research", "other").await.unwrap_err();
        assert!(matches!(err, Error::DuplicateProject(name) if name == "Research"));

        // The first project is unaffected
        let loaded = db.get_project(first).await.unwrap().unwrap();
        assert_eq!(loaded.description, "");
    }

    #[tokio::test]
    async fn test_empty_project_name_rejected() {
        let (db, _tmp) = setup_test_db().await;
        assert!(matches!(
            db.create_project("  ", "").await.unwrap_err(),
            Error::InvalidProjectName(_)
        ));
    }

    #[tokio::test]
    async fn test_doc_count_is_live() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Notes", "").await.unwrap();
        assert_eq!(db.list_projects().await.unwrap()[0].doc_count, 0);

        db.save_document(&test_document(id, "a.txt", "alpha")).await.unwrap();
        db.save_document(&test_document(id, "b.txt", "beta")).await.unwrap();
        assert_eq!(db.list_projects().await.unwrap()[0].doc_count, 2);

        let docs = db.get_project_documents(id).await.unwrap();
        db.delete_document(docs[0].id).await.unwrap();
        assert_eq!(db.list_projects().await.unwrap()[0].doc_count, 1);
    }

    #[tokio::test]
    async fn test_save_document_touches_project() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Notes", "").await.unwrap();
        let before = db.get_project(id).await.unwrap().unwrap().updated_at;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.save_document(&test_document(id, "a.txt", "alpha")).await.unwrap();

        let after = db.get_project(id).await.unwrap().unwrap().updated_at;
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Research", "").await.unwrap();
        let doc_id = db
            .save_document(&test_document(id, "a.txt", "alpha"))
            .await
            .unwrap();
        db.save_document_qa_pairs(
            doc_id,
            &[QaPair {
                question: "What is alpha?".to_string(),
                answer: "The first letter.".to_string(),
                source: "a.txt".to_string(),
            }],
        )
        .await
        .unwrap();

        db.delete_project(id).await.unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.project_count, 0);
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.qa_count, 0);
    }

    #[tokio::test]
    async fn test_qa_pairs_fully_replaced() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Research", "").await.unwrap();
        let doc_id = db
            .save_document(&test_document(id, "a.txt", "alpha"))
            .await
            .unwrap();

        let first_run: Vec<QaPair> = (0..3)
            .map(|i| QaPair {
                question: format!("Old question {}?", i),
                answer: "old".to_string(),
                source: "a.txt".to_string(),
            })
            .collect();
        db.save_document_qa_pairs(doc_id, &first_run).await.unwrap();

        let second_run = vec![QaPair {
            question: "New question?".to_string(),
            answer: "new".to_string(),
            source: "a.txt".to_string(),
        }];
        db.save_document_qa_pairs(doc_id, &second_run).await.unwrap();

        let stored = db.get_document_qa_pairs(doc_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].question, "New question?");
    }

    #[tokio::test]
    async fn test_project_qa_pairs_join() {
        let (db, _tmp) = setup_test_db().await;

        let research = db.create_project("Research", "").await.unwrap();
        let other = db.create_project("Other", "").await.unwrap();

        let doc_a = db
            .save_document(&test_document(research, "a.txt", "alpha"))
            .await
            .unwrap();
        let doc_b = db
            .save_document(&test_document(other, "b.txt", "beta"))
            .await
            .unwrap();

        let pair = |q: &str| QaPair {
            question: q.to_string(),
            answer: "answer".to_string(),
            source: "document".to_string(),
        };
        db.save_document_qa_pairs(doc_a, &[pair("About a?")]).await.unwrap();
        db.save_document_qa_pairs(doc_b, &[pair("About b?")]).await.unwrap();

        let research_pairs = db.get_project_qa_pairs(research, 10).await.unwrap();
        assert_eq!(research_pairs.len(), 1);
        assert_eq!(research_pairs[0].question, "About a?");

        let limited = db.get_project_qa_pairs(research, 0).await.unwrap();
        assert!(limited.is_empty());
    }

    #[tokio::test]
    async fn test_document_metadata_round_trip() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Research", "").await.unwrap();
        let mut doc = test_document(id, "a.pdf", "page text");
        doc.meta.page_count = Some(3);
        doc.meta
            .extra
            .insert("lang".to_string(), "en".to_string());

        let doc_id = db.save_document(&doc).await.unwrap();
        let loaded = db.get_document(doc_id).await.unwrap().unwrap();
        let meta = loaded.meta().unwrap();
        assert_eq!(meta.page_count, Some(3));
        assert_eq!(meta.extra.get("lang").map(String::as_str), Some("en"));
    }

    #[tokio::test]
    async fn test_resolve_project_by_name_or_id() {
        let (db, _tmp) = setup_test_db().await;

        let id = db.create_project("Research", "").await.unwrap();

        assert_eq!(db.resolve_project("Research").await.unwrap().id, id);
        assert_eq!(db.resolve_project(&id.to_string()).await.unwrap().id, id);
        assert!(matches!(
            db.resolve_project("missing").await.unwrap_err(),
            Error::ProjectNotFound(_)
        ));
    }
}
