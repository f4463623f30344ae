//! Embedded libSQL storage layer.
//!
//! The [`Storage`] struct wraps a libSQL database holding users, projects,
//! sections, the refinement audit log, and section feedback.
//!
//! **Ownership:** every project-scoped method takes the acting user's id and
//! joins back to `projects.user_id`. Rows outside that chain behave exactly
//! like rows that do not exist ([`DraftDeckError::NotFound`]).
//!
//! **Concurrency:** the handle is shared across request tasks. Each public
//! method holds the connection lock for its whole body, so a transaction
//! never interleaves with statements from another task and overlapping
//! writes to one section resolve by last write.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use draftdeck_shared::{
    DocumentKind, DraftDeckError, Feedback, Project, ProjectStatus, ProjectWithSections,
    RefinementEntry, Result, Section, User, new_id,
};
use libsql::{Connection, Database, Transaction, params};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

const PROJECT_COLUMNS: &str =
    "p.id, p.user_id, p.document_type, p.topic, p.status, p.created_at, p.updated_at";

const SECTION_COLUMNS: &str = "s.id, s.project_id, s.position, s.title, s.content, \
     s.is_generated, s.created_at, s.updated_at";

const HISTORY_COLUMNS: &str =
    "h.id, h.section_id, h.prompt, h.previous_content, h.new_content, h.created_at";

const FEEDBACK_COLUMNS: &str =
    "f.id, f.section_id, f.liked, f.comment, f.created_at, f.updated_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    // Owns the database the connection was opened from.
    _db: Database,
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DraftDeckError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        // Cascades from projects to sections, history and feedback rely on this.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .await
            .map_err(db_err)?;

        let storage = Self {
            _db: db,
            conn: Mutex::new(conn),
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;
        let conn = self.conn.lock().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                conn.execute_batch(migration.sql).await.map_err(|e| {
                    DraftDeckError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let conn = self.conn.lock().await;
        let result = conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Create a user and return it with its freshly minted API token.
    ///
    /// Only the token's SHA-256 digest is stored; the plain token cannot be
    /// recovered later.
    pub async fn create_user(&self, email: &str) -> Result<(User, String)> {
        let id = new_id();
        let token = format!("dd_{}", Uuid::new_v4().simple());
        let now = Utc::now();
        self.conn
            .lock()
            .await
            .execute(
                "INSERT INTO users (id, email, token_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), email, token_hash(&token), now.to_rfc3339()],
            )
            .await
            .map_err(db_err)?;

        tracing::info!(user_id = %id, email, "created user");
        let user = User {
            id,
            email: email.to_string(),
            created_at: now,
        };
        Ok((user, token))
    }

    /// Resolve a bearer token to its user.
    pub async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, email, created_at FROM users WHERE token_hash = ?1",
                params![token_hash(token)],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Look a user up by email.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, email, created_at FROM users WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create a project and its sections in one transaction.
    ///
    /// Section positions are the titles' indices, `0..n-1`.
    pub async fn create_project(
        &self,
        user_id: &str,
        kind: DocumentKind,
        topic: &str,
        titles: &[String],
    ) -> Result<ProjectWithSections> {
        let now = Utc::now();
        let project = Project {
            id: new_id(),
            user_id: user_id.to_string(),
            document_kind: kind,
            topic: topic.to_string(),
            status: ProjectStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        let sections: Vec<Section> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| Section {
                id: new_id(),
                project_id: project.id.clone(),
                position: i as i64,
                title: title.clone(),
                content: None,
                is_generated: false,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(db_err)?;
        let outcome = insert_project_rows(&tx, &project, &sections).await;
        finish(tx, outcome).await?;

        tracing::info!(
            project_id = %project.id,
            kind = %kind,
            sections = sections.len(),
            "created project"
        );
        Ok(ProjectWithSections { project, sections })
    }

    /// Get a project owned by `user_id`.
    pub async fn get_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let conn = self.conn.lock().await;
        fetch_project(&conn, user_id, project_id).await
    }

    /// Get a project together with its sections in position order.
    pub async fn get_project_with_sections(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<ProjectWithSections> {
        let conn = self.conn.lock().await;
        let project = fetch_project(&conn, user_id, project_id).await?;
        let sections = fetch_sections(&conn, user_id, project_id).await?;
        Ok(ProjectWithSections { project, sections })
    }

    /// List a user's projects, newest first.
    pub async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.user_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC"
        );
        let conn = self.conn.lock().await;
        let mut rows = conn.query(&sql, params![user_id]).await.map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_project(&row)?);
        }
        Ok(results)
    }

    /// Delete a project; its sections, history and feedback cascade.
    pub async fn delete_project(&self, user_id: &str, project_id: &str) -> Result<()> {
        let affected = self
            .conn
            .lock()
            .await
            .execute(
                "DELETE FROM projects WHERE id = ?1 AND user_id = ?2",
                params![project_id, user_id],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("project", project_id));
        }
        tracing::info!(project_id, "deleted project");
        Ok(())
    }

    /// Overwrite a project's status. No transition check happens here.
    pub async fn set_project_status(
        &self,
        user_id: &str,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<()> {
        let affected = self
            .conn
            .lock()
            .await
            .execute(
                "UPDATE projects SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
                params![status.as_str(), Utc::now().to_rfc3339(), project_id, user_id],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("project", project_id));
        }
        tracing::debug!(project_id, %status, "project status set");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    /// List a project's sections in position order.
    pub async fn list_sections(&self, user_id: &str, project_id: &str) -> Result<Vec<Section>> {
        let conn = self.conn.lock().await;
        fetch_sections(&conn, user_id, project_id).await
    }

    /// Get a section reachable from `user_id`.
    pub async fn get_section(&self, user_id: &str, section_id: &str) -> Result<Section> {
        let conn = self.conn.lock().await;
        fetch_section(&conn, user_id, section_id).await
    }

    /// Append a section after the current highest position.
    ///
    /// Positions freed by deletions are not reused.
    pub async fn add_section(
        &self,
        user_id: &str,
        project_id: &str,
        title: &str,
    ) -> Result<Section> {
        let id = new_id();
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        let affected = conn
            .execute(
                "INSERT INTO sections (id, project_id, position, title, content, is_generated, created_at, updated_at)
                 SELECT ?1, p.id,
                        COALESCE((SELECT MAX(position) + 1 FROM sections WHERE project_id = p.id), 0),
                        ?2, NULL, 0, ?3, ?3
                 FROM projects p WHERE p.id = ?4 AND p.user_id = ?5",
                params![id.as_str(), title, now.as_str(), project_id, user_id],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("project", project_id));
        }
        fetch_section(&conn, user_id, &id).await
    }

    /// Edit a section's title and/or content. `None` leaves a field as is.
    pub async fn update_section(
        &self,
        user_id: &str,
        section_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Section> {
        let conn = self.conn.lock().await;
        let affected = conn
            .execute(
                "UPDATE sections SET
                   title = COALESCE(?1, title),
                   content = COALESCE(?2, content),
                   updated_at = ?3
                 WHERE id = ?4
                   AND project_id IN (SELECT id FROM projects WHERE user_id = ?5)",
                params![title, content, Utc::now().to_rfc3339(), section_id, user_id],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("section", section_id));
        }
        fetch_section(&conn, user_id, section_id).await
    }

    /// Delete a section. Remaining positions are left untouched.
    pub async fn delete_section(&self, user_id: &str, section_id: &str) -> Result<()> {
        let affected = self
            .conn
            .lock()
            .await
            .execute(
                "DELETE FROM sections
                 WHERE id = ?1 AND project_id IN (SELECT id FROM projects WHERE user_id = ?2)",
                params![section_id, user_id],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("section", section_id));
        }
        Ok(())
    }

    /// Persist generated content for a batch of sections and mark the project
    /// completed, all in one transaction.
    ///
    /// Every `(section_id, content)` pair must belong to `project_id`;
    /// otherwise nothing is written.
    pub async fn store_generated_content(
        &self,
        user_id: &str,
        project_id: &str,
        contents: &[(String, String)],
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(db_err)?;
        let outcome = write_generated_content(&tx, user_id, project_id, contents).await;
        finish(tx, outcome).await
    }

    // -----------------------------------------------------------------------
    // Refinement history
    // -----------------------------------------------------------------------

    /// Record a refinement: append one history row and overwrite the section's
    /// content, atomically. Last write wins.
    pub async fn apply_refinement(
        &self,
        user_id: &str,
        section_id: &str,
        prompt: &str,
        previous_content: Option<&str>,
        new_content: &str,
    ) -> Result<RefinementEntry> {
        let conn = self.conn.lock().await;
        // Resolves ownership before anything is written.
        fetch_section(&conn, user_id, section_id).await?;

        let entry = RefinementEntry {
            id: new_id(),
            section_id: section_id.to_string(),
            prompt: prompt.to_string(),
            previous_content: previous_content.map(String::from),
            new_content: new_content.to_string(),
            created_at: Utc::now(),
        };

        let tx = conn.transaction().await.map_err(db_err)?;
        let outcome = write_refinement(&tx, &entry).await;
        finish(tx, outcome).await?;
        Ok(entry)
    }

    /// A section's refinement history in call order.
    pub async fn list_refinements(
        &self,
        user_id: &str,
        section_id: &str,
    ) -> Result<Vec<RefinementEntry>> {
        let conn = self.conn.lock().await;
        fetch_section(&conn, user_id, section_id).await?;

        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM refinement_history h
             WHERE h.section_id = ?1 ORDER BY h.rowid"
        );
        let mut rows = conn.query(&sql, params![section_id]).await.map_err(db_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            results.push(row_to_refinement(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// Upsert the like/dislike on a section. An existing comment is kept.
    pub async fn set_feedback_rating(
        &self,
        user_id: &str,
        section_id: &str,
        liked: Option<bool>,
    ) -> Result<Feedback> {
        let conn = self.conn.lock().await;
        fetch_section(&conn, user_id, section_id).await?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO feedback (id, section_id, liked, comment, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?4)
             ON CONFLICT(section_id) DO UPDATE SET
               liked = excluded.liked,
               updated_at = excluded.updated_at",
            params![new_id(), section_id, liked.map(i64::from), now.as_str()],
        )
        .await
        .map_err(db_err)?;
        require_feedback(&conn, section_id).await
    }

    /// Upsert the comment on a section. An existing rating is kept.
    pub async fn set_feedback_comment(
        &self,
        user_id: &str,
        section_id: &str,
        comment: Option<&str>,
    ) -> Result<Feedback> {
        let conn = self.conn.lock().await;
        fetch_section(&conn, user_id, section_id).await?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO feedback (id, section_id, liked, comment, created_at, updated_at)
             VALUES (?1, ?2, NULL, ?3, ?4, ?4)
             ON CONFLICT(section_id) DO UPDATE SET
               comment = excluded.comment,
               updated_at = excluded.updated_at",
            params![new_id(), section_id, comment, now.as_str()],
        )
        .await
        .map_err(db_err)?;
        require_feedback(&conn, section_id).await
    }

    /// Feedback left on a section, if any.
    pub async fn get_feedback(&self, user_id: &str, section_id: &str) -> Result<Option<Feedback>> {
        let conn = self.conn.lock().await;
        fetch_section(&conn, user_id, section_id).await?;
        find_feedback(&conn, section_id).await
    }
}

// ---------------------------------------------------------------------------
// Lookups shared by the locked methods
// ---------------------------------------------------------------------------

async fn fetch_project(conn: &Connection, user_id: &str, project_id: &str) -> Result<Project> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1 AND p.user_id = ?2");
    let mut rows = conn
        .query(&sql, params![project_id, user_id])
        .await
        .map_err(db_err)?;

    match rows.next().await.map_err(db_err)? {
        Some(row) => row_to_project(&row),
        None => Err(DraftDeckError::not_found("project", project_id)),
    }
}

async fn fetch_sections(conn: &Connection, user_id: &str, project_id: &str) -> Result<Vec<Section>> {
    let sql = format!(
        "SELECT {SECTION_COLUMNS} FROM sections s
         JOIN projects p ON p.id = s.project_id
         WHERE s.project_id = ?1 AND p.user_id = ?2
         ORDER BY s.position"
    );
    let mut rows = conn
        .query(&sql, params![project_id, user_id])
        .await
        .map_err(db_err)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(db_err)? {
        results.push(row_to_section(&row)?);
    }
    Ok(results)
}

async fn fetch_section(conn: &Connection, user_id: &str, section_id: &str) -> Result<Section> {
    let sql = format!(
        "SELECT {SECTION_COLUMNS} FROM sections s
         JOIN projects p ON p.id = s.project_id
         WHERE s.id = ?1 AND p.user_id = ?2"
    );
    let mut rows = conn
        .query(&sql, params![section_id, user_id])
        .await
        .map_err(db_err)?;

    match rows.next().await.map_err(db_err)? {
        Some(row) => row_to_section(&row),
        None => Err(DraftDeckError::not_found("section", section_id)),
    }
}

async fn find_feedback(conn: &Connection, section_id: &str) -> Result<Option<Feedback>> {
    let sql = format!("SELECT {FEEDBACK_COLUMNS} FROM feedback f WHERE f.section_id = ?1");
    let mut rows = conn.query(&sql, params![section_id]).await.map_err(db_err)?;

    match rows.next().await.map_err(db_err)? {
        Some(row) => Ok(Some(row_to_feedback(&row)?)),
        None => Ok(None),
    }
}

async fn require_feedback(conn: &Connection, section_id: &str) -> Result<Feedback> {
    find_feedback(conn, section_id)
        .await?
        .ok_or_else(|| DraftDeckError::not_found("feedback", section_id))
}

// ---------------------------------------------------------------------------
// Transaction bodies
// ---------------------------------------------------------------------------

/// Commit on success, roll back on failure. The body's error wins.
async fn finish(tx: Transaction, outcome: Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => tx.commit().await.map_err(db_err),
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

async fn insert_project_rows(
    conn: &Connection,
    project: &Project,
    sections: &[Section],
) -> Result<()> {
    conn.execute(
        "INSERT INTO projects (id, user_id, document_type, topic, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            project.id.as_str(),
            project.user_id.as_str(),
            project.document_kind.as_str(),
            project.topic.as_str(),
            project.status.as_str(),
            project.created_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(db_err)?;

    for section in sections {
        conn.execute(
            "INSERT INTO sections (id, project_id, position, title, content, is_generated, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5, ?5)",
            params![
                section.id.as_str(),
                section.project_id.as_str(),
                section.position,
                section.title.as_str(),
                section.created_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn write_generated_content(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
    contents: &[(String, String)],
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    for (section_id, content) in contents {
        let affected = conn
            .execute(
                "UPDATE sections SET content = ?1, is_generated = 1, updated_at = ?2
                 WHERE id = ?3 AND project_id = ?4
                   AND project_id IN (SELECT id FROM projects WHERE user_id = ?5)",
                params![
                    content.as_str(),
                    now.as_str(),
                    section_id.as_str(),
                    project_id,
                    user_id
                ],
            )
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(DraftDeckError::not_found("section", section_id.as_str()));
        }
    }

    let affected = conn
        .execute(
            "UPDATE projects SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![ProjectStatus::Completed.as_str(), now.as_str(), project_id, user_id],
        )
        .await
        .map_err(db_err)?;
    if affected == 0 {
        return Err(DraftDeckError::not_found("project", project_id));
    }
    Ok(())
}

async fn write_refinement(conn: &Connection, entry: &RefinementEntry) -> Result<()> {
    let created_at = entry.created_at.to_rfc3339();
    conn.execute(
        "INSERT INTO refinement_history (id, section_id, prompt, previous_content, new_content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id.as_str(),
            entry.section_id.as_str(),
            entry.prompt.as_str(),
            entry.previous_content.as_deref(),
            entry.new_content.as_str(),
            created_at.as_str(),
        ],
    )
    .await
    .map_err(db_err)?;

    conn.execute(
        "UPDATE sections SET content = ?1, is_generated = 1, updated_at = ?2 WHERE id = ?3",
        params![entry.new_content.as_str(), created_at.as_str(), entry.section_id.as_str()],
    )
    .await
    .map_err(db_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn db_err(e: libsql::Error) -> DraftDeckError {
    DraftDeckError::Storage(e.to_string())
}

fn token_hash(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DraftDeckError::Storage(format!("invalid date '{s}': {e}")))
}

fn row_to_user(row: &libsql::Row) -> Result<User> {
    Ok(User {
        id: row.get::<String>(0).map_err(db_err)?,
        email: row.get::<String>(1).map_err(db_err)?,
        created_at: parse_timestamp(&row.get::<String>(2).map_err(db_err)?)?,
    })
}

fn row_to_project(row: &libsql::Row) -> Result<Project> {
    Ok(Project {
        id: row.get::<String>(0).map_err(db_err)?,
        user_id: row.get::<String>(1).map_err(db_err)?,
        document_kind: row.get::<String>(2).map_err(db_err)?.parse()?,
        topic: row.get::<String>(3).map_err(db_err)?,
        status: row.get::<String>(4).map_err(db_err)?.parse()?,
        created_at: parse_timestamp(&row.get::<String>(5).map_err(db_err)?)?,
        updated_at: parse_timestamp(&row.get::<String>(6).map_err(db_err)?)?,
    })
}

fn row_to_section(row: &libsql::Row) -> Result<Section> {
    Ok(Section {
        id: row.get::<String>(0).map_err(db_err)?,
        project_id: row.get::<String>(1).map_err(db_err)?,
        position: row.get::<i64>(2).map_err(db_err)?,
        title: row.get::<String>(3).map_err(db_err)?,
        content: row.get::<Option<String>>(4).map_err(db_err)?,
        is_generated: row.get::<i64>(5).map_err(db_err)? != 0,
        created_at: parse_timestamp(&row.get::<String>(6).map_err(db_err)?)?,
        updated_at: parse_timestamp(&row.get::<String>(7).map_err(db_err)?)?,
    })
}

fn row_to_refinement(row: &libsql::Row) -> Result<RefinementEntry> {
    Ok(RefinementEntry {
        id: row.get::<String>(0).map_err(db_err)?,
        section_id: row.get::<String>(1).map_err(db_err)?,
        prompt: row.get::<String>(2).map_err(db_err)?,
        previous_content: row.get::<Option<String>>(3).map_err(db_err)?,
        new_content: row.get::<String>(4).map_err(db_err)?,
        created_at: parse_timestamp(&row.get::<String>(5).map_err(db_err)?)?,
    })
}

fn row_to_feedback(row: &libsql::Row) -> Result<Feedback> {
    Ok(Feedback {
        id: row.get::<String>(0).map_err(db_err)?,
        section_id: row.get::<String>(1).map_err(db_err)?,
        liked: row.get::<Option<i64>>(2).map_err(db_err)?.map(|v| v != 0),
        comment: row.get::<Option<String>>(3).map_err(db_err)?,
        created_at: parse_timestamp(&row.get::<String>(4).map_err(db_err)?)?,
        updated_at: parse_timestamp(&row.get::<String>(5).map_err(db_err)?)?,
    })
}
