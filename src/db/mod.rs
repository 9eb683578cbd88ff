mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ContentError;
use crate::models::*;

const TOPIC_COLUMNS: &str = "id, slug, title, sort_order, summary, theory, reference_list, practice, animations, created_at, updated_at";
const RESOURCE_COLUMNS: &str = "id, title, url, kind, description, tags, created_at, updated_at";
const PAGE_COLUMNS: &str = "id, slug, title, content, created_at, updated_at";

/// SQLite-backed content store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "fsd")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("content.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Topic operations
    // ============================================================

    /// All topics in curriculum order.
    pub fn get_all_topics(&self) -> Result<Vec<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM topics ORDER BY sort_order, title",
            TOPIC_COLUMNS
        ))?;

        let topics = stmt
            .query_map([], row_to_topic)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(topics)
    }

    pub fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_topic(&conn, slug)
    }

    pub fn create_topic(&self, input: CreateTopicInput) -> Result<Topic> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_topic(&conn, input)
    }

    pub fn update_topic(&self, slug: &str, input: UpdateTopicInput) -> Result<Option<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = find_topic(&conn, slug)? else {
            return Ok(None);
        };
        write_topic_update(&conn, existing, input).map(Some)
    }

    /// Create the topic, or update the one with the same slug.
    pub fn upsert_topic(&self, input: CreateTopicInput) -> Result<Topic> {
        let conn = self.conn.lock().expect("database lock poisoned");
        upsert_topic(&conn, input)
    }

    pub fn delete_topic(&self, slug: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM topics WHERE slug = ?", [slug])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Resource operations
    // ============================================================

    pub fn get_all_resources(&self) -> Result<Vec<Resource>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources ORDER BY title",
            RESOURCE_COLUMNS
        ))?;

        let resources = stmt
            .query_map([], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(resources)
    }

    pub fn get_resources_by_tag(&self, tag: &str) -> Result<Vec<Resource>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources
             WHERE EXISTS (SELECT 1 FROM json_each(resources.tags) WHERE json_each.value = ?)
             ORDER BY title",
            RESOURCE_COLUMNS
        ))?;

        let resources = stmt
            .query_map([tag], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(resources)
    }

    pub fn create_resource(&self, input: CreateResourceInput) -> Result<Resource> {
        let conn = self.conn.lock().expect("database lock poisoned");
        upsert_resource(&conn, input)
    }

    // ============================================================
    // Page operations
    // ============================================================

    pub fn get_all_pages(&self) -> Result<Vec<Page>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages ORDER BY title",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map([], row_to_page)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    pub fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_page(&conn, slug)
    }

    pub fn create_page(&self, input: CreatePageInput) -> Result<Page> {
        let conn = self.conn.lock().expect("database lock poisoned");
        validate_slug_and_title(&input.slug, &input.title)?;
        if find_page(&conn, &input.slug)?.is_some() {
            return Err(ContentError::DuplicateSlug(input.slug).into());
        }
        insert_page(&conn, input)
    }

    // ============================================================
    // Import
    // ============================================================

    /// Write a whole content bundle in one transaction.
    ///
    /// Topics and pages are matched by slug, resources by URL, so importing
    /// the same bundle twice leaves the store unchanged.
    pub fn import_bundle(&self, bundle: ContentBundle) -> Result<ImportSummary> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();

        for topic in bundle.topics {
            upsert_topic(&tx, topic)?;
            summary.topics += 1;
        }
        for resource in bundle.resources {
            upsert_resource(&tx, resource)?;
            summary.resources += 1;
        }
        for page in bundle.pages {
            match find_page(&tx, &page.slug)? {
                Some(existing) => {
                    update_page(&tx, existing, page)?;
                }
                None => {
                    validate_slug_and_title(&page.slug, &page.title)?;
                    insert_page(&tx, page)?;
                }
            }
            summary.pages += 1;
        }

        tx.commit()?;
        tracing::info!(
            "Imported {} topics, {} resources, {} pages",
            summary.topics,
            summary.resources,
            summary.pages
        );
        Ok(summary)
    }
}

// ============================================================
// Row-level helpers (shared by single calls and the import transaction)
// ============================================================

fn validate_slug_and_title(slug: &str, title: &str) -> Result<()> {
    if !is_valid_slug(slug) {
        return Err(ContentError::InvalidSlug(slug.to_string()).into());
    }
    if title.trim().is_empty() {
        return Err(ContentError::EmptyTitle.into());
    }
    Ok(())
}

fn find_topic(conn: &Connection, slug: &str) -> Result<Option<Topic>> {
    let topic = conn
        .query_row(
            &format!("SELECT {} FROM topics WHERE slug = ?", TOPIC_COLUMNS),
            [slug],
            row_to_topic,
        )
        .optional()?;
    Ok(topic)
}

fn insert_topic(conn: &Connection, input: CreateTopicInput) -> Result<Topic> {
    validate_slug_and_title(&input.slug, &input.title)?;
    if find_topic(conn, &input.slug)?.is_some() {
        return Err(ContentError::DuplicateSlug(input.slug).into());
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let order = input.order.unwrap_or(0);

    conn.execute(
        "INSERT INTO topics (id, slug, title, sort_order, summary, theory, reference_list, practice, animations, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            &input.slug,
            &input.title,
            order,
            &input.summary,
            input.theory.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&input.references)?,
            input.practice.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&input.animations)?,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Topic {
        id,
        slug: input.slug,
        title: input.title,
        order,
        summary: input.summary,
        theory: input.theory,
        references: input.references,
        practice: input.practice,
        animations: input.animations,
        created_at: now,
        updated_at: now,
    })
}

fn write_topic_update(conn: &Connection, existing: Topic, input: UpdateTopicInput) -> Result<Topic> {
    let title = input.title.unwrap_or(existing.title);
    if title.trim().is_empty() {
        return Err(ContentError::EmptyTitle.into());
    }

    let now = Utc::now();
    let order = input.order.unwrap_or(existing.order);
    let summary = input.summary.or(existing.summary);
    let theory = input.theory.or(existing.theory);
    let references = input.references.unwrap_or(existing.references);
    let practice = input.practice.or(existing.practice);
    let animations = input.animations.unwrap_or(existing.animations);

    conn.execute(
        "UPDATE topics SET title = ?, sort_order = ?, summary = ?, theory = ?, reference_list = ?, practice = ?, animations = ?, updated_at = ?
         WHERE id = ?",
        (
            &title,
            order,
            &summary,
            theory.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&references)?,
            practice.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&animations)?,
            now.to_rfc3339(),
            existing.id.to_string(),
        ),
    )?;

    Ok(Topic {
        id: existing.id,
        slug: existing.slug,
        title,
        order,
        summary,
        theory,
        references,
        practice,
        animations,
        created_at: existing.created_at,
        updated_at: now,
    })
}

fn upsert_topic(conn: &Connection, input: CreateTopicInput) -> Result<Topic> {
    match find_topic(conn, &input.slug)? {
        Some(existing) => write_topic_update(conn, existing, input.into()),
        None => insert_topic(conn, input),
    }
}

fn upsert_resource(conn: &Connection, input: CreateResourceInput) -> Result<Resource> {
    if input.title.trim().is_empty() {
        return Err(ContentError::EmptyTitle.into());
    }
    if input.url.trim().is_empty() {
        return Err(ContentError::EmptyUrl.into());
    }

    let existing = conn
        .query_row(
            &format!("SELECT {} FROM resources WHERE url = ?", RESOURCE_COLUMNS),
            [&input.url],
            row_to_resource,
        )
        .optional()?;

    let now = Utc::now();
    let tags = serde_json::to_string(&input.tags)?;

    let (id, created_at) = match existing {
        Some(existing) => {
            conn.execute(
                "UPDATE resources SET title = ?, kind = ?, description = ?, tags = ?, updated_at = ? WHERE id = ?",
                (
                    &input.title,
                    input.kind.as_str(),
                    &input.description,
                    &tags,
                    now.to_rfc3339(),
                    existing.id.to_string(),
                ),
            )?;
            (existing.id, existing.created_at)
        }
        None => {
            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO resources (id, title, url, kind, description, tags, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    id.to_string(),
                    &input.title,
                    &input.url,
                    input.kind.as_str(),
                    &input.description,
                    &tags,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ),
            )?;
            (id, now)
        }
    };

    Ok(Resource {
        id,
        title: input.title,
        url: input.url,
        kind: input.kind,
        description: input.description,
        tags: input.tags,
        created_at,
        updated_at: now,
    })
}

fn find_page(conn: &Connection, slug: &str) -> Result<Option<Page>> {
    let page = conn
        .query_row(
            &format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS),
            [slug],
            row_to_page,
        )
        .optional()?;
    Ok(page)
}

fn insert_page(conn: &Connection, input: CreatePageInput) -> Result<Page> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO pages (id, slug, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            &input.slug,
            &input.title,
            input.content.as_ref().map(serde_json::to_string).transpose()?,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Page {
        id,
        slug: input.slug,
        title: input.title,
        content: input.content,
        created_at: now,
        updated_at: now,
    })
}

fn update_page(conn: &Connection, existing: Page, input: CreatePageInput) -> Result<Page> {
    if input.title.trim().is_empty() {
        return Err(ContentError::EmptyTitle.into());
    }
    let now = Utc::now();
    let content = input.content.or(existing.content);

    conn.execute(
        "UPDATE pages SET title = ?, content = ?, updated_at = ? WHERE id = ?",
        (
            &input.title,
            content.as_ref().map(serde_json::to_string).transpose()?,
            now.to_rfc3339(),
            existing.id.to_string(),
        ),
    )?;

    Ok(Page {
        id: existing.id,
        slug: existing.slug,
        title: input.title,
        content,
        created_at: existing.created_at,
        updated_at: now,
    })
}

// ============================================================
// Row mapping
// ============================================================

fn row_to_topic(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: parse_uuid(row.get::<_, String>(0)?),
        slug: row.get(1)?,
        title: row.get(2)?,
        order: row.get(3)?,
        summary: row.get(4)?,
        theory: optional_json_column(row, 5)?,
        references: json_column(row, 6)?,
        practice: optional_json_column(row, 7)?,
        animations: json_column(row, 8)?,
        created_at: parse_datetime(row.get::<_, String>(9)?),
        updated_at: parse_datetime(row.get::<_, String>(10)?),
    })
}

fn row_to_resource(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        url: row.get(2)?,
        kind: ResourceKind::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        description: row.get(4)?,
        tags: json_column(row, 5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn row_to_page(row: &Row) -> rusqlite::Result<Page> {
    Ok(Page {
        id: parse_uuid(row.get::<_, String>(0)?),
        slug: row.get(1)?,
        title: row.get(2)?,
        content: optional_json_column(row, 3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn optional_json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_default()
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
