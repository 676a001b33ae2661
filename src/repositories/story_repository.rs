// src/repositories/story_repository.rs
//
// Story persistence: the store trait the engine talks to, and its SQLite
// implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{get_connection, ConnectionPool};
use crate::domain::story::{validate_story, Language, Story, StoryPatch};
use crate::error::{AppError, AppResult};

/// Optional server-side narrowing of `StoryStore::list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    pub is_published: Option<bool>,
    pub language: Option<Language>,
}

/// The item store. Remote by nature: every call may suspend or fail, and a
/// failure's `Display` is the reason shown to editors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Stories ordered by homepage rank (unranked last), newest first
    async fn list(&self, query: &StoryQuery) -> AppResult<Vec<Story>>;
    async fn count_episodes(&self, story_id: Uuid) -> AppResult<u32>;
    async fn insert(&self, story: &Story) -> AppResult<()>;
    /// Apply a partial update. Unknown id -> `AppError::NotFound`.
    async fn update(&self, id: Uuid, patch: &StoryPatch) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

const STORY_COLUMNS: &str = "id, title, language, is_published, is_banner, is_new_launch,
    homepage_rank, new_launch_rank, banner_image_url, tile_image_url,
    description, cover_image_url, created_at";

pub struct SqliteStoryStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteStoryStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Run blocking rusqlite work off the async runtime
    async fn with_connection<T, F>(&self, work: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let conn = get_connection(&pool)?;
            work(&conn)
        })
        .await?
    }

    /// Map database row to Story - returns rusqlite::Error for query_map compatibility.
    /// `episode_count` is filled in by the caller.
    fn row_to_story(row: &Row) -> Result<Story, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

        let language_tag: String = row.get("language")?;
        let language = language_tag
            .parse::<Language>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let created_at_str: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

        Ok(Story {
            id,
            title: row.get("title")?,
            language,
            is_published: row.get("is_published")?,
            is_banner: row.get("is_banner")?,
            is_new_launch: row.get("is_new_launch")?,
            homepage_rank: row.get("homepage_rank")?,
            new_launch_rank: row.get("new_launch_rank")?,
            banner_image_url: row.get("banner_image_url")?,
            tile_image_url: row.get("tile_image_url")?,
            description: row.get("description")?,
            cover_image_url: row.get("cover_image_url")?,
            episode_count: 0,
            created_at,
        })
    }

    fn fetch(conn: &Connection, id: Uuid) -> AppResult<Option<Story>> {
        let sql = format!("SELECT {} FROM stories WHERE id = ?1", STORY_COLUMNS);
        let story = conn
            .query_row(&sql, params![id.to_string()], Self::row_to_story)
            .optional()?;
        Ok(story)
    }
}

#[async_trait]
impl StoryStore for SqliteStoryStore {
    async fn list(&self, query: &StoryQuery) -> AppResult<Vec<Story>> {
        let query = query.clone();
        self.with_connection(move |conn| {
            let sql = format!(
                "SELECT {} FROM stories
                 WHERE (?1 IS NULL OR is_published = ?1)
                   AND (?2 IS NULL OR language = ?2)
                 ORDER BY homepage_rank IS NULL, homepage_rank ASC, created_at DESC",
                STORY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;

            let stories = stmt
                .query_map(
                    params![query.is_published, query.language.map(|l| l.tag())],
                    Self::row_to_story,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(stories)
        })
        .await
    }

    async fn count_episodes(&self, story_id: Uuid) -> AppResult<u32> {
        self.with_connection(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM episodes WHERE story_id = ?1",
                params![story_id.to_string()],
                |row| row.get(0),
            )?;
            u32::try_from(count).map_err(|_| AppError::Other(format!("Episode count out of range: {}", count)))
        })
        .await
    }

    async fn insert(&self, story: &Story) -> AppResult<()> {
        validate_story(story)?;

        let story = story.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO stories (
                    id, title, language, is_published, is_banner, is_new_launch,
                    homepage_rank, new_launch_rank, banner_image_url, tile_image_url,
                    description, cover_image_url, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    story.id.to_string(),
                    story.title,
                    story.language.tag(),
                    story.is_published,
                    story.is_banner,
                    story.is_new_launch,
                    story.homepage_rank,
                    story.new_launch_rank,
                    story.banner_image_url,
                    story.tile_image_url,
                    story.description,
                    story.cover_image_url,
                    story.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, id: Uuid, patch: &StoryPatch) -> AppResult<()> {
        let patch = patch.clone();
        self.with_connection(move |conn| {
            let tx = conn.unchecked_transaction()?;

            let mut story = Self::fetch(&tx, id)?.ok_or(AppError::NotFound)?;
            story.apply_patch(&patch);

            tx.execute(
                "UPDATE stories SET
                    is_published = ?2, is_banner = ?3, is_new_launch = ?4,
                    homepage_rank = ?5, new_launch_rank = ?6,
                    banner_image_url = ?7, tile_image_url = ?8
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    story.is_published,
                    story.is_banner,
                    story.is_new_launch,
                    story.homepage_rank,
                    story.new_launch_rank,
                    story.banner_image_url,
                    story.tile_image_url,
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.with_connection(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM stories WHERE id = ?1", params![id.to_string()])?;

            if rows_affected == 0 {
                return Err(AppError::NotFound);
            }
            Ok(())
        })
        .await
    }
}
