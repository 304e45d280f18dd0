//! SQLite warehouse backend

use super::traits::{OpenWarehouse, Table, Warehouse, WarehouseResult};
use crate::analysis::AnalysisRecord;
use crate::video::{CommentRecord, VideoRecord};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed warehouse
///
/// One database file with `videos`, `comments` and `analyzed` tables.
/// Report sections are stored as JSON text columns so the table shape
/// stays flat. Thread-safe via internal mutex on the connection.
pub struct SqliteWarehouse {
    conn: Mutex<Connection>,
}

impl SqliteWarehouse {
    fn init_schema(conn: &Connection) -> WarehouseResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                tracking_id TEXT PRIMARY KEY,
                run_date TEXT NOT NULL,
                id TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                channel_title TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                thumbnail_url TEXT NOT NULL,
                duration TEXT NOT NULL,
                category_id TEXT NOT NULL,
                view_count INTEGER NOT NULL,
                like_count INTEGER NOT NULL,
                favorite_count INTEGER NOT NULL,
                comment_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS comments (
                tracking_id TEXT NOT NULL,
                run_date TEXT NOT NULL,
                video_id TEXT NOT NULL,
                id TEXT NOT NULL,
                parent_id TEXT,
                channel_id TEXT NOT NULL,
                text TEXT NOT NULL,
                like_count INTEGER NOT NULL,
                reply_count INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comments_tracking
                ON comments(tracking_id);
            CREATE INDEX IF NOT EXISTS idx_comments_video
                ON comments(video_id);

            CREATE TABLE IF NOT EXISTS analyzed (
                tracking_id TEXT PRIMARY KEY,
                run_date TEXT NOT NULL,
                executive_summary TEXT NOT NULL,
                performance_metrics_json TEXT NOT NULL,
                audience_analysis_json TEXT NOT NULL,
                content_feedback_json TEXT NOT NULL,
                key_themes_json TEXT NOT NULL,
                engagement_highlights_json TEXT NOT NULL,
                swot_analysis_json TEXT NOT NULL,
                actionable_recommendations_json TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> WarehouseResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of rows in `table` for `tracking_id`.
    pub fn count_rows(&self, table: Table, tracking_id: &str) -> WarehouseResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE tracking_id = ?1", table.name());
        let count: i64 = self
            .conn()
            .query_row(&sql, params![tracking_id], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl OpenWarehouse for SqliteWarehouse {
    fn open(path: impl AsRef<Path>) -> WarehouseResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> WarehouseResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl Warehouse for SqliteWarehouse {
    fn record_exists(&self, table: Table, tracking_id: &str) -> WarehouseResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE tracking_id = ?1)",
            table.name()
        );
        let exists: bool = self
            .conn()
            .query_row(&sql, params![tracking_id], |row| row.get(0))?;
        Ok(exists)
    }

    fn insert_raw(
        &self,
        video: &VideoRecord,
        comments: &[CommentRecord],
    ) -> WarehouseResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO videos (
                tracking_id, run_date, id, channel_id, channel_title, title, description,
                thumbnail_url, duration, category_id, view_count, like_count,
                favorite_count, comment_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                video.tracking_id,
                video.run_date,
                video.id,
                video.channel_id,
                video.channel_title,
                video.title,
                video.description,
                video.thumbnail_url,
                video.duration,
                video.category_id,
                video.view_count,
                video.like_count,
                video.favorite_count,
                video.comment_count,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO comments (
                    tracking_id, run_date, video_id, id, parent_id, channel_id, text,
                    like_count, reply_count
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in comments {
                let c = &row.comment;
                stmt.execute(params![
                    c.tracking_id,
                    c.run_date,
                    row.video_id,
                    c.id,
                    c.parent_id,
                    c.channel_id,
                    c.text,
                    c.like_count,
                    c.reply_count,
                ])?;
            }
        }
        tx.commit()?;
        Ok(comments.len())
    }

    fn insert_analysis(&self, record: &AnalysisRecord) -> WarehouseResult<()> {
        let performance = serde_json::to_string(&record.performance_metrics)?;
        let audience = serde_json::to_string(&record.audience_analysis)?;
        let feedback = serde_json::to_string(&record.content_feedback)?;
        let themes = serde_json::to_string(&record.key_themes)?;
        let highlights = serde_json::to_string(&record.engagement_highlights)?;
        let swot = serde_json::to_string(&record.swot_analysis)?;
        let recommendations = serde_json::to_string(&record.actionable_recommendations)?;

        self.conn().execute(
            "INSERT INTO analyzed (
                tracking_id, run_date, executive_summary, performance_metrics_json,
                audience_analysis_json, content_feedback_json, key_themes_json,
                engagement_highlights_json, swot_analysis_json, actionable_recommendations_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.tracking_id,
                record.run_date,
                record.executive_summary,
                performance,
                audience,
                feedback,
                themes,
                highlights,
                swot,
                recommendations,
            ],
        )?;
        Ok(())
    }
}
