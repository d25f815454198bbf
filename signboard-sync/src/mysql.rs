//! MySQL-backed [`NoticeSource`] over the `jellynews` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::{Connection, FromRow};

use signboard_core::{NoticeRecord, RemoteConfig};

use crate::source::{NoticeSession, NoticeSource};
use crate::SyncError;

const COUNT_QUERY: &str = "SELECT COUNT(*) FROM jellynews";
const FETCH_QUERY: &str =
    "SELECT created_at, type, name, content FROM jellynews ORDER BY created_at DESC LIMIT ?";

/// Opens one plain (non-TLS) connection per refresh cycle.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    options: MySqlConnectOptions,
    label: String,
}

impl MySqlSource {
    pub fn new(remote: &RemoteConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&remote.host)
            .port(remote.port)
            .username(&remote.user)
            .password(&remote.password)
            .database(&remote.database)
            .ssl_mode(MySqlSslMode::Disabled);
        Self {
            options,
            label: format!("{}:{}/{}", remote.host, remote.port, remote.database),
        }
    }
}

#[async_trait]
impl NoticeSource for MySqlSource {
    async fn connect(&self) -> Result<Box<dyn NoticeSession>, SyncError> {
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(connect_error)?;
        Ok(Box::new(MySqlSession { conn }))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl NoticeSession for MySqlSession {
    async fn count_notices(&mut self) -> Result<u64, SyncError> {
        let total: i64 = sqlx::query_scalar(COUNT_QUERY)
            .fetch_one(&mut self.conn)
            .await
            .map_err(query_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn fetch_latest(&mut self, limit: u32) -> Result<Vec<NoticeRecord>, SyncError> {
        let rows: Vec<NoticeRow> = sqlx::query_as(FETCH_QUERY)
            .bind(limit)
            .fetch_all(&mut self.conn)
            .await
            .map_err(query_error)?;
        Ok(rows.into_iter().map(NoticeRecord::from).collect())
    }

    async fn close(self: Box<Self>) -> Result<(), SyncError> {
        self.conn.close().await.map_err(query_error)
    }
}

#[derive(Debug, FromRow)]
struct NoticeRow {
    created_at: DateTime<Utc>,
    #[sqlx(rename = "type")]
    category: Option<String>,
    name: Option<String>,
    content: Option<String>,
}

impl From<NoticeRow> for NoticeRecord {
    fn from(row: NoticeRow) -> Self {
        NoticeRecord {
            created_at: row.created_at,
            category: row.category.unwrap_or_default(),
            author: row.name.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
        }
    }
}

fn connect_error(err: sqlx::Error) -> SyncError {
    match err {
        sqlx::Error::Configuration(source) => SyncError::DriverUnavailable(source.to_string()),
        other => SyncError::RemoteUnavailable(other.to_string()),
    }
}

fn query_error(err: sqlx::Error) -> SyncError {
    SyncError::RemoteQueryFailed(err.to_string())
}
