// ==========================================
// 批量导入管道 - 业务记录 Repository 实现
// ==========================================
// 职责: 实现 RecordRepository（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 所有 SQL 均为参数化语句
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::record::{fold_natural_key, BusinessRecord, NormalizedRecord, UpsertAction};
use crate::domain::types::ImportKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_repo::RecordRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    SELECT record_id, owner_id, kind, natural_key, fields_json, created_at, updated_at
    FROM business_record
"#;

/// 数据库原始行（JSON/时间未解析）
struct RecordRow {
    record_id: String,
    owner_id: String,
    kind: String,
    natural_key: String,
    fields_json: String,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            owner_id: row.get(1)?,
            kind: row.get(2)?,
            natural_key: row.get(3)?,
            fields_json: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_record(self) -> RepositoryResult<BusinessRecord> {
        let kind = self
            .kind
            .parse::<ImportKind>()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "kind".to_string(),
                message,
            })?;
        let fields: NormalizedRecord = serde_json::from_str(&self.fields_json)?;

        Ok(BusinessRecord {
            record_id: self.record_id,
            owner_id: self.owner_id,
            kind,
            natural_key: self.natural_key,
            fields,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ==========================================
// SqliteRecordRepository
// ==========================================
pub struct SqliteRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordRepository {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn).map_err(|e| RepositoryError::SchemaError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 说明：会再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard).map_err(|e| RepositoryError::SchemaError(e.to_string()))?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn find_in(
        conn: &Connection,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
    ) -> RepositoryResult<Option<BusinessRecord>> {
        let sql = format!(
            "{} WHERE owner_id = ?1 AND kind = ?2 AND natural_key_folded = ?3",
            SELECT_COLUMNS
        );
        let row = conn
            .query_row(
                &sql,
                params![owner_id, kind.as_str(), fold_natural_key(natural_key)],
                RecordRow::from_row,
            )
            .optional()?;

        row.map(RecordRow::into_record).transpose()
    }

    fn insert_in(conn: &Connection, record: &BusinessRecord) -> RepositoryResult<()> {
        let fields_json = serde_json::to_string(&record.fields)?;
        conn.execute(
            r#"
            INSERT INTO business_record (
                record_id, owner_id, kind, natural_key, natural_key_folded,
                fields_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.record_id,
                record.owner_id,
                record.kind.as_str(),
                record.natural_key,
                fold_natural_key(&record.natural_key),
                fields_json,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn find_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
    ) -> RepositoryResult<Option<BusinessRecord>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, owner_id, kind, natural_key)
    }

    /// 更新或插入（事务化：查找 + 写入在同一事务内）
    async fn upsert_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
        fields: NormalizedRecord,
    ) -> RepositoryResult<(BusinessRecord, UpsertAction)> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Utc::now();
        let outcome = match Self::find_in(&tx, owner_id, kind, natural_key)? {
            Some(mut existing) => {
                existing.fields.extend(fields);
                existing.updated_at = now;

                let fields_json = serde_json::to_string(&existing.fields)?;
                tx.execute(
                    "UPDATE business_record SET fields_json = ?1, updated_at = ?2 WHERE record_id = ?3",
                    params![fields_json, now.to_rfc3339(), existing.record_id],
                )?;
                debug!(record_id = %existing.record_id, natural_key, "记录已更新");
                (existing, UpsertAction::Updated)
            }
            None => {
                let record = BusinessRecord {
                    record_id: Uuid::new_v4().to_string(),
                    owner_id: owner_id.to_string(),
                    kind,
                    natural_key: natural_key.to_string(),
                    fields,
                    created_at: now,
                    updated_at: now,
                };
                Self::insert_in(&tx, &record)?;
                debug!(record_id = %record.record_id, natural_key, "记录已插入");
                (record, UpsertAction::Inserted)
            }
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(outcome)
    }

    async fn insert_record(&self, record: &BusinessRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, record)
    }

    async fn count_by_kind(&self, owner_id: &str, kind: ImportKind) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM business_record WHERE owner_id = ?1 AND kind = ?2",
            params![owner_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn list_by_kind(
        &self,
        owner_id: &str,
        kind: ImportKind,
    ) -> RepositoryResult<Vec<BusinessRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE owner_id = ?1 AND kind = ?2 ORDER BY natural_key_folded",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_id, kind.as_str()], RecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}
