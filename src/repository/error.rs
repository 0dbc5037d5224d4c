// ==========================================
// 批量导入管道 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 基础设施故障（整批中止） vs 数据约束故障（单行失败）
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 基础设施错误 =====
    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database lock acquisition failed: {0}")]
    LockError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database schema unavailable: {0}")]
    SchemaError(String),

    // ===== 数据错误 =====
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("field value error (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("serialization failed: {0}")]
    SerializationError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否为基础设施级故障（存储不可达 / 事务子系统失败）
    ///
    /// 基础设施故障需中止整批导入；其余错误仅影响当前行。
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            RepositoryError::DatabaseConnectionError(_)
                | RepositoryError::LockError(_)
                | RepositoryError::DatabaseTransactionError(_)
                | RepositoryError::SchemaError(_)
        )
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                let msg = msg.unwrap_or_else(|| ffi_err.to_string());
                match ffi_err.code {
                    ErrorCode::ConstraintViolation => {
                        if msg.contains("UNIQUE") {
                            RepositoryError::UniqueConstraintViolation(msg)
                        } else if msg.contains("FOREIGN KEY") {
                            RepositoryError::ForeignKeyViolation(msg)
                        } else {
                            RepositoryError::ConstraintViolation(msg)
                        }
                    }
                    ErrorCode::TypeMismatch | ErrorCode::TooBig => {
                        RepositoryError::DatabaseQueryError(msg)
                    }
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseTransactionError(msg)
                    }
                    _ if msg.contains("no such table") => RepositoryError::SchemaError(msg),
                    ErrorCode::Unknown => RepositoryError::DatabaseQueryError(msg),
                    _ => RepositoryError::DatabaseConnectionError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::FromSqlConversionFailure(idx, _, e) => {
                RepositoryError::FieldValueError {
                    field: format!("column {}", idx),
                    message: e.to_string(),
                }
            }
            rusqlite::Error::InvalidPath(p) => {
                RepositoryError::DatabaseConnectionError(p.display().to_string())
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_violation_is_row_level() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn test_missing_table_is_infrastructure() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO missing_table VALUES (1)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::SchemaError(_)));
        assert!(err.is_infrastructure());
    }

    #[test]
    fn test_lock_error_is_infrastructure() {
        assert!(RepositoryError::LockError("poisoned".into()).is_infrastructure());
        assert!(!RepositoryError::SerializationError("bad".into()).is_infrastructure());
    }
}
