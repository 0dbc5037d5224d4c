// ==========================================
// 批量导入管道 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层:
// - 映射阶段（整批拒绝，未处理任何行）
// - 行级错误（仅记入 errors，不影响其他行）
// - 基础设施中止 / 取消（整批失败，不返回结果）
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（CSV 适配器） =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .csv is supported)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== 映射阶段错误（整批拒绝） =====
    #[error("missing required field(s): {}", fields.join(", "))]
    MissingRequiredField { fields: Vec<String> },

    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("batch too large: {rows} rows (limit {limit})")]
    BatchTooLarge { rows: usize, limit: usize },

    // ===== 行级错误 =====
    #[error("{message}")]
    RowValidation { row: usize, message: String },

    #[error("could not resolve {field}: {message}")]
    RelationResolution {
        row: usize,
        field: String,
        message: String,
    },

    #[error("could not save record: {message}")]
    Persistence { row: usize, message: String },

    // ===== 整批失败 =====
    #[error("import aborted: {0}")]
    ImportAborted(String),

    #[error("import cancelled after {processed} row(s)")]
    Cancelled { processed: usize },

    #[error("import transaction is {0}, expected PENDING")]
    InvalidState(String),

    // ===== 配置错误 =====
    #[error("config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为行级错误（记入结果后继续处理下一行）
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            ImportError::RowValidation { .. }
                | ImportError::RelationResolution { .. }
                | ImportError::Persistence { .. }
        )
    }

    /// 行级错误对应的行号
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::RowValidation { row, .. }
            | ImportError::RelationResolution { row, .. }
            | ImportError::Persistence { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// 将仓储错误归类为整批中止或行级持久化失败
    pub fn from_repository(err: RepositoryError, row: usize) -> Self {
        if err.is_infrastructure() {
            ImportError::ImportAborted(err.to_string())
        } else {
            ImportError::Persistence {
                row,
                message: err.to_string(),
            }
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_field_message() {
        let err = ImportError::MissingRequiredField {
            fields: vec!["Quote Number".to_string(), "Name".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required field(s): Quote Number, Name"
        );
        assert!(!err.is_row_scoped());
    }

    #[test]
    fn test_from_repository_classification() {
        let aborted =
            ImportError::from_repository(RepositoryError::LockError("poisoned".into()), 3);
        assert!(matches!(aborted, ImportError::ImportAborted(_)));
        assert_eq!(aborted.row(), None);

        let row_level = ImportError::from_repository(
            RepositoryError::UniqueConstraintViolation("dup".into()),
            3,
        );
        assert!(row_level.is_row_scoped());
        assert_eq!(row_level.row(), Some(3));
    }
}
