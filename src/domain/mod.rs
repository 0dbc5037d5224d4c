// ==========================================
// 批量导入管道 - 领域模型层
// ==========================================
// 职责: 定义记录类型、字段表、映射与结果结构
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod record;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use import::{
    ColumnOverride, ColumnSpec, FieldMapping, ImportBatch, ImportMapping, ImportResult, RawRow, ResolvedMapping,
    RowError,
};
pub use record::{
    fold_natural_key, BusinessRecord, ImportedRecord, NormalizedRecord, RelatedRef, UpsertAction,
};
pub use schema::{field_def, fields_for, FieldDef};
pub use types::{FieldValue, ImportKind, ImportState, KeyPolicy, ValueType};
