// ==========================================
// 批量导入管道 - 导入层
// ==========================================
// 职责: 表格行 → 业务记录（映射、归一化、关联解析、落库）
// 入口: ImportTransaction::run
// 适配: CsvParser（CSV → ImportBatch）
// ==========================================

// 模块声明
pub mod entity_resolver;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_transaction;
pub mod importer_trait;
pub mod value_normalizer;

// 重导出核心类型
pub use entity_resolver::EntityResolver as EntityResolverImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::CsvParser;
pub use import_transaction::{CancelFlag, ImportTransaction};
pub use value_normalizer::ValueNormalizer as ValueNormalizerImpl;

// 重导出 Trait 接口
pub use importer_trait::{EntityResolver, FieldMapper, ValueNormalizer};
