// ==========================================
// 批量导入管道 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 表格数据（订单/报价/联系人/原料）批量导入为业务记录
// 流程: 列映射 → 值归一化 → 关联解析 → 按业务主键更新或插入
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录类型与结构
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 映射、归一化、关联、落库
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BusinessRecord, ColumnSpec, FieldValue, ImportBatch, ImportKind, ImportMapping, ImportState,
    RawRow, UpsertAction, ValueType,
};

// 导入
pub use importer::{CancelFlag, CsvParser, ImportError, ImportTransaction};

// 仓储与配置
pub use config::{ConfigManager, ImportConfigReader};
pub use repository::{RecordRepository, SqliteRecordRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "bizdesk-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
