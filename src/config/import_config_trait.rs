// ==========================================
// 批量导入管道 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::ImportKind;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入协调器所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取结果摘要消息的语言
    ///
    /// # 默认值
    /// - "en"
    async fn get_locale(&self) -> ImportResult<String>;

    /// 获取单批次最大行数
    ///
    /// # 默认值
    /// - 10000
    ///
    /// # 用途
    /// - 超出则在处理任何行之前整批拒绝
    async fn get_max_rows(&self) -> ImportResult<usize>;

    /// 获取合成业务主键的前缀
    ///
    /// # 默认值
    /// - ImportKind::default_key_prefix()（ORD / QUO / CON / ING）
    async fn get_key_prefix(&self, kind: ImportKind) -> ImportResult<String>;
}
