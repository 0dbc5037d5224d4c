// ==========================================
// 批量导入管道 - 导入组件 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 列映射 → 值归一化 → 关联解析 → 按业务主键落库
// ==========================================

use crate::domain::import::{ImportMapping, RawRow, ResolvedMapping};
use crate::domain::record::RelatedRef;
use crate::importer::error::ImportResult;
use crate::repository::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 标准字段 → 文件实际列名（每批一次）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 解析列映射
    ///
    /// # 规则
    /// 1. 声明了主列且表头中存在（区分大小写精确匹配）→ 使用主列
    /// 2. 否则按声明顺序扫描别名，取第一个（忽略大小写、去首尾空白）匹配的表头
    /// 3. 未匹配: 必填 → 整批失败；可选 → 字段缺席
    ///
    /// # 返回
    /// - Ok(ResolvedMapping): 解析结果
    /// - Err(MissingRequiredField): 列出所有缺失的必填字段（显示名）
    fn resolve(&self, mapping: &ImportMapping, headers: &[String])
        -> ImportResult<ResolvedMapping>;

    /// 取某标准字段在该行的原始文本（字段缺席或行内缺列 → ""）
    fn extract<'a>(&self, resolved: &ResolvedMapping, field: &str, row: &'a RawRow) -> &'a str;
}

// ==========================================
// ValueNormalizer Trait
// ==========================================
// 用途: 单元格文本 → 类型化值（全部为全函数，不报错）
// 实现者: ValueNormalizerImpl
pub trait ValueNormalizer: Send + Sync {
    /// 解析日期（多格式启发式，丢弃时间部分）
    ///
    /// # 返回
    /// - Some(NaiveDate): 解析成功
    /// - None: 无法识别
    fn normalize_date(&self, value: &str) -> Option<NaiveDate>;

    /// 解析金额（显式结果）
    ///
    /// # 返回
    /// - Some(f64): 仅保留数字 / '.' / '-' 后可解析
    /// - None: 空值或非法数字
    fn parse_currency(&self, value: &str) -> Option<f64>;

    /// 解析金额（全函数形式，非法 → 0）
    fn normalize_currency(&self, value: &str) -> f64 {
        self.parse_currency(value).unwrap_or(0.0)
    }

    /// 解析布尔值（肯定集合之外一律 false）
    fn normalize_boolean(&self, value: &str) -> bool;

    /// 清洗文本（TRIM，空白 → None）
    fn normalize_text(&self, value: &str) -> Option<String>;
}

// ==========================================
// EntityResolver Trait
// ==========================================
// 用途: 按显示名查找或创建关联记录（owner 作用域）
// 实现者: EntityResolverImpl
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// 查找或创建关联记录
    ///
    /// # 返回
    /// - Ok(None): 显示名为空（无关联，不是错误）
    /// - Ok(Some(ref)): 已存在或新建的关联记录
    /// - Err: 查找/创建失败
    async fn resolve(
        &self,
        display_name: &str,
        owner_id: &str,
    ) -> RepositoryResult<Option<RelatedRef>>;
}
