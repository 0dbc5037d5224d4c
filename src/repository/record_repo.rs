// ==========================================
// 批量导入管道 - 业务记录 Repository Trait
// ==========================================
// 职责: 定义按 (owner, kind, 业务主键) 的查找/创建/更新接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::record::{BusinessRecord, NormalizedRecord, UpsertAction};
use crate::domain::types::ImportKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RecordRepository Trait
// ==========================================
// 用途: 导入协调器与实体解析器的持久化协作方
// 实现者: SqliteRecordRepository（使用 rusqlite）
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// 按业务主键查找记录（owner 作用域内，忽略大小写）
    ///
    /// # 返回
    /// - Ok(Some): 找到记录
    /// - Ok(None): 不存在
    async fn find_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
    ) -> RepositoryResult<Option<BusinessRecord>>;

    /// 按业务主键更新或插入（单条原子操作）
    ///
    /// # 规则
    /// - 已存在: 保留 record_id / created_at，合并字段（传入字段覆盖旧值）
    /// - 不存在: 生成新 record_id 插入
    ///
    /// # 返回
    /// - Ok((记录, 动作)): 写入后的完整记录及 Inserted/Updated
    async fn upsert_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
        fields: NormalizedRecord,
    ) -> RepositoryResult<(BusinessRecord, UpsertAction)>;

    /// 插入一条新记录（主键冲突返回 UniqueConstraintViolation）
    async fn insert_record(&self, record: &BusinessRecord) -> RepositoryResult<()>;

    /// 统计 owner 作用域内某类型记录数
    async fn count_by_kind(&self, owner_id: &str, kind: ImportKind) -> RepositoryResult<usize>;

    /// 列出 owner 作用域内某类型记录（按业务主键排序）
    async fn list_by_kind(
        &self,
        owner_id: &str,
        kind: ImportKind,
    ) -> RepositoryResult<Vec<BusinessRecord>>;
}
