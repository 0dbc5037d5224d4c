// ==========================================
// 批量导入管道 - 业务记录实体
// ==========================================
// 对应表: business_record
// 说明: 字段以 JSON 形式存储（fields_json），主键为 record_id
// ==========================================

use crate::domain::types::{FieldValue, ImportKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 业务主键比较形式（Unicode 小写），唯一约束与查找均基于此
pub fn fold_natural_key(natural_key: &str) -> String {
    natural_key.to_lowercase()
}

/// 归一化后的单行记录：标准字段 → 类型化值（行内临时结构）
pub type NormalizedRecord = BTreeMap<String, FieldValue>;

// ==========================================
// BusinessRecord - 已落库的业务记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub record_id: String,
    pub owner_id: String,
    pub kind: ImportKind,
    pub natural_key: String,
    pub fields: NormalizedRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }
}

// ==========================================
// UpsertAction - 写入动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Inserted,
    Updated,
}

// ==========================================
// ImportedRecord - 导入成功明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRecord {
    pub row: usize,
    pub action: UpsertAction,
    pub key_synthesized: bool,
    pub record: BusinessRecord,
}

// ==========================================
// RelatedRef - 关联记录引用（实体解析结果）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRef {
    pub record_id: String,
    pub display_name: String,
    /// 本次解析是否新建了关联记录
    pub created: bool,
}
