// ==========================================
// 批量导入管道 - 领域类型定义
// ==========================================
// 职责: 记录类型 / 字段值类型 / 主键策略 / 状态机
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// ImportKind - 导入记录类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportKind {
    Order,      // 订单
    Quote,      // 报价单
    Contact,    // 联系人（客户/供应商）
    Ingredient, // 原料
}

impl ImportKind {
    pub const ALL: [ImportKind; 4] = [
        ImportKind::Order,
        ImportKind::Quote,
        ImportKind::Contact,
        ImportKind::Ingredient,
    ];

    /// 数据库存储值（全大写）
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Order => "ORDER",
            ImportKind::Quote => "QUOTE",
            ImportKind::Contact => "CONTACT",
            ImportKind::Ingredient => "INGREDIENT",
        }
    }

    /// 小写短名（配置键 / i18n 键）
    pub fn slug(&self) -> &'static str {
        match self {
            ImportKind::Order => "order",
            ImportKind::Quote => "quote",
            ImportKind::Contact => "contact",
            ImportKind::Ingredient => "ingredient",
        }
    }

    /// 业务主键字段
    pub fn natural_key_field(&self) -> &'static str {
        match self {
            ImportKind::Order => "order_number",
            ImportKind::Quote => "quote_number",
            ImportKind::Contact | ImportKind::Ingredient => "name",
        }
    }

    /// 业务主键缺失时的处理策略
    pub fn key_policy(&self) -> KeyPolicy {
        match self {
            ImportKind::Order => KeyPolicy::Synthesize,
            ImportKind::Quote | ImportKind::Contact | ImportKind::Ingredient => {
                KeyPolicy::Mandatory
            }
        }
    }

    /// 合成主键默认前缀
    pub fn default_key_prefix(&self) -> &'static str {
        match self {
            ImportKind::Order => "ORD",
            ImportKind::Quote => "QUO",
            ImportKind::Contact => "CON",
            ImportKind::Ingredient => "ING",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    /// 兼容单复数 / 大小写（"quotes" / "Quote" / "QUOTE"）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ImportKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == singular)
            .ok_or_else(|| format!("unknown import kind: {}", s))
    }
}

// ==========================================
// KeyPolicy - 业务主键策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// 行内必须提供，缺失则该行校验失败
    Mandatory,
    /// 行内缺失时按 前缀-时间戳-序号 合成
    Synthesize,
}

// ==========================================
// ValueType - 字段声明类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Date,
    Currency,
    Boolean,
    /// 关联记录（按显示名查找或创建联系人）
    Relation,
}

// ==========================================
// FieldValue - 归一化后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Date(NaiveDate),
    Decimal(f64),
    Boolean(bool),
    Text(String),
    Reference { id: String, name: String },
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ==========================================
// ImportState - 批次状态机
// ==========================================
// PENDING → RUNNING → COMPLETED / ABORTED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportState {
    Pending,
    Running,
    Completed,
    Aborted,
}
