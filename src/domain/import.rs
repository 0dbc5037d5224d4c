// ==========================================
// 批量导入管道 - 导入映射与结果结构
// ==========================================
// 职责: 列映射输入 / 解析后映射 / 原始行 / 批次 / 导入结果
// ==========================================

use crate::domain::record::ImportedRecord;
use crate::domain::schema::{field_def, fields_for};
use crate::domain::types::{ImportKind, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 原始行：源列名 → 原始文本
pub type RawRow = HashMap<String, String>;

// ==========================================
// ColumnSpec - 调用方提供的单字段列映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    #[serde(default)]
    pub primary_column: Option<String>,
    #[serde(default)]
    pub alternative_names: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub display_name: String,
}

// ==========================================
// ColumnOverride - 调用方对单字段的部分覆写
// ==========================================
// 未给出的键沿用字段表默认值
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOverride {
    #[serde(default)]
    pub primary_column: Option<String>,
    #[serde(default)]
    pub alternative_names: Option<Vec<String>>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub display_name: Option<String>,
}

// ==========================================
// FieldMapping - 标准字段 + 声明类型 + 列映射
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub field: String,
    pub value_type: ValueType,
    pub spec: ColumnSpec,
}

// ==========================================
// ImportMapping - 批次级映射（有序）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportMapping {
    pub kind: ImportKind,
    pub fields: Vec<FieldMapping>,
}

impl ImportMapping {
    /// 按记录类型字段表生成默认映射（无主列，仅别名）
    pub fn for_kind(kind: ImportKind) -> Self {
        let fields = fields_for(kind)
            .iter()
            .map(|def| FieldMapping {
                field: def.name.to_string(),
                value_type: def.value_type,
                spec: ColumnSpec {
                    primary_column: None,
                    alternative_names: def.aliases.iter().map(|a| a.to_string()).collect(),
                    required: def.required,
                    display_name: def.display_name.to_string(),
                },
            })
            .collect();

        Self { kind, fields }
    }

    /// 在默认映射上叠加调用方覆写
    ///
    /// # 规则
    /// - 仅替换覆写中给出的键，其余沿用默认（必填、别名、显示名）
    /// - 空白 display_name 视为未给出
    /// - 覆写未知字段名 → Err(字段名)
    pub fn with_overrides(
        kind: ImportKind,
        overrides: BTreeMap<String, ColumnOverride>,
    ) -> Result<Self, String> {
        let mut mapping = Self::for_kind(kind);

        for (field, patch) in overrides {
            if field_def(kind, &field).is_none() {
                return Err(field);
            }
            let Some(slot) = mapping.fields.iter_mut().find(|f| f.field == field) else {
                continue;
            };

            if let Some(primary) = patch.primary_column {
                slot.spec.primary_column = Some(primary);
            }
            if let Some(names) = patch.alternative_names {
                slot.spec.alternative_names = names;
            }
            if let Some(required) = patch.required {
                slot.spec.required = required;
            }
            if let Some(display) = patch.display_name.filter(|d| !d.trim().is_empty()) {
                slot.spec.display_name = display;
            }
        }

        Ok(mapping)
    }

    /// 设置某字段的主列（链式，便于测试与调用方快速构造）
    pub fn with_primary(mut self, field: &str, column: &str) -> Self {
        if let Some(slot) = self.fields.iter_mut().find(|f| f.field == field) {
            slot.spec.primary_column = Some(column.to_string());
        }
        self
    }

    /// 设置某字段是否必填
    pub fn with_required(mut self, field: &str, required: bool) -> Self {
        if let Some(slot) = self.fields.iter_mut().find(|f| f.field == field) {
            slot.spec.required = required;
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.field == field)
    }
}

// ==========================================
// ResolvedMapping - 标准字段 → 文件实际列名
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedMapping {
    columns: BTreeMap<String, String>,
}

impl ResolvedMapping {
    pub fn insert(&mut self, field: &str, column: &str) {
        self.columns.insert(field.to_string(), column.to_string());
    }

    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ==========================================
// ImportBatch - 表头集合 + 有序行
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// 每行在源文件中的数据行号（从 1 开始，空白行也计数）
    pub row_numbers: Vec<usize>,
}

impl ImportBatch {
    /// 行号按顺序从 1 编号
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        let row_numbers = (1..=rows.len()).collect();
        Self {
            headers,
            rows,
            row_numbers,
        }
    }

    /// 指定每行的源行号（跳过空白行后保持原始编号）
    pub fn with_row_numbers(
        headers: Vec<String>,
        rows: Vec<RawRow>,
        row_numbers: Vec<usize>,
    ) -> Self {
        Self {
            headers,
            rows,
            row_numbers,
        }
    }

    /// 第 idx 行（0 起）对外报告的行号
    pub fn row_number(&self, idx: usize) -> usize {
        self.row_numbers.get(idx).copied().unwrap_or(idx + 1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// RowError - 行级错误（行号从 1 开始）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

// ==========================================
// ImportResult - 批次导入结果（返回调用方，不落库）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub batch_id: String,
    pub kind: ImportKind,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
    pub success_details: Vec<ImportedRecord>,
    pub relations_created: usize,
    pub elapsed_ms: u64,
    pub message: String,
}

impl ImportResult {
    pub fn new(batch_id: String, kind: ImportKind, total_rows: usize) -> Self {
        Self {
            batch_id,
            kind,
            total_rows,
            success_count: 0,
            error_count: 0,
            errors: Vec::new(),
            success_details: Vec::new(),
            relations_created: 0,
            elapsed_ms: 0,
            message: String::new(),
        }
    }

    pub fn record_success(&mut self, record: ImportedRecord) {
        self.success_count += 1;
        self.success_details.push(record);
    }

    pub fn record_error(&mut self, row: usize, message: impl Into<String>) {
        self.error_count += 1;
        self.errors.push(RowError {
            row,
            message: message.into(),
        });
    }
}
