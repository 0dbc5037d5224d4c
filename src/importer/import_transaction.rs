// ==========================================
// 批量导入管道 - 批次导入协调器
// ==========================================
// 职责: 整合导入流程，从原始行到落库
// 流程: 列映射(一次) → 逐行[归一化 → 校验 → 关联解析 → 业务主键 → 更新或插入]
// 约束:
// - 行严格按源顺序串行处理（关联记录的查找或创建不可并发）
// - 行级原子提交，批次允许部分成功
// - 仅基础设施故障中止整批
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{ImportBatch, ImportMapping, RawRow, ResolvedMapping};
use crate::domain::record::{fold_natural_key, ImportedRecord, NormalizedRecord};
use crate::domain::types::{FieldValue, ImportKind, ImportState, KeyPolicy, ValueType};
use crate::domain::ImportResult as BatchResult;
use crate::i18n;
use crate::importer::entity_resolver::EntityResolver as EntityResolverImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::importer_trait::{EntityResolver, FieldMapper, ValueNormalizer};
use crate::importer::value_normalizer::ValueNormalizer as ValueNormalizerImpl;
use crate::repository::RecordRepository;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 进程内单调递增序号（合成业务主键用）
static KEY_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// ==========================================
// CancelFlag - 批次取消标记
// ==========================================
// 每行处理前检查；已提交的行保持提交
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 批次内共享的只读上下文
struct BatchContext<'a> {
    owner_id: &'a str,
    kind: ImportKind,
    mapping: &'a ImportMapping,
    resolved: &'a ResolvedMapping,
    key_prefix: &'a str,
}

/// 单行处理结果
struct RowOutcome {
    record: ImportedRecord,
    relations_created: usize,
}

// ==========================================
// ImportTransaction - 批次导入协调器
// ==========================================
pub struct ImportTransaction<R, C>
where
    R: RecordRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    records: Arc<R>,

    // 配置读取器
    config: C,

    // 导入组件
    field_mapper: Box<dyn FieldMapper>,
    normalizer: Box<dyn ValueNormalizer>,
    entity_resolver: Box<dyn EntityResolver>,

    // 批次状态
    state: ImportState,
}

impl<R, C> ImportTransaction<R, C>
where
    R: RecordRepository + 'static,
    C: ImportConfigReader,
{
    /// 使用默认组件创建协调器
    ///
    /// # 参数
    /// - records: 业务记录仓储（同时供关联解析使用）
    /// - config: 配置读取器
    pub fn new(records: Arc<R>, config: C) -> Self {
        let entity_resolver = Box::new(EntityResolverImpl::new(records.clone()));
        Self::with_components(
            records,
            config,
            Box::new(FieldMapperImpl),
            Box::new(ValueNormalizerImpl),
            entity_resolver,
        )
    }

    /// 注入全部组件创建协调器
    pub fn with_components(
        records: Arc<R>,
        config: C,
        field_mapper: Box<dyn FieldMapper>,
        normalizer: Box<dyn ValueNormalizer>,
        entity_resolver: Box<dyn EntityResolver>,
    ) -> Self {
        Self {
            records,
            config,
            field_mapper,
            normalizer,
            entity_resolver,
            state: ImportState::Pending,
        }
    }

    /// 当前批次状态
    pub fn state(&self) -> ImportState {
        self.state
    }

    /// 执行批次导入
    ///
    /// # 参数
    /// - batch: 表头 + 有序原始行
    /// - mapping: 列映射（含记录类型）
    /// - owner_id: owner 作用域
    /// - cancel: 可选取消标记
    ///
    /// # 返回
    /// - Ok(ImportResult): 完整结果（可能含行级错误）
    /// - Err(MissingRequiredField / InvalidMapping / BatchTooLarge): 映射阶段拒绝，未处理任何行
    /// - Err(ImportAborted): 基础设施故障，整批失败
    /// - Err(Cancelled): 调用方取消
    #[instrument(
        skip(self, batch, mapping, cancel),
        fields(batch_id = tracing::field::Empty, kind = %mapping.kind)
    )]
    pub async fn run(
        &mut self,
        batch: &ImportBatch,
        mapping: &ImportMapping,
        owner_id: &str,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<BatchResult> {
        if self.state != ImportState::Pending {
            return Err(ImportError::InvalidState(format!("{:?}", self.state)));
        }

        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(rows = batch.len(), "开始批次导入");

        // === 阶段 0: 前置校验与配置 ===
        if owner_id.trim().is_empty() {
            return Err(ImportError::InvalidMapping("owner id is empty".to_string()));
        }

        let max_rows = self.config.get_max_rows().await?;
        if batch.len() > max_rows {
            warn!(rows = batch.len(), limit = max_rows, "批次行数超限");
            return Err(ImportError::BatchTooLarge {
                rows: batch.len(),
                limit: max_rows,
            });
        }

        let locale = self.config.get_locale().await?;
        let key_prefix = self.config.get_key_prefix(mapping.kind).await?;

        // === 阶段 1: 列映射（一次） ===
        let resolved = self.field_mapper.resolve(mapping, &batch.headers)?;
        debug!(resolved = resolved.len(), "列映射完成");

        let ctx = BatchContext {
            owner_id,
            kind: mapping.kind,
            mapping,
            resolved: &resolved,
            key_prefix: &key_prefix,
        };

        // === 阶段 2: 逐行处理 ===
        self.state = ImportState::Running;
        let mut result = BatchResult::new(batch_id.clone(), mapping.kind, batch.len());
        let mut seen_keys: HashMap<String, usize> = HashMap::new();

        for (idx, row) in batch.rows.iter().enumerate() {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                self.state = ImportState::Aborted;
                warn!(processed = idx, "批次已取消");
                return Err(ImportError::Cancelled { processed: idx });
            }

            let row_number = batch.row_number(idx);
            match self.process_row(row_number, row, &ctx).await {
                Ok(outcome) => {
                    let key = fold_natural_key(&outcome.record.record.natural_key);
                    if let Some(first_row) = seen_keys.insert(key, row_number) {
                        warn!(
                            row = row_number,
                            first_row,
                            natural_key = %outcome.record.record.natural_key,
                            "同批次内业务主键重复，后行覆盖前行"
                        );
                    }
                    result.relations_created += outcome.relations_created;
                    result.record_success(outcome.record);
                }
                Err(e) if e.is_row_scoped() => {
                    warn!(row = row_number, error = %e, "行导入失败");
                    result.record_error(row_number, e.to_string());
                }
                Err(e) => {
                    self.state = ImportState::Aborted;
                    error!(row = row_number, error = %e, "批次导入中止");
                    return Err(match e {
                        ImportError::ImportAborted(_) => e,
                        other => ImportError::ImportAborted(other.to_string()),
                    });
                }
            }
        }

        // === 阶段 3: 汇总 ===
        self.state = ImportState::Completed;
        result.elapsed_ms = start_time.elapsed().as_millis() as u64;
        result.message = i18n::import_summary(
            &locale,
            mapping.kind,
            result.success_count,
            result.error_count,
        );

        info!(
            success = result.success_count,
            failed = result.error_count,
            relations_created = result.relations_created,
            elapsed_ms = result.elapsed_ms,
            "批次导入完成"
        );

        Ok(result)
    }

    /// 处理单行（任何行级错误只影响本行）
    async fn process_row(
        &self,
        row_number: usize,
        row: &RawRow,
        ctx: &BatchContext<'_>,
    ) -> ImportResult<RowOutcome> {
        // 步骤 1-2: 取值 + 归一化 + 必填校验
        let mut fields = NormalizedRecord::new();
        let mut relation_names: Vec<(&str, &str, String)> = Vec::new();

        for fm in &ctx.mapping.fields {
            // 文件中不存在的字段不参与写入，避免覆盖已有记录的值
            if !ctx.resolved.contains(&fm.field) {
                continue;
            }

            let raw = self.field_mapper.extract(ctx.resolved, &fm.field, row);
            let display = fm.spec.display_name.as_str();

            let value = match fm.value_type {
                ValueType::Text => self.normalizer.normalize_text(raw).map(FieldValue::Text),
                ValueType::Date => self.normalizer.normalize_date(raw).map(FieldValue::Date),
                ValueType::Currency => {
                    Some(FieldValue::Decimal(self.normalizer.normalize_currency(raw)))
                }
                ValueType::Boolean => {
                    Some(FieldValue::Boolean(self.normalizer.normalize_boolean(raw)))
                }
                ValueType::Relation => {
                    if let Some(name) = self.normalizer.normalize_text(raw) {
                        relation_names.push((fm.field.as_str(), display, name));
                        continue;
                    }
                    None
                }
            };

            match value {
                Some(v) => {
                    fields.insert(fm.field.clone(), v);
                }
                None if fm.spec.required => {
                    let message = if raw.trim().is_empty() {
                        format!("{} is required", display)
                    } else {
                        format!("{} has an unrecognised value: '{}'", display, raw.trim())
                    };
                    return Err(ImportError::RowValidation {
                        row: row_number,
                        message,
                    });
                }
                None => {
                    fields.insert(fm.field.clone(), FieldValue::Null);
                }
            }
        }

        // 步骤 4: 业务主键（行内提供优先，否则按策略合成或拒绝）
        let key_field = ctx.kind.natural_key_field();
        let supplied_key = fields
            .get(key_field)
            .and_then(FieldValue::as_text)
            .map(str::to_string);

        let (natural_key, key_synthesized) = match supplied_key {
            Some(key) => (key, false),
            None => match ctx.kind.key_policy() {
                KeyPolicy::Synthesize => {
                    let key = synthesize_key(ctx.key_prefix);
                    debug!(row = row_number, natural_key = %key, "合成业务主键");
                    fields.insert(key_field.to_string(), FieldValue::Text(key.clone()));
                    (key, true)
                }
                KeyPolicy::Mandatory => {
                    let display = ctx
                        .mapping
                        .get(key_field)
                        .map(|f| f.spec.display_name.clone())
                        .unwrap_or_else(|| key_field.to_string());
                    return Err(ImportError::RowValidation {
                        row: row_number,
                        message: format!("{} is required to import a {}", display, ctx.kind.slug()),
                    });
                }
            },
        };

        // 步骤 3: 关联解析（校验通过后才创建关联记录）
        let mut relations_created = 0;
        for (field, display, name) in relation_names {
            let related = self
                .entity_resolver
                .resolve(&name, ctx.owner_id)
                .await
                .map_err(|e| {
                    if e.is_infrastructure() {
                        ImportError::ImportAborted(e.to_string())
                    } else {
                        ImportError::RelationResolution {
                            row: row_number,
                            field: display.to_string(),
                            message: e.to_string(),
                        }
                    }
                })?;

            let value = match related {
                Some(r) => {
                    if r.created {
                        relations_created += 1;
                    }
                    FieldValue::Reference {
                        id: r.record_id,
                        name: r.display_name,
                    }
                }
                None => FieldValue::Null,
            };
            fields.insert(field.to_string(), value);
        }

        // 步骤 5: 更新或插入（单行原子）
        let (record, action) = self
            .records
            .upsert_by_natural_key(ctx.owner_id, ctx.kind, &natural_key, fields)
            .await
            .map_err(|e| ImportError::from_repository(e, row_number))?;

        debug!(row = row_number, record_id = %record.record_id, ?action, "行导入成功");

        Ok(RowOutcome {
            record: ImportedRecord {
                row: row_number,
                action,
                key_synthesized,
                record,
            },
            relations_created,
        })
    }
}

/// 合成业务主键: {前缀}-{UTC 时间戳到毫秒}-{进程内序号}
fn synthesize_key(prefix: &str) -> String {
    let seq = KEY_SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1;
    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d%H%M%S%3f"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_keys_are_unique_and_prefixed() {
        let a = synthesize_key("ORD");
        let b = synthesize_key("ORD");
        assert_ne!(a, b);
        assert!(a.starts_with("ORD-"));

        let seq_a: u64 = a.rsplit('-').next().unwrap().parse().unwrap();
        let seq_b: u64 = b.rsplit('-').next().unwrap().parse().unwrap();
        assert!(seq_b > seq_a);
    }

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
