// ==========================================
// Mock 仓储实现 - 用于故障注入测试
// ==========================================

use async_trait::async_trait;
use bizdesk_import::domain::{
    fold_natural_key, BusinessRecord, ImportKind, NormalizedRecord, UpsertAction,
};
use bizdesk_import::repository::{RecordRepository, RepositoryError, RepositoryResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// 对特定业务主键注入的故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// 连接丢失（基础设施级）
    ConnectionLost,
    /// 数据约束失败（行级）
    Constraint,
}

/// 内存仓储：键为 (owner, kind, 业务主键比较形式)
#[derive(Default)]
pub struct MockRepository {
    records: Mutex<HashMap<(String, ImportKind, String), BusinessRecord>>,
    faults: HashMap<String, Fault>,
}

impl MockRepository {
    pub fn with_fault(natural_key: &str, fault: Fault) -> Self {
        let mut faults = HashMap::new();
        faults.insert(fold_natural_key(natural_key), fault);
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_fault(&self, natural_key: &str) -> RepositoryResult<()> {
        match self.faults.get(&fold_natural_key(natural_key)) {
            Some(Fault::ConnectionLost) => Err(RepositoryError::DatabaseConnectionError(
                "connection reset".to_string(),
            )),
            Some(Fault::Constraint) => Err(RepositoryError::ConstraintViolation(
                "CHECK constraint failed: business_record".to_string(),
            )),
            None => Ok(()),
        }
    }
}

fn key(owner_id: &str, kind: ImportKind, natural_key: &str) -> (String, ImportKind, String) {
    (owner_id.to_string(), kind, fold_natural_key(natural_key))
}

#[async_trait]
impl RecordRepository for MockRepository {
    async fn find_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
    ) -> RepositoryResult<Option<BusinessRecord>> {
        self.check_fault(natural_key)?;
        let records = self.records.lock().unwrap();
        Ok(records.get(&key(owner_id, kind, natural_key)).cloned())
    }

    async fn upsert_by_natural_key(
        &self,
        owner_id: &str,
        kind: ImportKind,
        natural_key: &str,
        fields: NormalizedRecord,
    ) -> RepositoryResult<(BusinessRecord, UpsertAction)> {
        self.check_fault(natural_key)?;
        let mut records = self.records.lock().unwrap();
        let now = Utc::now();
        match records.get_mut(&key(owner_id, kind, natural_key)) {
            Some(existing) => {
                existing.fields.extend(fields);
                existing.updated_at = now;
                Ok((existing.clone(), UpsertAction::Updated))
            }
            None => {
                let record = BusinessRecord {
                    record_id: format!("rec-{}", records.len() + 1),
                    owner_id: owner_id.to_string(),
                    kind,
                    natural_key: natural_key.to_string(),
                    fields,
                    created_at: now,
                    updated_at: now,
                };
                records.insert(key(owner_id, kind, natural_key), record.clone());
                Ok((record, UpsertAction::Inserted))
            }
        }
    }

    async fn insert_record(&self, record: &BusinessRecord) -> RepositoryResult<()> {
        self.check_fault(&record.natural_key)?;
        let mut records = self.records.lock().unwrap();
        let k = key(&record.owner_id, record.kind, &record.natural_key);
        if records.contains_key(&k) {
            return Err(RepositoryError::UniqueConstraintViolation(
                record.natural_key.clone(),
            ));
        }
        records.insert(k, record.clone());
        Ok(())
    }

    async fn count_by_kind(&self, owner_id: &str, kind: ImportKind) -> RepositoryResult<usize> {
        let records = self.records.lock().unwrap();
        Ok(records
            .keys()
            .filter(|(o, k, _)| o == owner_id && *k == kind)
            .count())
    }

    async fn list_by_kind(
        &self,
        owner_id: &str,
        kind: ImportKind,
    ) -> RepositoryResult<Vec<BusinessRecord>> {
        let records = self.records.lock().unwrap();
        let mut list: Vec<_> = records
            .values()
            .filter(|r| r.owner_id == owner_id && r.kind == kind)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.natural_key.cmp(&b.natural_key));
        Ok(list)
    }
}
