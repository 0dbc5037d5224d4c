// ==========================================
// 批量导入管道 - 关联实体解析器实现
// ==========================================
// 职责: 按显示名查找或创建联系人（owner 作用域，忽略大小写）
// 约束: 非并发安全，同一 owner 的批次须串行逐行调用
// ==========================================

use crate::domain::record::{BusinessRecord, NormalizedRecord, RelatedRef};
use crate::domain::types::{FieldValue, ImportKind};
use crate::importer::importer_trait::EntityResolver as EntityResolverTrait;
use crate::repository::{RecordRepository, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 关联记录类型（客户 / 供应商均为联系人）
const RELATED_KIND: ImportKind = ImportKind::Contact;

pub struct EntityResolver {
    records: Arc<dyn RecordRepository>,
}

impl EntityResolver {
    pub fn new(records: Arc<dyn RecordRepository>) -> Self {
        Self { records }
    }

    fn new_contact(display_name: &str, owner_id: &str) -> BusinessRecord {
        let mut fields = NormalizedRecord::new();
        fields.insert(
            "name".to_string(),
            FieldValue::Text(display_name.to_string()),
        );

        let now = Utc::now();
        BusinessRecord {
            record_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            kind: RELATED_KIND,
            natural_key: display_name.to_string(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl EntityResolverTrait for EntityResolver {
    #[instrument(skip(self))]
    async fn resolve(
        &self,
        display_name: &str,
        owner_id: &str,
    ) -> RepositoryResult<Option<RelatedRef>> {
        let name = display_name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if let Some(existing) = self
            .records
            .find_by_natural_key(owner_id, RELATED_KIND, name)
            .await?
        {
            debug!(record_id = %existing.record_id, "关联记录已存在");
            return Ok(Some(RelatedRef {
                record_id: existing.record_id,
                display_name: existing.natural_key,
                created: false,
            }));
        }

        let contact = Self::new_contact(name, owner_id);
        match self.records.insert_record(&contact).await {
            Ok(()) => {
                info!(record_id = %contact.record_id, "新建关联记录");
                Ok(Some(RelatedRef {
                    record_id: contact.record_id,
                    display_name: contact.natural_key,
                    created: true,
                }))
            }
            // 查找与插入之间被其他写入方抢先创建：重新查找一次
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                let existing = self
                    .records
                    .find_by_natural_key(owner_id, RELATED_KIND, name)
                    .await?
                    .ok_or(RepositoryError::UniqueConstraintViolation(msg))?;
                Ok(Some(RelatedRef {
                    record_id: existing.record_id,
                    display_name: existing.natural_key,
                    created: false,
                }))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteRecordRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (Arc<SqliteRecordRepository>, EntityResolver) {
        let conn = Connection::open_in_memory().unwrap();
        let repo =
            Arc::new(SqliteRecordRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap());
        let resolver = EntityResolver::new(repo.clone());
        (repo, resolver)
    }

    #[tokio::test]
    async fn test_empty_name_is_no_relation() {
        let (repo, resolver) = setup();
        assert_eq!(resolver.resolve("   ", "o").await.unwrap(), None);
        assert_eq!(repo.count_by_kind("o", ImportKind::Contact).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_or_create_is_case_insensitive() {
        let (repo, resolver) = setup();

        let created = resolver.resolve("Acme Bakery", "o").await.unwrap().unwrap();
        assert!(created.created);

        let found = resolver.resolve(" acme bakery ", "o").await.unwrap().unwrap();
        assert!(!found.created);
        assert_eq!(found.record_id, created.record_id);
        assert_eq!(found.display_name, "Acme Bakery");

        assert_eq!(repo.count_by_kind("o", ImportKind::Contact).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scoped_to_owner() {
        let (repo, resolver) = setup();
        let a = resolver.resolve("Acme", "owner-a").await.unwrap().unwrap();
        let b = resolver.resolve("Acme", "owner-b").await.unwrap().unwrap();

        assert!(a.created && b.created);
        assert_ne!(a.record_id, b.record_id);
        assert_eq!(
            repo.count_by_kind("owner-a", ImportKind::Contact).await.unwrap(),
            1
        );
    }
}
