// ==========================================
// 批量导入管道 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::types::ImportKind;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const LOCALE: &str = "import.locale";
    pub const MAX_ROWS: &str = "import.max_rows";
    /// 完整键为 `import.key_prefix.<kind>`
    pub const KEY_PREFIX: &str = "import.key_prefix";
}

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_MAX_ROWS: usize = 10_000;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| config_error("<open>", e))?;
        ensure_schema(&conn).map_err(|e| config_error("<schema>", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn.lock().map_err(|e| config_error("<lock>", e))?;
            configure_sqlite_connection(&guard).map_err(|e| config_error("<open>", e))?;
            ensure_schema(&guard).map_err(|e| config_error("<schema>", e))?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| config_error(key, e))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| config_error(key, e))
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.conn.lock().map_err(|e| config_error(key, e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| config_error(key, e))?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ImportResult<BTreeMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| config_error("<snapshot>", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(|e| config_error("<snapshot>", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| config_error("<snapshot>", e))?;

        rows.collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|e| config_error("<snapshot>", e))
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

fn config_error(key: &str, err: impl std::fmt::Display) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_locale(&self) -> ImportResult<String> {
        self.get_config_or_default(config_keys::LOCALE, DEFAULT_LOCALE)
    }

    async fn get_max_rows(&self) -> ImportResult<usize> {
        let raw = self.get_config_or_default(
            config_keys::MAX_ROWS,
            &DEFAULT_MAX_ROWS.to_string(),
        )?;
        raw.trim()
            .parse::<usize>()
            .map_err(|e| config_error(config_keys::MAX_ROWS, format!("{}: {}", raw, e)))
    }

    async fn get_key_prefix(&self, kind: ImportKind) -> ImportResult<String> {
        let key = format!("{}.{}", config_keys::KEY_PREFIX, kind.slug());
        self.get_config_or_default(&key, kind.default_key_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = setup();
        assert_eq!(config.get_locale().await.unwrap(), "en");
        assert_eq!(config.get_max_rows().await.unwrap(), DEFAULT_MAX_ROWS);
        assert_eq!(
            config.get_key_prefix(ImportKind::Order).await.unwrap(),
            "ORD"
        );
    }

    #[tokio::test]
    async fn test_overrides() {
        let config = setup();
        config.set_config_value(config_keys::LOCALE, "zh-CN").unwrap();
        config.set_config_value(config_keys::MAX_ROWS, "50").unwrap();
        config
            .set_config_value("import.key_prefix.order", "SO")
            .unwrap();
        // 覆写两次，取最后一次
        config.set_config_value(config_keys::MAX_ROWS, "25").unwrap();

        assert_eq!(config.get_locale().await.unwrap(), "zh-CN");
        assert_eq!(config.get_max_rows().await.unwrap(), 25);
        assert_eq!(config.get_key_prefix(ImportKind::Order).await.unwrap(), "SO");
        assert_eq!(config.get_config_snapshot().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_max_rows() {
        let config = setup();
        config.set_config_value(config_keys::MAX_ROWS, "lots").unwrap();

        let err = config.get_max_rows().await.unwrap_err();
        assert!(matches!(err, ImportError::ConfigReadError { .. }));
    }
}
