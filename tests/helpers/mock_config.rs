// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use bizdesk_import::config::ImportConfigReader;
use bizdesk_import::domain::ImportKind;
use bizdesk_import::importer::ImportResult;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub locale: String,
    pub max_rows: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            max_rows: 10_000,
        }
    }
}

impl MockConfig {
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_locale(&self) -> ImportResult<String> {
        Ok(self.locale.clone())
    }

    async fn get_max_rows(&self) -> ImportResult<usize> {
        Ok(self.max_rows)
    }

    async fn get_key_prefix(&self, kind: ImportKind) -> ImportResult<String> {
        Ok(kind.default_key_prefix().to_string())
    }
}
