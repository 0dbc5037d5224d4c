// ==========================================
// 批量导入管道 - 字段映射器实现
// ==========================================
// 职责: 标准字段 → 源文件列名（主列优先，别名兜底）
// ==========================================

use crate::domain::import::{ImportMapping, RawRow, ResolvedMapping};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FieldMapper as FieldMapperTrait;
use tracing::{debug, warn};

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn resolve(
        &self,
        mapping: &ImportMapping,
        headers: &[String],
    ) -> ImportResult<ResolvedMapping> {
        let mut resolved = ResolvedMapping::default();
        let mut missing = Vec::new();

        for field in &mapping.fields {
            let spec = &field.spec;

            // 主列：精确匹配（区分大小写）
            let primary = spec
                .primary_column
                .as_deref()
                .filter(|col| headers.iter().any(|h| h == col));

            let column = primary.or_else(|| {
                spec.alternative_names
                    .iter()
                    .find_map(|alt| Self::match_header(headers, alt))
            });

            match column {
                Some(col) => {
                    debug!(field = %field.field, column = %col, "字段映射命中");
                    resolved.insert(&field.field, col);
                }
                None if spec.required => {
                    warn!(field = %field.field, "必填字段无匹配列");
                    missing.push(spec.display_name.clone());
                }
                None => {
                    debug!(field = %field.field, "可选字段无匹配列");
                }
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::MissingRequiredField { fields: missing });
        }

        Ok(resolved)
    }

    fn extract<'a>(&self, resolved: &ResolvedMapping, field: &str, row: &'a RawRow) -> &'a str {
        resolved
            .column_for(field)
            .and_then(|col| row.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl FieldMapper {
    /// 别名匹配（忽略大小写、去首尾空白），返回文件自身的表头文本
    fn match_header<'h>(headers: &'h [String], alias: &str) -> Option<&'h str> {
        let wanted = alias.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        headers
            .iter()
            .find(|h| h.trim().to_lowercase() == wanted)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ColumnSpec;
    use crate::domain::types::ImportKind;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alias_match_ignores_case_and_whitespace() {
        let mapping = ImportMapping::for_kind(ImportKind::Quote);
        let resolved = FieldMapper
            .resolve(&mapping, &headers(&["  quote #  ", "CLIENT", "Total"]))
            .unwrap();

        assert_eq!(resolved.column_for("quote_number"), Some("  quote #  "));
        assert_eq!(resolved.column_for("customer"), Some("CLIENT"));
        assert_eq!(resolved.column_for("amount"), Some("Total"));
        assert!(!resolved.contains("valid_until"));
    }

    #[test]
    fn test_primary_wins_over_alias() {
        // "Quote Number" 也能被别名命中，但主列声明优先
        let mapping =
            ImportMapping::for_kind(ImportKind::Quote).with_primary("quote_number", "Ref");
        let resolved = FieldMapper
            .resolve(&mapping, &headers(&["Quote Number", "Ref"]))
            .unwrap();

        assert_eq!(resolved.column_for("quote_number"), Some("Ref"));
    }

    #[test]
    fn test_primary_is_case_sensitive_then_falls_back() {
        let mapping =
            ImportMapping::for_kind(ImportKind::Quote).with_primary("quote_number", "ref");
        let resolved = FieldMapper
            .resolve(&mapping, &headers(&["Ref", "Quote No"]))
            .unwrap();

        // 主列大小写不符 → 走别名
        assert_eq!(resolved.column_for("quote_number"), Some("Quote No"));
    }

    #[test]
    fn test_alias_declared_order() {
        let mut mapping = ImportMapping::for_kind(ImportKind::Contact);
        mapping.fields[0].spec = ColumnSpec {
            primary_column: None,
            alternative_names: vec!["Contact".to_string(), "Full Name".to_string()],
            required: true,
            display_name: "Name".to_string(),
        };
        let resolved = FieldMapper
            .resolve(&mapping, &headers(&["Full Name", "Contact"]))
            .unwrap();

        assert_eq!(resolved.column_for("name"), Some("Contact"));
    }

    #[test]
    fn test_missing_required_lists_all() {
        let mapping = ImportMapping::for_kind(ImportKind::Quote).with_required("quote_date", true);
        let err = FieldMapper
            .resolve(&mapping, &headers(&["Customer"]))
            .unwrap_err();

        match err {
            ImportError::MissingRequiredField { fields } => {
                assert_eq!(fields, vec!["Quote Number".to_string(), "Quote Date".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extract_missing_column_is_empty() {
        let mapping = ImportMapping::for_kind(ImportKind::Contact);
        let resolved = FieldMapper
            .resolve(&mapping, &headers(&["Name", "Email"]))
            .unwrap();

        let mut row = RawRow::new();
        row.insert("Name".to_string(), "Ada".to_string());

        assert_eq!(FieldMapper.extract(&resolved, "name", &row), "Ada");
        assert_eq!(FieldMapper.extract(&resolved, "email", &row), "");
        assert_eq!(FieldMapper.extract(&resolved, "phone", &row), "");
    }
}
