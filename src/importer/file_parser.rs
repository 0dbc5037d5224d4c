// ==========================================
// 批量导入管道 - CSV 适配器
// ==========================================
// 职责: CSV 文件 → ImportBatch（表头 + 有序原始行）
// 约束: 仅做解析，不做映射与归一化
// ==========================================

use crate::domain::import::{ImportBatch, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub struct CsvParser;

impl CsvParser {
    /// 解析 CSV 文件
    ///
    /// # 返回
    /// - Err(FileNotFound): 文件不存在
    /// - Err(UnsupportedFormat): 扩展名不是 .csv
    pub fn parse_path(&self, path: &Path) -> ImportResult<ImportBatch> {
        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let batch = self.parse_reader(file)?;
        debug!(path = %path.display(), rows = batch.len(), "CSV 解析完成");
        Ok(batch)
    }

    /// 解析任意 CSV 数据源（首行为表头）
    ///
    /// # 规则
    /// - 行号取数据行在文件中的位置（表头之后从 1 起，空白行也计数）
    /// - 表头重名 → Err(CsvParseError)
    pub fn parse_reader<R: Read>(&self, source: R) -> ImportResult<ImportBatch> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !h.is_empty() && !seen.insert(h.as_str())) {
            return Err(ImportError::CsvParseError(format!(
                "duplicate column header: {}",
                dup
            )));
        }

        let mut rows = Vec::new();
        let mut row_numbers = Vec::new();
        for (record_idx, result) in reader.records().enumerate() {
            let record = result?;
            // 表头位于第 1 行
            let row_number = record
                .position()
                .map(|pos| pos.line().saturating_sub(1) as usize)
                .unwrap_or(record_idx + 1);
            let mut row: RawRow = RawRow::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(row);
            row_numbers.push(row_number);
        }

        Ok(ImportBatch::with_row_numbers(headers, rows, row_numbers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_reader_trims_headers_and_cells() {
        let data = " Quote # , Customer \nQ-1,  Acme \nQ-2,Globex,extra\n";
        let batch = CsvParser.parse_reader(data.as_bytes()).unwrap();

        assert_eq!(batch.headers, vec!["Quote #", "Customer"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows[0].get("Customer"), Some(&"Acme".to_string()));
        // 多余列被忽略
        assert_eq!(batch.rows[1].len(), 2);
    }

    #[test]
    fn test_parse_reader_skips_blank_rows() {
        let data = "Name,Email\nAda,ada@example.com\n,\nGrace,\n";
        let batch = CsvParser.parse_reader(data.as_bytes()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows[1].get("Name"), Some(&"Grace".to_string()));
        // 空白行跳过后仍保留源行号
        assert_eq!(batch.row_numbers, vec![1, 3]);
    }

    #[test]
    fn test_parse_reader_keeps_numbers_after_empty_lines() {
        let data = "Name
Ada


Grace
";
        let batch = CsvParser.parse_reader(data.as_bytes()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.row_numbers, vec![1, 4]);
    }

    #[test]
    fn test_parse_reader_rejects_duplicate_headers() {
        let data = "Name,Email,name,Name
Ada,a@example.com,x,y
";
        let err = CsvParser.parse_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::CsvParseError(ref m) if m.contains("Name")));
    }

    #[test]
    fn test_parse_path_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Name,Unit").unwrap();
        writeln!(temp_file, "Flour,kg").unwrap();

        let batch = CsvParser.parse_path(temp_file.path()).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_parse_path_errors() {
        let err = CsvParser
            .parse_path(Path::new("non_existent.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));

        let temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = CsvParser.parse_path(temp_file.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
