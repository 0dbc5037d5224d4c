// ==========================================
// 批量导入管道 - 值归一化器实现
// ==========================================
// 职责: 日期 / 金额 / 布尔 / 文本 的启发式解析
// 约束: 全部为全函数，非法输入返回显式缺省（None / 0 / false）
// ==========================================

use crate::importer::importer_trait::ValueNormalizer as ValueNormalizerTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `May 19, 2025` / `May 19 2025` / `Sep. 3rd, 2025`
static MONTH_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})(?:\D|$)").unwrap()
});

/// `19 May 2025` / `19 May, 2025`
static DAY_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\.?,?\s+(\d{4})(?:\D|$)").unwrap()
});

/// `19/05/2025` / `19-05-2025` / `19.05.2025`（日在前）
static DAY_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})(?:\D|$)").unwrap());

/// `2025/05/19` / `2025-05-19`（允许尾随时间部分）
static YEAR_MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})(?:\D|$)").unwrap());

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// 布尔肯定集合
const AFFIRMATIVE: [&str; 7] = ["true", "yes", "y", "1", "paid", "complete", "completed"];

/// 兜底解析的日期时间格式
const FALLBACK_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y%m%d%H%M%S"];

/// 兜底解析的纯日期格式
const FALLBACK_DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%A, %B %d, %Y"];

pub struct ValueNormalizer;

impl ValueNormalizerTrait for ValueNormalizer {
    fn normalize_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        // 按固定顺序尝试结构化格式，首个结构匹配即采用（不打分）
        if let Some(caps) = MONTH_NAME_FIRST.captures(value) {
            if let Some(month) = month_from_name(&caps[1]) {
                return ymd(&caps, 3, month, 2);
            }
        }
        if let Some(caps) = DAY_MONTH_NAME.captures(value) {
            if let Some(month) = month_from_name(&caps[2]) {
                return ymd(&caps, 3, month, 1);
            }
        }
        if let Some(caps) = DAY_MONTH_YEAR.captures(value) {
            let month = caps[2].parse().ok()?;
            return ymd(&caps, 3, month, 1);
        }
        if let Some(caps) = YEAR_MONTH_DAY.captures(value) {
            let month = caps[2].parse().ok()?;
            return ymd(&caps, 1, month, 3);
        }

        parse_generic(value)
    }

    fn parse_currency(&self, value: &str) -> Option<f64> {
        let cleaned: String = value
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        if cleaned.is_empty() {
            return None;
        }

        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn normalize_boolean(&self, value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        AFFIRMATIVE.contains(&lowered.as_str())
    }

    fn normalize_text(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// 月份名（全称或三字母缩写，忽略大小写）→ 1..=12
fn month_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|full| *full == lowered || (lowered.len() == 3 && full.starts_with(&lowered)))
        .map(|idx| idx as u32 + 1)
}

/// 由捕获组组装日期；结构匹配但日历非法（如 31/02）→ None
fn ymd(caps: &Captures<'_>, year_idx: usize, month: u32, day_idx: usize) -> Option<NaiveDate> {
    let year: i32 = caps[year_idx].parse().ok()?;
    let day: u32 = caps[day_idx].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 通用兜底解析（RFC 3339 / RFC 2822 / 常见 ISO 变体 / YYYYMMDD）
fn parse_generic(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_date_formats_are_equivalent() {
        let n = ValueNormalizer;
        let expected = date(2025, 5, 19);
        for input in [
            "May 19, 2025",
            "19 May 2025",
            "19/05/2025",
            "19-05-2025",
            "2025/05/19",
            "19.05.2025",
            "2025-5-19",
        ] {
            assert_eq!(n.normalize_date(input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_date_month_names() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date("sep 3, 2024"), date(2024, 9, 3));
        assert_eq!(n.normalize_date("SEPTEMBER 3 2024"), date(2024, 9, 3));
        assert_eq!(n.normalize_date("3 Dec. 2024"), date(2024, 12, 3));
        assert_eq!(n.normalize_date("Jan 1st, 2026"), date(2026, 1, 1));
    }

    #[test]
    fn test_date_day_first_not_month_first() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date("03/04/2025"), date(2025, 4, 3));
    }

    #[test]
    fn test_date_time_component_discarded() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date("2025-05-19T23:59:59Z"), date(2025, 5, 19));
        assert_eq!(n.normalize_date("19/05/2025 10:30"), date(2025, 5, 19));
        assert_eq!(
            n.normalize_date("Mon, 19 May 2025 10:00:00 +0000"),
            date(2025, 5, 19)
        );
    }

    #[test]
    fn test_date_fallback_compact() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date("20250519"), date(2025, 5, 19));
        assert_eq!(n.normalize_date("Monday, May 19, 2025"), date(2025, 5, 19));
    }

    #[test]
    fn test_date_invalid_inputs() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date(""), None);
        assert_eq!(n.normalize_date("   "), None);
        assert_eq!(n.normalize_date("soon"), None);
        assert_eq!(n.normalize_date("31/02/2025"), None);
        assert_eq!(n.normalize_date("Foo 12, 2025"), None);
        assert_eq!(n.normalize_date("Sept 12, 2025"), None);
    }

    #[test]
    fn test_currency_equivalence() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_currency("$1,234.56"), 1234.56);
        assert_eq!(n.normalize_currency("1234.56"), 1234.56);
        assert_eq!(n.normalize_currency("USD 1234.56"), 1234.56);
        assert_eq!(n.normalize_currency("-12.5"), -12.5);
    }

    #[test]
    fn test_currency_invalid_is_zero() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_currency(""), 0.0);
        assert_eq!(n.normalize_currency("n/a"), 0.0);
        assert_eq!(n.normalize_currency("1.2.3"), 0.0);
        assert_eq!(n.parse_currency("free"), None);
        assert_eq!(n.parse_currency("€ 9"), Some(9.0));
    }

    #[test]
    fn test_boolean_mapping() {
        let n = ValueNormalizer;
        for yes in ["Yes", "TRUE", "1", "Paid", " y ", "Completed", "complete"] {
            assert!(n.normalize_boolean(yes), "input: {yes}");
        }
        for no in ["No", "", "0", "maybe", "false", "unpaid"] {
            assert!(!n.normalize_boolean(no), "input: {no}");
        }
    }

    #[test]
    fn test_normalize_text() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_text("  hello  "), Some("hello".to_string()));
        assert_eq!(n.normalize_text("   "), None);
    }
}
