// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::types::ImportKind;

/// 翻译消息（带参数，指定语言，不依赖全局语言）
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    interpolate(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn interpolate(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 生成导入结果摘要消息
///
/// 例: "Successfully imported 8 quotes with 2 errors."
pub fn import_summary(locale: &str, kind: ImportKind, success: usize, errors: usize) -> String {
    let plural = if success == 1 { "one" } else { "other" };
    let noun = t_in(locale, &format!("kind.{}.{}", kind.slug(), plural), &[]);

    let key = match errors {
        0 => "import.summary",
        1 => "import.summary_with_error",
        _ => "import.summary_with_errors",
    };
    t_in(
        locale,
        key,
        &[
            ("count", &success.to_string()),
            ("kind", &noun),
            ("errors", &errors.to_string()),
        ],
    )
}
