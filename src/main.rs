// ==========================================
// 批量导入管道 - 命令行入口
// ==========================================
// 用法:
//   bizdesk-import --kind <orders|quotes|contacts|ingredients> --owner <id>
//                  --file <csv> [--mapping <json>] [--db <path>]
// 输出: ImportResult（JSON，stdout）；日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context};
use bizdesk_import::db::{default_db_path, open_sqlite_connection};
use bizdesk_import::domain::{ColumnOverride, ImportKind, ImportMapping};
use bizdesk_import::{logging, CancelFlag, ConfigManager, CsvParser, ImportTransaction};
use bizdesk_import::SqliteRecordRepository;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const USAGE: &str = "usage: bizdesk-import --kind <orders|quotes|contacts|ingredients> \
--owner <id> --file <csv> [--mapping <json>] [--db <path>]";

struct CliArgs {
    kind: ImportKind,
    owner_id: String,
    file: PathBuf,
    mapping_json: Option<String>,
    db_path: String,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut kind = None;
    let mut owner_id = None;
    let mut file = None;
    let mut mapping_json = None;
    let mut db_path = None;

    let mut args = args;
    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| anyhow!("missing value for {}\n{}", flag, USAGE))
        };
        match flag.as_str() {
            "--kind" => kind = Some(value()?.parse::<ImportKind>().map_err(|e| anyhow!(e))?),
            "--owner" => owner_id = Some(value()?),
            "--file" => file = Some(PathBuf::from(value()?)),
            "--mapping" => mapping_json = Some(value()?),
            "--db" => db_path = Some(value()?),
            "-h" | "--help" => bail!("{}", USAGE),
            other => bail!("unknown argument: {}\n{}", other, USAGE),
        }
    }

    Ok(CliArgs {
        kind: kind.ok_or_else(|| anyhow!("--kind is required\n{}", USAGE))?,
        owner_id: owner_id.ok_or_else(|| anyhow!("--owner is required\n{}", USAGE))?,
        file: file.ok_or_else(|| anyhow!("--file is required\n{}", USAGE))?,
        mapping_json,
        db_path: db_path.unwrap_or_else(default_db_path),
    })
}

/// 构建列映射：默认字段表 + 可选 JSON 部分覆写（{"field": ColumnOverride}）
fn build_mapping(kind: ImportKind, mapping_json: Option<&str>) -> anyhow::Result<ImportMapping> {
    let Some(raw) = mapping_json else {
        return Ok(ImportMapping::for_kind(kind));
    };

    let overrides: BTreeMap<String, ColumnOverride> =
        serde_json::from_str(raw).context("invalid --mapping JSON")?;
    ImportMapping::with_overrides(kind, overrides)
        .map_err(|field| anyhow!("--mapping names unknown field: {}", field))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = parse_args(std::env::args().skip(1))?;
    tracing::info!(
        version = bizdesk_import::VERSION,
        db = %args.db_path,
        kind = %args.kind,
        "启动批量导入"
    );

    let mapping = build_mapping(args.kind, args.mapping_json.as_deref())?;
    let batch = CsvParser.parse_path(&args.file)?;

    // 仓储与配置共享同一连接
    let conn = open_sqlite_connection(&args.db_path)
        .with_context(|| format!("cannot open database {}", args.db_path))?;
    let conn = Arc::new(Mutex::new(conn));

    let records = Arc::new(SqliteRecordRepository::from_connection(conn.clone())?);
    let config = ConfigManager::from_connection(conn)?;

    // Ctrl-C 在行间取消
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("收到中断信号，停止导入");
                cancel.cancel();
            }
        });
    }

    let mut transaction = ImportTransaction::new(records, config);
    let result = transaction
        .run(&batch, &mapping, &args.owner_id, Some(&cancel))
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!("{}", result.message);
    Ok(())
}
