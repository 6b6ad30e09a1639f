//! CLI command implementations

use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::batch::BatchOp;
use crate::recovery::{ReplayConfig, ReplayStats, ReplayedBatches, WalReplayer};
use crate::wal::{WalEntry, WalReader, WalRecord};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{write_json, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Inspect { wal } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            inspect(&wal, &mut out)?;
        }
        Command::Replay { config } => {
            replay(&config)?;
        }
    }
    Ok(())
}

/// Write one JSON line per WAL record to `out`.
///
/// Stops at the first corrupted record, after printing every record
/// before it. Returns the number of records printed.
pub fn inspect<W: Write>(wal_path: &Path, out: &mut W) -> CliResult<u64> {
    let mut reader = WalReader::open(wal_path)?;
    let mut count = 0u64;

    while let Some(record) = reader.read_next()? {
        write_json(out, &describe_record(&record)?)?;
        count += 1;
    }

    Ok(count)
}

/// Replay the WAL named by the configuration and print the statistics
pub fn replay(config_path: &Path) -> CliResult<ReplayStats> {
    let config = ReplayConfig::load(config_path)?;
    let running_ts_sz = config.running_size_map();

    let mut reader = WalReader::open(&config.wal_path)?;
    let mut sink = ReplayedBatches::new();

    let stats = WalReplayer::replay(
        &mut reader,
        &mut sink,
        &running_ts_sz,
        config.consistency_mode,
    )?;

    write_response(serde_json::to_value(&stats)?)?;

    Ok(stats)
}

fn describe_record(record: &WalRecord) -> CliResult<Value> {
    let value = match record.entry()? {
        WalEntry::TimestampSize(sizes) => {
            let entries: Vec<Value> = sizes
                .entries()
                .iter()
                .map(|(cf, ts_sz)| json!({ "column_family": cf, "timestamp_size": ts_sz }))
                .collect();
            json!({
                "sequence": record.sequence_number,
                "type": record.record_type.as_str(),
                "timestamp_sizes": entries,
            })
        }
        WalEntry::Batch(batch) => {
            let ops: Vec<Value> = batch.ops().iter().map(describe_op).collect();
            json!({
                "sequence": record.sequence_number,
                "type": record.record_type.as_str(),
                "column_families": batch.column_family_ids(),
                "operations": ops,
            })
        }
    };
    Ok(value)
}

fn describe_op(op: &BatchOp) -> Value {
    let mut value = json!({ "kind": op.kind().as_str() });
    if let Some(cf) = op.column_family() {
        value["column_family"] = json!(cf);
    }
    match op {
        BatchOp::Put { key, .. }
        | BatchOp::Delete { key, .. }
        | BatchOp::SingleDelete { key, .. }
        | BatchOp::Merge { key, .. }
        | BatchOp::PutBlobIndex { key, .. } => {
            value["key_len"] = json!(key.len());
        }
        BatchOp::DeleteRange {
            begin_key, end_key, ..
        } => {
            value["begin_key_len"] = json!(begin_key.len());
            value["end_key_len"] = json!(end_key.len());
        }
        _ => {}
    }
    value
}
