//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::error;

use filecache::core::model::{CliError, ResultItem, ResultSet};
use filecache::core::render::{OutputFormat, RenderConfig, Renderer};
use filecache::{Activation, CacheConfig, CacheStore, DropInHost};

/// filecache - inspect and manipulate a filesystem-backed object cache.
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(
    author,
    version,
    about,
    long_about = r#"filecache reads and writes the same on-disk layout a host application
uses through the filecache library, so cached state can be inspected,
seeded or cleared between test runs.

Each command prints result records in the selected format (default: jsonl).

Examples:
    filecache --dir /tmp/cache set greeting '"hello"' --expire 60
    filecache --dir /tmp/cache get greeting
    filecache --dir /tmp/cache incr visits --group stats
    filecache --dir /tmp/cache flush
    filecache --dir /tmp/cache enable --host-dir ./wp-content
"#
)]
pub struct Cli {
    /// Cache base directory.
    #[arg(
        long,
        global = true,
        env = "FILECACHE_DIR",
        value_name = "DIR",
        long_help = "Cache base directory holding one subdirectory per group.\n\n\
Defaults to $TMPDIR/filecache when neither --dir nor FILECACHE_DIR is set."
    )]
    pub dir: Option<PathBuf>,

    /// Tenant prefix for non-global groups.
    #[arg(long, global = true, env = "FILECACHE_TENANT", default_value = "")]
    pub tenant: String,

    /// Groups shared across tenants (comma separated, repeatable).
    #[arg(long = "global-group", global = true, value_delimiter = ',', value_name = "GROUP")]
    pub global_groups: Vec<String>,

    /// Output format (jsonl/json/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- raw (bare values, one per line)"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up one or more keys.
    Get {
        #[arg(value_name = "KEY", required = true, num_args = 1..)]
        keys: Vec<String>,

        #[arg(short, long, default_value = "default")]
        group: String,

        /// Bypass the in-memory layer and re-read entry files.
        #[arg(long)]
        force: bool,
    },

    /// Store a value (parsed as JSON, falling back to a plain string).
    Set {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,

        #[arg(short, long, default_value = "default")]
        group: String,

        /// Seconds until the entry expires (0 = never).
        #[arg(short, long, default_value = "0", value_name = "SECS")]
        expire: i64,
    },

    /// Store a value only if the key is absent.
    Add {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,

        #[arg(short, long, default_value = "default")]
        group: String,

        #[arg(short, long, default_value = "0", value_name = "SECS")]
        expire: i64,
    },

    /// Store a value only if the key is present.
    Replace {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,

        #[arg(short, long, default_value = "default")]
        group: String,

        #[arg(short, long, default_value = "0", value_name = "SECS")]
        expire: i64,
    },

    /// Delete one or more keys.
    Delete {
        #[arg(value_name = "KEY", required = true, num_args = 1..)]
        keys: Vec<String>,

        #[arg(short, long, default_value = "default")]
        group: String,
    },

    /// Increment a counter (never below zero).
    Incr {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        by: i64,

        #[arg(short, long, default_value = "default")]
        group: String,
    },

    /// Decrement a counter (never below zero).
    Decr {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        by: i64,

        #[arg(short, long, default_value = "default")]
        group: String,
    },

    /// Delete every entry in every group.
    Flush,

    /// Delete every entry in one group.
    FlushGroup {
        #[arg(value_name = "GROUP")]
        group: String,
    },

    /// Show counters and per-group disk usage.
    Stats,

    /// Delete expired and corrupt entry files.
    Gc,

    /// Install this cache as the host's active object cache and clear it.
    Enable {
        #[arg(long, env = "FILECACHE_HOST_DIR", value_name = "DIR")]
        host_dir: PathBuf,
    },

    /// Remove this cache as the host's active object cache and clear it.
    Disable {
        #[arg(long, env = "FILECACHE_HOST_DIR", value_name = "DIR")]
        host_dir: PathBuf,
    },

    /// Report whether this cache is the host's active object cache.
    Status {
        #[arg(long, env = "FILECACHE_HOST_DIR", value_name = "DIR")]
        host_dir: PathBuf,
    },
}

/// Parse a command-line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn open_store(cli: &Cli) -> Result<CacheStore> {
    let mut config = CacheConfig::from_env()
        .tenant(cli.tenant.clone())
        .global_groups(cli.global_groups.iter().cloned());
    if let Some(dir) = &cli.dir {
        config.base_dir = dir.clone();
    }

    CacheStore::open(config).context("Failed to open cache store")
}

/// Run a command. Returns false when any mutating operation reported failure.
pub fn run(cli: Cli) -> Result<bool> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let mut store = open_store(&cli)?;
    let results = execute(&mut store, cli.command)?;

    let output = Renderer::with_config(render_config).render(&results);
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(results.all_ok())
}

fn execute(store: &mut CacheStore, command: Commands) -> Result<ResultSet> {
    let mut results = ResultSet::new();

    match command {
        Commands::Get { keys, group, force } => {
            for (key, value) in store.get_multiple(&keys, &group, force) {
                results.push(ResultItem::entry("get", &group, &key, value));
            }
        }

        Commands::Set {
            key,
            value,
            group,
            expire,
        } => {
            let ok = store.set(&key, parse_value(&value), &group, expire);
            results.push(ResultItem::outcome("set", ok).with_target(&group, &key));
        }

        Commands::Add {
            key,
            value,
            group,
            expire,
        } => {
            let ok = store.add(&key, parse_value(&value), &group, expire);
            results.push(ResultItem::outcome("add", ok).with_target(&group, &key));
        }

        Commands::Replace {
            key,
            value,
            group,
            expire,
        } => {
            let ok = store.replace(&key, parse_value(&value), &group, expire);
            results.push(ResultItem::outcome("replace", ok).with_target(&group, &key));
        }

        Commands::Delete { keys, group } => {
            for (key, ok) in store.delete_multiple(&keys, &group).items {
                results.push(ResultItem::outcome("delete", ok).with_target(&group, &key));
            }
        }

        Commands::Incr { key, by, group } => {
            results.push(counter_result("incr", store.incr(&key, by, &group), &group, &key));
        }

        Commands::Decr { key, by, group } => {
            results.push(counter_result("decr", store.decr(&key, by, &group), &group, &key));
        }

        Commands::Flush => {
            results.push(ResultItem::outcome("flush", store.flush()));
        }

        Commands::FlushGroup { group } => {
            let ok = store.flush_group(&group);
            results.push(ResultItem::outcome("flush-group", ok).with_group(&group));
        }

        Commands::Stats => {
            let stats = store.stats();
            results.push(ResultItem::stats(
                "stats",
                json!({
                    "base_dir": store.base_dir(),
                    "hits": stats.hits,
                    "misses": stats.misses,
                    "runtime_groups": stats.runtime_groups,
                    "runtime_entries": stats.runtime_entries,
                    "groups": store.census(),
                }),
            ));
        }

        Commands::Gc => {
            let removed = store.purge_expired();
            results.push(ResultItem::outcome("gc", true).with_data(json!({ "removed": removed })));
        }

        Commands::Enable { host_dir } => {
            let activation = Activation::new(DropInHost::new(host_dir));
            let item = match activation.enable(store) {
                Ok(()) => ResultItem::outcome("enable", true).with_data(drop_in_data(&activation)),
                Err(e) => activation_error("enable", &e),
            };
            results.push(item);
        }

        Commands::Disable { host_dir } => {
            let activation = Activation::new(DropInHost::new(host_dir));
            let item = match activation.disable(store) {
                Ok(()) => ResultItem::outcome("disable", true),
                Err(e) => activation_error("disable", &e),
            };
            results.push(item);
        }

        Commands::Status { host_dir } => {
            let activation = Activation::new(DropInHost::new(host_dir));
            let active = activation.is_active(store);
            results.push(ResultItem::status("status", active).with_data(drop_in_data(&activation)));
        }
    }

    Ok(results)
}

fn counter_result(op: &str, next: Option<i64>, group: &str, key: &str) -> ResultItem {
    let item = ResultItem::outcome(op, next.is_some()).with_target(group, key);
    match next {
        Some(n) => item.with_value(json!(n)),
        None => item,
    }
}

fn activation_error(op: &str, e: &anyhow::Error) -> ResultItem {
    error!(op, error = %format!("{:#}", e), "activation failed");
    ResultItem::error(op, CliError::new("ACTIVATION_FAILED", format!("{:#}", e)))
}

fn drop_in_data(activation: &Activation<DropInHost>) -> Value {
    use filecache::CacheHost;

    activation
        .host()
        .installed()
        .and_then(|d| serde_json::to_value(d).ok())
        .unwrap_or(Value::Null)
}
