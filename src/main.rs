//! QuickCache snapshot inspector
//!
//! Loads a cache snapshot and prints its valid keys, values and metrics as
//! JSON. Configuration comes from `QUICKCACHE_*` environment variables; the
//! snapshot format follows the file extension when it names one.
//!
//! Usage: `quickcache <snapshot>`
//!
//! Bincode snapshots are not self-describing, so their values are read as
//! strings. A bincode snapshot holding any other value type cannot be inspected.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickcache::{Config, QuickCache, SerializerKind};

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(snapshot) = env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: quickcache <snapshot>\n\nbincode (.bin) snapshots must hold string values");
    };

    let mut config = Config::from_env();
    config.cleanup_interval = Duration::ZERO;
    if let Some(kind) = serializer_for(&snapshot) {
        config.serializer = kind;
    }
    config.validate().context("invalid configuration")?;

    info!(
        "Inspecting {:?} with {} serializer",
        snapshot, config.serializer
    );

    let report = match config.serializer {
        SerializerKind::Json => inspect::<serde_json::Value>(config, &snapshot)?,
        SerializerKind::Bincode => inspect::<String>(config, &snapshot)?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Serializer named by the file extension, if any.
fn serializer_for(path: &Path) -> Option<SerializerKind> {
    match path.extension()?.to_str()? {
        "json" => Some(SerializerKind::Json),
        "bin" => Some(SerializerKind::Bincode),
        _ => None,
    }
}

fn inspect<V>(config: Config, snapshot: &Path) -> anyhow::Result<serde_json::Value>
where
    V: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    let cache: QuickCache<V> = QuickCache::new(config)?;
    let kind = cache.config().serializer;
    cache.load(Some(snapshot)).with_context(|| {
        format!(
            "failed to load snapshot {} ({})",
            snapshot.display(),
            load_hint(kind)
        )
    })?;

    let keys = cache.keys();
    let values = cache.get_many(&keys);
    let entries: serde_json::Map<String, serde_json::Value> = keys
        .iter()
        .filter_map(|key| {
            let value = serde_json::to_value(values.get(key)?).ok()?;
            Some((key.clone(), value))
        })
        .collect();

    Ok(json!({
        "snapshot": snapshot.display().to_string(),
        "serializer": kind.as_str(),
        "valid_keys": keys,
        "entries": entries,
        "metrics": cache.metrics_snapshot(),
    }))
}

/// How snapshot values are decoded for a given format.
fn load_hint(kind: SerializerKind) -> &'static str {
    match kind {
        SerializerKind::Json => "values are read as JSON",
        SerializerKind::Bincode => {
            "bincode values are read as strings, snapshots of other value types cannot be inspected"
        }
    }
}
