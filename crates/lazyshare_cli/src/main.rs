//! CLI demo entry point.
//!
//! # Responsibility
//! - Show one process-wide record store shared by concurrent callers.
//! - Show a caching proxy serving repeated reads from memory.
//!
//! Config path comes from the first argument or `LAZYSHARE_CONFIG`;
//! defaults apply when neither is set.

use lazyshare_core::{
    core_version, init_logging, open_store_in_memory, CacheStats, CachingProxy, CoreConfig,
    SingletonHolder, SqliteRecordStore, StoreResult,
};
use log::info;
use std::process::ExitCode;
use std::thread;

const DEMO_THREADS: usize = 5;
const SEEDED_KEYS: &[&str] = &["ABC", "XYZ"];

static SHARED_STORE: SingletonHolder<SqliteRecordStore> = SingletonHolder::new();

/// Returns the shared store and whether this call ran its constructor.
fn shared_store() -> StoreResult<(&'static SqliteRecordStore, bool)> {
    acquire_reporting(&SHARED_STORE, || -> StoreResult<SqliteRecordStore> {
        let store = open_store_in_memory()?;
        for key in SEEDED_KEYS {
            store.put(key, &format!("Data for key {key}"))?;
        }
        Ok(store)
    })
}

/// Like `get_or_try_init`, but also reports whether `ctor` ran for this caller.
fn acquire_reporting<T, E>(
    holder: &SingletonHolder<T>,
    ctor: impl FnOnce() -> Result<T, E>,
) -> Result<(&T, bool), E> {
    let mut created = false;
    let instance = holder.get_or_try_init(|| {
        created = true;
        ctor()
    })?;
    Ok((instance, created))
}

fn creation_label(created: bool) -> &'static str {
    if created {
        "created"
    } else {
        "already created"
    }
}

/// Names where one `get` was answered from, given counters around it.
fn lookup_source(before: CacheStats, after: CacheStats) -> &'static str {
    if after.hits > before.hits {
        "cache hit"
    } else {
        "fetched from origin"
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("lazyshare: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = load_config()?;
    if let Some(log_dir) = &config.logging.log_dir {
        init_logging(&config.logging.level, &log_dir.to_string_lossy())?;
    }
    println!("lazyshare_core version={}", core_version());

    println!("--- Shared store ---");
    let handles: Vec<_> = (0..DEMO_THREADS)
        .map(|index| {
            thread::spawn(move || -> Result<usize, String> {
                let (store, created) = shared_store().map_err(|err| err.to_string())?;
                println!("thread {index}: shared store {}", creation_label(created));
                Ok(store as *const SqliteRecordStore as usize)
            })
        })
        .collect();

    let mut addresses = Vec::with_capacity(DEMO_THREADS);
    for handle in handles {
        let address = handle
            .join()
            .map_err(|_| "shared store thread panicked".to_string())??;
        addresses.push(address);
    }
    addresses.sort_unstable();
    addresses.dedup();
    let distinct = addresses.len();
    println!("distinct instances: {distinct}");
    info!("event=demo_singleton module=cli status=ok threads={DEMO_THREADS} distinct={distinct}");

    let (store, _) = shared_store().map_err(|err| err.to_string())?;
    let proxy = CachingProxy::from_config(store, &config.cache);
    for (label, key) in [
        ("First request", "ABC"),
        ("Second request (same key)", "ABC"),
        ("Third request (different key)", "XYZ"),
    ] {
        println!();
        println!("--- {label} ---");
        let before = proxy.stats();
        let value = proxy
            .get(&key.to_string())
            .map_err(|err| format!("fetch `{key}` failed: {err}"))?;
        println!("{}: {value}", lookup_source(before, proxy.stats()));
    }

    let stats = proxy.stats();
    println!();
    println!(
        "cache policy={} entries={} hits={} misses={} fetch_errors={}",
        proxy.policy().as_str(),
        proxy.len(),
        stats.hits,
        stats.misses,
        stats.fetch_errors
    );
    Ok(())
}

fn load_config() -> Result<CoreConfig, String> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LAZYSHARE_CONFIG").ok())
        .filter(|raw| !raw.trim().is_empty());
    match path {
        Some(path) => CoreConfig::load(path.trim()).map_err(|err| err.to_string()),
        None => Ok(CoreConfig::default()),
    }
}
