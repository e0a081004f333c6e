//! Shared test utilities for integration tests
//!
//! Fixed clock and timezone, a content fixture, and environment isolation for
//! tests that load configuration.

use chrono::{FixedOffset, TimeZone, Utc};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use trellis::dates::{Clock, DateSettings};
use trellis::generators::TimelineGenerator;
use trellis::{ContentStore, Dispatcher, MemoryStore, Resolver};

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 4] = ["HOME", "XDG_CONFIG_HOME", "TRELLIS_ENV", "TRELLIS__URLS__BASE_URL"];

/// 2020-07-15 12:00 local time at UTC-6
pub fn fixed_dates() -> DateSettings {
    DateSettings::new(
        FixedOffset::west_opt(6 * 3600).unwrap(),
        Clock::Fixed(Utc.with_ymd_and_hms(2020, 7, 15, 18, 0, 0).unwrap()),
    )
}

pub fn fixture() -> Value {
    json!({
        "items": [
            {"id": "n1", "type": "news", "TS": 1594828800000i64, "name": "Launch", "kind": "updated",
             "image": {"url": "launch.jpg", "width": 800}},
            {"id": "n2", "type": "news", "TS": 1594821600000i64, "name": "Launch", "kind": "new",
             "image": "launch-thumb.jpg"},
            {"id": "n3", "type": "news", "TS": 1594756800000i64, "name": "Recap", "kind": "new",
             "featured": true},
            {"id": "n4", "type": "news", "TS": 1594324800000i64, "name": "Preview", "kind": "new"},
            {"id": "e1", "type": "event", "TS": 1592665200000i64, "title": "Summer fair"},
            {"id": "e2", "type": "event", "TS": 1575558000000i64, "title": "Winter fair"},
            {"id": "home--top", "type": "list", "Data": {"items": ["n3", "e1"]}},
            {"id": "about", "type": "page",
             "Data": {"title": "About", "publishUp": "2019-12-05T15:00:00Z"}}
        ]
    })
}

pub fn fixture_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_value(fixture()).unwrap())
}

pub fn resolver_for(store: Arc<dyn ContentStore>) -> Resolver {
    let dates = fixed_dates();
    Resolver::new(Dispatcher::new(store, TimelineGenerator::new(dates)), dates)
}

pub fn resolver() -> Resolver {
    resolver_for(fixture_store())
}

/// Isolated environment for configuration loading; restores on drop
pub struct IsolatedEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _guard: MutexGuard<'static, ()>,
}

/// Point the global config directory at `config_home` and clear TRELLIS_* overrides
pub fn isolate_env(config_home: &Path) -> IsolatedEnv {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved = ISOLATED_VARS
        .iter()
        .map(|key| (*key, std::env::var(key).ok()))
        .collect();
    for key in ISOLATED_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("XDG_CONFIG_HOME", config_home);
    IsolatedEnv {
        saved,
        _guard: guard,
    }
}

impl Drop for IsolatedEnv {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}
