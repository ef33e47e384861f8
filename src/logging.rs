//! Structured logging for the dashboard pipeline.
//!
//! Every record is one JSON line on stderr, so stdout carries only program
//! output. When a run directory can be created, records are also appended to:
//! - `events.jsonl` (info and above)
//! - `trace.jsonl` (trace and debug)
//!
//! and a `manifest.json` describes the run.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,      // Dataset generation
    Filter,    // Range and plant filtering
    Aggregate, // KPI, trend and heatmap derivation
    Alert,     // Threshold evaluation
    Session,   // Filter selection changes
    Asset,     // Branding asset loading
    System,    // Startup, config, server
    Profile,   // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Filter => "filter",
            Domain::Aggregate => "aggregate",
            Domain::Alert => "alert",
            Domain::Session => "session",
            Domain::Asset => "asset",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

type Sink = Option<Mutex<BufWriter<File>>>;

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Sink,
    trace: Sink,
}

fn open_sink(path: PathBuf) -> Sink {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn build_run_context(base: PathBuf, run_id: String) -> RunContext {
    let run_dir = base.join(&run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return RunContext {
            run_id,
            events: None,
            trace: None,
        };
    }

    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );

    RunContext {
        events: open_sink(run_dir.join("events.jsonl")),
        trace: open_sink(run_dir.join("trace.jsonl")),
        run_id,
    }
}

fn run_id_from_env() -> String {
    std::env::var("RUN_ID").unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()))
}

#[cfg(not(test))]
fn default_log_base() -> PathBuf {
    PathBuf::from("out/runs")
}

#[cfg(test)]
fn default_log_base() -> PathBuf {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    DIR.get_or_init(|| tempfile::TempDir::new().expect("test log dir"))
        .path()
        .to_path_buf()
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let base = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_log_base());
        build_run_context(base, run_id_from_env())
    })
}

/// Sets the run directory base before the first record is written. Returns
/// false if logging already started, in which case the existing base stays.
pub fn init_run_dir(base: impl Into<PathBuf>) -> bool {
    let mut fresh = false;
    let base = base.into();
    RUN_CONTEXT.get_or_init(|| {
        fresh = true;
        build_run_context(base, run_id_from_env())
    });
    fresh
}

fn write_line(sink: &Sink, line: &str) {
    if let Some(writer) = sink {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn build_entry(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    mut fields: Map<String, Value>,
) -> Value {
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry)
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_entry(&ctx.run_id, level, component, event, fields).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_dataset_generated(records: usize, plants: &[String], fingerprint: &str, seeded: bool) {
    log(
        Level::Info,
        Domain::Data,
        "dataset_generated",
        obj(&[
            ("records", json!(records)),
            ("plants", json!(plants)),
            ("fingerprint", v_str(fingerprint)),
            ("seeded", json!(seeded)),
        ]),
    );
}

pub fn log_filter_applied(start: &str, end: &str, plants: usize, kept: usize, total: usize) {
    log(
        Level::Debug,
        Domain::Filter,
        "filter_applied",
        obj(&[
            ("start", v_str(start)),
            ("end", v_str(end)),
            ("plants", json!(plants)),
            ("kept", json!(kept)),
            ("total", json!(total)),
        ]),
    );
}

pub fn log_selection_change(change: &str, plants: &[String], threshold: f64) {
    log(
        Level::Debug,
        Domain::Session,
        "selection_change",
        obj(&[
            ("change", v_str(change)),
            ("plants", json!(plants)),
            ("threshold", v_num(threshold)),
        ]),
    );
}

pub fn log_no_data(view: &str, reason: &str) {
    log(
        Level::Info,
        Domain::Aggregate,
        "no_data",
        obj(&[("view", v_str(view)), ("msg", v_str(reason))]),
    );
}

pub fn log_alert(plant: &str, max_consumption: f64, threshold: f64) {
    log(
        Level::Warn,
        Domain::Alert,
        "consumption_alert",
        obj(&[
            ("plant", v_str(plant)),
            ("max_consumption_mwh", v_num(max_consumption)),
            ("threshold", v_num(threshold)),
        ]),
    );
}

pub fn log_asset_fallback(path: &str, reason: &str) {
    log(
        Level::Warn,
        Domain::Asset,
        "asset_fallback",
        obj(&[("path", v_str(path)), ("msg", v_str(reason))]),
    );
}

pub fn log_view_summary(records: usize, alerts: usize, no_data: bool) {
    log(
        Level::Info,
        Domain::System,
        "view_computed",
        obj(&[
            ("records", json!(records)),
            ("alerts", json!(alerts)),
            ("no_data", json!(no_data)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    let bucket = (seq % 10_000) as f64 / 10_000.0;
                    bucket < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
