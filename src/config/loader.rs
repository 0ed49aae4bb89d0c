//! Configuration loading and environment parsing.

use super::validation::validate_config;
use super::Config;
use anyhow::Context;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Prefix for whole-document sources and per-field overrides.
pub const ENV_PREFIX: &str = "TICTAC_LOBBY";

const CONFIG_FILE_NAME: &str = "config.json";

/// Load configuration with the following precedence (highest first):
/// 1) `TICTAC_LOBBY_CONFIG_JSON` env var containing raw JSON
/// 2) If `TICTAC_LOBBY_CONFIG_STDIN=true/1/yes`, read JSON from stdin
/// 3) File pointed to by `TICTAC_LOBBY_CONFIG_PATH`
/// 4) `config.json` in the current working directory
/// 5) `config.json` next to the executable
/// 6) Defaults compiled into the binary
///
/// Single fields are then overridden by `TICTAC_LOBBY__SECTION__FIELD` variables,
/// e.g. `TICTAC_LOBBY__PORT=8080` or `TICTAC_LOBBY__LOGGING__LEVEL=debug`.
///
/// Read and parse failures are reported on stderr and the offending source is
/// skipped. Validation problems are reported but not returned; callers that
/// need a hard failure run [`validate_config`] themselves.
#[must_use]
pub fn load() -> Config {
    let defaults = Config::default();
    let mut merged = serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(Map::new()));

    // Later sources have lower precedence, so merge from the bottom up.
    let mut layers = Vec::new();

    if let Ok(json) = env::var(format!("{ENV_PREFIX}_CONFIG_JSON")) {
        layers.push(parse_json_document(&json, "TICTAC_LOBBY_CONFIG_JSON"));
    }

    if env::var(format!("{ENV_PREFIX}_CONFIG_STDIN")).is_ok_and(|val| env_var_truthy(&val)) {
        let mut buf = String::new();
        match std::io::stdin().read_to_string(&mut buf) {
            Ok(_) => layers.push(parse_json_document(&buf, "stdin")),
            Err(e) => eprintln!("Failed to read config from stdin: {e}"),
        }
    }

    if let Ok(path) = env::var(format!("{ENV_PREFIX}_CONFIG_PATH")) {
        layers.push(read_file_source(&PathBuf::from(path)));
    }

    layers.push(read_file_source(Path::new(CONFIG_FILE_NAME)));

    if let Some(beside_exe) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
    {
        layers.push(read_file_source(&beside_exe));
    }

    for layer in layers.into_iter().rev().flatten() {
        merge_values(&mut merged, layer);
    }

    apply_env_overrides(&mut merged, env::vars());

    let config = match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config; using defaults: {e}");
            defaults
        }
    };

    if let Err(e) = validate_config(&config) {
        eprintln!("Configuration validation error: {e}");
    }

    config
}

/// Strictly load a single JSON file on top of the defaults.
pub fn load_from_file(path: &Path) -> anyhow::Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let overlay: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    let mut merged = serde_json::to_value(Config::default())?;
    merge_values(&mut merged, overlay);
    serde_json::from_value(merged).context("config file does not match the expected schema")
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }

    serde_json::from_str(raw)
        .map_err(|err| eprintln!("Failed to parse config from {label}: {err}"))
        .ok()
}

fn read_file_source(path: &Path) -> Option<Value> {
    if path.as_os_str().is_empty() || !path.exists() {
        return None;
    }

    match fs::read_to_string(path) {
        Ok(contents) => parse_json_document(&contents, &format!("file {}", path.display())),
        Err(err) => {
            eprintln!("Failed to read config from {}: {err}", path.display());
            None
        }
    }
}

/// Deep-merge `source` into `target`; objects merge key by key, anything else replaces.
pub(crate) fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value;
        }
    }
}

pub(crate) fn apply_env_overrides<I>(root: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let field_prefix = format!("{ENV_PREFIX}__");
    for (key, raw_value) in vars {
        let Some(stripped) = key.strip_prefix(&field_prefix) else {
            continue;
        };

        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        if segments.is_empty() {
            continue;
        }

        set_nested_value(root, &segments, parse_env_value(&raw_value));
    }
}

fn env_var_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Scalars are read as JSON where possible so `8080` and `true` keep their
/// types; everything else stays a string.
fn parse_env_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };

    if rest.is_empty() {
        map.insert(head.clone(), value);
        return;
    }

    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    set_nested_value(entry, rest, value);
}
