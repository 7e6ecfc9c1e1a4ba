//! ABOUTME: Config loading — parses a `ConfigSnapshot` from TOML, searching a fixed set of
//! ABOUTME: default paths, with a handful of environment variable overrides applied afterward

use anyhow::{Context, Result};
use autoresearch_core::types::{ConfigSnapshot, ReasoningMode};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Search order used when the caller doesn't name an explicit path,
/// checked relative to the current working directory.
const CONFIG_SEARCH_PATHS: &[&str] = &["autoresearch.toml", ".autoresearch.toml", "config/autoresearch.toml"];

/// Environment variable prefix for post-load overrides.
const ENV_PREFIX: &str = "AUTORESEARCH_";

/// Load a `ConfigSnapshot`.
///
/// If `path` is given, it must exist and parse as a full `ConfigSnapshot`.
/// Otherwise the first existing file in `CONFIG_SEARCH_PATHS` is used, and
/// if none exist, `ConfigSnapshot::default()` is returned unchanged by the
/// file-parsing step. Either way, a small set of `AUTORESEARCH_*`
/// environment variables are applied on top before the result is
/// validated.
///
/// # Errors
/// Returns an error if an explicit `path` can't be read or parsed, if a
/// discovered default path exists but fails to parse, or if the resulting
/// snapshot fails `ConfigSnapshot::validate`.
pub fn load_config_snapshot(path: Option<&Path>) -> Result<ConfigSnapshot> {
    let mut snapshot = match path {
        Some(explicit) => parse_file(explicit)?,
        None => match find_default_path() {
            Some(found) => parse_file(&found)?,
            None => ConfigSnapshot::default(),
        },
    };
    apply_env_overrides(&mut snapshot);
    snapshot.validate().map_err(anyhow::Error::msg)?;
    Ok(snapshot)
}

fn find_default_path() -> Option<PathBuf> {
    CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).find(|p| p.exists())
}

fn parse_file(path: &Path) -> Result<ConfigSnapshot> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

/// Override a handful of high-churn fields from the environment. Anything
/// unset or unparsable is left at whatever the file (or default) supplied.
fn apply_env_overrides(snapshot: &mut ConfigSnapshot) {
    if let Some(loops) = env_parsed::<u32>("LOOPS") {
        snapshot.loops = loops;
    }
    if let Some(mode) = env_var("REASONING_MODE").and_then(|raw| parse_reasoning_mode(&raw)) {
        snapshot.reasoning_mode = mode;
    }
    if let Some(ms) = env_parsed::<u64>("AGENT_TIMEOUT_MS") {
        snapshot.agent_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = env_parsed::<u64>("CYCLE_TIMEOUT_MS") {
        snapshot.cycle_timeout = Duration::from_millis(ms);
    }
    if let Some(tokens) = env_parsed::<u64>("BUDGET_TOKENS") {
        snapshot.budget.tokens = Some(tokens);
    }
}

fn env_var(suffix: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{suffix}")).ok()
}

fn env_parsed<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    env_var(suffix).and_then(|raw| raw.parse().ok())
}

fn parse_reasoning_mode(raw: &str) -> Option<ReasoningMode> {
    match raw.to_lowercase().as_str() {
        "direct" => Some(ReasoningMode::Direct),
        "dialectical" => Some(ReasoningMode::Dialectical),
        "chain-of-thought" | "chain_of_thought" => Some(ReasoningMode::ChainOfThought),
        "auto" => Some(ReasoningMode::Auto),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Writes `contents` to a unique file in the system temp dir and
    /// returns its path; the caller is responsible for cleanup.
    fn write_temp_toml(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("autoresearch-config-test-{name}-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn round_trips_a_full_snapshot_through_toml() {
        let original = ConfigSnapshot {
            loops: 4,
            ..ConfigSnapshot::default()
        };
        let text = toml::to_string(&original).unwrap();
        let path = write_temp_toml("round-trip", &text);
        let loaded = parse_file(&path).unwrap();
        assert_eq!(loaded.loops, 4);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let missing = PathBuf::from("/nonexistent/path/to/autoresearch.toml");
        assert!(load_config_snapshot(Some(&missing)).is_err());
    }

    #[test]
    fn no_path_and_no_default_file_falls_back_to_defaults() {
        let original_cwd = env::current_dir().unwrap();
        env::set_current_dir(env::temp_dir()).unwrap();
        let result = load_config_snapshot(None);
        env::set_current_dir(original_cwd).unwrap();
        let snapshot = result.unwrap();
        assert_eq!(snapshot.loops, ConfigSnapshot::default().loops);
    }

    #[test]
    fn recognizes_every_reasoning_mode_spelling() {
        assert_eq!(parse_reasoning_mode("direct"), Some(ReasoningMode::Direct));
        assert_eq!(parse_reasoning_mode("Dialectical"), Some(ReasoningMode::Dialectical));
        assert_eq!(parse_reasoning_mode("chain-of-thought"), Some(ReasoningMode::ChainOfThought));
        assert_eq!(parse_reasoning_mode("auto"), Some(ReasoningMode::Auto));
        assert_eq!(parse_reasoning_mode("not-a-mode"), None);
    }

    #[test]
    fn env_override_replaces_the_loop_count() {
        env::set_var("AUTORESEARCH_LOOPS", "7");
        let mut snapshot = ConfigSnapshot::default();
        apply_env_overrides(&mut snapshot);
        env::remove_var("AUTORESEARCH_LOOPS");
        assert_eq!(snapshot.loops, 7);
    }
}
