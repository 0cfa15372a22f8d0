//! Parse a project `.env` file into a key-value map; applying to the process
//! environment (and the precedence rules) lives in the crate root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` location: `override_dir` if given, else the current directory.
fn locate(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Strips matching surrounding quotes. Double quotes honor `\"` escapes;
/// single quotes are literal.
fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].replace("\\\"", "\"");
    }
    value
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(value)
        .to_string()
}

/// Minimal `.env` parser: `KEY=VALUE` lines, `#` comment lines and blanks
/// skipped, keys and values trimmed. No multiline values.
fn parse(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter_map(|(k, v)| {
            let key = k.trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(v.trim())))
        })
        .collect()
}

/// Loads `.env` into a map. A missing file is an empty map, not an error.
pub fn load_env_map(override_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match locate(override_dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}
