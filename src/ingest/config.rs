// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::page::FetchPolicy;

pub const ENV_POLICY_PATH: &str = "INDICATORS_POLICY_PATH";
const DEFAULT_POLICY_PATH: &str = "config/fetch_policy.toml";

/// Load a fetch policy from an explicit path. Supports TOML or JSON formats;
/// missing keys take their defaults.
pub fn load_fetch_policy_from(path: &Path) -> Result<FetchPolicy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading fetch policy from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_policy(&content, ext.as_str())
}

/// Load the fetch policy using env var + fallbacks:
/// 1) $INDICATORS_POLICY_PATH
/// 2) config/fetch_policy.toml
/// 3) built-in defaults
pub fn load_fetch_policy_default() -> Result<FetchPolicy> {
    if let Ok(p) = std::env::var(ENV_POLICY_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_fetch_policy_from(&pb);
        } else {
            return Err(anyhow!("{ENV_POLICY_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_POLICY_PATH);
    if toml_p.exists() {
        return load_fetch_policy_from(&toml_p);
    }
    Ok(FetchPolicy::default())
}

fn parse_policy(s: &str, hint_ext: &str) -> Result<FetchPolicy> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing fetch policy json");
    }
    match toml::from_str::<FetchPolicy>(s) {
        Ok(p) => Ok(p),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported fetch policy format: {toml_err}")),
    }
}
