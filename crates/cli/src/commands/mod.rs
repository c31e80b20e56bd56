//! CLI Commands

use std::path::Path;

use anyhow::{Context, Result};
use storefront_e2e::HarnessConfig;

pub mod check;
pub mod locators;
pub mod run;
pub mod scenarios;

/// Load the harness config and the directory its relative paths start from
fn load_config(path: &Path) -> Result<(HarnessConfig, &Path)> {
    let config = HarnessConfig::load(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((config, base_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_file_name_resolves_to_current_dir() {
        let (config, base_dir) = load_config(Path::new("missing-storefront.toml")).unwrap();
        assert_eq!(base_dir, Path::new("."));
        assert!(config.suites.is_empty());
    }

    #[test]
    fn test_relative_paths_start_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "strict = true\n").unwrap();

        let (config, base_dir) = load_config(&path).unwrap();
        assert!(config.strict);
        assert_eq!(base_dir, dir.path());
    }
}
