use std::path::Path;

use transeval_core::config::EngineConfig;

/// Loads the configuration document (§6.3) as YAML or JSON, dispatching on
/// the file extension.
pub fn load_engine_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&text)?),
        Some("json") => Ok(serde_json::from_str(&text)?),
        other => anyhow::bail!("unsupported config file extension: {other:?} (expected .yaml, .yml, or .json)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "runSettings:\n  concurrency: 4\n").unwrap();
        let config = load_engine_config(&path).unwrap();
        assert_eq!(config.run_settings.concurrency, 4);
    }

    #[test]
    fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"runSettings":{"concurrency":3}}"#).unwrap();
        let config = load_engine_config(&path).unwrap();
        assert_eq!(config.run_settings.concurrency, 3);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "").unwrap();
        assert!(load_engine_config(&path).is_err());
    }
}
