//! xtask configuration: TOML file first, environment second.
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use map_core::{Floor, MapConfig};
use serde::Deserialize;

use crate::dirs;

/// Settings shared by the decoding commands.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XtaskConfig {
    /// Floor assumed when a command does not pass `--floor`.
    pub floor: Floor,
    /// Render settings file; defaults to the platform config directory.
    pub settings_path: Option<PathBuf>,
    /// Pixel stride of the origin search.
    pub scan_stride: usize,
}

impl Default for XtaskConfig {
    fn default() -> Self {
        Self {
            floor: Floor::Catacombs(Floor::MAX_FLOOR),
            settings_path: None,
            scan_stride: MapConfig::DEFAULT_SCAN_STRIDE,
        }
    }
}

impl XtaskConfig {
    /// Loads `path` (if given) and applies environment overrides.
    ///
    /// Environment variables:
    /// - `MINIMAP_FLOOR` - Default floor, e.g. `F7`, `M3`, `E`
    /// - `MINIMAP_SETTINGS` - Render settings file
    /// - `MINIMAP_SCAN_STRIDE` - Origin search stride in pixels
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn with_env(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Values that fail to parse
    /// are ignored.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(floor) = parse_var::<Floor>(&lookup, "MINIMAP_FLOOR") {
            self.floor = floor;
        }
        if let Some(path) = lookup("MINIMAP_SETTINGS") {
            self.settings_path = Some(PathBuf::from(path));
        }
        if let Some(stride) = parse_var::<usize>(&lookup, "MINIMAP_SCAN_STRIDE") {
            self.scan_stride = stride;
        }
        self
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_path.clone().unwrap_or_else(dirs::settings_file)
    }

    pub fn map_config(&self) -> MapConfig {
        MapConfig::with_scan_stride(self.scan_stride)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let value = lookup(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(XtaskConfig::from_toml("").unwrap(), XtaskConfig::default());
    }

    #[test]
    fn toml_fields_parse() {
        let config = XtaskConfig::from_toml(
            r#"
            floor = "M3"
            settings_path = "/tmp/minimap.json"
            scan_stride = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.floor, Floor::MasterMode(3));
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/minimap.json"));
        assert_eq!(config.map_config().scan_stride, 4);
    }

    #[test]
    fn bad_floor_is_rejected() {
        assert!(XtaskConfig::from_toml(r#"floor = "F9""#).is_err());
        assert!(XtaskConfig::from_toml(r#"flour = "F1""#).is_err());
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xtask.toml");
        std::fs::write(&path, "floor = \"E\"\n").unwrap();

        assert_eq!(XtaskConfig::from_file(&path).unwrap().floor, Floor::Entrance);
        assert!(XtaskConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = XtaskConfig::from_toml(
            r#"
            floor = "F3"
            scan_stride = 4
            "#,
        )
        .unwrap();

        let config = file.clone().with_overrides(vars(&[
            ("MINIMAP_FLOOR", "m5"),
            ("MINIMAP_SETTINGS", "/srv/minimap.json"),
            ("MINIMAP_SCAN_STRIDE", "10"),
        ]));
        assert_eq!(config.floor, Floor::MasterMode(5));
        assert_eq!(config.settings_path(), PathBuf::from("/srv/minimap.json"));
        assert_eq!(config.scan_stride, 10);

        assert_eq!(file.clone().with_overrides(vars(&[])), file);
    }

    #[test]
    fn invalid_environment_values_are_ignored() {
        let config = XtaskConfig::default().with_overrides(vars(&[
            ("MINIMAP_FLOOR", "F9"),
            ("MINIMAP_SCAN_STRIDE", "fast"),
        ]));
        assert_eq!(config, XtaskConfig::default());
    }
}
