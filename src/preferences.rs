use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::Path};

pub const DARK_MODE_KEY: &str = "darkmode";

/// Small string key/value store persisted as one JSON object.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    path: String,
    values: BTreeMap<String, String>,
}

impl Preferences {
    /// Loads the store; a missing file yields an empty one.
    pub fn load(path: &str) -> Result<Self> {
        let values = if Path::new(path).exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Unable to read preferences {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("Malformed preferences {path}"))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_string(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.path).parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Unable to write preferences {}", self.path))
    }

    pub fn dark_mode(&self) -> bool {
        self.get(DARK_MODE_KEY) == Some("true")
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.set(DARK_MODE_KEY, enabled.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_mode_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("preferences.json");
        let path = path.to_str().unwrap();

        let mut prefs = Preferences::load(path).unwrap();
        assert!(!prefs.dark_mode());
        prefs.set_dark_mode(true).unwrap();

        let reloaded = Preferences::load(path).unwrap();
        assert!(reloaded.dark_mode());
        assert_eq!(reloaded.get(DARK_MODE_KEY), Some("true"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();
        assert!(Preferences::load(path.to_str().unwrap()).is_err());
    }
}
