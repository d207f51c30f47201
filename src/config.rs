use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Defaults loaded from `~/.config/rdv/config.toml`. Every field is
/// optional; CLI flags always win over config values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RdvConfig {
    /// Default target ref when `--ref` is not given.
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub semantic: Option<bool>,
    pub plain: Option<bool>,
    /// Release name passed to `helm template`.
    pub release_name: Option<String>,
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("RDV_CONFIG") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/rdv/config.toml"))
}

/// Load config from `~/.config/rdv/config.toml`, falling back to defaults.
/// A missing file is normal; a malformed one logs a warning so a typo does
/// not silently change behavior.
pub fn load_config() -> RdvConfig {
    let Some(path) = config_path() else {
        return RdvConfig::default();
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(_) => return RdvConfig::default(),
    };

    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!("ignoring malformed config `{}`: {err}", path.display());
            RdvConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let config: RdvConfig = toml::from_str("").unwrap();
        assert!(config.reference.is_none());
        assert!(config.semantic.is_none());
        assert!(config.plain.is_none());
        assert!(config.release_name.is_none());
    }

    #[test]
    fn fields_parse() {
        let config: RdvConfig = toml::from_str(
            "ref = \"develop\"\nsemantic = true\nplain = false\nrelease_name = \"preview\"\n",
        )
        .unwrap();
        assert_eq!(config.reference.as_deref(), Some("develop"));
        assert_eq!(config.semantic, Some(true));
        assert_eq!(config.plain, Some(false));
        assert_eq!(config.release_name.as_deref(), Some("preview"));
    }
}
