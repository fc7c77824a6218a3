use figment::{
    providers::{Env, Format, Toml, Yaml},
    value::Dict,
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `HUNTARR_STATE__TTL_HOURS=24`.
const ENV_PREFIX: &str = "HUNTARR_";

/// On-disk configuration syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension. Unknown extensions are read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
    if contents.trim().is_empty() {
        return Err(ConfigError::Empty(path.display().to_string()));
    }

    let figment = match ConfigFormat::from_path(path) {
        ConfigFormat::Toml => Figment::new().merge(Toml::file(path)),
        ConfigFormat::Yaml => Figment::new().merge(Yaml::file(path)),
    };

    ensure_not_empty(&figment, &path.display().to_string())?;

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from a string (useful for testing)
pub fn load_config_from_str(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    if contents.trim().is_empty() {
        return Err(ConfigError::Empty("<string>".to_string()));
    }

    let figment = match format {
        ConfigFormat::Toml => Figment::from(Toml::string(contents)),
        ConfigFormat::Yaml => Figment::from(Yaml::string(contents)),
    };

    ensure_not_empty(&figment, "<string>")?;

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// A document with only comments or `null` parses fine but sets nothing.
fn ensure_not_empty(figment: &Figment, source: &str) -> Result<(), ConfigError> {
    let document: Dict = figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if document.is_empty() {
        return Err(ConfigError::Empty(source.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_config_from_str_toml() {
        let toml = r#"
[state]
ttl_hours = 24

[[sonarr]]
name = "tv"
url = "http://localhost:8989"
api_key = "abc"
"#;
        let config = load_config_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.state.ttl_hours, 24);
        assert_eq!(config.sonarr.len(), 1);
        assert_eq!(config.sonarr[0].hunt_missing, 5);
    }

    #[test]
    fn test_load_config_from_str_yaml() {
        let yaml = r#"
radarr:
  - name: movies
    url: http://localhost:7878
    api_key: xyz
    hunt_upgrades: 3
    skip_future: false
"#;
        let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.sonarr.is_empty());
        assert_eq!(config.radarr.len(), 1);
        assert_eq!(config.radarr[0].hunt_upgrades, 3);
        assert!(!config.radarr[0].skip_future);
        assert!(config.radarr[0].monitored_only);
    }

    #[test]
    fn test_load_config_from_str_empty() {
        let result = load_config_from_str("   \n", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Empty(_))));
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[state]
ttl_hours = "a week"
"#;
        let result = load_config_from_str(toml, ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_empty_file() {
        let temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = load_config(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Empty(_))));
    }

    #[test]
    fn test_load_config_comment_only_yaml_file() {
        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(temp_file, "# sonarr: []").unwrap();

        let result = load_config(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Empty(_))));
    }

    #[test]
    fn test_load_config_from_str_without_keys() {
        for (contents, format) in [
            ("# nothing here\n", ConfigFormat::Yaml),
            ("# nothing here\n", ConfigFormat::Toml),
        ] {
            let result = load_config_from_str(contents, format);
            assert!(
                matches!(result, Err(ConfigError::Empty(_))),
                "{:?} should be empty",
                format
            );
        }

        // An explicit null document is not a mapping at all.
        assert!(load_config_from_str("null\n", ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let mut temp_file = Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            temp_file,
            r#"
sonarr:
  - name: main
    url: http://sonarr:8989
    api_key: key
state:
  database: /data/huntarr.db
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.sonarr[0].url, "http://sonarr:8989");
        assert_eq!(config.state.database.to_str().unwrap(), "/data/huntarr.db");
        assert_eq!(config.state.ttl_hours, 168);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.YAML")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")),
            ConfigFormat::Toml
        );
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Toml);
    }
}
