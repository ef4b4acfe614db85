use anyhow::{anyhow, Context, Result};
use matcap_core::Configuration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// On-disk encodings for planning input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Format implied by the file extension, if recognised.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(ConfigFormat::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(ConfigFormat::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(ConfigFormat::Toml)
        } else {
            None
        }
    }
}

/// Parse any serde document by extension, falling back to YAML then JSON.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {what} '{}'", path.display()))?;
    match ConfigFormat::from_path(path) {
        Some(ConfigFormat::Yaml) => {
            serde_yaml::from_str(&data).with_context(|| format!("parsing {what} yaml"))
        }
        Some(ConfigFormat::Json) => {
            serde_json::from_str(&data).with_context(|| format!("parsing {what} json"))
        }
        Some(ConfigFormat::Toml) => {
            toml::from_str(&data).with_context(|| format!("parsing {what} toml"))
        }
        None => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .with_context(|| format!("parsing {what}")),
    }
}

/// Load a planning configuration from YAML, JSON or TOML.
///
/// The result is not validated; call [`Configuration::validate`] before
/// solving.
pub fn load_configuration(path: &Path) -> Result<Configuration> {
    read_document(path, "configuration")
}

fn render<T: Serialize>(value: &T, format: ConfigFormat) -> Result<String> {
    match format {
        ConfigFormat::Yaml => serde_yaml::to_string(value).context("serializing yaml"),
        ConfigFormat::Json => serde_json::to_string_pretty(value).context("serializing json"),
        ConfigFormat::Toml => toml::to_string_pretty(value).context("serializing toml"),
    }
}

/// Write a configuration; the extension picks the format (YAML by default).
pub fn save_configuration(path: &Path, config: &Configuration) -> Result<()> {
    let format = ConfigFormat::from_path(path).unwrap_or(ConfigFormat::Yaml);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    let text = render(config, format)?;
    fs::write(path, text).with_context(|| format!("writing configuration '{}'", path.display()))
}

/// Render a configuration for stdout.
pub fn configuration_to_string(config: &Configuration, format: ConfigFormat) -> Result<String> {
    render(config, format).map_err(|err| anyhow!("rendering configuration: {err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.cfg")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }
}
