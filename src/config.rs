use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Error, Result};

const APP_DIR: &str = "pbilink";
const LOCAL_CONFIG_FILE: &str = "pbilink.toml";
const ENV_PREFIX: &str = "PBILINK";

/// Which kind of surface the audited screen belongs to. Only affects tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    #[default]
    Web,
    App,
}

impl Surface {
    pub fn tag_suffix(self) -> &'static str {
        match self {
            Surface::Web => "Page",
            Surface::App => "View",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub org_url: String,
    pub project: String,
    pub api_version: String,
    pub work_item_type: String,
    pub area_path: String,
    pub iteration_path: String,
    #[serde(default)]
    pub surface: Surface,
    pub write_hyperlinks: bool,
    #[serde(default)]
    pub url_rewrite_from: Option<String>,
    #[serde(default)]
    pub url_rewrite_to: Option<String>,
    #[serde(default)]
    pub pat: Option<String>,
}

impl Settings {
    /// Load defaults, then the user config file, then `./pbilink.toml`, then
    /// `PBILINK_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut files = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            files.push(dir.join(APP_DIR).join("config.toml"));
        }
        files.push(PathBuf::from(LOCAL_CONFIG_FILE));
        Self::load_from(&files, Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load_from(files: &[PathBuf], env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("org_url", "")?
            .set_default("project", "Design")?
            .set_default("api_version", "6.0")?
            .set_default("work_item_type", "Product Backlog Item")?
            .set_default("area_path", "Design\\Accessibility")?
            .set_default("iteration_path", "Design\\Accessibility")?
            .set_default("write_hyperlinks", true)?;

        for path in files {
            builder = builder.add_source(File::from(path.clone()).required(false));
        }

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.org_url.trim().is_empty() {
            return Err(Error::config(format!(
                "org_url is not set; export {}_ORG_URL or add it to {}",
                ENV_PREFIX, LOCAL_CONFIG_FILE
            )));
        }
        if self.url_rewrite_from.is_some() != self.url_rewrite_to.is_some() {
            return Err(Error::config(
                "url_rewrite_from and url_rewrite_to must be set together",
            ));
        }
        Ok(())
    }

    /// Organization URL without a trailing slash.
    pub fn org_base(&self) -> &str {
        self.org_url.trim_end_matches('/')
    }

    /// Apply the configured prefix rewrite (e.g. production host to dev host).
    pub fn rewrite_page_url(&self, url: &str) -> String {
        match (&self.url_rewrite_from, &self.url_rewrite_to) {
            (Some(from), Some(to)) if url.starts_with(from.as_str()) => {
                format!("{}{}", to, &url[from.len()..])
            }
            _ => url.to_string(),
        }
    }
}

#[cfg(test)]
impl Settings {
    pub(crate) fn for_tests(org_url: &str) -> Self {
        Self {
            org_url: org_url.to_string(),
            project: "Design".to_string(),
            api_version: "6.0".to_string(),
            work_item_type: "Product Backlog Item".to_string(),
            area_path: "Design\\Accessibility".to_string(),
            iteration_path: "Design\\Accessibility".to_string(),
            surface: Surface::Web,
            write_hyperlinks: true,
            url_rewrite_from: None,
            url_rewrite_to: None,
            pat: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults_fill_everything_but_org_url() {
        let settings = Settings::load_from(&[], env(&[("PBILINK_ORG_URL", "https://dev.example/Coll/")]))
            .unwrap();
        assert_eq!(settings.project, "Design");
        assert_eq!(settings.api_version, "6.0");
        assert_eq!(settings.area_path, "Design\\Accessibility");
        assert_eq!(settings.surface, Surface::Web);
        assert!(settings.write_hyperlinks);
        assert_eq!(settings.org_base(), "https://dev.example/Coll");
    }

    #[test]
    fn missing_org_url_is_a_config_error() {
        let err = Settings::load_from(&[], env(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pbilink.toml");
        std::fs::write(
            &path,
            "org_url = \"https://tfs.example/Coll\"\nproject = \"Apps\"\nsurface = \"app\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(&[path], env(&[])).unwrap();
        assert_eq!(settings.project, "Apps");
        assert_eq!(settings.surface, Surface::App);
        assert_eq!(settings.surface.tag_suffix(), "View");
    }

    #[test]
    fn rewrite_only_touches_matching_prefix() {
        let mut settings = Settings::for_tests("https://tfs.example");
        settings.url_rewrite_from = Some("https://www.shop.example".to_string());
        settings.url_rewrite_to = Some("https://www.dev.shop.example".to_string());

        assert_eq!(
            settings.rewrite_page_url("https://www.shop.example/cart"),
            "https://www.dev.shop.example/cart"
        );
        assert_eq!(
            settings.rewrite_page_url("https://other.example/cart"),
            "https://other.example/cart"
        );
    }
}
