//! Global generator configuration.
//!
//! Holds the document-level metadata (`info`, `servers`, `tags`, global `security`) and
//! the target OpenAPI version. Files are read as YAML or JSON depending on their
//! extension.

use crate::descriptor::SecurityRequirement;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Target OpenAPI version string (e.g. "3.0.3", "3.1.0")
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    /// Global security requirements
    pub security: Vec<SecurityRequirement>,
    /// Copied verbatim into `components.securitySchemes`
    pub security_schemes: IndexMap<String, Value>,
    /// Request content types used when a method declares none
    pub request_content_types: Vec<String>,
    /// Response content types used when a method declares none
    pub response_content_types: Vec<String>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Tag object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            security: Vec::new(),
            security_schemes: IndexMap::new(),
            request_content_types: vec![DEFAULT_CONTENT_TYPE.to_string()],
            response_content_types: vec![DEFAULT_CONTENT_TYPE.to_string()],
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = read_structured_file(path)?;
        if config.info.title.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{}: info.title must not be empty",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Read a JSON (`.json`) or YAML (any other extension) file into `T`
pub fn read_structured_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading {}", path.display());
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.openapi, "3.0.3");
        assert_eq!(config.info.title, "Generated API");
        assert_eq!(config.request_content_types, vec!["application/json"]);
        assert!(config.security.is_empty());
    }

    #[test]
    fn test_load_yaml_with_partial_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("openapi.yaml");
        fs::write(
            &path,
            "openapi: 3.1.0\ninfo:\n  title: Shop\n  version: 2.0.0\nsecurity:\n  - bearer: []\n",
        )
        .unwrap();

        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.openapi, "3.1.0");
        assert_eq!(config.info.title, "Shop");
        assert_eq!(config.security.len(), 1);
        assert!(config.security[0].contains_key("bearer"));
        assert_eq!(config.response_content_types, vec!["application/json"]);
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("openapi.json");
        fs::write(
            &path,
            r#"{"info": {"title": "Shop", "version": "1"}, "servers": [{"url": "https://api.example.com"}]}"#,
        )
        .unwrap();

        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.servers[0].url, "https://api.example.com");
        assert_eq!(config.openapi, DEFAULT_OPENAPI_VERSION);
    }

    #[test]
    fn test_empty_title_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("openapi.json");
        fs::write(&path, r#"{"info": {"title": " ", "version": "1"}}"#).unwrap();

        assert!(matches!(
            GeneratorConfig::from_file(&path),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = GeneratorConfig::from_file(Path::new("/nonexistent/openapi.yaml"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
