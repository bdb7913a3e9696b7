use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const CONFIG_FILE: &str = "frog-catalog.json";
pub const DEFAULT_DATABASE: &str = "frogs_toads.db";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_root: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_root: Utf8PathBuf,
    pub database: Utf8PathBuf,
    pub regions: Vec<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `frog-catalog.json` in the working directory when it
    /// exists. Without either, defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let data_root = match config.data_root {
            Some(root) => Utf8PathBuf::from(root),
            None => default_data_root()?,
        };

        let database = Utf8PathBuf::from(
            config
                .database
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        );
        let database = if database.is_absolute() {
            database
        } else {
            data_root.join(database)
        };

        let regions = config.regions.unwrap_or_else(default_regions);

        Ok(ResolvedConfig {
            schema_version,
            data_root,
            database,
            regions,
        })
    }
}

fn default_data_root() -> Result<Utf8PathBuf, CatalogError> {
    ProjectDirs::from("", "", "frog-catalog")
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok())
        .ok_or_else(|| CatalogError::Filesystem("unable to resolve data directory".to_string()))
}

/// U.S. states, matching the path ids of the bundled range map.
pub fn default_regions() -> Vec<String> {
    [
        "Alabama",
        "Alaska",
        "Arizona",
        "Arkansas",
        "California",
        "Colorado",
        "Connecticut",
        "Delaware",
        "Florida",
        "Georgia",
        "Hawaii",
        "Idaho",
        "Illinois",
        "Indiana",
        "Iowa",
        "Kansas",
        "Kentucky",
        "Louisiana",
        "Maine",
        "Maryland",
        "Massachusetts",
        "Michigan",
        "Minnesota",
        "Mississippi",
        "Missouri",
        "Montana",
        "Nebraska",
        "Nevada",
        "New Hampshire",
        "New Jersey",
        "New Mexico",
        "New York",
        "North Carolina",
        "North Dakota",
        "Ohio",
        "Oklahoma",
        "Oregon",
        "Pennsylvania",
        "Rhode Island",
        "South Carolina",
        "South Dakota",
        "Tennessee",
        "Texas",
        "Utah",
        "Vermont",
        "Virginia",
        "Washington",
        "West Virginia",
        "Wisconsin",
        "Wyoming",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_database_joins_data_root() {
        let config = Config {
            data_root: Some("/tmp/frogs".to_string()),
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.database, Utf8PathBuf::from("/tmp/frogs/frogs_toads.db"));
        assert_eq!(resolved.regions.len(), 50);
    }
}
