use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::BoundingBox;

fn default_source_url() -> String {
    "https://data.calgary.ca/resource/cchr-krqg.geojson".to_string()
}
fn default_geometry_column() -> String {
    "polygon".to_string()
}
fn default_limit() -> u32 {
    1000
}
fn default_source_timeout_secs() -> u64 {
    60
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}
fn default_user_agent() -> String {
    "urban_design_app".to_string()
}
fn default_geocoder_timeout_secs() -> u64 {
    10
}
fn default_concurrency() -> usize {
    1
}
// Nominatim usage policy: at most one request per second
fn default_min_interval_ms() -> u64 {
    1000
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data").join("buildings.geojson")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Column the `within_box` predicate filters on
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub bbox: BoundingBox,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            geometry_column: default_geometry_column(),
            limit: default_limit(),
            timeout_secs: default_source_timeout_secs(),
            bbox: BoundingBox::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on lookups in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Minimum spacing between the start of two lookups
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout_secs(),
            concurrency: default_concurrency(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Directory the cache path is resolved against (defaults to the working directory)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            path: default_cache_path(),
        }
    }
}

impl CacheConfig {
    pub fn resolved_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(&self.path),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub verbose: bool,
}

/// A search-path config file that exists but could not be used.
#[derive(Debug, Clone)]
pub struct SkippedConfig {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of the config search. Skipped files are returned rather than
/// logged so the caller can report them once logging is set up.
#[derive(Debug, Default)]
pub struct Discovered {
    pub config: Option<FileConfig>,
    pub skipped: Vec<SkippedConfig>,
}

impl FileConfig {
    /// First parseable config found on the search path, if any.
    pub fn load() -> Discovered {
        Self::load_from(&get_config_paths())
    }

    pub fn load_from(paths: &[PathBuf]) -> Discovered {
        let mut discovered = Discovered::default();

        for path in paths {
            if !path.exists() {
                continue;
            }
            let parsed: Result<FileConfig, String> = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|contents| toml::from_str(&contents).map_err(|e| e.to_string()));
            match parsed {
                Ok(config) => {
                    discovered.config = Some(config);
                    break;
                }
                Err(reason) => discovered.skipped.push(SkippedConfig {
                    path: path.clone(),
                    reason,
                }),
            }
        }
        discovered
    }

    /// Load an explicitly requested config file; unlike [`FileConfig::load`]
    /// every failure is reported.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("buildings3d.toml"));
    paths.push(PathBuf::from(".buildings3d.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("buildings3d").join("config.toml"));
        paths.push(config_dir.join("buildings3d.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".buildings3d.toml"));
        paths.push(home.join(".config").join("buildings3d").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert_eq!(config.source.limit, 1000);
        assert_eq!(config.source.geometry_column, "polygon");
        assert_eq!(config.source.bbox, BoundingBox::default());
        assert_eq!(config.geocoder.timeout_secs, 10);
        assert_eq!(config.geocoder.concurrency, 1);
        assert_eq!(config.cache.resolved_path(), PathBuf::from("data/buildings.geojson"));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
            verbose = true

            [source]
            limit = 250

            [source.bbox]
            north = 51.05
            south = 51.04
            west = -114.07
            east = -114.06

            [geocoder]
            user_agent = "calgary-viewer"
            concurrency = 4
            min_interval_ms = 0

            [cache]
            base_dir = "/srv/buildings"
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();

        assert!(config.verbose);
        assert_eq!(config.source.limit, 250);
        assert_eq!(config.source.url, default_source_url());
        assert_eq!(config.source.bbox.north, 51.05);
        assert_eq!(config.geocoder.user_agent, "calgary-viewer");
        assert_eq!(config.geocoder.concurrency, 4);
        assert_eq!(config.geocoder.timeout_secs, 10);
        assert_eq!(
            config.cache.resolved_path(),
            PathBuf::from("/srv/buildings/data/buildings.geojson")
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8088").unwrap();

        let config = FileConfig::from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_from_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::from_path(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_load_from_reports_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("buildings3d.toml");
        let valid = dir.path().join("config.toml");
        std::fs::write(&broken, "[source\nlimit = 5").unwrap();
        std::fs::write(&valid, "[source]\nlimit = 42").unwrap();

        let discovered = FileConfig::load_from(&[
            dir.path().join("missing.toml"),
            broken.clone(),
            valid,
        ]);

        assert_eq!(discovered.config.unwrap().source.limit, 42);
        assert_eq!(discovered.skipped.len(), 1);
        assert_eq!(discovered.skipped[0].path, broken);
        assert!(!discovered.skipped[0].reason.is_empty());
    }

    #[test]
    fn test_load_from_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let discovered = FileConfig::load_from(&[dir.path().join("missing.toml")]);
        assert!(discovered.config.is_none());
        assert!(discovered.skipped.is_empty());
    }

    #[test]
    fn test_from_path_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nlimit = \"many\"").unwrap();
        assert!(FileConfig::from_path(file.path()).is_err());
    }
}
