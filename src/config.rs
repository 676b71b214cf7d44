use crate::models::{ElevationStyle, MapOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub directions: DirectionsConfig,
    pub map: MapConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub enabled: bool,            // false reports the permission as restricted
    pub authorization: String,    // Remembered permission decision
    pub auto_locate: bool,        // Use IP geolocation if true
    pub lookup_ip: String,        // Address handed to the geolocation service
    pub manual_lat: f64,          // Latitude used if auto_locate is false
    pub manual_lon: f64,          // Longitude used if auto_locate is false
    pub desired_accuracy_m: f64,
    pub update_interval_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub default_span_m: f64, // Zoom used when centering on the user
    pub shows_compass: bool,
    pub shows_scale: bool,
    pub elevation: ElevationStyle,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authorization: "not-determined".to_string(),
            auto_locate: true,
            lookup_ip: "1.1.1.1".to_string(),
            manual_lat: 55.7558,
            manual_lon: 37.6173,
            desired_accuracy_m: 100.0,
            update_interval_seconds: 30,
        }
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_span_m: 10_000.0,
            shows_compass: true,
            shows_scale: true,
            elevation: ElevationStyle::Realistic,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 150 }
    }
}

impl MapConfig {
    pub fn options(&self) -> MapOptions {
        MapOptions {
            shows_compass: self.shows_compass,
            shows_scale: self.shows_scale,
            elevation: self.elevation,
        }
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    /// Missing keys take their defaults. Defaults are only written to disk
    /// when there is no file yet; a file that fails to parse is left alone.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    return Config::default();
                }
            },
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!("Could not read {}: {}. Using defaults.", path.display(), e);
                return Config::default();
            }
            Err(_) => {}
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_survives_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), Config::default());
    }

    #[test]
    fn parses_user_file() {
        let text = r#"
            [location]
            enabled = true
            authorization = "when-in-use"
            auto_locate = false
            lookup_ip = ""
            manual_lat = 10.0
            manual_lon = 20.0
            desired_accuracy_m = 50.0
            update_interval_seconds = 5

            [directions]
            base_url = "http://localhost:5000"
            timeout_seconds = 3

            [map]
            default_span_m = 5000.0
            shows_compass = false
            shows_scale = true
            elevation = "flat"

            [ui]
            tick_rate_ms = 100
        "#;
        let config = Config::from_toml(text).unwrap();
        assert!(!config.location.auto_locate);
        assert_eq!(config.location.authorization, "when-in-use");
        assert_eq!(config.directions.base_url, "http://localhost:5000");
        assert_eq!(config.map.elevation, ElevationStyle::Flat);
        assert!(!config.map.options().shows_compass);
    }

    #[test]
    fn partial_file_keeps_user_values() {
        let text = r#"
            [location]
            manual_lat = 1.0

            [map]
            elevation = "flat"
        "#;
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.location.manual_lat, 1.0);
        assert_eq!(config.location.manual_lon, LocationConfig::default().manual_lon);
        assert_eq!(config.map.elevation, ElevationStyle::Flat);
        assert_eq!(config.ui, UiConfig::default());
        assert_eq!(config.directions, DirectionsConfig::default());
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("pinmap-tui-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("config.toml")
    }

    #[test]
    fn load_keeps_the_user_file() {
        let path = scratch_path("partial");
        let mut text = toml::to_string_pretty(&Config::default()).unwrap();
        text = text.replace("manual_lat = 55.7558", "manual_lat = 1.0");
        text = text.replace("tick_rate_ms = 150\n", "");
        fs::write(&path, &text).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.location.manual_lat, 1.0);
        assert_eq!(config.ui.tick_rate_ms, 150);
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn load_does_not_overwrite_a_broken_file() {
        let path = scratch_path("broken");
        fs::write(&path, "[location\nmanual_lat = 1.0").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[location\nmanual_lat = 1.0"
        );
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let path = scratch_path("missing");
        let _ = fs::remove_file(&path);

        assert_eq!(Config::load_from(&path), Config::default());
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(Config::from_toml(&written).unwrap(), Config::default());
    }

    #[test]
    fn rejects_unknown_elevation() {
        let mut text = toml::to_string_pretty(&Config::default()).unwrap();
        text = text.replace("\"realistic\"", "\"hybrid\"");
        assert!(Config::from_toml(&text).is_err());
    }
}
