use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the globe in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// A user-placed point of interest.
///
/// `label` is the 1-based position of the pin in creation order and is
/// never changed after the pin is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub coordinate: Coordinate,
    pub label: String,
}

impl Pin {
    pub fn new(coordinate: Coordinate, index: usize) -> Self {
        Self {
            coordinate,
            label: index.to_string(),
        }
    }
}

/// What the map surface draws for a pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub coordinate: Coordinate,
    pub title: String,
}

impl From<&Pin> for Annotation {
    fn from(pin: &Pin) -> Self {
        Self {
            coordinate: pin.coordinate,
            title: pin.label.clone(),
        }
    }
}

/// One candidate route returned by a directions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Path as a sequence of points, origin first.
    pub polyline: Vec<Coordinate>,
    pub distance_m: f64,
    pub expected_travel_time_s: f64,
}

/// A transient drawing on top of the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Polyline(Vec<Coordinate>),
}

/// Stroke style used to draw a polyline overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineRenderer {
    pub stroke_color: Color,
    pub line_width: f64,
}

/// OS-style location authorization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    NotDetermined,
    AuthorizedWhenInUse,
    AuthorizedAlways,
    Denied,
    Restricted,
    /// A value this build does not know how to handle.
    Unrecognized(String),
}

impl PermissionStatus {
    /// Reads the remembered decision stored in `config.toml`.
    pub fn from_config(value: &str) -> Self {
        match value {
            "not-determined" => Self::NotDetermined,
            "when-in-use" => Self::AuthorizedWhenInUse,
            "always" => Self::AuthorizedAlways,
            "denied" => Self::Denied,
            "restricted" => Self::Restricted,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetermined => write!(f, "not-determined"),
            Self::AuthorizedWhenInUse => write!(f, "when-in-use"),
            Self::AuthorizedAlways => write!(f, "always"),
            Self::Denied => write!(f, "denied"),
            Self::Restricted => write!(f, "restricted"),
            Self::Unrecognized(raw) => write!(f, "unrecognized ({raw})"),
        }
    }
}

/// Only driving directions are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportType {
    #[default]
    Automobile,
}

impl TransportType {
    /// Routing profile name understood by OSRM.
    pub fn profile(&self) -> &'static str {
        match self {
            TransportType::Automobile => "driving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationStyle {
    Flat,
    #[default]
    Realistic,
}

/// Display preferences applied once when the screen loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapOptions {
    pub shows_compass: bool,
    pub shows_scale: bool,
    pub elevation: ElevationStyle,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            shows_compass: true,
            shows_scale: true,
            elevation: ElevationStyle::Realistic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_label_is_its_index() {
        let pin = Pin::new(Coordinate::new(10.0, 20.0), 3);
        assert_eq!(pin.label, "3");
        assert_eq!(Annotation::from(&pin).title, "3");
    }

    #[test]
    fn permission_from_config() {
        assert_eq!(
            PermissionStatus::from_config("when-in-use"),
            PermissionStatus::AuthorizedWhenInUse
        );
        assert_eq!(
            PermissionStatus::from_config("always"),
            PermissionStatus::AuthorizedAlways
        );
        assert_eq!(PermissionStatus::from_config("denied"), PermissionStatus::Denied);
        assert_eq!(
            PermissionStatus::from_config("provisional"),
            PermissionStatus::Unrecognized("provisional".to_string())
        );
    }
}
