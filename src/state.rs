//! Screen state and the pure decisions made on it.
//!
//! Nothing in here touches the map surface or the location provider; the
//! controller calls these functions and then applies the side effects.

use crate::error::MapError;
use crate::geo::Region;
use crate::models::{Coordinate, Pin};

/// Pins in creation order plus the most recent location fix.
#[derive(Debug, Default, Clone)]
pub struct MapState {
    pins: Vec<Pin>,
    pub last_fix: Option<Coordinate>,
}

impl MapState {
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Appends a pin labeled with the next 1-based index.
    pub fn push_pin(&mut self, coordinate: Coordinate) -> &Pin {
        let index = self.pins.len() + 1;
        self.pins.push(Pin::new(coordinate, index));
        &self.pins[index - 1]
    }

    pub fn clear_pins(&mut self) -> Vec<Pin> {
        std::mem::take(&mut self.pins)
    }

    /// Pin at a 1-based position.
    pub fn pin(&self, index: usize) -> Option<&Pin> {
        index.checked_sub(1).and_then(|i| self.pins.get(i))
    }
}

/// Parses the two free-text fields of the add-pin dialog.
///
/// Both must be finite decimal numbers. The range of the values is not
/// checked.
pub fn parse_coordinate(latitude: &str, longitude: &str) -> Result<Coordinate, MapError> {
    let parse = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
    match (parse(latitude), parse(longitude)) {
        (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)),
        _ => Err(MapError::InvalidCoordinate {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        }),
    }
}

/// Parses the add-route dialog text into a 1-based index into `count` pins.
pub fn parse_pin_index(text: &str, count: usize) -> Result<usize, MapError> {
    if count == 0 {
        return Err(MapError::NoPins);
    }
    let index: i64 = text
        .parse()
        .map_err(|_| MapError::InvalidIndex(text.to_string()))?;
    match usize::try_from(index) {
        Ok(i) if (1..=count).contains(&i) => Ok(i),
        _ => Err(MapError::IndexOutOfRange { index, count }),
    }
}

/// Region centered on `current` wide enough to also show `pin`.
pub fn region_for_pin(current: Coordinate, pin: Coordinate) -> Region {
    let span = current.distance_to(&pin) * 2.0;
    Region::square(current, span)
}

pub fn default_region(current: Coordinate, span_m: f64) -> Region {
    Region::square(current, span_m)
}
