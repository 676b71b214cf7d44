//! The map surface the controller draws on.
//!
//! [`TerminalMap`] only records what should be visible; `ui::render` turns
//! that into a ratatui canvas every frame and asks the [`MapDelegate`] how
//! each overlay should be stroked.

use crate::geo::Region;
use crate::models::{Annotation, Coordinate, MapOptions, Overlay, PolylineRenderer};

pub trait MapSurface {
    fn configure(&mut self, options: MapOptions);
    fn set_shows_user_location(&mut self, shows: bool);
    fn add_annotation(&mut self, annotation: Annotation);
    fn remove_annotation(&mut self, annotation: &Annotation);
    fn annotations(&self) -> &[Annotation];
    fn add_overlay(&mut self, overlay: Overlay);
    fn remove_overlays(&mut self);
    fn overlays(&self) -> &[Overlay];
    fn set_region(&mut self, region: Region, animated: bool);
}

/// Picks the renderer for an overlay when the surface draws it.
pub trait MapDelegate {
    fn renderer_for(&self, overlay: &Overlay) -> PolylineRenderer;
}

#[derive(Debug, Default)]
pub struct TerminalMap {
    pub options: MapOptions,
    pub shows_user_location: bool,
    pub region: Option<Region>,
    pub last_change_animated: bool,
    annotations: Vec<Annotation>,
    overlays: Vec<Overlay>,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas bounds `([lon_min, lon_max], [lat_min, lat_max])` for the
    /// current region, or around `fallback` when no region was set.
    ///
    /// Extents below `min_degrees` are widened so a zero-span region still
    /// shows something.
    pub fn bounds(&self, fallback: Coordinate, min_degrees: f64) -> ([f64; 2], [f64; 2]) {
        let (center, lat_delta, lon_delta) = match self.region {
            Some(r) => (r.center, r.latitude_delta(), r.longitude_delta()),
            None => (fallback, 180.0, 360.0),
        };
        let half_lat = lat_delta.max(min_degrees) / 2.0;
        let half_lon = lon_delta.max(min_degrees) / 2.0;
        (
            [center.longitude - half_lon, center.longitude + half_lon],
            [center.latitude - half_lat, center.latitude + half_lat],
        )
    }
}

impl MapSurface for TerminalMap {
    fn configure(&mut self, options: MapOptions) {
        self.options = options;
    }

    fn set_shows_user_location(&mut self, shows: bool) {
        self.shows_user_location = shows;
    }

    fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    fn remove_annotation(&mut self, annotation: &Annotation) {
        if let Some(pos) = self.annotations.iter().position(|a| a == annotation) {
            self.annotations.remove(pos);
        }
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn add_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    fn remove_overlays(&mut self) {
        self.overlays.clear();
    }

    fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    fn set_region(&mut self, region: Region, animated: bool) {
        self.region = Some(region);
        self.last_change_animated = animated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_matching_annotation_only() {
        let mut map = TerminalMap::new();
        let a = Annotation {
            coordinate: Coordinate::new(1.0, 1.0),
            title: "1".to_string(),
        };
        let b = Annotation {
            coordinate: Coordinate::new(2.0, 2.0),
            title: "2".to_string(),
        };
        map.add_annotation(a.clone());
        map.add_annotation(b.clone());
        map.remove_annotation(&a);
        assert_eq!(map.annotations(), &[b]);
    }

    #[test]
    fn bounds_follow_region() {
        let mut map = TerminalMap::new();
        map.set_region(Region::square(Coordinate::new(0.0, 0.0), 111_320.0), true);
        let (x, y) = map.bounds(Coordinate::new(50.0, 50.0), 0.01);
        assert!((x[0] + 0.5).abs() < 1e-9 && (x[1] - 0.5).abs() < 1e-9);
        assert!((y[0] + 0.5).abs() < 1e-9 && (y[1] - 0.5).abs() < 1e-9);
        assert!(map.last_change_animated);
    }

    #[test]
    fn zero_span_is_widened() {
        let mut map = TerminalMap::new();
        map.set_region(Region::square(Coordinate::new(10.0, 20.0), 0.0), false);
        let (x, y) = map.bounds(Coordinate::new(0.0, 0.0), 0.02);
        assert!((x[1] - x[0] - 0.02).abs() < 1e-9);
        assert!((y[1] - y[0] - 0.02).abs() < 1e-9);
    }

    #[test]
    fn world_view_without_region() {
        let map = TerminalMap::new();
        let (x, y) = map.bounds(Coordinate::new(0.0, 0.0), 0.01);
        assert_eq!(x, [-180.0, 180.0]);
        assert_eq!(y, [-90.0, 90.0]);
    }
}
