//! The map screen's logic: pins, routes and following the user's location.
//!
//! [`MapScreenController`] owns the pin list and reacts to user actions and
//! provider callbacks. All side effects go through the injected
//! [`LocationProvider`], [`MapSurface`] and [`DirectionsProvider`], so the
//! whole flow runs against fakes in tests.

use crate::config::Config;
use crate::directions::{DirectionsError, DirectionsProvider, DirectionsRequest};
use crate::error::MapError;
use crate::events::Event;
use crate::location::LocationProvider;
use crate::map::{MapDelegate, MapSurface};
use crate::models::{
    Annotation, Coordinate, MapOptions, Overlay, PermissionStatus, Pin, PolylineRenderer, Route,
    TransportType,
};
use crate::state::{self, MapState};
use ratatui::style::Color;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

const ROUTE_STROKE: PolylineRenderer = PolylineRenderer {
    stroke_color: Color::Red,
    line_width: 3.0,
};

pub struct MapScreenController<L, M, D> {
    location: L,
    map: M,
    directions: Arc<D>,
    events: UnboundedSender<Event>,
    state: MapState,
    options: MapOptions,
    default_span_m: f64,
    desired_accuracy_m: f64,
    notice: Option<String>,
}

impl<L, M, D> MapScreenController<L, M, D>
where
    L: LocationProvider,
    M: MapSurface,
    D: DirectionsProvider,
{
    pub fn new(
        location: L,
        map: M,
        directions: Arc<D>,
        events: UnboundedSender<Event>,
        config: &Config,
    ) -> Self {
        Self {
            location,
            map,
            directions,
            events,
            state: MapState::default(),
            options: config.map.options(),
            default_span_m: config.map.default_span_m,
            desired_accuracy_m: config.location.desired_accuracy_m,
            notice: None,
        }
    }

    /// First display of the screen: set up the map, then sort out location access.
    pub fn load(&mut self) -> Result<(), MapError> {
        self.map.configure(self.options);
        if let Some(current) = self.location.location() {
            self.map
                .set_region(state::default_region(current, self.default_span_m), false);
        }
        self.check_location_permission()
    }

    /// Acts on the provider's authorization status.
    ///
    /// Also called again whenever the status changes.
    pub fn check_location_permission(&mut self) -> Result<(), MapError> {
        match self.location.authorization_status() {
            PermissionStatus::NotDetermined => {
                info!("Location permission not determined; requesting it");
                self.location.request_when_in_use_authorization();
            }
            PermissionStatus::AuthorizedWhenInUse | PermissionStatus::AuthorizedAlways => {
                self.notice = None;
                self.map.set_shows_user_location(true);
                self.location.set_desired_accuracy(self.desired_accuracy_m);
                self.location.start_updating_location();
            }
            status @ (PermissionStatus::Denied | PermissionStatus::Restricted) => {
                warn!("Location permission is {}", status);
                self.notice = Some("Please turn on location access".to_string());
            }
            PermissionStatus::Unrecognized(raw) => {
                return Err(MapError::UnrecognizedPermission(raw));
            }
        }
        Ok(())
    }

    /// Parses the dialog fields, adds a pin and zooms to show it next to the user.
    pub fn add_pin(&mut self, latitude: &str, longitude: &str) -> Result<Pin, MapError> {
        let coordinate = state::parse_coordinate(latitude, longitude)?;
        let current = self.current_location().ok_or(MapError::NoLocation)?;

        let pin = self.state.push_pin(coordinate).clone();
        self.map.add_annotation(Annotation::from(&pin));
        self.map
            .set_region(state::region_for_pin(current, pin.coordinate), true);

        info!("Added pin {} at {}", pin.label, pin.coordinate);
        Ok(pin)
    }

    /// Removes every pin and route, then zooms back to the user.
    ///
    /// The map is cleared even without a fix; only the re-centering is
    /// skipped, and `NoLocation` is returned.
    pub fn delete_all_pins(&mut self) -> Result<(), MapError> {
        for pin in self.state.clear_pins() {
            self.map.remove_annotation(&Annotation::from(&pin));
        }
        self.map.remove_overlays();

        let current = self.current_location().ok_or(MapError::NoLocation)?;
        self.map
            .set_region(state::default_region(current, self.default_span_m), true);
        info!("Deleted all pins");
        Ok(())
    }

    /// Asks for driving directions from the user to the pin numbered `index_text`.
    ///
    /// Returns as soon as the request is issued; the answer comes back as
    /// [`Event::RouteComputed`] and goes to [`on_route_computed`](Self::on_route_computed).
    pub fn add_route(&mut self, index_text: &str) -> Result<DirectionsRequest, MapError> {
        let index = state::parse_pin_index(index_text, self.state.pins().len())?;
        let source = self.current_location().ok_or(MapError::NoLocation)?;
        let destination = self
            .state
            .pin(index)
            .map(|p| p.coordinate)
            .ok_or(MapError::IndexOutOfRange {
                index: index as i64,
                count: self.state.pins().len(),
            })?;

        let request = DirectionsRequest {
            source,
            destination,
            transport_type: TransportType::Automobile,
        };
        info!("Requesting route {} -> pin {} {}", source, index, destination);

        let calculation = self.directions.calculate(request);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = calculation.await;
            if tx.send(Event::RouteComputed(result)).is_err() {
                debug!("Route finished after the screen closed");
            }
        });
        Ok(request)
    }

    /// Draws the first candidate route. Failures and empty answers are dropped.
    pub fn on_route_computed(&mut self, result: Result<Vec<Route>, DirectionsError>) {
        match result {
            Ok(routes) => match routes.into_iter().next() {
                Some(route) => {
                    info!(
                        "Route found: {:.1} km, {:.0} min",
                        route.distance_m / 1000.0,
                        route.expected_travel_time_s / 60.0
                    );
                    self.map.add_overlay(Overlay::Polyline(route.polyline));
                }
                None => debug!("Directions returned no routes"),
            },
            Err(e) => warn!("Route request failed: {}", e),
        }
    }

    /// Re-centers on the newest fix. Every update re-centers.
    pub fn on_location_update(&mut self, locations: &[Coordinate]) {
        let Some(fix) = locations.first().copied() else {
            return;
        };
        self.state.last_fix = Some(fix);
        self.map
            .set_region(state::default_region(fix, self.default_span_m), true);
    }

    pub fn current_location(&self) -> Option<Coordinate> {
        self.location.location().or(self.state.last_fix)
    }

    pub fn pins(&self) -> &[Pin] {
        self.state.pins()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }
}

impl<L, M, D> MapDelegate for MapScreenController<L, M, D> {
    fn renderer_for(&self, overlay: &Overlay) -> PolylineRenderer {
        match overlay {
            Overlay::Polyline(_) => ROUTE_STROKE,
        }
    }
}
