//! User location for the map screen.
//!
//! [`LocationProvider`] mirrors what a platform location manager offers:
//! an authorization status, a way to ask for access, start/stop of a stream
//! of fixes and the last known fix. Fixes and authorization prompts are
//! delivered as [`Event`]s on the application channel.
//!
//! [`TerminalLocation`] resolves fixes via IP geolocation (IpApi) or from
//! the manual coordinates in `config.toml`.

use crate::config::LocationConfig;
use crate::events::Event;
use crate::models::{Coordinate, PermissionStatus};
use ipgeolocate::{Locator, Service};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub trait LocationProvider {
    fn authorization_status(&self) -> PermissionStatus;
    fn request_when_in_use_authorization(&mut self);
    fn set_desired_accuracy(&mut self, meters: f64);
    fn start_updating_location(&mut self);
    fn stop_updating_location(&mut self);
    /// Most recent fix, if any has arrived yet.
    fn location(&self) -> Option<Coordinate>;
}

pub struct TerminalLocation {
    config: LocationConfig,
    status: PermissionStatus,
    desired_accuracy: f64,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
    events: UnboundedSender<Event>,
    updates: Option<JoinHandle<()>>,
}

impl TerminalLocation {
    pub fn new(config: LocationConfig, events: UnboundedSender<Event>) -> Self {
        let status = if config.enabled {
            PermissionStatus::from_config(&config.authorization)
        } else {
            PermissionStatus::Restricted
        };
        Self {
            desired_accuracy: config.desired_accuracy_m,
            config,
            status,
            last_fix: Arc::new(Mutex::new(None)),
            events,
            updates: None,
        }
    }

    /// Records the user's answer to the access prompt.
    pub fn resolve_authorization(&mut self, status: PermissionStatus) {
        info!("Location authorization changed to {}", status);
        self.status = status;
    }

    pub fn is_updating(&self) -> bool {
        self.updates.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl LocationProvider for TerminalLocation {
    fn authorization_status(&self) -> PermissionStatus {
        self.status.clone()
    }

    fn request_when_in_use_authorization(&mut self) {
        if self.status != PermissionStatus::NotDetermined {
            return;
        }
        if self.events.send(Event::AuthorizationRequested).is_err() {
            warn!("Event loop is gone; dropping authorization request.");
        }
    }

    /// IP geolocation has no accuracy control; the value is only logged
    /// when updates start.
    fn set_desired_accuracy(&mut self, meters: f64) {
        self.desired_accuracy = meters;
    }

    fn start_updating_location(&mut self) {
        if self.is_updating() {
            return;
        }
        info!(
            "Starting location updates every {}s (accuracy {} m)",
            self.config.update_interval_seconds, self.desired_accuracy
        );

        let config = self.config.clone();
        let last_fix = Arc::clone(&self.last_fix);
        let tx = self.events.clone();
        self.updates = Some(tokio::spawn(async move {
            let interval = Duration::from_secs(config.update_interval_seconds.max(1));
            loop {
                let fix = resolve_fix(&config).await;
                if let Ok(mut slot) = last_fix.lock() {
                    *slot = Some(fix);
                }
                if tx.send(Event::LocationUpdate(vec![fix])).is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        }));
    }

    fn stop_updating_location(&mut self) {
        if let Some(handle) = self.updates.take() {
            debug!("Stopping location updates");
            handle.abort();
        }
    }

    fn location(&self) -> Option<Coordinate> {
        self.last_fix.lock().ok().and_then(|slot| *slot)
    }
}

impl Drop for TerminalLocation {
    fn drop(&mut self) {
        self.stop_updating_location();
    }
}

/// One fix: geolocated when `auto_locate` is on, otherwise the manual
/// coordinates. A failed lookup also falls back to the manual coordinates.
async fn resolve_fix(config: &LocationConfig) -> Coordinate {
    let manual = Coordinate::new(config.manual_lat, config.manual_lon);
    if !config.auto_locate {
        return manual;
    }

    match Locator::get(&config.lookup_ip, Service::IpApi).await {
        Ok(loc) => {
            let lat = loc.latitude.parse::<f64>().unwrap_or(manual.latitude);
            let lon = loc.longitude.parse::<f64>().unwrap_or(manual.longitude);
            info!("Geolocation successful - ({}, {})", lat, lon);
            Coordinate::new(lat, lon)
        }
        Err(e) => {
            error!(
                "Error using geolocation service: {}. Using manual coordinates {}.",
                e, manual
            );
            manual
        }
    }
}
