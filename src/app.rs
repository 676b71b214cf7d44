use crate::config::Config;
use crate::controller::MapScreenController;
use crate::directions::{DirectionsError, DirectionsProvider, OsrmDirections};
use crate::error::MapError;
use crate::events::Event;
use crate::location::{LocationProvider, TerminalLocation};
use crate::map::TerminalMap;
use crate::models::PermissionStatus;
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

pub type Screen<D> = MapScreenController<TerminalLocation, TerminalMap, D>;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PinField {
    Latitude,
    Longitude,
}

/// Modal text prompts shown over the map.
#[derive(Debug, PartialEq, Clone)]
pub enum Dialog {
    AddPin {
        latitude: String,
        longitude: String,
        focus: PinField,
    },
    AddRoute {
        index: String,
        pin_count: usize,
    },
    Permission,
}

pub struct App<D = OsrmDirections> {
    pub controller: Screen<D>,
    pub dialog: Option<Dialog>,
    permission_pending: bool,
    pub should_quit: bool,
}

impl App<OsrmDirections> {
    pub fn new(config: &Config, events: UnboundedSender<Event>) -> Result<Self, DirectionsError> {
        let directions = Arc::new(OsrmDirections::new(&config.directions)?);
        Ok(Self::with_directions(config, events, directions))
    }
}

impl<D: DirectionsProvider> App<D> {
    pub fn with_directions(
        config: &Config,
        events: UnboundedSender<Event>,
        directions: Arc<D>,
    ) -> Self {
        let location = TerminalLocation::new(config.location.clone(), events.clone());
        Self {
            controller: MapScreenController::new(
                location,
                TerminalMap::new(),
                directions,
                events,
                config,
            ),
            dialog: None,
            permission_pending: false,
            should_quit: false,
        }
    }

    /// Runs the screen's load sequence. An error here should end the program.
    pub fn start(&mut self) -> Result<(), MapError> {
        self.controller.load()
    }

    pub fn handle_event(&mut self, event: Event) -> Result<(), MapError> {
        match event {
            // Redraw only
            Event::Tick => {}
            Event::Input(key) => self.handle_key(key)?,
            Event::LocationUpdate(fixes) => self.controller.on_location_update(&fixes),
            Event::AuthorizationRequested => {
                // An open dialog is finished first; the prompt waits for it.
                if self.dialog.is_none() {
                    self.dialog = Some(Dialog::Permission);
                } else {
                    self.permission_pending = true;
                }
            }
            Event::RouteComputed(result) => self.controller.on_route_computed(result),
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<(), MapError> {
        if let Some(dialog) = self.dialog.take() {
            self.handle_dialog_key(dialog, key)?;
            if self.dialog.is_none() && self.permission_pending {
                self.permission_pending = false;
                self.dialog = Some(Dialog::Permission);
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('p') => {
                self.dialog = Some(Dialog::AddPin {
                    latitude: String::new(),
                    longitude: String::new(),
                    focus: PinField::Latitude,
                });
            }
            KeyCode::Char('r') => {
                let pin_count = self.controller.pins().len();
                if pin_count == 0 {
                    info!("There are no pins");
                } else {
                    self.dialog = Some(Dialog::AddRoute {
                        index: String::new(),
                        pin_count,
                    });
                }
            }
            KeyCode::Char('d') => log_failure(self.controller.delete_all_pins()),
            _ => {}
        }
        Ok(())
    }

    pub fn quit(&mut self) {
        self.controller.location_mut().stop_updating_location();
        self.should_quit = true;
    }

    fn handle_dialog_key(&mut self, dialog: Dialog, key: KeyEvent) -> Result<(), MapError> {
        match dialog {
            Dialog::Permission => {
                let answer = match key.code {
                    KeyCode::Char('y') => PermissionStatus::AuthorizedWhenInUse,
                    KeyCode::Char('a') => PermissionStatus::AuthorizedAlways,
                    KeyCode::Char('n') | KeyCode::Esc => PermissionStatus::Denied,
                    _ => {
                        self.dialog = Some(Dialog::Permission);
                        return Ok(());
                    }
                };
                self.controller.location_mut().resolve_authorization(answer);
                self.controller.check_location_permission()?;
            }
            Dialog::AddPin {
                mut latitude,
                mut longitude,
                mut focus,
            } => {
                let field = match focus {
                    PinField::Latitude => &mut latitude,
                    PinField::Longitude => &mut longitude,
                };
                match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Enter => {
                        log_failure(self.controller.add_pin(&latitude, &longitude));
                        return Ok(());
                    }
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        focus = match focus {
                            PinField::Latitude => PinField::Longitude,
                            PinField::Longitude => PinField::Latitude,
                        };
                    }
                    KeyCode::Backspace => {
                        field.pop();
                    }
                    KeyCode::Char(c) => field.push(c),
                    _ => {}
                }
                self.dialog = Some(Dialog::AddPin {
                    latitude,
                    longitude,
                    focus,
                });
            }
            Dialog::AddRoute {
                mut index,
                pin_count,
            } => {
                match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Enter => {
                        log_failure(self.controller.add_route(&index));
                        return Ok(());
                    }
                    KeyCode::Backspace => {
                        index.pop();
                    }
                    KeyCode::Char(c) => index.push(c),
                    _ => {}
                }
                self.dialog = Some(Dialog::AddRoute { index, pin_count });
            }
        }
        Ok(())
    }
}

/// User actions only ever fail into the log.
fn log_failure<T>(result: Result<T, MapError>) {
    if let Err(e) = result {
        warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapSurface;
    use crate::models::Coordinate;
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn app_with(authorization: &str) -> (App, UnboundedReceiver<Event>) {
        let mut config = Config::default();
        config.location.authorization = authorization.to_string();
        config.location.auto_locate = false;
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(&config, tx).unwrap(), rx)
    }

    fn located_app() -> App {
        let (mut app, _rx) = app_with("denied");
        app.start().unwrap();
        app.handle_event(Event::LocationUpdate(vec![Coordinate::new(0.0, 0.0)]))
            .unwrap();
        app
    }

    #[test]
    fn add_pin_dialog_flow() {
        let mut app = located_app();
        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        type_text(&mut app, "10.5");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "20x");
        app.handle_key(key(KeyCode::Backspace)).unwrap();
        assert_eq!(
            app.dialog,
            Some(Dialog::AddPin {
                latitude: "10.5".to_string(),
                longitude: "20".to_string(),
                focus: PinField::Longitude,
            })
        );

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.dialog.is_none());
        assert_eq!(app.controller.pins().len(), 1);
        assert_eq!(app.controller.pins()[0].coordinate, Coordinate::new(10.5, 20.0));
    }

    #[test]
    fn invalid_pin_input_just_closes_the_dialog() {
        let mut app = located_app();
        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        type_text(&mut app, "abc");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.dialog.is_none());
        assert!(app.controller.pins().is_empty());
    }

    #[test]
    fn escape_dismisses_without_changes() {
        let mut app = located_app();
        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        type_text(&mut app, "1");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(app.dialog.is_none());
        assert!(app.controller.pins().is_empty());
        // Keys reach the map again once the dialog is gone
        app.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn route_dialog_needs_pins() {
        let mut app = located_app();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert!(app.dialog.is_none());

        app.controller.add_pin("1", "1").unwrap();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert_eq!(
            app.dialog,
            Some(Dialog::AddRoute {
                index: String::new(),
                pin_count: 1,
            })
        );
    }

    #[test]
    fn out_of_range_route_is_ignored() {
        let mut app = located_app();
        app.controller.add_pin("1", "1").unwrap();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        type_text(&mut app, "5");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.dialog.is_none());
        assert!(app.controller.map().overlays().is_empty());
    }

    #[test]
    fn delete_key_clears_pins() {
        let mut app = located_app();
        app.controller.add_pin("1", "1").unwrap();
        app.controller.add_pin("2", "2").unwrap();
        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        assert!(app.controller.pins().is_empty());
        assert!(app.controller.map().annotations().is_empty());
    }

    #[test]
    fn denied_location_shows_notice() {
        let (mut app, _rx) = app_with("denied");
        app.start().unwrap();
        assert!(app.controller.notice().is_some());
    }

    #[test]
    fn unknown_authorization_fails_start() {
        let (mut app, _rx) = app_with("sometimes");
        assert_eq!(
            app.start(),
            Err(MapError::UnrecognizedPermission("sometimes".to_string()))
        );
    }

    #[tokio::test]
    async fn permission_prompt_grants_and_starts_updates() {
        let (mut app, mut rx) = app_with("not-determined");
        app.start().unwrap();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::AuthorizationRequested));
        app.handle_event(event).unwrap();
        assert_eq!(app.dialog, Some(Dialog::Permission));

        // Unrelated keys keep the prompt open
        app.handle_key(key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.dialog, Some(Dialog::Permission));

        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.dialog.is_none());
        assert!(app.controller.location().is_updating());
        assert!(app.controller.map().shows_user_location);

        match rx.recv().await {
            Some(Event::LocationUpdate(fixes)) => app.handle_event(Event::LocationUpdate(fixes)).unwrap(),
            _ => panic!("expected a location update"),
        }
        let manual = Coordinate::new(
            Config::default().location.manual_lat,
            Config::default().location.manual_lon,
        );
        assert_eq!(app.controller.current_location(), Some(manual));
        app.quit();
        assert!(!app.controller.location().is_updating());
    }

    #[test]
    fn permission_prompt_waits_for_open_dialog() {
        let (mut app, _rx) = app_with("not-determined");
        app.start().unwrap();
        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        type_text(&mut app, "12");

        app.handle_event(Event::AuthorizationRequested).unwrap();
        assert_eq!(
            app.dialog,
            Some(Dialog::AddPin {
                latitude: "12".to_string(),
                longitude: String::new(),
                focus: PinField::Latitude,
            })
        );

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.dialog, Some(Dialog::Permission));
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert!(app.dialog.is_none());
    }

    #[test]
    fn permission_prompt_can_be_declined() {
        let (mut app, _rx) = app_with("not-determined");
        app.start().unwrap();
        app.handle_event(Event::AuthorizationRequested).unwrap();
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert!(app.dialog.is_none());
        assert!(app.controller.notice().is_some());
        assert!(!app.controller.location().is_updating());
    }
}
