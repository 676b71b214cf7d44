//! TUI rendering for the map screen.
//!
//! Draws the [`TerminalMap`](crate::map::TerminalMap) held by the controller
//! onto a ratatui canvas, a one-line status bar, and whichever dialog is open.

use crate::app::{App, Dialog, PinField};
use crate::map::{MapDelegate, MapSurface};
use crate::models::{Coordinate, ElevationStyle, Overlay};
use ratatui::{
    prelude::*,
    widgets::{canvas::*, *}, // Imports Map, Line (canvas), Clear, etc.
};

use ratatui::text::Line;

/// Narrowest extent, in degrees, the canvas will zoom to.
const MIN_SPAN_DEGREES: f64 = 0.005;

/// Renders one frame of the map screen.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.size());

    render_map(f, app, chunks[0]);
    render_status_bar(f, app, chunks[1]);

    if let Some(dialog) = &app.dialog {
        render_dialog(f, dialog);
    }
}

/// Map canvas: world outline, route overlays, pins, compass and the user.
///
/// Bounds come from the region last set on the map; the elevation style
/// picks the outline resolution.
fn render_map(f: &mut Frame, app: &App, area: Rect) {
    let map = app.controller.map();
    let user = app.controller.current_location();
    let (x_bounds, y_bounds) = map.bounds(user.unwrap_or(Coordinate::new(0.0, 0.0)), MIN_SPAN_DEGREES);

    let mut title = String::from(" Map ");
    if map.options.shows_scale {
        let span_km = map
            .region
            .map(|r| r.longitudinal_meters / 1000.0)
            .unwrap_or(0.0);
        title = format!(" Map │ scale: {:.1} km across ", span_km);
    }

    let resolution = match map.options.elevation {
        ElevationStyle::Realistic => MapResolution::High,
        ElevationStyle::Flat => MapResolution::Low,
    };

    let canvas = Canvas::default()
        .block(Block::bordered().title(title))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::Rgb(50, 50, 50),
                resolution,
            });
            ctx.layer();

            for overlay in map.overlays() {
                let renderer = app.controller.renderer_for(overlay);
                match overlay {
                    Overlay::Polyline(points) => {
                        for pair in points.windows(2) {
                            ctx.draw(&canvas::Line {
                                x1: pair[0].longitude,
                                y1: pair[0].latitude,
                                x2: pair[1].longitude,
                                y2: pair[1].latitude,
                                color: renderer.stroke_color,
                            });
                        }
                    }
                }
            }
            ctx.layer();

            for annotation in map.annotations() {
                ctx.print(
                    annotation.coordinate.longitude,
                    annotation.coordinate.latitude,
                    Line::from(Span::styled(
                        format!("◉{}", annotation.title),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )),
                );
            }

            if map.options.shows_compass {
                let label_style = Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM);
                let mid_x = (x_bounds[0] + x_bounds[1]) / 2.0;
                let mid_y = (y_bounds[0] + y_bounds[1]) / 2.0;
                let inset_x = (x_bounds[1] - x_bounds[0]) * 0.05;
                let inset_y = (y_bounds[1] - y_bounds[0]) * 0.05;

                ctx.print(mid_x, y_bounds[1] - inset_y, Line::from(Span::styled("N", label_style)));
                ctx.print(mid_x, y_bounds[0] + inset_y, Line::from(Span::styled("S", label_style)));
                ctx.print(x_bounds[1] - inset_x, mid_y, Line::from(Span::styled("E", label_style)));
                ctx.print(x_bounds[0] + inset_x, mid_y, Line::from(Span::styled("W", label_style)));
            }

            if let (true, Some(user)) = (map.shows_user_location, user) {
                ctx.print(
                    user.longitude,
                    user.latitude,
                    Line::from(Span::styled(" ⌖ ", Style::default().fg(Color::Cyan))),
                );
            }
        });

    f.render_widget(canvas, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let location = app
        .controller
        .current_location()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut spans = vec![
        Span::styled(" PINS: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            app.controller.pins().len().to_string(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  │  "),
        Span::styled("YOU: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(location),
        Span::raw("  │  "),
    ];
    if let Some(notice) = app.controller.notice() {
        spans.push(Span::styled(notice, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw("  │  "));
    }
    spans.push(Span::styled(
        "p pin  r route  d delete all  q quit",
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_dialog(f: &mut Frame, dialog: &Dialog) {
    let (title, lines) = match dialog {
        Dialog::AddPin {
            latitude,
            longitude,
            focus,
        } => (
            " Enter the pin coordinates ",
            vec![
                input_line("latitude", latitude, *focus == PinField::Latitude),
                input_line("longitude", longitude, *focus == PinField::Longitude),
                Line::from(""),
                help_line("Tab switch field   Enter OK   Esc cancel"),
            ],
        ),
        Dialog::AddRoute { index, pin_count } => (
            " Route to which pin? ",
            vec![
                input_line(&format!("a number up to {}", pin_count), index, true),
                Line::from(""),
                help_line("Enter OK   Esc cancel"),
            ],
        ),
        Dialog::Permission => (
            " Allow access to your location? ",
            vec![
                Line::from(" Your location is looked up to center the map and plan routes."),
                Line::from(""),
                help_line("y while using   a always   n don't allow"),
            ],
        ),
    };

    let area = centered_rect(60, 7, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        ),
        area,
    );
}

fn input_line<'a>(label: &str, value: &'a str, focused: bool) -> Line<'a> {
    let style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .bg(Color::Rgb(30, 30, 60))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!(" {:<18}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}{}", value, if focused { "▏" } else { "" }), style),
    ])
}

fn help_line(text: &str) -> Line<'_> {
    Line::from(Span::styled(format!(" {}", text), Style::default().fg(Color::DarkGray)))
}

/// Rect of `percent_x`% width and `height` rows centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::Event;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn app() -> App {
        let mut config = Config::default();
        config.location.authorization = "denied".to_string();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(&config, tx).unwrap();
        app.start().unwrap();
        app
    }

    #[test]
    fn status_bar_shows_pins_and_notice() {
        let mut app = app();
        app.handle_event(Event::LocationUpdate(vec![Coordinate::new(0.0, 0.0)]))
            .unwrap();
        app.controller.add_pin("0.01", "0.01").unwrap();
        let text = screen_text(&app);
        assert!(text.contains("PINS: 1"));
        assert!(text.contains("Please turn on location access"));
        assert!(text.contains("scale: 3.1 km across"));
    }

    #[test]
    fn dialogs_render_their_prompt() {
        let mut app = app();
        app.dialog = Some(Dialog::AddRoute {
            index: "2".to_string(),
            pin_count: 3,
        });
        assert!(screen_text(&app).contains("a number up to 3"));

        app.dialog = Some(Dialog::Permission);
        assert!(screen_text(&app).contains("Allow access to your location?"));
    }
}
