// SPDX-License-Identifier: GPL-3.0-only

//! Terminal check-in console
//!
//! A full-screen scanner for the gate: pick the event, point the camera at a
//! ticket, read the verdict, press `n` for the next participant.

use crate::api::Event;
use crate::checkin::{CheckInVerifier, ScanControl, StatusView, Tone, VerificationClient};
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::info;

/// What the operator had selected when the console closed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleSelection {
    pub event_id: Option<String>,
    pub camera_id: Option<String>,
}

/// Run the scan console until the operator quits
///
/// Must be called from a thread that has entered a multi-threaded tokio
/// runtime, so verification calls make progress while the UI loop blocks
/// on terminal input.
pub fn run<V: VerificationClient>(
    verifier: &mut CheckInVerifier<V>,
    events: &[Event],
) -> Result<ConsoleSelection, Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, verifier, events);

    // The camera must be released even if drawing failed
    verifier.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(ConsoleSelection {
        event_id: verifier.session().selected_event_id.clone(),
        camera_id: verifier.session().camera_id.clone(),
    })
}

fn run_app<V: VerificationClient>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    verifier: &mut CheckInVerifier<V>,
    events: &[Event],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cursor = ListState::default();
    let selected_index = verifier
        .session()
        .selected_event_id
        .as_ref()
        .and_then(|id| events.iter().position(|e| &e.id == id));
    cursor.select(selected_index.or(if events.is_empty() { None } else { Some(0) }));

    loop {
        verifier.pump();
        let view = verifier.view();
        let camera_label = current_camera_label(verifier);
        let event_name = verifier
            .session()
            .selected_event_id
            .as_ref()
            .and_then(|id| events.iter().find(|e| &e.id == id))
            .map(|e| e.nama.clone());

        terminal.draw(|f| {
            let area = f.area();
            let [header, body, footer] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .areas(area);
            let [list_area, status_area] =
                Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
                    .areas(body);

            f.render_widget(
                HeaderBar {
                    event: event_name.as_deref(),
                    camera: camera_label.as_deref(),
                },
                header,
            );
            f.render_stateful_widget(EventList { events }, list_area, &mut cursor);
            f.render_widget(StatusPanel { view: &view }, status_area);
            f.render_widget(
                StatusBar {
                    message: &build_help_message(&view, verifier.cameras().len() > 1),
                },
                footer,
            );
        })?;

        // Handle input with timeout so background results get drawn
        if event::poll(Duration::from_millis(16))?
            && let TermEvent::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up => move_cursor(&mut cursor, events.len(), -1),
                KeyCode::Down => move_cursor(&mut cursor, events.len(), 1),
                KeyCode::Enter => {
                    if let Some(event) = cursor.selected().and_then(|i| events.get(i)) {
                        info!(event_id = %event.id, event = %event.nama, "Event selected");
                        verifier.select_event(Some(event.id.clone()));
                    }
                }
                KeyCode::Char('c') => cycle_camera(verifier),
                KeyCode::Char('r') => {
                    verifier.refresh_cameras();
                }
                KeyCode::Char('s') | KeyCode::Char(' ') => match view.scan_control {
                    ScanControl::Start => verifier.start(),
                    ScanControl::Stop => verifier.stop(),
                    ScanControl::ScanAnother => {
                        verifier.dismiss();
                        verifier.start();
                    }
                    ScanControl::Hidden => {}
                },
                KeyCode::Char('n') | KeyCode::Char('d') => {
                    if view.scan_control == ScanControl::ScanAnother {
                        verifier.dismiss();
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn move_cursor(cursor: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        return;
    }
    let current = cursor.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    cursor.select(Some(next));
}

fn cycle_camera<V: VerificationClient>(verifier: &mut CheckInVerifier<V>) {
    let cameras = verifier.cameras();
    if cameras.len() < 2 {
        return;
    }
    let current = verifier
        .session()
        .camera_id
        .as_ref()
        .and_then(|id| cameras.iter().position(|c| &c.id == id))
        .unwrap_or(0);
    let next = cameras[(current + 1) % cameras.len()].id.clone();
    verifier.select_camera(next);
}

fn current_camera_label<V: VerificationClient>(verifier: &CheckInVerifier<V>) -> Option<String> {
    let id = verifier.session().camera_id.as_ref()?;
    verifier
        .cameras()
        .iter()
        .find(|c| &c.id == id)
        .map(|c| c.display_name())
}

fn build_help_message(view: &StatusView, multi_camera: bool) -> String {
    let mut msg = String::from("↑/↓ Enter: event");
    match view.scan_control {
        ScanControl::Start => msg.push_str(" | 's' start scan"),
        ScanControl::Stop => msg.push_str(" | 's' stop scan"),
        ScanControl::ScanAnother => msg.push_str(" | 'n' scan another"),
        ScanControl::Hidden => {}
    }
    if multi_camera {
        msg.push_str(" | 'c' switch camera");
    }
    msg.push_str(" | 'r' rescan cameras | 'q' quit");
    msg
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Info => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Danger => Color::Red,
    }
}

struct HeaderBar<'a> {
    event: Option<&'a str>,
    camera: Option<&'a str>,
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(" Check-in ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("│ "),
            Span::raw(self.event.unwrap_or("no event")),
            Span::raw(" │ "),
            Span::raw(self.camera.unwrap_or("no camera")),
        ]);
        Paragraph::new(line)
            .style(Style::default().fg(Color::Black).bg(Color::Gray))
            .render(area, buf);
    }
}

struct EventList<'a> {
    events: &'a [Event],
}

impl StatefulWidget for EventList<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let items: Vec<ListItem> = self
            .events
            .iter()
            .map(|e| {
                ListItem::new(vec![
                    Line::from(e.nama.clone()),
                    Line::from(Span::styled(
                        e.tanggal.format("%Y-%m-%d").to_string(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Events"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, area, buf, state);
    }
}

struct StatusPanel<'a> {
    view: &'a StatusView,
}

impl Widget for StatusPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = tone_color(self.view.tone);
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", self.view.icon.glyph()),
                    Style::default().fg(Color::Black).bg(color),
                ),
                Span::raw(" "),
                Span::styled(
                    self.view.message.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::raw(""),
        ];

        if let Some(customer) = &self.view.customer {
            lines.push(Line::from(format!("Name:  {}", customer.nama)));
            lines.push(Line::from(format!("Email: {}", customer.email)));
            lines.push(Line::from(format!("Phone: {}", customer.no_hp)));
            if let Some(at) = customer.verified_at {
                lines.push(Line::from(format!(
                    "Checked in: {}",
                    at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                )));
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title("Status"),
            )
            .render(area, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Render text, cut at a char boundary
        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
