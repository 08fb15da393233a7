use anyhow::Result;
use crossterm::event::KeyEventKind;
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::event_source::{Event, EventSource, KeyCode, KeyEvent, MouseEvent};
use crate::ingest::is_pdf;
use crate::inputs::{gesture_from_key, gesture_from_mouse};
use crate::notification::{NotificationLevel, NotificationManager};
use crate::session::{PageDisplay, PageView, ReadingSession, SourceKind};
use crate::settings::Settings;

pub const CONTROLS_HINT: &str = "Press ? to hide/show the controls.";
pub const DIRECTION_CHANGED: &str = "Reading direction changed.";

/// Display adapter for the terminal: page changes only mark the next frame as due
#[derive(Debug, Default)]
pub struct FrameRequest {
    pending: bool,
}

impl FrameRequest {
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl PageDisplay for FrameRequest {
    fn refresh(&mut self, view: PageView<'_>) {
        debug!("Page {:?} of {}", view.index, view.len);
        self.pending = true;
    }

    fn direction_changed(&mut self, _direction: crate::navigation::ReadingDirection) {
        self.pending = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Viewing,
    OpenPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App {
    pub session: ReadingSession<FrameRequest>,
    pub mode: Mode,
    pub chrome_visible: bool,
    pub prompt: String,
    pub notifications: NotificationManager,
}

impl App {
    pub fn new(mut session: ReadingSession<FrameRequest>, settings: &Settings) -> Self {
        session.set_direction(settings.reading_direction);
        Self {
            session,
            mode: Mode::Viewing,
            chrome_visible: true,
            prompt: String::new(),
            notifications: NotificationManager::with_default_duration(
                settings.notification_duration(),
            ),
        }
    }

    /// Open a folder or a PDF. Returns true when a sequence was installed.
    pub fn open_source(&mut self, path: &Path) -> bool {
        let result = if is_pdf(path) {
            self.session.load_pdf(path)
        } else if path.is_dir() {
            self.session.load_folder(path)
        } else {
            warn!("{path:?} is neither a folder nor a PDF");
            self.notifications
                .error(format!("Not a folder or PDF: {}", path.display()));
            return false;
        };

        match result {
            Ok(()) => {
                self.done_opening();
                true
            }
            Err(e) if is_pdf(path) && self.session.sequence_len() > 0 => {
                warn!("Partial extraction of {path:?}: {e}");
                self.done_opening();
                self.notifications.warn(format!(
                    "Showing {} images; extraction stopped: {e}",
                    self.session.sequence_len()
                ));
                true
            }
            Err(e) => {
                warn!("Failed to open {path:?}: {e}");
                self.notifications.error(e.to_string());
                false
            }
        }
    }

    fn done_opening(&mut self) {
        self.chrome_visible = false;
        if self.session.sequence_len() == 0 {
            self.notifications.warn("No images found.");
        } else {
            self.notifications.info(CONTROLS_HINT);
        }
    }

    pub fn handle_event(&mut self, event: &Event, viewport_width: u16) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match self.mode {
                Mode::Viewing => self.handle_key(*key),
                Mode::OpenPrompt => {
                    self.handle_prompt_key(*key);
                    None
                }
            },
            Event::Mouse(mouse) if self.mode == Mode::Viewing => {
                self.handle_mouse(mouse, viewport_width);
                None
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if let Some(gesture) = gesture_from_key(key.code) {
            self.session.navigate(gesture);
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('d') => {
                self.session.toggle_direction();
                self.notifications.info(DIRECTION_CHANGED);
            }
            KeyCode::Char('o') => {
                self.prompt.clear();
                self.mode = Mode::OpenPrompt;
            }
            KeyCode::Char('?') | KeyCode::Tab => {
                self.chrome_visible = !self.chrome_visible;
                self.notifications.info(CONTROLS_HINT);
            }
            _ => {}
        }
        None
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt.clear();
                self.mode = Mode::Viewing;
            }
            KeyCode::Enter => {
                self.mode = Mode::Viewing;
                let input = std::mem::take(&mut self.prompt);
                let input = input.trim();
                if !input.is_empty() {
                    self.open_source(&PathBuf::from(input));
                }
            }
            KeyCode::Backspace => {
                self.prompt.pop();
            }
            KeyCode::Char(c) => self.prompt.push(c),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, viewport_width: u16) {
        if let Some(gesture) = gesture_from_mouse(mouse, viewport_width) {
            self.session.navigate(gesture);
        }
    }

    /// Release extracted files; call once before the process exits
    pub fn shutdown(&mut self) {
        info!("Releasing workspace");
        self.session.cleanup_workspace();
    }

    pub fn draw(&self, frame: &mut Frame) {
        let show_footer = self.chrome_visible || self.mode == Mode::OpenPrompt;
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(u16::from(self.chrome_visible)),
            Constraint::Min(1),
            Constraint::Length(u16::from(show_footer)),
        ])
        .areas(frame.area());

        if self.chrome_visible {
            frame.render_widget(Paragraph::new(self.header_line()), header);
        }
        self.draw_page(frame, body);
        if show_footer {
            frame.render_widget(Paragraph::new(self.footer_line()), footer);
        }
        self.draw_notification(frame, body);
    }

    fn header_line(&self) -> Line<'static> {
        let source = match self.session.source() {
            Some(SourceKind::Folder(path)) => format!("Folder: {}", path.display()),
            Some(SourceKind::Pdf(path)) => format!("PDF: {}", path.display()),
            None => "Nothing open".to_string(),
        };
        Line::from(vec![
            Span::styled(
                " mangaview ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {source} ")),
            Span::styled(
                format!("[{}]", self.session.direction().as_str()),
                Style::default().fg(Color::Yellow),
            ),
        ])
    }

    fn footer_line(&self) -> Line<'static> {
        match self.mode {
            Mode::OpenPrompt => Line::from(vec![
                Span::styled("Open: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("{}_", self.prompt)),
            ]),
            Mode::Viewing => Line::from(Span::styled(
                " ←/→ page  wheel/click page  d direction  o open  ? controls  q quit",
                Style::default().fg(Color::DarkGray),
            )),
        }
    }

    fn draw_page(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        match (self.session.current_image(), self.session.current_index()) {
            (Some(image), Some(index)) => {
                lines.push(Line::from(Span::styled(
                    image.file_name().into_owned(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::default());
                lines.push(Line::from(format!(
                    "Page {} / {}",
                    index + 1,
                    self.session.sequence_len()
                )));
                lines.push(Line::from(Span::styled(
                    image.to_string(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ if self.session.source().is_none() => {
                lines.push(Line::from("Press o to open a folder or PDF"));
            }
            _ => {
                lines.push(Line::from("No images"));
            }
        }

        let top_padding = area.height.saturating_sub(2 + lines.len() as u16) / 2;
        let mut padded = vec![Line::default(); usize::from(top_padding)];
        padded.extend(lines);

        let page = Paragraph::new(padded)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(page, area);
    }

    fn draw_notification(&self, frame: &mut Frame, area: Rect) {
        let Some(notification) = self.notifications.current() else {
            return;
        };
        if area.height < 3 {
            return;
        }
        let style = match notification.level {
            NotificationLevel::Info => Style::default().fg(Color::White).bg(Color::DarkGray),
            NotificationLevel::Warning => Style::default().fg(Color::Black).bg(Color::Yellow),
            NotificationLevel::Error => Style::default().fg(Color::White).bg(Color::Red),
        };
        let line_area = Rect {
            x: area.x + 1,
            y: area.y + area.height - 2,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        frame.render_widget(Clear, line_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {} ", notification.message),
                style,
            )))
            .alignment(Alignment::Center),
            line_area,
        );
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut first_render = true;
    loop {
        let mut needs_redraw = std::mem::take(&mut first_render);
        let mut should_quit = false;
        let mut events_processed = 0;

        while events_processed < 50 && event_source.poll(Duration::from_millis(0))? {
            let event = event_source.read()?;
            events_processed += 1;
            needs_redraw = true;

            let viewport_width = terminal.size()?.width;
            if app.handle_event(&event, viewport_width) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        if app.notifications.update() {
            needs_redraw = true;
        }
        if app.session.display_mut().take_pending() {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|frame| app.draw(frame))?;
        }

        if should_quit {
            info!("Quit requested");
            return Ok(());
        }

        event_source.poll(tick_rate)?;
    }
}
