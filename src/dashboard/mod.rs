//! Live system monitor.
//!
//! [`DashboardSession`] holds all dashboard state and exposes one handler
//! per inbound event. It performs no I/O of its own: handlers that need the
//! network return an [`Effect`] and the caller runs it in the background,
//! feeding the outcome back as another [`SessionEvent`]. That keeps every
//! mutation on the thread that owns the session.

pub mod charts;
pub mod logs;
pub mod metrics;
pub mod theme;

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::client::{ClientError, LogRecord};
use crate::diagnostics;
use crate::feed::{FeedEvent, PerformanceSample};
use crate::notice::{NoticeBoard, NoticeKind};
use crate::settings::schema::DashboardSettings;

use charts::ChartRegistry;
use logs::{LogTicket, LogViewer};
use metrics::{Metric, MetricCard, PerformanceBuffer};
use theme::{PreferenceStore, Theme, ThemeManager};

/// How long the refresh pulse stays lit.
pub const PULSE_DURATION: Duration = Duration::from_secs(1);

pub const LOGS_FETCH_FAILURE: &str = "Failed to load logs";
pub const LOGS_CLEAR_FAILURE: &str = "Failed to clear logs";
pub const THEME_SAVE_FAILURE: &str = "Could not save theme preference";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        })
    }
}

/// Keyboard chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
}

/// A typed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleTheme,
    RefreshLogs,
    ClearLogs,
    /// `None` shows every level.
    Filter(Option<String>),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Feed(FeedEvent),
    Command(Command),
    Key(Key),
    LogsLoaded {
        ticket: LogTicket,
        result: Result<Vec<LogRecord>, ClientError>,
    },
    LogsCleared(Result<(), ClientError>),
    SystemTheme(Theme),
    /// Periodic wake-up so time-based state (pulse, notices) can expire.
    Tick,
}

impl From<FeedEvent> for SessionEvent {
    fn from(event: FeedEvent) -> Self {
        SessionEvent::Feed(event)
    }
}

/// Work the caller must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchLogs(LogTicket),
    ClearLogs,
    Quit,
}

/// Parse one line typed at the monitor prompt.
///
/// Raw control bytes are accepted too (`\x04` for Ctrl+D, `\x12` for
/// Ctrl+R), as are the spelled-out forms `^D` and `ctrl+d`.
pub fn parse_input(line: &str) -> Option<SessionEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.contains('\u{4}') {
        return Some(SessionEvent::Key(Key::Ctrl('d')));
    }
    if line.contains('\u{12}') {
        return Some(SessionEvent::Key(Key::Ctrl('r')));
    }

    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(chord) = lower.strip_prefix("ctrl+").or_else(|| lower.strip_prefix('^'))
        && let Some(c) = chord.chars().next()
        && chord.chars().count() == 1
    {
        return Some(SessionEvent::Key(Key::Ctrl(c)));
    }

    let mut parts = trimmed.split_whitespace();
    let command = match parts.next()? {
        "t" | "theme" => Command::ToggleTheme,
        "r" | "refresh" => Command::RefreshLogs,
        "c" | "clear" => Command::ClearLogs,
        "q" | "quit" | "exit" => Command::Quit,
        "l" | "level" => Command::Filter(
            parts
                .next()
                .filter(|level| !level.eq_ignore_ascii_case("all"))
                .map(str::to_ascii_uppercase),
        ),
        _ => return None,
    };
    Some(SessionEvent::Command(command))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct DashboardSession<P: PreferenceStore> {
    themes: ThemeManager<P>,
    status: ConnectionStatus,
    buffer: PerformanceBuffer,
    cards: [MetricCard; 4],
    charts: ChartRegistry,
    logs: LogViewer,
    notices: NoticeBoard,
    pulse_until: Option<Instant>,
    loading: bool,
}

impl<P: PreferenceStore> DashboardSession<P> {
    pub fn new(themes: ThemeManager<P>, settings: &DashboardSettings) -> Self {
        let charts = ChartRegistry::new(themes.theme());
        Self {
            themes,
            status: ConnectionStatus::Disconnected,
            buffer: PerformanceBuffer::new(settings.max_data_points),
            cards: Metric::ALL.map(MetricCard::empty),
            charts,
            logs: LogViewer::new(),
            notices: NoticeBoard::new(Duration::from_secs(settings.notice_secs)),
            pulse_until: None,
            loading: false,
        }
    }

    /// Dispatch one event to its handler.
    pub fn handle(&mut self, event: SessionEvent) -> Option<Effect> {
        match event {
            SessionEvent::Feed(FeedEvent::Connected) => {
                self.on_connect();
                None
            }
            SessionEvent::Feed(FeedEvent::Disconnected) => {
                self.on_disconnect();
                None
            }
            SessionEvent::Feed(FeedEvent::ConnectError(message)) => {
                self.on_connect_error(&message);
                None
            }
            SessionEvent::Feed(FeedEvent::Performance(sample)) => {
                self.on_performance(&sample);
                None
            }
            SessionEvent::Command(command) => self.handle_command(command),
            SessionEvent::Key(key) => self.handle_key(key),
            SessionEvent::LogsLoaded { ticket, result } => {
                self.apply_log_response(&ticket, result);
                None
            }
            SessionEvent::LogsCleared(result) => self.on_logs_cleared(result),
            SessionEvent::SystemTheme(theme) => {
                self.on_system_theme_change(theme);
                None
            }
            SessionEvent::Tick => None,
        }
    }

    // -- push channel -------------------------------------------------------

    pub fn on_connect(&mut self) {
        diagnostics::info("feed", "connected");
        self.status = ConnectionStatus::Connected;
        self.pulse();
    }

    pub fn on_disconnect(&mut self) {
        diagnostics::info("feed", "disconnected");
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn on_connect_error(&mut self, message: &str) {
        diagnostics::warn("feed", &format!("connection error: {message}"));
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn on_performance(&mut self, sample: &PerformanceSample) {
        self.on_performance_at(sample, Local::now());
    }

    /// Same as [`on_performance`](Self::on_performance) with an explicit
    /// arrival time.
    pub fn on_performance_at(&mut self, sample: &PerformanceSample, at: DateTime<Local>) {
        self.buffer.push(sample, at.format("%H:%M:%S").to_string());
        for card in &mut self.cards {
            card.value = card.metric.read(sample);
        }
        self.charts.update_from(&self.buffer);
        self.pulse();
    }

    fn pulse(&mut self) {
        self.pulse_until = Some(Instant::now() + PULSE_DURATION);
    }

    // -- theme --------------------------------------------------------------

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = match self.themes.toggle() {
            Ok(theme) => theme,
            Err(e) => {
                diagnostics::error("theme", &format!("{e:#}"));
                self.notices.show(NoticeKind::Danger, THEME_SAVE_FAILURE);
                self.themes.theme()
            }
        };
        self.charts.apply_theme(theme);
        theme
    }

    pub fn on_system_theme_change(&mut self, system: Theme) {
        if self.themes.on_system_change(system) {
            self.charts.apply_theme(system);
        }
    }

    // -- input --------------------------------------------------------------

    /// Ctrl+D toggles the theme, Ctrl+R reloads the logs.
    pub fn handle_key(&mut self, key: Key) -> Option<Effect> {
        match key {
            Key::Ctrl('d') | Key::Ctrl('D') => {
                self.toggle_theme();
                None
            }
            Key::Ctrl('r') | Key::Ctrl('R') => Some(self.refresh_logs()),
            _ => None,
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::ToggleTheme => {
                self.toggle_theme();
                None
            }
            Command::RefreshLogs => Some(self.refresh_logs()),
            Command::ClearLogs => Some(self.clear_logs()),
            Command::Filter(level) => Some(self.fetch_logs(level.as_deref())),
            Command::Quit => Some(Effect::Quit),
        }
    }

    // -- logs ---------------------------------------------------------------

    /// Request logs for `level`; the response must come back through
    /// [`apply_log_response`](Self::apply_log_response).
    pub fn fetch_logs(&mut self, level: Option<&str>) -> Effect {
        self.loading = true;
        Effect::FetchLogs(self.logs.begin_fetch(level))
    }

    /// Re-fetch with the active filter.
    pub fn refresh_logs(&mut self) -> Effect {
        let level = self.logs.filter().map(str::to_string);
        self.fetch_logs(level.as_deref())
    }

    pub fn apply_log_response(
        &mut self,
        ticket: &LogTicket,
        result: Result<Vec<LogRecord>, ClientError>,
    ) {
        if !self.logs.is_current(ticket) {
            diagnostics::info(
                "logs",
                &format!("dropped stale response for request {}", ticket.seq()),
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                self.logs.apply(ticket, records);
            }
            Err(e) => {
                diagnostics::error("logs", &format!("error fetching logs: {e}"));
                self.notices.show(NoticeKind::Danger, LOGS_FETCH_FAILURE);
            }
        }
    }

    /// Any fetch still in flight is retired; the list is re-fetched once the
    /// clear completes.
    pub fn clear_logs(&mut self) -> Effect {
        self.logs.invalidate();
        self.loading = true;
        Effect::ClearLogs
    }

    /// After a successful clear the list is re-fetched with the active filter.
    pub fn on_logs_cleared(&mut self, result: Result<(), ClientError>) -> Option<Effect> {
        match result {
            Ok(()) => Some(self.refresh_logs()),
            Err(e) => {
                self.loading = false;
                diagnostics::error("logs", &format!("error clearing logs: {e}"));
                self.notices.show(NoticeKind::Danger, LOGS_CLEAR_FAILURE);
                None
            }
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.themes.theme()
    }

    pub fn themes(&self) -> &ThemeManager<P> {
        &self.themes
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn buffer(&self) -> &PerformanceBuffer {
        &self.buffer
    }

    pub fn cards(&self) -> &[MetricCard; 4] {
        &self.cards
    }

    pub fn card(&self, metric: Metric) -> &MetricCard {
        &self.cards[metric.index()]
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn logs(&self) -> &LogViewer {
        &self.logs
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pulse_active_at(&self, now: Instant) -> bool {
        self.pulse_until.is_some_and(|until| now < until)
    }

    pub fn pulse_active(&self) -> bool {
        self.pulse_active_at(Instant::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
