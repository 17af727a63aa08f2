//! Full-screen text rendering of a [`DashboardSession`].

use std::time::Instant;

use colored::{ColoredString, Colorize};

use super::logs::render_table;
use crate::dashboard::charts::{Chart, Palette, hex_to_rgb};
use crate::dashboard::metrics::{MetricCard, StatusTier};
use crate::dashboard::theme::PreferenceStore;
use crate::dashboard::{ConnectionStatus, DashboardSession};
use crate::notice::NoticeKind;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Clear the screen and home the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const HELP_LINE: &str =
    "t theme · r refresh · c clear · l <LEVEL> filter · q quit · ^D theme · ^R refresh";

fn paint(text: &str, hex: &str) -> ColoredString {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

/// One character per sample, scaled to 0-100.
pub fn sparkline(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| {
            let clamped = v.clamp(0.0, 100.0);
            let index = ((clamped / 100.0) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[index.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn tier_color(tier: StatusTier, palette: &Palette) -> Option<&'static str> {
    match tier {
        StatusTier::Normal => Some(palette.success),
        StatusTier::Warning => Some(palette.warning),
        StatusTier::Critical => Some(palette.error),
        StatusTier::Neutral => None,
    }
}

fn render_card(card: &MetricCard, chart: &Chart, palette: &Palette) -> String {
    let tier = card.tier();
    let status = match tier_color(tier, palette) {
        Some(hex) => paint(&tier.to_string(), hex).bold(),
        None => tier.to_string().dimmed(),
    };
    let line = chart
        .datasets
        .first()
        .map(|d| paint(&sparkline(&d.data), &d.border_color).to_string())
        .unwrap_or_default();
    format!(
        "  {:<11} {:>7}  {:<9} {}\n",
        card.metric.label().bold(),
        card.display_value(),
        status,
        line
    )
}

fn render_overview(chart: &Chart) -> String {
    let mut out = String::new();
    let span = match (chart.labels.first(), chart.labels.last()) {
        (Some(first), Some(last)) => format!("{first} → {last}"),
        _ => "waiting for data".to_string(),
    };
    out.push_str(&format!("{} {}\n", "Overview".bold().cyan(), span.dimmed()));
    for dataset in &chart.datasets {
        out.push_str(&format!(
            "  {:<16} {}\n",
            paint(&dataset.label, &dataset.border_color),
            paint(&sparkline(&dataset.data), &dataset.border_color)
        ));
    }
    out
}

/// The whole monitor screen, without the clear-screen prefix.
pub fn render_dashboard<P: PreferenceStore>(
    session: &DashboardSession<P>,
    log_rows: usize,
    now: Instant,
) -> String {
    let palette = session.charts().palette();
    let mut out = String::new();

    let status = match session.status() {
        ConnectionStatus::Connected => paint("● Connected", palette.success),
        ConnectionStatus::Disconnected => paint("● Disconnected", palette.error),
    };
    let pulse = if session.pulse_active_at(now) {
        paint(" ⟳", palette.info).to_string()
    } else {
        String::new()
    };
    let loading = if session.is_loading() {
        format!("  {}", "loading…".dimmed())
    } else {
        String::new()
    };
    out.push_str(&format!(
        "{}  {}{}  {}{}\n",
        paint("System Monitor", palette.primary).bold(),
        status,
        pulse,
        format!("theme: {}", session.theme()).dimmed(),
        loading
    ));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    if let Some(notice) = session.notices().visible_at(now) {
        let text = match notice.kind {
            NoticeKind::Success => paint(&notice.message, palette.success),
            NoticeKind::Danger => paint(&notice.message, palette.error),
        };
        out.push_str(&format!("{}\n", text.bold()));
    }
    out.push('\n');

    for card in session.cards() {
        out.push_str(&render_card(card, session.charts().mini(card.metric), palette));
    }
    out.push('\n');
    out.push_str(&render_overview(session.charts().overview()));
    out.push('\n');

    out.push_str(&format!("{}\n", "Logs".bold().cyan()));
    out.push_str(&render_table(session.logs(), palette, log_rows));
    out.push('\n');
    out.push_str(&format!("{}\n", HELP_LINE.dimmed()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::theme::{MemoryStore, ThemeManager};
    use crate::feed::PerformanceSample;
    use crate::settings::schema::DashboardSettings;

    #[test]
    fn sparkline_scales_to_levels() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0, 150.0, -3.0]), "▁▅██▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn screen_shows_cards_overview_and_placeholder() {
        colored::control::set_override(false);
        let mut session = DashboardSession::new(
            ThemeManager::new(MemoryStore::default(), None),
            &DashboardSettings::default(),
        );
        session.on_connect();
        session.on_performance(&PerformanceSample {
            cpu_percent: Some(72.25),
            ..PerformanceSample::default()
        });

        let screen = render_dashboard(&session, 10, Instant::now());
        assert!(screen.contains("● Connected"));
        assert!(screen.contains("72.2%") || screen.contains("72.3%"));
        assert!(screen.contains("Warning"));
        assert!(screen.contains("GPU Memory (%)"));
        assert!(screen.contains("N/A"));
        assert!(screen.contains(crate::dashboard::logs::NO_LOGS));
    }
}
