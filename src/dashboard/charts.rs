//! Chart models: four mini charts and the overview.
//!
//! A chart here is the data a renderer needs (labels, datasets, colors) plus
//! a redraw counter. Every redraw is requested without animation.

use super::metrics::{Metric, PerformanceBuffer};
use super::theme::Theme;

/// Alpha suffix appended to a hex color for filled areas.
pub const FILL_ALPHA: &str = "20";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
    pub info: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    primary: "#8b5cf6",
    secondary: "#a78bfa",
    success: "#10b981",
    warning: "#f59e0b",
    error: "#ef4444",
    info: "#3b82f6",
};

pub const DARK_PALETTE: Palette = Palette {
    primary: "#fb923c",
    secondary: "#fdba74",
    success: "#34d399",
    warning: "#fbbf24",
    error: "#f87171",
    info: "#60a5fa",
};

impl Palette {
    pub fn for_theme(theme: Theme) -> &'static Palette {
        match theme {
            Theme::Light => &LIGHT_PALETTE,
            Theme::Dark => &DARK_PALETTE,
        }
    }

    /// Overview line color for `metric`.
    pub fn overview_color(&self, metric: Metric) -> &'static str {
        match metric {
            Metric::Cpu => self.primary,
            Metric::Ram => self.success,
            Metric::Gpu => self.warning,
            Metric::GpuMemory => self.error,
        }
    }
}

/// Parse `#rrggbb` into its components.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() < 6 || !digits.is_char_boundary(6) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartId {
    Mini(Metric),
    Overview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: String,
}

impl Dataset {
    fn new(label: String, color: &str) -> Self {
        Self {
            label,
            data: Vec::new(),
            border_color: color.to_string(),
            background_color: format!("{color}{FILL_ALPHA}"),
        }
    }

    fn recolor(&mut self, color: &str) {
        self.border_color = color.to_string();
        self.background_color = format!("{color}{FILL_ALPHA}");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub id: ChartId,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    redraws: u64,
    last_animated: bool,
}

impl Chart {
    fn new(id: ChartId, datasets: Vec<Dataset>) -> Self {
        Self {
            id,
            labels: Vec::new(),
            datasets,
            redraws: 0,
            last_animated: false,
        }
    }

    fn redraw(&mut self, animate: bool) {
        self.redraws += 1;
        self.last_animated = animate;
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn last_redraw_animated(&self) -> bool {
        self.last_animated
    }
}

/// All five charts of the dashboard, kept in one place so a theme change or
/// a new sample updates them together.
#[derive(Debug, Clone)]
pub struct ChartRegistry {
    palette: &'static Palette,
    minis: Vec<Chart>,
    overview: Chart,
}

impl ChartRegistry {
    pub fn new(theme: Theme) -> Self {
        let palette = Palette::for_theme(theme);
        let minis = Metric::ALL
            .iter()
            .map(|&metric| {
                Chart::new(
                    ChartId::Mini(metric),
                    vec![Dataset::new(String::new(), palette.primary)],
                )
            })
            .collect();
        let overview = Chart::new(
            ChartId::Overview,
            Metric::ALL
                .iter()
                .map(|&metric| {
                    Dataset::new(
                        format!("{} (%)", metric.label()),
                        palette.overview_color(metric),
                    )
                })
                .collect(),
        );
        Self {
            palette,
            minis,
            overview,
        }
    }

    pub fn palette(&self) -> &'static Palette {
        self.palette
    }

    /// Copy the whole buffer into every chart and redraw.
    pub fn update_from(&mut self, buffer: &PerformanceBuffer) {
        let labels: Vec<String> = buffer.timestamps().iter().cloned().collect();

        for (chart, metric) in self.minis.iter_mut().zip(Metric::ALL) {
            chart.labels = labels.clone();
            chart.datasets[0].data = buffer.series(metric).iter().copied().collect();
            chart.redraw(false);
        }

        self.overview.labels = labels;
        for (dataset, metric) in self.overview.datasets.iter_mut().zip(Metric::ALL) {
            dataset.data = buffer.series(metric).iter().copied().collect();
        }
        self.overview.redraw(false);
    }

    /// Swap every chart to the palette of `theme` and redraw.
    pub fn apply_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
        for chart in &mut self.minis {
            chart.datasets[0].recolor(self.palette.primary);
            chart.redraw(false);
        }
        for (dataset, metric) in self.overview.datasets.iter_mut().zip(Metric::ALL) {
            dataset.recolor(self.palette.overview_color(metric));
        }
        self.overview.redraw(false);
    }

    pub fn mini(&self, metric: Metric) -> &Chart {
        &self.minis[metric.index()]
    }

    pub fn overview(&self) -> &Chart {
        &self.overview
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chart> {
        self.minis.iter().chain(std::iter::once(&self.overview))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
