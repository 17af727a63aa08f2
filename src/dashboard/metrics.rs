//! Sliding window of performance samples and the four metric cards.

use std::collections::VecDeque;
use std::fmt;

use crate::feed::PerformanceSample;

/// Default number of samples kept per metric.
pub const DEFAULT_MAX_POINTS: usize = 20;

/// Above this a metric is `warning`.
pub const WARNING_THRESHOLD: f64 = 60.0;

/// Above this a metric is `critical`.
pub const CRITICAL_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    Ram,
    Gpu,
    GpuMemory,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Ram, Metric::Gpu, Metric::GpuMemory];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Ram => "RAM",
            Metric::Gpu => "GPU",
            Metric::GpuMemory => "GPU Memory",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Metric::Cpu => 0,
            Metric::Ram => 1,
            Metric::Gpu => 2,
            Metric::GpuMemory => 3,
        }
    }

    pub fn read(self, sample: &PerformanceSample) -> Option<f64> {
        match self {
            Metric::Cpu => sample.cpu_percent,
            Metric::Ram => sample.ram_percent,
            Metric::Gpu => sample.gpu_percent,
            Metric::GpuMemory => sample.gpu_memory_percent,
        }
    }
}

// ---------------------------------------------------------------------------
// Status tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    Normal,
    Warning,
    Critical,
    /// No value reported.
    Neutral,
}

impl StatusTier {
    pub fn classify(value: f64) -> Self {
        if value > CRITICAL_THRESHOLD {
            StatusTier::Critical
        } else if value > WARNING_THRESHOLD {
            StatusTier::Warning
        } else {
            StatusTier::Normal
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusTier::Normal => "Normal",
            StatusTier::Warning => "Warning",
            StatusTier::Critical => "Critical",
            StatusTier::Neutral => "N/A",
        })
    }
}

/// Latest value of one metric as shown on its card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCard {
    pub metric: Metric,
    pub value: Option<f64>,
}

impl MetricCard {
    pub fn empty(metric: Metric) -> Self {
        Self {
            metric,
            value: None,
        }
    }

    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) => format!("{v:.1}%"),
            None => "N/A".to_string(),
        }
    }

    pub fn tier(&self) -> StatusTier {
        self.value.map_or(StatusTier::Neutral, StatusTier::classify)
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Parallel bounded sequences, one per metric plus the timestamps.
///
/// All five sequences always have the same length, never above `capacity`.
#[derive(Debug, Clone)]
pub struct PerformanceBuffer {
    capacity: usize,
    timestamps: VecDeque<String>,
    series: [VecDeque<f64>; 4],
}

impl Default for PerformanceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl PerformanceBuffer {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            timestamps: VecDeque::with_capacity(capacity + 1),
            series: std::array::from_fn(|_| VecDeque::with_capacity(capacity + 1)),
        }
    }

    /// Append a sample; missing values are stored as `0`.
    pub fn push(&mut self, sample: &PerformanceSample, timestamp: impl Into<String>) {
        for metric in Metric::ALL {
            self.series[metric.index()].push_back(metric.read(sample).unwrap_or(0.0));
        }
        self.timestamps.push_back(timestamp.into());

        if self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
            for series in &mut self.series {
                series.pop_front();
            }
        }
    }

    pub fn series(&self, metric: Metric) -> &VecDeque<f64> {
        &self.series[metric.index()]
    }

    pub fn timestamps(&self) -> &VecDeque<String> {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
