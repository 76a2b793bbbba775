use serde::{Deserialize, Serialize};

/// Changes smaller than this are reported as [`Trend::Stable`].
const TREND_EPSILON: f32 = 1e-4;

/// Direction of the most recent change of a metric's target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl Trend {
    fn from_delta(delta: f32) -> Self {
        if delta > TREND_EPSILON {
            Trend::Up
        } else if delta < -TREND_EPSILON {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

/// Read-only view of a metric for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Exact value computed this tick.
    pub value: f32,
    /// Eased value for on-screen display.
    pub displayed: f32,
    pub trend: Trend,
}

/// A scalar whose exact value is recomputed each tick while its displayed
/// value eases towards it over `time_constant` seconds of wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedMetric {
    target: f32,
    displayed: f32,
    trend: Trend,
    time_constant: f32,
}

impl SmoothedMetric {
    pub fn new(initial: f32, time_constant: f32) -> Self {
        SmoothedMetric {
            target: initial,
            displayed: initial,
            trend: Trend::Stable,
            time_constant,
        }
    }

    /// Sets the exact value and advances the displayed value by `dt` seconds.
    pub fn update(&mut self, target: f32, dt: f32) {
        self.trend = Trend::from_delta(target - self.target);
        self.target = target;

        if self.time_constant <= 0.0 {
            self.displayed = target;
            return;
        }
        if dt > 0.0 && dt.is_finite() {
            let alpha = 1.0 - (-dt / self.time_constant).exp();
            self.displayed += (target - self.displayed) * alpha;
        }
    }

    pub fn value(&self) -> f32 {
        self.target
    }

    pub fn displayed(&self) -> f32 {
        self.displayed
    }

    pub fn reading(&self) -> MetricReading {
        MetricReading {
            value: self.target,
            displayed: self.displayed,
            trend: self.trend,
        }
    }
}
