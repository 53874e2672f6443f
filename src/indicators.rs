//! Rolling statistics over return and volume series.
//!
//! The stateful structs update incrementally; the free functions apply them
//! over a whole column and fill undefined (not yet full) windows with 0.

use std::collections::VecDeque;

// =============================================================================
// Rolling Statistics
// =============================================================================

/// Exponential moving average seeded with the first observation.
///
/// With `alpha = 2 / (span + 1)` this is the recursive (non-adjusted) EWMA:
/// `y0 = x0`, `yt = (1 - alpha) * y(t-1) + alpha * xt`.
#[derive(Debug, Clone)]
pub struct Ema {
    pub value: f64,
    pub alpha: f64,
    initialized: bool,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            value: 0.0,
            alpha: 2.0 / (span as f64 + 1.0),
            initialized: false,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        if !self.initialized {
            self.value = x;
            self.initialized = true;
        } else {
            self.value = self.value * (1.0 - self.alpha) + x * self.alpha;
        }
        self.value
    }

    pub fn get(&self) -> f64 {
        self.value
    }
}

/// Simple moving average with fixed window
#[derive(Debug, Clone)]
pub struct Sma {
    window: VecDeque<f64>,
    period: usize,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(period),
            period,
            sum: 0.0,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        self.sum += x;
        self.window.push_back(x);
        if self.window.len() > self.period {
            self.sum -= self.window.pop_front().unwrap_or(0.0);
        }
        self.get()
    }

    pub fn get(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.sum / self.window.len() as f64
        }
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }
}

/// Rolling sample standard deviation (Bessel-corrected).
///
/// Recomputed from the window on each update so that a constant window gives
/// exactly zero rather than cancellation noise.
#[derive(Debug, Clone)]
pub struct RollingStd {
    window: VecDeque<f64>,
    period: usize,
    std: f64,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(period),
            period,
            std: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        self.std = sample_std(self.window.make_contiguous());
        self.std
    }

    pub fn get(&self) -> f64 {
        self.std
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }
}

// =============================================================================
// Window helpers
// =============================================================================

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Sample standard deviation, 0 for fewer than two values.
pub fn sample_std(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Pearson correlation between `xs[..n-1]` and `xs[1..]`.
///
/// Returns `None` when the window is too short or either leg has zero
/// variance.
pub fn lag1_autocorr(xs: &[f64]) -> Option<f64> {
    if xs.len() < 3 {
        return None;
    }
    let lead = &xs[..xs.len() - 1];
    let lag = &xs[1..];
    let ma = mean(lead);
    let mb = mean(lag);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (a, b) in lead.iter().zip(lag) {
        let da = a - ma;
        let db = b - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    let r = cov / (va.sqrt() * vb.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Empirical quantile of an ascending slice with linear interpolation
/// between order statistics at position `q * (n - 1)`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Clip to `[0, max]` then apply `ln(1 + x)`.
pub fn compress(x: f64, max: f64) -> f64 {
    x.clamp(0.0, max).ln_1p()
}

// =============================================================================
// Column transforms
// =============================================================================

/// EWMA over a whole column.
pub fn ewma(xs: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Ema::new(span);
    xs.iter().map(|&x| ema.update(x)).collect()
}

/// Rolling sample std over full windows; 0 until the window fills.
pub fn rolling_std(xs: &[f64], window: usize) -> Vec<f64> {
    let mut std = RollingStd::new(window);
    xs.iter()
        .map(|&x| {
            let s = std.update(x);
            if std.is_ready() { s } else { 0.0 }
        })
        .collect()
}

/// Rolling mean over full windows; `None` until the window fills.
pub fn rolling_mean(xs: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut sma = Sma::new(window);
    xs.iter()
        .map(|&x| {
            let m = sma.update(x);
            if sma.is_ready() { Some(m) } else { None }
        })
        .collect()
}
