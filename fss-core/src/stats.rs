//! Statistics primitives — pure functions over f64 slices.
//!
//! Degenerate inputs (empty slices, zero variance, undefined correlation)
//! evaluate to 0.0 rather than NaN. NaN cells in cross-sectional passes are
//! skipped on input and map to a zero z-score on output, which downstream
//! becomes the neutral score 50.

/// Mean of the non-NaN entries; 0.0 when none exist.
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values {
        if !v.is_nan() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Population standard deviation (divide by N) of the non-NaN entries.
pub fn std_pop(values: &[f64]) -> f64 {
    let mut n = 0usize;
    let mut m = 0.0;
    for &v in values {
        if !v.is_nan() {
            m += v;
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }
    m /= n as f64;
    let var: f64 = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - m) * (v - m))
        .sum::<f64>()
        / n as f64;
    var.sqrt()
}

/// Median of the non-NaN entries; 0.0 when none exist.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Cross-sectional z-scores.
///
/// Zero or undefined standard deviation defines every z-score as 0 for that
/// cross-section; NaN inputs also map to 0.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let s = std_pop(values);
    values
        .iter()
        .map(|&v| {
            if v.is_nan() || s == 0.0 || s.is_nan() {
                0.0
            } else {
                (v - m) / s
            }
        })
        .collect()
}

/// Map a z-score onto [0, 100] through a clipped [-3σ, +3σ] window; 50 = neutral.
pub fn z_to_score(z: f64, clip_z: f64) -> f64 {
    let z = z.clamp(-clip_z, clip_z);
    50.0 + (z / clip_z) * 50.0
}

/// Average ranks (1-based), ties sharing the mean rank.
///
/// Callers filter NaNs before ranking; a NaN here compares as equal.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[idx[j + 1]] == values[idx[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[idx[k]] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Pearson correlation over the pairs where both sides are non-NaN; 0.0
/// when fewer than two such pairs exist or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    let mut count = 0usize;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for i in 0..n {
        if x[i].is_nan() || y[i].is_nan() {
            continue;
        }
        sx += x[i];
        sy += y[i];
        count += 1;
    }
    if count < 2 {
        return 0.0;
    }
    let mx = sx / count as f64;
    let my = sy / count as f64;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for i in 0..n {
        if x[i].is_nan() || y[i].is_nan() {
            continue;
        }
        let dx = x[i] - mx;
        let dy = y[i] - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return 0.0;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// Spearman rank correlation — the information coefficient of factor investing.
///
/// Pairs with a NaN on either side are dropped before ranking.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for i in 0..n {
        if !x[i].is_nan() && !y[i].is_nan() {
            xs.push(x[i]);
            ys.push(y[i]);
        }
    }
    if xs.len() < 2 {
        return 0.0;
    }
    let rx = average_ranks(&xs);
    let ry = average_ranks(&ys);
    pearson(&rx, &ry)
}

/// Lag-k autocorrelation; 0.0 on degenerate input.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag + 1 {
        return 0.0;
    }
    pearson(&values[..values.len() - lag], &values[lag..])
}

/// Rolling mean over a trailing window; NaN until the window is full.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, mean)
}

/// Rolling population standard deviation; NaN until the window is full.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, std_pop)
}

/// Rolling mean that emits a value as soon as one observation exists
/// (pandas `min_periods=1` semantics).
pub fn rolling_mean_min1(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Rolling population std with `min_periods=1` semantics.
pub fn rolling_std_min1(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            std_pop(&values[start..=i])
        })
        .collect()
}

/// Rolling sum with `min_periods=1` semantics; NaN cells contribute 0.
pub fn rolling_sum_min1(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i].iter().filter(|v| !v.is_nan()).sum()
        })
        .collect()
}

/// Rolling maximum; NaN until the window is full.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |s| {
        s.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Rolling minimum; NaN until the window is full.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |s| {
        s.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

fn rolling(values: &[f64], window: usize, f: fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(slice);
    }
    out
}
