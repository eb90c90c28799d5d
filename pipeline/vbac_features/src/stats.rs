use core::cmp::Ordering;

/// Median of the observed values; `None` when there are none
pub fn median(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// True when every value equals the first
pub fn is_constant(xs: &[f64]) -> bool {
    match xs.first() {
        None => true,
        Some(&first) => xs.iter().all(|&x| x == first),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMoments {
    pub mean: f64,
    /// Sum of squared deviations
    pub ss: f64,
}

impl ColumnMoments {
    pub fn of(xs: &[f64]) -> Self {
        if xs.is_empty() {
            return Self { mean: 0.0, ss: 0.0 };
        }
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        let ss = xs.iter().map(|&x| (x - mean) * (x - mean)).sum();
        Self { mean, ss }
    }
}

/// Pearson correlation; 0.0 when either column has no variance
pub fn pearson(xs: &[f64], a: ColumnMoments, ys: &[f64], b: ColumnMoments) -> f64 {
    if a.ss == 0.0 || b.ss == 0.0 || xs.len() != ys.len() {
        return 0.0;
    }
    let mut sxy = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        sxy += (x - a.mean) * (y - b.mean);
    }
    (sxy / (a.ss.sqrt() * b.ss.sqrt())).clamp(-1.0, 1.0)
}
