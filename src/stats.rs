pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    (count > 0).then_some(sum / count as f64)
}

/// Sample variance with Bessel's correction.
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 1 => {
            let sum_sq = data
                .iter()
                .map(|value| {
                    let diff = data_mean - (*value);

                    diff * diff
                })
                .sum::<f64>();

            Some(sum_sq / (count - 1) as f64)
        },
        _ => None,
    }
}

pub fn sample_std_deviation(data: &[f64]) -> Option<f64> {
    sample_variance(data).map(f64::sqrt)
}

/// Copy of the values sorted ascending.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sorted = sorted(data);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentile of already sorted data with linear interpolation between
/// closest ranks, `q` in `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Biased central moments m2, m3 and m4 (n denominator).
#[derive(Clone, Copy, Debug)]
pub struct CentralMoments {
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
}

impl CentralMoments {
    pub fn of(data: &[f64]) -> Option<Self> {
        let data_mean = mean(data)?;
        let n = data.len() as f64;
        let (mut sum2, mut sum3, mut sum4) = (0.0, 0.0, 0.0);
        for &x in data {
            let d = x - data_mean;
            let d2 = d * d;
            sum2 += d2;
            sum3 += d2 * d;
            sum4 += d2 * d2;
        }
        Some(Self {
            m2: sum2 / n,
            m3: sum3 / n,
            m4: sum4 / n,
        })
    }

    /// Biased skewness g1 = m3 / m2^1.5.
    pub fn skewness(&self) -> f64 {
        self.m3 / self.m2.powf(1.5)
    }

    /// Pearson kurtosis b2 = m4 / m2² (3 for a normal distribution).
    pub fn kurtosis(&self) -> f64 {
        self.m4 / (self.m2 * self.m2)
    }
}

/// Adjusted Fisher-Pearson skewness G1.
///
/// `None` for fewer than 3 values or zero variance.
pub fn skewness(data: &[f64]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }
    let moments = CentralMoments::of(data)?;
    if moments.m2 == 0.0 {
        return None;
    }
    let n = data.len() as f64;
    Some(moments.skewness() * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected excess kurtosis G2, zero for a normal distribution.
///
/// `None` for fewer than 4 values or zero variance.
pub fn excess_kurtosis(data: &[f64]) -> Option<f64> {
    if data.len() < 4 {
        return None;
    }
    let moments = CentralMoments::of(data)?;
    if moments.m2 == 0.0 {
        return None;
    }
    let n = data.len() as f64;
    let g2 = moments.kurtosis() - 3.0;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

/// Least-squares fit `y = slope * x + intercept` and Pearson's r.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (x_mean, y_mean) = (mean(x)?, mean(y)?);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let (dx, dy) = (xi - x_mean, yi - y_mean);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };
    Some((slope, intercept, r))
}
