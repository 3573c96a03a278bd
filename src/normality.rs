//! Normality tests.
//!
//! Both tests take the raw sample and return the test statistic with its
//! p-value. Small p-values are evidence against the sample coming from a
//! normal distribution.

use std::{f64::consts::PI, fmt};

use serde::Serialize;

use crate::{
    special::{inverse_normal_cdf, poly, standard_normal_sf},
    stats::{self, CentralMoments},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsError {
    TooFewValues { needed: usize, got: usize },
    TooManyValues { limit: usize, got: usize },
    ZeroVariance,
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::TooFewValues { needed, got } => {
                write!(f, "need at least {needed} values, got {got}")
            },
            StatsError::TooManyValues { limit, got } => {
                write!(f, "at most {limit} values are supported, got {got}")
            },
            StatsError::ZeroVariance => write!(f, "sample has zero variance"),
        }
    }
}

impl std::error::Error for StatsError {}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

const SHAPIRO_MAX_VALUES: usize = 5000;

// Royston (1995) polynomial approximations, ascending powers.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Shapiro-Wilk coefficients a₁ ≥ a₂ ≥ … for the `n / 2` outermost order
/// statistic pairs (algorithm AS R94).
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![0.5f64.sqrt()];
    }

    let nf = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| inverse_normal_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    a[0] = a1;

    let (start, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    for i in start..half {
        a[i] = -m[i] / fac;
    }
    a
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    if n == 3 {
        // exact distribution for three observations
        let p = 6.0 / PI * (w.sqrt().asin() - (0.75f64).sqrt().asin());
        return p.max(0.0);
    }

    let w1 = (1.0 - w).ln();
    let (y, m, s) = if n <= 11 {
        let gamma = poly(&G, nf);
        if w1 >= gamma {
            return 1e-99;
        }
        (-(gamma - w1).ln(), poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (w1, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    standard_normal_sf((y - m) / s)
}

/// Shapiro-Wilk W test (Royston 1995), valid for 3 to 5000 values.
pub fn shapiro_wilk(data: &[f64]) -> Result<TestOutcome, StatsError> {
    let n = data.len();
    if n < 3 {
        return Err(StatsError::TooFewValues { needed: 3, got: n });
    }
    if n > SHAPIRO_MAX_VALUES {
        return Err(StatsError::TooManyValues {
            limit: SHAPIRO_MAX_VALUES,
            got: n,
        });
    }

    let x = stats::sorted(data);
    let moments = CentralMoments::of(&x).ok_or(StatsError::ZeroVariance)?;
    if x[n - 1] - x[0] == 0.0 || moments.m2 == 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    let ss = moments.m2 * n as f64;

    let a = shapiro_coefficients(n);
    let numerator = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum::<f64>();
    let w = (numerator * numerator / ss).min(1.0);

    Ok(TestOutcome {
        statistic: w,
        p_value: shapiro_p_value(w, n),
    })
}

/// Z score of the sample skewness (D'Agostino 1970).
fn skew_z(moments: &CentralMoments, n: f64) -> f64 {
    let b1 = moments.skewness();
    let y = b1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    // exactly symmetric samples are scored as y = 1
    let y = if y == 0.0 { 1.0 } else { y };
    delta * (y / alpha).asinh()
}

/// Z score of the sample kurtosis (Anscombe & Glynn 1983).
fn kurtosis_z(moments: &CentralMoments, n: f64) -> f64 {
    let b2 = moments.kurtosis();
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

const DAGOSTINO_MIN_VALUES: usize = 8;

/// D'Agostino-Pearson K² omnibus test combining skewness and kurtosis.
///
/// K² is χ² distributed with two degrees of freedom under normality.
pub fn dagostino_k2(data: &[f64]) -> Result<TestOutcome, StatsError> {
    let n = data.len();
    if n < DAGOSTINO_MIN_VALUES {
        return Err(StatsError::TooFewValues {
            needed: DAGOSTINO_MIN_VALUES,
            got: n,
        });
    }
    let moments = CentralMoments::of(data).ok_or(StatsError::ZeroVariance)?;
    if moments.m2 == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let nf = n as f64;
    let zs = skew_z(&moments, nf);
    let zk = kurtosis_z(&moments, nf);
    let k2 = zs * zs + zk * zk;

    Ok(TestOutcome {
        statistic: k2,
        // χ²₂ survival function
        p_value: (-k2 / 2.0).exp(),
    })
}
