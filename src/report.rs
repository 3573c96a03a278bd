use serde::Serialize;

use crate::{
    normality::{self, StatsError, TestOutcome},
    stats,
};

/// Significance level both normality tests are judged against.
pub const ALPHA: f64 = 0.05;

pub const FAIL_TO_REJECT: &str = "No evidence against normality (fail to reject H0)";
pub const REJECT: &str = "Evidence of non-normality (reject H0)";

pub fn interpret(p_value: f64) -> &'static str {
    if p_value > ALPHA {
        FAIL_TO_REJECT
    } else {
        REJECT
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub std_sample: f64,
    pub skewness: f64,
    pub kurtosis_excess: f64,
    pub shapiro_stat: f64,
    pub shapiro_p: f64,
    pub dagostino_stat: f64,
    pub dagostino_p: f64,
    pub interpretation_shapiro: &'static str,
    pub interpretation_dagostino: &'static str,
}

impl StatisticsReport {
    pub fn compute(values: &[f64]) -> Result<Self, StatsError> {
        let n = values.len();
        let too_few = |needed| StatsError::TooFewValues { needed, got: n };

        let mean = stats::mean(values).ok_or(too_few(1))?;
        let median = stats::median(values).ok_or(too_few(1))?;
        let std_sample = stats::sample_std_deviation(values).ok_or(too_few(2))?;
        if std_sample == 0.0 {
            return Err(StatsError::ZeroVariance);
        }
        let skewness = stats::skewness(values).ok_or(too_few(3))?;
        let kurtosis_excess = stats::excess_kurtosis(values).ok_or(too_few(4))?;

        let TestOutcome {
            statistic: shapiro_stat,
            p_value: shapiro_p,
        } = normality::shapiro_wilk(values)?;
        let TestOutcome {
            statistic: dagostino_stat,
            p_value: dagostino_p,
        } = normality::dagostino_k2(values)?;

        Ok(Self {
            n,
            mean,
            median,
            std_sample,
            skewness,
            kurtosis_excess,
            shapiro_stat,
            shapiro_p,
            dagostino_stat,
            dagostino_p,
            interpretation_shapiro: interpret(shapiro_p),
            interpretation_dagostino: interpret(dagostino_p),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_for_one_to_ten() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let report = StatisticsReport::compute(&values).unwrap();
        assert_eq!(report.n, 10);
        assert_eq!(report.mean, 5.5);
        assert_eq!(report.median, 5.5);
        assert!((report.std_sample - 3.0276503540974917).abs() < 1e-12);
        assert!(report.skewness.abs() < 1e-12);
        assert!((report.kurtosis_excess + 1.2).abs() < 1e-12);
        assert!((report.shapiro_stat - 0.9702).abs() < 1e-3);
        assert!((report.shapiro_p - 0.8924).abs() < 1e-3);
        assert_eq!(report.interpretation_shapiro, FAIL_TO_REJECT);
        assert_eq!(report.interpretation_dagostino, FAIL_TO_REJECT);
    }

    #[test]
    fn test_report_flags_outlier() {
        let mut values = vec![5.0, 5.1, 4.9, 5.0, 5.2, 4.8, 5.1, 4.9, 5.0, 5.0, 5.1];
        values.push(60.0);
        let report = StatisticsReport::compute(&values).unwrap();
        assert_eq!(report.n, 12);
        assert_eq!(report.interpretation_shapiro, REJECT);
        assert_eq!(report.interpretation_dagostino, REJECT);
    }

    #[test]
    fn test_constant_input_is_an_error() {
        assert_eq!(
            StatisticsReport::compute(&[2.5; 10]),
            Err(StatsError::ZeroVariance)
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(interpret(0.05), REJECT);
        assert_eq!(interpret(0.050001), FAIL_TO_REJECT);
        assert_eq!(interpret(0.0), REJECT);
    }

    #[test]
    fn test_serializes_field_names() {
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let report = StatisticsReport::compute(&values).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "n",
            "mean",
            "median",
            "std_sample",
            "skewness",
            "kurtosis_excess",
            "shapiro_stat",
            "shapiro_p",
            "dagostino_stat",
            "dagostino_p",
            "interpretation_shapiro",
            "interpretation_dagostino",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["n"], 12);
    }
}
