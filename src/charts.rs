//! Histogram and normal Q-Q plot rendering.
//!
//! Charts are drawn into an in-memory RGB buffer, encoded as PNG and handed
//! back base64 encoded so they can be embedded in a `data:` URI.

use std::{fmt, ops::Range};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::{coord::Shift, drawing::DrawingAreaErrorKind, prelude::*};
use serde::Serialize;

use crate::{special::inverse_normal_cdf, stats};

#[derive(Debug)]
pub enum ChartError {
    TooFewValues(usize),
    InvalidSize { width: u32, height: u32 },
    /// The data range does not fit in `MAX_BINS` bins of the chosen width.
    TooManyBins(f64),
    Draw(String),
    Encode(image::ImageError),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::TooFewValues(n) => write!(f, "cannot plot {n} values"),
            ChartError::InvalidSize { width, height } => {
                write!(f, "invalid chart size {width}x{height}")
            },
            ChartError::TooManyBins(bins) => {
                write!(f, "histogram needs {bins:e} bins, at most {MAX_BINS} allowed")
            },
            ChartError::Draw(msg) => write!(f, "drawing failed: {msg}"),
            ChartError::Encode(err) => write!(f, "png encoding failed: {err}"),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Draw(err.to_string())
    }
}

impl From<image::ImageError> for ChartError {
    fn from(err: image::ImageError) -> Self {
        ChartError::Encode(err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        // 6.4 x 4.8 inches at 150 dpi
        Self {
            width: 960,
            height: 720,
        }
    }
}

/// Equal-width histogram bins, `counts.len() + 1 == edges.len()`.
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramBins {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

pub const MAX_BINS: usize = 1_000;

/// Bin the values the way numpy's `bins="auto"` does: the narrower of the
/// Freedman-Diaconis and Sturges widths, Sturges alone when the IQR is zero.
///
/// Fails with [`ChartError::TooManyBins`] when a small IQR next to a far
/// outlier would need more than [`MAX_BINS`] bins.
pub fn histogram_bins(values: &[f64]) -> Result<HistogramBins, ChartError> {
    if values.is_empty() {
        return Err(ChartError::TooFewValues(0));
    }
    let sorted = stats::sorted(values);
    let n = sorted.len() as f64;
    let (mut first, mut last) = (sorted[0], sorted[sorted.len() - 1]);
    let range = last - first;
    if !range.is_finite() {
        return Err(ChartError::TooManyBins(f64::INFINITY));
    }

    let sturges = range / (n.log2() + 1.0);
    let iqr = match (
        stats::percentile_sorted(&sorted, 75.0),
        stats::percentile_sorted(&sorted, 25.0),
    ) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let freedman_diaconis = 2.0 * iqr * n.powf(-1.0 / 3.0);
    let width = if freedman_diaconis > 0.0 {
        freedman_diaconis.min(sturges)
    } else {
        sturges
    };

    if first == last {
        first -= 0.5;
        last += 0.5;
    }
    let bins = if width > 0.0 {
        ((last - first) / width).ceil().max(1.0)
    } else {
        1.0
    };
    if !bins.is_finite() || bins > MAX_BINS as f64 {
        return Err(ChartError::TooManyBins(bins));
    }
    let bins = bins as usize;

    let step = (last - first) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| first + step * i as f64).collect();
    edges.push(last);

    let mut counts = vec![0; bins];
    for &x in &sorted {
        let index = (((x - first) / (last - first)) * bins as f64).floor() as usize;
        counts[index.min(bins - 1)] += 1;
    }

    Ok(HistogramBins { edges, counts })
}

/// Normal probability plot data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbabilityPlot {
    /// Theoretical normal quantiles of the order statistics.
    pub theoretical: Vec<f64>,
    /// The sample sorted ascending.
    pub ordered: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

/// Filliben's estimate of the uniform order statistic medians.
fn order_statistic_medians(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let last = 0.5f64.powf(1.0 / nf);
    (1..=n)
        .map(|i| match i {
            1 => 1.0 - last,
            i if i == n => last,
            i => (i as f64 - 0.3175) / (nf + 0.365),
        })
        .collect()
}

pub fn probability_plot(values: &[f64]) -> Result<ProbabilityPlot, ChartError> {
    if values.len() < 2 {
        return Err(ChartError::TooFewValues(values.len()));
    }
    let theoretical: Vec<f64> = order_statistic_medians(values.len())
        .into_iter()
        .map(inverse_normal_cdf)
        .collect();
    let ordered = stats::sorted(values);
    let (slope, intercept, r) = stats::linear_fit(&theoretical, &ordered)
        .ok_or(ChartError::TooFewValues(values.len()))?;

    Ok(ProbabilityPlot {
        theoretical,
        ordered,
        slope,
        intercept,
        r,
    })
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if hi > lo {
        let pad = (hi - lo) * 0.05;
        (lo - pad)..(hi + pad)
    } else {
        (lo - 0.5)..(hi + 0.5)
    }
}

fn min_max(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn render_png<F>(size: ChartSize, draw: F) -> Result<Vec<u8>, ChartError>
where
    F: FnOnce(&Area<'_>) -> Result<(), ChartError>,
{
    let ChartSize { width, height } = size;
    if width == 0 || height == 0 {
        return Err(ChartError::InvalidSize { width, height });
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root_area =
            BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root_area.fill(&WHITE)?;
        draw(&root_area)?;
        root_area.present()?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ColorType::Rgb8)?;
    Ok(png)
}

fn draw_histogram(root_area: &Area<'_>, bins: &HistogramBins) -> Result<(), ChartError> {
    let x_min = bins.edges[0];
    let x_max = bins.edges[bins.edges.len() - 1];
    let y_max = bins.counts.iter().copied().max().unwrap_or(0) as f64 + 1.0;

    let mut ctx = ChartBuilder::on(root_area)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .caption("Histogram", ("sans-serif", 32))
        .build_cartesian_2d(padded(x_min, x_max), 0.0..y_max)?;

    ctx.configure_mesh()
        .x_desc("Value")
        .y_desc("Frequency")
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    let bars = bins
        .edges
        .windows(2)
        .zip(&bins.counts)
        .map(|(edge, &count)| [(edge[0], 0.0), (edge[1], count as f64)]);

    ctx.draw_series(
        bars.clone()
            .map(|corners| Rectangle::new(corners, BLUE.mix(0.6).filled())),
    )?;
    ctx.draw_series(bars.map(|corners| Rectangle::new(corners, BLACK.stroke_width(1))))?;
    Ok(())
}

fn draw_qq_plot(root_area: &Area<'_>, plot: &ProbabilityPlot) -> Result<(), ChartError> {
    let (x_min, x_max) = min_max(plot.theoretical.iter().copied());
    let line = [
        (x_min, plot.slope * x_min + plot.intercept),
        (x_max, plot.slope * x_max + plot.intercept),
    ];
    let (y_min, y_max) = min_max(
        plot.ordered
            .iter()
            .copied()
            .chain(line.iter().map(|&(_, y)| y)),
    );

    let mut ctx = ChartBuilder::on(root_area)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .caption("Q-Q Plot", ("sans-serif", 32))
        .build_cartesian_2d(padded(x_min, x_max), padded(y_min, y_max))?;

    ctx.configure_mesh()
        .x_desc("Theoretical quantiles")
        .y_desc("Ordered Values")
        .draw()?;

    ctx.draw_series(LineSeries::new(line, RED.stroke_width(2)))?;
    ctx.draw_series(
        plot.theoretical
            .iter()
            .zip(&plot.ordered)
            .map(|(&x, &y)| Circle::new((x, y), 5, BLUE.filled())),
    )?;
    Ok(())
}

pub fn histogram_png(values: &[f64], size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let bins = histogram_bins(values)?;
    render_png(size, |root_area| draw_histogram(root_area, &bins))
}

pub fn qq_plot_png(values: &[f64], size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let plot = probability_plot(values)?;
    render_png(size, |root_area| draw_qq_plot(root_area, &plot))
}

/// Both charts as base64 encoded PNGs.
#[derive(Clone, Debug, Serialize)]
pub struct Charts {
    pub histogram: String,
    pub qq_plot: String,
}

impl Charts {
    pub fn render(values: &[f64], size: ChartSize) -> Result<Self, ChartError> {
        Ok(Self {
            histogram: STANDARD.encode(histogram_png(values, size)?),
            qq_plot: STANDARD.encode(qq_plot_png(values, size)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    #[test]
    fn test_auto_bins_one_to_ten() {
        let bins = histogram_bins(&one_to_ten()).unwrap();
        assert_eq!(bins.counts, vec![2, 2, 2, 2, 2]);
        assert_eq!(bins.edges.len(), 6);
        assert_eq!(bins.edges[0], 1.0);
        assert_eq!(bins.edges[5], 10.0);
        assert!((bins.edges[1] - 2.8).abs() < 1e-12);
    }

    #[test]
    fn test_bins_cover_every_value() {
        let values = [3.2, 7.7, 1.0, 1.0, 9.4, 5.5, 5.6, 2.2, 8.8, 4.1, 6.0, 120.0];
        let bins = histogram_bins(&values).unwrap();
        assert_eq!(bins.counts.iter().sum::<usize>(), values.len());
        assert_eq!(bins.edges.len(), bins.counts.len() + 1);
        // the maximum lands in the closed last bin
        assert_eq!(*bins.counts.last().unwrap(), 1);
    }

    #[test]
    fn test_constant_values_single_bin() {
        let bins = histogram_bins(&[4.0; 10]).unwrap();
        assert_eq!(bins.counts, vec![10]);
        assert_eq!(bins.edges, vec![3.5, 4.5]);
    }

    #[test]
    fn test_far_outlier_exceeds_bin_limit() {
        let mut values: Vec<f64> = (0..=13).map(f64::from).collect();
        values.push(1e15);
        assert!(matches!(
            histogram_bins(&values),
            Err(ChartError::TooManyBins(bins)) if bins > MAX_BINS as f64
        ));
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        let mut values = vec![0.0; 10];
        values[0] = -f64::MAX;
        values[9] = f64::MAX;
        assert!(matches!(
            histogram_bins(&values),
            Err(ChartError::TooManyBins(_))
        ));
    }

    #[test]
    fn test_probability_plot_of_one_to_ten() {
        let plot = probability_plot(&one_to_ten()).unwrap();
        assert_eq!(plot.ordered, one_to_ten());
        assert_eq!(plot.theoretical.len(), 10);
        assert!(plot.theoretical.windows(2).all(|w| w[0] < w[1]));
        // quantiles are symmetric around zero
        assert!((plot.theoretical[0] + plot.theoretical[9]).abs() < 1e-9);
        assert!((plot.intercept - 5.5).abs() < 1e-9);
        assert!(plot.slope > 0.0);
        assert!(plot.r > 0.97);
    }

    #[test]
    fn test_probability_plot_needs_two_values() {
        assert!(matches!(
            probability_plot(&[1.0]),
            Err(ChartError::TooFewValues(1))
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = histogram_png(
            &one_to_ten(),
            ChartSize {
                width: 0,
                height: 10,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::InvalidSize { .. }));
    }

    #[test]
    fn test_render_produces_png() {
        let size = ChartSize {
            width: 320,
            height: 240,
        };
        let charts = Charts::render(&one_to_ten(), size).unwrap();
        for encoded in [&charts.histogram, &charts.qq_plot] {
            let png = STANDARD.decode(encoded).unwrap();
            assert_eq!(png[..8], PNG_SIGNATURE);
        }
    }
}
