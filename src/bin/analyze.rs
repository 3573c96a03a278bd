use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use csv::ReaderBuilder;
use normality_check::{
    charts::{self, ChartSize},
    input,
    report::StatisticsReport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Describe a small sample and test it for normality")]
struct Args {
    /// Numbers to analyze, separated by spaces, commas or semicolons
    #[arg(allow_negative_numbers = true)]
    numbers: Vec<String>,

    /// Read the numbers from a text file
    #[arg(long, conflicts_with_all = ["numbers", "csv"])]
    input: Option<PathBuf>,

    /// Read the numbers from every field of a headerless CSV file
    #[arg(long, conflicts_with = "numbers")]
    csv: Option<PathBuf>,

    /// Directory for histogram.png and qq_plot.png
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Skip writing the chart images
    #[arg(long)]
    no_charts: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 960)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Every field of every record, joined with spaces. Records may differ in length.
fn read_csv_fields<R: io::Read>(reader: R) -> csv::Result<String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut fields = Vec::new();
    for result in rdr.records() {
        let record = result?;
        fields.extend(record.iter().map(str::to_string));
    }
    Ok(fields.join(" "))
}

fn read_csv_file(path: &Path) -> anyhow::Result<String> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_csv_fields(file).with_context(|| format!("failed to read {}", path.display()))
}

fn raw_input(args: &Args) -> anyhow::Result<String> {
    if let Some(path) = &args.input {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    if let Some(path) = &args.csv {
        return read_csv_file(path);
    }
    Ok(args.numbers.join(" "))
}

fn write_png(path: &Path, png: &[u8]) -> anyhow::Result<()> {
    fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn print_table(report: &StatisticsReport) {
    println!("n:                {}", report.n);
    println!("mean:             {:.4}", report.mean);
    println!("median:           {:.4}", report.median);
    println!("std (ddof=1):     {:.4}", report.std_sample);
    println!("skewness:         {:.4}", report.skewness);
    println!("excess kurtosis:  {:.4}", report.kurtosis_excess);
    println!(
        "shapiro-wilk:     W={:.4} p={:.4}  {}",
        report.shapiro_stat, report.shapiro_p, report.interpretation_shapiro
    );
    println!(
        "d'agostino k2:    K2={:.4} p={:.4}  {}",
        report.dagostino_stat, report.dagostino_p, report.interpretation_dagostino
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let raw = raw_input(&args)?;
    let values = input::parse_numbers(&raw)?;
    let report = StatisticsReport::compute(&values)?;

    if !args.no_charts {
        let size = ChartSize {
            width: args.width,
            height: args.height,
        };
        fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
        write_png(
            &args.out_dir.join("histogram.png"),
            &charts::histogram_png(&values, size)?,
        )?;
        write_png(
            &args.out_dir.join("qq_plot.png"),
            &charts::qq_plot_png(&values, size)?,
        )?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }
    Ok(())
}
