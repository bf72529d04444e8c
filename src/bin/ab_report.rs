//! Console front-end: load a dataset, run the test battery, print verdicts.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};

use ab_verdict::config::{AppConfig, VIEWING_STATUS_FIELD};
use ab_verdict::data::label::label_dataset;
use ab_verdict::data::loader::load_file;
use ab_verdict::data::model::Dataset;
use ab_verdict::data::partition::{partition, GroupSample};
use ab_verdict::data::summary::{category_counts, histogram_in_range, value_range};
use ab_verdict::{db, report, stats};

const BAR_WIDTH: usize = 40;

/// Output format for the report
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable verdict lines (default)
    Text,
    /// The full battery as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ab-report")]
#[command(version)]
#[command(about = "Run hypothesis tests comparing groups of a dataset", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "query"])))]
struct Cli {
    /// Load records from a .csv, .json or .parquet file
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Load records from PostgreSQL (connection from AB_DB_* variables)
    #[arg(short, long, value_name = "SQL")]
    query: Option<String>,

    /// Field whose values define the groups
    #[arg(short, long, value_name = "FIELD")]
    group: String,

    /// Numeric field compared between groups
    #[arg(short, long, value_name = "FIELD")]
    metric: String,

    /// Treat two groups as paired observations (Wilcoxon signed-rank)
    #[arg(long)]
    paired: bool,

    /// Add the viewing_status column before analysis
    #[arg(long)]
    label: bool,

    /// Run the pairwise Mann-Whitney sweep even for two groups
    #[arg(long)]
    pairwise: bool,

    /// Also run Student's t-test (two groups only)
    #[arg(long = "t-test")]
    t_test: bool,

    /// Print a text histogram per group with this many bins
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    bins: Option<u32>,

    /// Override AB_MINUTES_FIELD
    #[arg(long, value_name = "FIELD")]
    minutes_field: Option<String>,

    /// Override AB_DURATION_FIELD
    #[arg(long, value_name = "FIELD")]
    duration_field: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(field) = &cli.minutes_field {
        config.fields.minutes_watched = field.clone();
    }
    if let Some(field) = &cli.duration_field {
        config.fields.content_duration = field.clone();
    }

    let mut dataset = load(&cli, &config)?;
    if dataset.is_empty() {
        bail!("dataset has no records");
    }

    if cli.label {
        let complete = label_dataset(
            &mut dataset,
            &config.fields.minutes_watched,
            &config.fields.content_duration,
            VIEWING_STATUS_FIELD,
        )?;
        if matches!(cli.format, OutputFormat::Text) {
            println!("== Viewing completion");
            for (value, n) in category_counts(&dataset, VIEWING_STATUS_FIELD) {
                println!("{value}: {n}");
            }
            println!("({complete} of {} complete)", dataset.len());
        }
    }

    let groups = partition(&dataset, &cli.group, &cli.metric)
        .with_context(|| format!("grouping '{}' by '{}'", cli.metric, cli.group))?;

    let mut battery = stats::run_battery(&groups, cli.paired);
    if cli.pairwise && battery.pairwise.is_none() {
        battery.pairwise = Some(stats::pairwise_mann_whitney(&groups));
    }
    let t_test = cli.t_test.then(|| stats::t_test_two_groups(&groups));

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&battery)?);
        }
        OutputFormat::Text => {
            for line in report::describe_battery(&battery) {
                println!("{line}");
            }
            if let Some(outcome) = t_test {
                println!("== Student's t-test");
                match outcome {
                    Ok(v) => println!("{}", report::describe(&v)),
                    Err(e) => println!("error: {e}"),
                }
            }
            if let Some(bins) = cli.bins {
                print_histograms(&groups, bins as usize);
            }
        }
    }
    Ok(())
}

fn load(cli: &Cli, config: &AppConfig) -> Result<Dataset> {
    if let Some(path) = &cli.file {
        return load_file(path);
    }
    let Some(sql) = &cli.query else {
        bail!("either --file or --query is required");
    };
    if !config.database.is_complete() {
        bail!("AB_DB_USER and AB_DB_NAME must be set to query the database");
    }
    let Some(mut client) = db::connect(&config.database) else {
        bail!(
            "could not connect to {}:{}",
            config.database.host,
            config.database.port
        );
    };
    db::query_dataset(&mut client, sql)
}

fn print_histograms(groups: &[GroupSample], bins: usize) {
    let all: Vec<f64> = groups
        .iter()
        .flat_map(|g| g.values.iter().copied())
        .collect();
    let Some(range) = value_range(&all) else {
        return;
    };
    for group in groups {
        println!("== Histogram: {}", group.label);
        let hist = histogram_in_range(&group.values, bins, range);
        let peak = hist.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &hist {
            let bar = "#".repeat(bin.count * BAR_WIDTH / peak);
            println!(
                "[{:>10.2}, {:>10.2}) {:>6} {bar}",
                bin.start, bin.end, bin.count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["ab-report", "-g", "group", "-m", "minutes"]).is_err());
        let cli = Cli::try_parse_from([
            "ab-report", "-f", "data.csv", "-g", "group", "-m", "minutes", "--bins", "12",
        ])
        .unwrap();
        assert_eq!(cli.bins, Some(12));
        assert!(!cli.paired);
    }

    #[test]
    fn test_zero_bins_rejected() {
        let parsed = Cli::try_parse_from([
            "ab-report", "-f", "data.csv", "-g", "group", "-m", "minutes", "--bins", "0",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_file_and_query_conflict() {
        let parsed = Cli::try_parse_from([
            "ab-report", "-f", "a.csv", "-q", "select 1", "-g", "g", "-m", "m",
        ]);
        assert!(parsed.is_err());
    }
}
