//! CLI entry point for customer dataset imputation and analysis.

use anyhow::{Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use customer_insights::analysis::{
    BuyerDistances, CorrelationReport, CustomerLocation, FrequencyCluster, GenderFrequencyTable,
    IncomeHeatmap,
};
use customer_insights::{
    AnalysisConfig, CustomerAnalyzer, DataSource, EmptyColumnPolicy, ImputationSummary,
    ImputerConfig, LocationFilter, Pipeline, PipelineResult, ReportGenerator, SegmentColumn,
};
use dotenv::dotenv;
use serde::Serialize;
use tracing::{error, info};

/// Which view of the cleaned dataset to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    /// What the imputer filled
    Summary,
    /// Age vs annual income correlation
    Correlation,
    /// Customer coordinates, optionally filtered
    Locations,
    /// Customers per purchase frequency
    Clusters,
    /// Gender x purchase frequency counts
    GenderFrequency,
    /// Mean income binned by location
    Heatmap,
    /// Distances between the highest-income customers
    Distances,
}

/// CLI-compatible segment column enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSegmentColumn {
    Gender,
    Frequency,
}

impl From<CliSegmentColumn> for SegmentColumn {
    fn from(cli: CliSegmentColumn) -> Self {
        match cli {
            CliSegmentColumn::Gender => SegmentColumn::Gender,
            CliSegmentColumn::Frequency => SegmentColumn::Frequency,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Grouped imputation and descriptive analyses for customer datasets",
    long_about = "Fills missing customer fields from related fields, then prints a view of the cleaned data.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CUSTOMER_DATA_SOURCE    Default input path or URL\n\n\
                  EXAMPLES:\n  \
                  # Imputation summary\n  \
                  customer-insights -i clientes.csv\n\n  \
                  # Locations of female customers\n  \
                  customer-insights -i clientes.csv --view locations --filter-column gender --filter-value F\n\n  \
                  # Distance matrix as JSON\n  \
                  customer-insights -i https://host/clientes.csv --view distances --top-n 5 --json"
)]
struct Args {
    /// Path or HTTP(S) URL of the customer CSV
    #[arg(short, long, env = "CUSTOMER_DATA_SOURCE")]
    input: String,

    /// View to print after imputation
    #[arg(long, value_enum, default_value = "summary")]
    view: View,

    /// Segment column for the locations view
    #[arg(long, value_enum, requires = "filter_value")]
    filter_column: Option<CliSegmentColumn>,

    /// Value the segment column must equal
    #[arg(long)]
    filter_value: Option<String>,

    /// Number of highest-income customers in the distances view
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Heatmap bins per axis
    #[arg(long, default_value = "50")]
    grid_size: usize,

    /// Maximum imputation passes (overrides --config)
    #[arg(long)]
    max_passes: Option<usize>,

    /// Fail instead of using placeholders for fields with no known value
    #[arg(long)]
    strict: bool,

    /// JSON file with imputer configuration (column names, placeholders)
    #[arg(long)]
    config: Option<String>,

    /// Output directory for cleaned data and reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Write the cleaned dataset as CSV to the output directory
    #[arg(long)]
    save_cleaned: bool,

    /// Write a JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable tables
    ///
    /// Disables all progress logs; only the selected view is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Loaded first so CUSTOMER_DATA_SOURCE can come from .env
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_imputer_config(&args)?;
    let analysis = AnalysisConfig::builder()
        .top_n(args.top_n)
        .heatmap_grid_size(args.grid_size)
        .build()?;

    let pipeline = build_pipeline(&args, config)?;

    let source = DataSource::parse(&args.input);

    let result = match pipeline.run(&source) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    write_outputs(&args, &source, pipeline.config(), &result)?;
    render_view(&args, &source, &pipeline, &result, analysis)
}

fn build_imputer_config(args: &Args) -> Result<ImputerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading imputer configuration from: {}", path);
            ImputerConfig::from_json_file(path)?
        }
        None => ImputerConfig::default(),
    };

    if let Some(passes) = args.max_passes {
        config.max_passes = passes;
    }
    if args.strict {
        config.empty_column_policy = EmptyColumnPolicy::Error;
    }
    Ok(config)
}

fn build_pipeline(args: &Args, config: ImputerConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Write the cleaned CSV and report files requested on the command line.
fn write_outputs(
    args: &Args,
    source: &DataSource,
    config: &ImputerConfig,
    result: &PipelineResult,
) -> Result<()> {
    if !args.save_cleaned && !args.emit_report {
        return Ok(());
    }

    let generator = ReportGenerator::new(&args.output, source.stem());

    let csv_path = if args.save_cleaned {
        Some(generator.write_cleaned_csv(&result.data)?)
    } else {
        None
    };

    if args.emit_report {
        let report = ReportGenerator::build_report(
            &source.to_string(),
            csv_path.as_deref().and_then(|p| p.to_str()),
            config,
            result,
        );
        let path = generator.write_report(&report)?;
        info!("Report written to: {}", path.display());
    }
    Ok(())
}

fn render_view(
    args: &Args,
    source: &DataSource,
    pipeline: &Pipeline,
    result: &PipelineResult,
    analysis: AnalysisConfig,
) -> Result<()> {
    let cols = result.columns(&pipeline.config().columns)?;
    let analyzer = CustomerAnalyzer::new(&cols, analysis)?;

    match args.view {
        View::Summary => {
            if args.json {
                let report = ReportGenerator::build_report(
                    &source.to_string(),
                    None,
                    pipeline.config(),
                    result,
                );
                return emit_json(&report);
            }
            print_summary(&source.to_string(), &result.summary);
        }
        View::Correlation => {
            let report = analyzer.correlation();
            if args.json {
                return emit_json(&report);
            }
            print_correlation(&report);
        }
        View::Locations => {
            let filter = match (args.filter_column, &args.filter_value) {
                (Some(column), Some(value)) => {
                    let column = SegmentColumn::from(column);
                    let available = analyzer.segment_values(column);
                    if !available.contains(value) {
                        bail!(
                            "No customer has {} = '{}'. Available values: {}",
                            column,
                            value,
                            available.join(", ")
                        );
                    }
                    Some(LocationFilter::new(column, value.clone()))
                }
                _ => None,
            };
            let locations = analyzer.locations(filter.as_ref());
            if args.json {
                return emit_json(&locations);
            }
            print_locations(&locations, filter.as_ref());
        }
        View::Clusters => {
            let clusters = analyzer.frequency_clusters();
            if args.json {
                return emit_json(&clusters);
            }
            print_clusters(&clusters);
        }
        View::GenderFrequency => {
            let table = analyzer.gender_frequency();
            if args.json {
                return emit_json(&table);
            }
            print_gender_frequency(&table);
        }
        View::Heatmap => {
            let heatmap = analyzer.income_heatmap();
            if args.json {
                return emit_json(&heatmap);
            }
            print_heatmap(&heatmap);
        }
        View::Distances => {
            let distances = analyzer.buyer_distances();
            if args.json {
                return emit_json(&distances);
            }
            print_distances(&distances);
        }
    }
    Ok(())
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn rule() -> String {
    "=".repeat(80)
}

fn fmt_corr(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.4}", v))
        .unwrap_or_else(|| "undefined".to_string())
}

/// Print a human-readable summary of the imputation.
///
/// Uses `println!` intentionally; this is the primary output of the default view.
fn print_summary(source: &str, summary: &ImputationSummary) {
    println!();
    println!("{}", rule());
    println!("IMPUTATION COMPLETE");
    println!("{}", rule());
    println!();
    println!("Input: {} ({} rows)", source, summary.rows);
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Passes: {}", summary.passes);
    println!(
        "  Missing values: {} -> {}",
        summary.missing_before, summary.missing_after
    );
    println!(
        "  Completeness: {:.1}% -> {:.1}%",
        summary.completeness_before * 100.0,
        summary.completeness_after * 100.0
    );
    println!();

    println!(
        "{:<22} {:>8} {:>8} {:>8} {:>12}",
        "Column", "Missing", "Group", "Global", "Placeholder"
    );
    println!("{}", "-".repeat(62));
    for field in &summary.fields {
        println!(
            "{:<22} {:>8} {:>8} {:>8} {:>12}",
            field.column,
            field.missing_before,
            field.filled_from_group,
            field.filled_from_global,
            field.filled_from_placeholder
        );
    }
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --view to explore the cleaned data, --json for machine-readable output");
    println!("{}", rule());
}

fn print_correlation(report: &CorrelationReport) {
    println!("AGE vs ANNUAL INCOME (Pearson)");
    println!("{}", "-".repeat(40));
    println!("  Global: {}", fmt_corr(report.global));
    println!();
    println!("  By gender:");
    for (gender, value) in &report.by_gender {
        println!("    {:<20} {}", gender, fmt_corr(*value));
    }
    println!();
    println!("  By purchase frequency:");
    for (freq, value) in &report.by_frequency {
        println!("    {:<20} {}", freq, fmt_corr(*value));
    }
}

fn print_locations(locations: &[CustomerLocation], filter: Option<&LocationFilter>) {
    match filter {
        Some(f) => println!("CUSTOMER LOCATIONS ({} = {})", f.column, f.value),
        None => println!("CUSTOMER LOCATIONS"),
    }
    println!("{}", "-".repeat(40));
    println!("{:>6} {:>12} {:>12}", "Row", "Latitude", "Longitude");
    for loc in locations {
        println!("{:>6} {:>12.5} {:>12.5}", loc.row, loc.latitude, loc.longitude);
    }
    println!();
    println!("{} customers", locations.len());
}

fn print_clusters(clusters: &[FrequencyCluster]) {
    println!("CUSTOMERS BY PURCHASE FREQUENCY");
    println!("{}", "-".repeat(40));
    for cluster in clusters {
        println!("  {:<20} {:>8}", cluster.frequency, cluster.customers);
    }
}

fn print_gender_frequency(table: &GenderFrequencyTable) {
    println!("CUSTOMERS BY GENDER AND PURCHASE FREQUENCY");
    println!("{}", "-".repeat(40));
    print!("{:<16}", "");
    for freq in &table.frequencies {
        print!(" {:>12}", freq);
    }
    println!();
    for (gender, row) in table.genders.iter().zip(&table.counts) {
        print!("{:<16}", gender);
        for count in row {
            print!(" {:>12}", count);
        }
        println!();
    }
}

fn print_heatmap(heatmap: &IncomeHeatmap) {
    println!(
        "MEAN ANNUAL INCOME BY LOCATION ({0}x{0} grid)",
        heatmap.grid_size
    );
    println!("{}", "-".repeat(40));
    if heatmap.cells.is_empty() {
        println!("  No customers with coordinates and income");
        return;
    }
    println!(
        "{:>12} {:>12} {:>10} {:>14}",
        "Latitude", "Longitude", "Customers", "Mean income"
    );
    for cell in &heatmap.cells {
        println!(
            "{:>12.4} {:>12.4} {:>10} {:>14.2}",
            cell.center_latitude, cell.center_longitude, cell.customers, cell.mean_income
        );
    }
}

fn print_distances(distances: &BuyerDistances) {
    println!(
        "DISTANCES BETWEEN TOP {} BUYERS (degrees)",
        distances.rows.len()
    );
    println!("{}", "-".repeat(40));
    print!("{:>8}", "");
    for row in &distances.rows {
        print!(" {:>8}", row);
    }
    println!();
    for (row, line) in distances.rows.iter().zip(&distances.matrix) {
        print!("{:>8}", row);
        for d in line {
            print!(" {:>8.3}", d);
        }
        println!();
    }
}
