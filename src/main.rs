use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use kpi_engine::AttrValue;
use kpi_engine::FileDataSource;
use kpi_engine::InMemoryBindingStore;
use kpi_engine::Interpreter;
use kpi_engine::JsonLinesSink;
use kpi_engine::PipelineDriver;
use miette::IntoDiagnostic;
use miette::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kpi-engine", about = "Evaluate KPI formulas over attribute readings")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate one formula against one value and print the result
    Eval {
        /// Formula text, e.g. `ATTR*1.8+32` or `Regex(ATTR, 'A.*')`
        formula: String,
        /// Attribute value; numeric input is treated as a number
        value: String,
    },
    /// Continuously evaluate readings from a JSON-lines file
    Run {
        /// Readings file, one JSON object per line
        readings: PathBuf,
        /// Bindings catalog, a JSON array of {asset_id, attribute_id, expression}
        #[arg(long)]
        bindings: PathBuf,
        /// Append outcomes to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Seconds to wait between readings
        #[arg(long, default_value_t = 5.0)]
        interval: f64,
    },
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Eval { formula, value } => {
            let value = match value.parse::<f64>() {
                Ok(n) => AttrValue::Number(n),
                Err(_) => AttrValue::Text(value),
            };
            let result = Interpreter::new().evaluate(&formula, &value)?;
            println!("{result}");
        }
        Commands::Run {
            readings,
            bindings,
            output,
            interval,
        } => {
            let bindings = InMemoryBindingStore::from_json_file(&bindings)?;
            let mut source = FileDataSource::open(&readings)
                .into_diagnostic()
                .wrap_err_with(|| format!("opening `{}` failed", readings.display()))?;
            let pace = Duration::from_secs_f64(interval.max(0.0));

            let stats = match output {
                Some(path) => {
                    let sink = JsonLinesSink::append(&path)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("opening `{}` failed", path.display()))?;
                    PipelineDriver::new(bindings, sink)
                        .with_pace(pace)
                        .run(&mut source)
                }
                None => {
                    let sink = JsonLinesSink::new(io::stdout());
                    PipelineDriver::new(bindings, sink)
                        .with_pace(pace)
                        .run(&mut source)
                }
            };
            info!(
                processed = stats.processed,
                skipped = stats.skipped,
                "source exhausted"
            );
        }
    }
    Ok(())
}
