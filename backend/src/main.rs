//! Unpivot CLI - reshape wide opportunity spreadsheets
//!
//! ```bash
//! unpivot reshape opps.xlsx             # writes opps-done.csv next to the input
//! unpivot reshape opps.csv -f xlsx      # writes opps-done.xlsx
//! unpivot reshape opps.csv -o -         # CSV to stdout
//! unpivot inspect opps.csv              # show which groups will be reshaped
//! unpivot serve --port 8080             # start the HTTP server
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use unpivot::{
    inspect_schema, load_file, output_file_name, reshape_file, ExportFormat, SchemaReport,
    ServerConfig,
};

#[derive(Parser)]
#[command(name = "unpivot")]
#[command(about = "Reshape wide Category 1..9 spreadsheets into one row per category", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reshape a CSV or Excel file (wide → long)
    Reshape {
        /// Input .csv / .xlsx / .xls file
        input: PathBuf,

        /// Output path ('-' for stdout; default: <input>-done.<format> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or xlsx
        #[arg(short, long, default_value = "csv", value_parser = parse_format)]
        format: ExportFormat,
    },

    /// Show which category groups a file contains
    Inspect {
        /// Input .csv / .xlsx / .xls file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: UNPIVOT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: UNPIVOT_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<IpAddr>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reshape {
            input,
            output,
            format,
        } => cmd_reshape(&input, output.as_deref(), format),

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Serve { port, host } => cmd_serve(host, port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse().map_err(|e: unpivot::ExportError| e.to_string())
}

fn cmd_reshape(
    input: &Path,
    output: Option<&Path>,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = reshape_file(input)?;
    let bytes = format.write(&result.output)?;

    match output {
        Some(p) if p == Path::new("-") => {
            std::io::stdout().write_all(&bytes)?;
        }
        Some(p) => {
            fs::write(p, &bytes)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());
            let path = input.with_file_name(output_file_name(&name, format));
            fs::write(&path, &bytes)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
    }

    eprintln!(
        "✨ {} input rows → {} output rows",
        result.input_rows, result.output_rows
    );
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_file(input)?;
    let report = inspect_schema(&loaded.table);

    println!("📄 {} ({} rows)", input.display(), loaded.table.len());
    print_report(&report);

    if !report.has_groups() {
        return Err("No 'Category 1'...'Category 9' columns were found in this file".into());
    }
    Ok(())
}

fn print_report(report: &SchemaReport) {
    println!("\n📋 Category groups: {}", report.groups.len());
    for group in &report.groups {
        print!("   {} → {} rows", group.category_column, group.filled_rows);
        if group.missing_attributes.is_empty() {
            println!();
        } else {
            println!(" (missing: {})", group.missing_attributes.join(", "));
        }
    }
    println!("\n   Base columns: {}", report.base_columns.join(", "));
    if !report.orphan_columns.is_empty() {
        println!("   ⚠️  Dropped (no matching category): {}", report.orphan_columns.join(", "));
    }
    if !report.out_of_range_columns.is_empty() {
        println!("   ⚠️  Not reshaped (index outside 1..9): {}", report.out_of_range_columns.join(", "));
    }
    println!("\n   Expected output rows: {}", report.expected_rows());
}

async fn cmd_serve(host: Option<IpAddr>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?.with_overrides(host, port);
    unpivot::server::start_server(config).await?;
    Ok(())
}
