//! # Lading CLI
//!
//! Usage:
//!   lading serve --listen 0.0.0.0:8080 --config layout.json
//!   lading render bill.json -o MCL-001.pdf
//!   lading example > bill.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lading::config::{LayoutConfig, ServerConfig};
use lading::error::BolError;
use lading::model::BillOfLading;
use lading::Engine;

#[derive(Parser)]
#[command(name = "lading")]
#[command(about = "Bill of lading forms rendered to PDF", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web form
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Layout configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Render a JSON bill to PDF
    Render {
        /// Bill JSON file, or `-` for stdin
        input: String,

        /// Output file (defaults to the name derived from the B/L number)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layout configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a sample bill as JSON
    Example,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BolError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, config } => {
            let engine = Engine::new(LayoutConfig::load(config.as_deref())?);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(lading::server::serve(
                ServerConfig {
                    listen_addr: listen,
                },
                engine,
            ))
        }

        Commands::Render {
            input,
            output,
            config,
        } => {
            let engine = Engine::new(LayoutConfig::load(config.as_deref())?);
            for warning in engine.warnings() {
                warn!("{}", warning);
            }

            let json = if input == "-" {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                fs::read_to_string(&input)?
            };
            let bill = BillOfLading::from_json(&json)?;
            let rendered = engine.render(&bill)?;

            let path = output.unwrap_or_else(|| PathBuf::from(&rendered.filename));
            fs::write(&path, &rendered.bytes)?;
            info!(path = %path.display(), bytes = rendered.bytes.len(), "wrote PDF");
            Ok(())
        }

        Commands::Example => {
            print!("{}", EXAMPLE_BILL);
            Ok(())
        }
    }
}

const EXAMPLE_BILL: &str = r#"{
  "fields": {
    "shipper": "ACME Export B.V.\nWaalhaven Z.z. 21\n3089 JH Rotterdam, NL",
    "consignee": "Northwind Traders Ltd.\n12 Harbour Road\nFelixstowe IP11 3SY, UK",
    "notify_party": "Same as consignee",
    "doc_no": "DOC-2026-0415",
    "bl_number": "MCL/2026/001",
    "export_ref": "INV 88231",
    "vessel_voyage": "MSC AURORA / 041W",
    "port_loading": "Rotterdam",
    "port_discharge": "Felixstowe",
    "place_delivery": "Felixstowe CY",
    "type_of_move": "FCL/FCL",
    "revenue_tons": "24.5",
    "rate": "42.00",
    "originals": "THREE (3)",
    "place_issue": "Rotterdam",
    "date_issue": "2026-10-15",
    "onboard_date": "2026-10-14",
    "signature": "MCL SHIPPING\nas Carrier"
  },
  "cargo": [
    {
      "container_no": "MSCU1234567 / SL-99812",
      "packages": "20 PLT",
      "description": "Machine parts, crated",
      "gross_weight": "18,400",
      "measurement": "31.2"
    },
    {
      "container_no": "TGHU7654321 / SL-99813",
      "packages": "640 CTN",
      "description": "Ceramic tiles",
      "gross_weight": "21,050",
      "measurement": "28.7"
    }
  ],
  "freight_terms": "prepaid",
  "tracking_url": "https://track.example.com/MCL-2026-001"
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use lading::model::FieldId;

    #[test]
    fn test_example_bill_parses() {
        let bill = BillOfLading::from_json(EXAMPLE_BILL).unwrap();
        assert_eq!(bill.value(FieldId::BlNumber), Some("MCL/2026/001"));
        assert_eq!(bill.cargo.len(), 2);
        assert!(bill.tracking_url().is_some());
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from(["lading", "render", "bill.json", "-o", "out.pdf"]).unwrap();
        match cli.command {
            Commands::Render { input, output, .. } => {
                assert_eq!(input, "bill.json");
                assert_eq!(output, Some(PathBuf::from("out.pdf")));
            }
            _ => panic!("expected render"),
        }
    }
}
