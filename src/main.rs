use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docxside_translate::config::{self, Device, GatewayConfig};
use docxside_translate::format::DocumentFormat;
use docxside_translate::gateway::ArgosGateway;
use docxside_translate::session::Session;
use docxside_translate::worker::{WorkerEvent, WorkerOptions};

#[derive(Parser)]
#[command(
    name = "docxside-translate",
    about = "Translate DOCX and TXT files with installed Argos Translate packages"
)]
struct Args {
    /// Input file (.docx or .txt)
    #[arg(required_unless_present = "list_packages")]
    input: Option<PathBuf>,
    /// Output file (defaults to <name>_translated_<to>.<ext> next to the input)
    output: Option<PathBuf>,
    /// Language pair, e.g. en_fr
    #[arg(short, long, env = "DOCXSIDE_PACKAGE", default_value = "None")]
    package: String,
    /// Device used by the translation engine
    #[arg(long, env = "ARGOS_DEVICE_TYPE", default_value = "cpu")]
    device: Device,
    /// Directory holding installed Argos packages
    #[arg(long, env = "ARGOS_PACKAGES_DIR")]
    packages_dir: Option<PathBuf>,
    /// Translation engine executable
    #[arg(long, default_value = "argos-translate")]
    engine: PathBuf,
    /// Cancel if no save location is settled within this many seconds
    #[arg(long)]
    save_timeout: Option<u64>,
    /// List installed language pairs and exit
    #[arg(long)]
    list_packages: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut gateway_config = GatewayConfig {
        command: args.engine,
        device: args.device,
        ..GatewayConfig::default()
    };
    if let Some(dir) = args.packages_dir {
        gateway_config.packages_dir = dir;
    }

    let gateway = match ArgosGateway::new(gateway_config) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if args.list_packages {
        for pair in gateway.packages().pairs() {
            println!("{pair}");
        }
        return;
    }

    let Some(input) = args.input else {
        eprintln!("Error: no input file given");
        std::process::exit(1);
    };
    let format = DocumentFormat::from_path(&input);
    if format.needs_conversion() {
        eprintln!("Error: this file format is not fully supported. Please convert it to .docx and try again");
        std::process::exit(1);
    }
    if !format.is_accepted() {
        eprintln!("Error: file is not supported: {}", input.display());
        std::process::exit(1);
    }

    let package = match config::parse_package(&args.package) {
        Ok(package) => package,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let options = WorkerOptions {
        save_timeout: args.save_timeout.map(Duration::from_secs),
    };
    let (mut session, events) = Session::new(Arc::new(gateway), package, options);

    if let Err(e) = session.start(&input) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    for event in events {
        match event {
            WorkerEvent::SaveRequested { default_name, .. } => {
                let output = args.output.clone().unwrap_or_else(|| {
                    input
                        .parent()
                        .map(|dir| dir.join(&default_name))
                        .unwrap_or_else(|| PathBuf::from(&default_name))
                });
                log::debug!("saving to {}", output.display());
                session.provide_save_path(output);
            }
            WorkerEvent::Finished { outcome, .. } => {
                if outcome.is_success() {
                    println!("Translation saved to {}", outcome.message());
                    return;
                }
                let message = outcome.message();
                if !message.is_empty() {
                    eprintln!("Error: {message}");
                }
                std::process::exit(1);
            }
        }
    }

    eprintln!("Error: translation ended without a result");
    std::process::exit(1);
}
