use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use epub_inspect::{inspect_epub_file, InspectReport, StageError};

#[derive(Parser, Debug)]
#[command(name = "epub-inspect")]
#[command(version)]
#[command(about = "Validate an EPUB archive and print its package document as JSON", long_about = None)]
#[command(after_help = "Log verbosity follows RUST_LOG (default: info).")]
struct Cli {
    /// EPUB file to inspect
    #[arg(value_name = "EPUB")]
    epub: PathBuf,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Treat advisories as failures
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let report = inspect_epub_file(&cli.epub).map_err(|e| stage_error_line(&e))?;
    println!("{}", render(&report, cli.pretty)?);

    if cli.strict && !report.is_clean() {
        return Err(format!(
            "error[strict]: {} advisories raised for {}",
            report.advisories.len(),
            cli.epub.display()
        ));
    }
    Ok(())
}

fn stage_error_line(err: &StageError) -> String {
    format!("error[{}/{}]: {}", err.stage, err.kind(), err.error)
}

fn render(report: &InspectReport, pretty: bool) -> Result<String, String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.map_err(|e| format!("error[output]: {}", e))
}
