mod config;
mod error;
mod format;
mod generate;
mod paths;
mod pointer;
mod registry;
mod resolver;
mod store;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::config::Options;

#[derive(Parser)]
#[command(
    name = "schemalink",
    version,
    about = "Bundle modular JSON/YAML schema fragments into one self-contained document"
)]
struct Cli {
    /// Root document to resolve
    input: PathBuf,
    /// Where to write the bundled document (.json, .yaml or .yml)
    output: PathBuf,
    /// JSON pointer to the definitions mapping in the root document
    #[arg(long)]
    definitions_pointer: Option<String>,
    /// Marker key replaced with the referenced content
    #[arg(long)]
    replace_token: Option<String>,
    /// Marker key replaced with a link to the referenced content
    #[arg(long)]
    define_reference_token: Option<String>,
    /// Key used in emitted link mappings
    #[arg(long)]
    reference_token: Option<String>,
    /// Root path for absolute-style references (defaults to the input's directory)
    #[arg(long)]
    root_path: Option<PathBuf>,
    /// Keep running and re-bundle whenever a source file changes
    #[arg(long)]
    watch: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = Options {
        define_reference_token: cli.define_reference_token,
        definitions_pointer: cli.definitions_pointer,
        reference_token: cli.reference_token,
        replace_token: cli.replace_token,
        root_path: cli.root_path,
    };

    if cli.watch {
        return match watch::run(&cli.input, &cli.output, &overrides) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            },
        };
    }

    match generate::generate_to_file(&cli.input, &cli.output, &overrides) {
        Ok(report) => {
            let count = report.sources.len();
            println!("Bundled {count} source files into {}", cli.output.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}
