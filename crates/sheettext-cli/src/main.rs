mod logging;
mod output;

use clap::Parser;
use sheettext_core::{ExtractOptions, Extractor};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sheettext",
    version,
    about = "Dump the text of every sheet in an XLSX, XLS or CSV file as JSON"
)]
struct Cli {
    /// Path to the workbook or CSV file
    input_file: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Leave out cell comments
    #[arg(long)]
    no_comments: bool,

    /// Leave out image and chart placeholder lines
    #[arg(long)]
    no_placeholders: bool,

    /// Log extraction details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let options = ExtractOptions {
        include_comments: !cli.no_comments,
        include_placeholders: !cli.no_placeholders,
    };
    let result = Extractor::new(options).run(cli.input_file.as_deref());
    tracing::debug!(
        sheets = result.sheets.len(),
        fatal = result.is_fatal(),
        "extraction finished"
    );

    if let Err(e) = output::json::print(&result, cli.pretty) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let code = result.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
}
