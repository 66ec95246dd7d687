mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "haushalt",
    version,
    about = "Convert the budget tables of municipal budget exports into CSV"
)]
struct Cli {
    /// Log classification and extraction decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one or more exported documents (.docx or pre-extracted .json)
    Convert {
        /// Input documents, processed in the given order
        #[arg(required = true)]
        input_files: Vec<PathBuf>,

        /// Directory for the CSV files (default: working directory)
        #[arg(short = 'O', long = "out-dir", value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Custom JSON layout profile file
        #[arg(short, long = "layouts", value_name = "FILE")]
        layouts: Option<PathBuf>,

        /// Prepend budget unit, product area and product group columns
        #[arg(long)]
        context: bool,
    },
    /// Show how each table of a document is classified and structured
    Inspect {
        /// Input document (.docx or .json)
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Custom JSON layout profile file
        #[arg(short, long = "layouts", value_name = "FILE")]
        layouts: Option<PathBuf>,
    },
    /// Inspect and validate layout profiles
    Layouts {
        #[command(subcommand)]
        action: LayoutsAction,
    },
}

#[derive(Subcommand)]
enum LayoutsAction {
    /// List the built-in layouts
    List,
    /// Explain a built-in layout in plain language
    Explain {
        /// Layout tag (e.g., "partial_result_budgets")
        layout: String,
    },
    /// Validate a custom layout profile file
    Validate {
        /// Path to JSON layout file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input_files,
            out_dir,
            layouts,
            context,
        } => commands::convert::run(&input_files, &out_dir, layouts.as_deref(), context),
        Commands::Inspect {
            input_file,
            output,
            layouts,
        } => commands::inspect::run(&input_file, &output, layouts.as_deref()),
        Commands::Layouts { action } => match action {
            LayoutsAction::List => commands::layouts::list(),
            LayoutsAction::Explain { layout } => commands::layouts::explain(&layout),
            LayoutsAction::Validate { file } => commands::layouts::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
