//! deltadoc CLI - Delta ⇄ DOCX/PDF conversion tool

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use deltadoc::{
    extract_path, generate_docx, generate_pdf, DeltaOp, GenerateOptions, GenerateRequest,
    ListNumbering, Margins, PageGeometry,
};

#[derive(Parser)]
#[command(name = "deltadoc")]
#[command(version)]
#[command(about = "Convert between Delta rich text and DOCX/PDF documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document to a Delta JSON array
    Extract {
        /// Input document (.docx or .pdf)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Generate a DOCX document from Delta JSON
    Docx {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Generate a PDF document from Delta JSON
    Pdf {
        #[command(flatten)]
        args: GenerateArgs,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Delta JSON file: an operation array or `{"delta": [...]}`
    #[arg(value_name = "DELTA")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Page size
    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Margins in millimeters: one value for all sides or top,bottom,left,right
    #[arg(long, value_name = "MM")]
    margins: Option<String>,

    /// Restart ordered-list numbering after each interruption
    #[arg(long)]
    restart_lists: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSizeArg {
    A4,
    Letter,
    Legal,
}

impl PageSizeArg {
    fn name(self) -> &'static str {
        match self {
            PageSizeArg::A4 => "a4",
            PageSizeArg::Letter => "letter",
            PageSizeArg::Legal => "legal",
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{} {}", "error:".red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
        } => {
            let extraction = extract_path(&input).map_err(|e| e.to_string())?;
            report_diagnostics(extraction.diagnostics.notes());

            let json = extraction.to_json();
            let rendered = if compact {
                serde_json::to_string(&json)
            } else {
                serde_json::to_string_pretty(&json)
            }
            .map_err(|e| e.to_string())?;

            match output {
                Some(path) => {
                    fs::write(&path, rendered).map_err(|e| e.to_string())?;
                    eprintln!("{} {}", "wrote".green(), path.display());
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }
        Commands::Docx { args } => generate(args, generate_docx),
        Commands::Pdf { args } => generate(args, generate_pdf),
    }
}

fn generate(
    args: GenerateArgs,
    generator: fn(&[DeltaOp], &GenerateOptions) -> deltadoc::Result<deltadoc::Generated>,
) -> Result<(), String> {
    let delta = read_delta(&args.input)?;
    let margins = args.margins.as_deref().map(parse_margins).transpose()?;
    let mut options = GenerateOptions::new()
        .with_geometry(PageGeometry::resolve(Some(args.page_size.name()), margins));
    if args.restart_lists {
        options = options.with_numbering(ListNumbering::RestartAfterBreak);
    }

    let generated = generator(&delta, &options).map_err(|e| e.to_string())?;
    report_diagnostics(generated.diagnostics.notes());

    fs::write(&args.output, &generated.bytes).map_err(|e| e.to_string())?;
    eprintln!(
        "{} {} ({} bytes)",
        "wrote".green(),
        args.output.display(),
        generated.bytes.len()
    );
    Ok(())
}

/// Accept both a bare operation array and the request body shape.
fn read_delta(path: &PathBuf) -> Result<Vec<DeltaOp>, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if let Ok(ops) = serde_json::from_str::<Vec<DeltaOp>>(&raw) {
        return Ok(ops);
    }
    serde_json::from_str::<GenerateRequest>(&raw)
        .map(|request| request.delta)
        .map_err(|e| format!("{}: not a delta document: {}", path.display(), e))
}

/// `20` or `20,15,25,25` (top,bottom,left,right), in millimeters.
fn parse_margins(raw: &str) -> Result<Margins, String> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid margins {:?}", raw))?;
    match values.as_slice() {
        [all] => Ok(Margins::uniform(*all)),
        [top, bottom, left, right] => Ok(Margins {
            top: *top,
            bottom: *bottom,
            left: *left,
            right: *right,
        }),
        _ => Err(format!(
            "expected 1 or 4 margin values, got {}",
            values.len()
        )),
    }
}

fn report_diagnostics(notes: &[String]) {
    for note in notes {
        eprintln!("{} {}", "warning:".yellow(), note);
    }
}
