use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use dict_scanner::output::{write_entries, OutputFormat};
use dict_scanner::parallel::{parse_documents, DocumentResult, ParallelConfig};
use dict_scanner::session::IssueKind;
use dict_scanner::{Error, MarkerTable};

const WRITE_BUFFER: usize = 256 * 1024;

#[derive(Parser)]
#[command(name = "dict-scanner")]
#[command(about = "Parse Syriac-Arabic dictionary paragraphs into structured entries")]
struct Args {
    /// Input documents (.txt or .jsonl, optionally .bz2)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file (single input only; default: input name with the format's extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to marker schema YAML file (default: built-in schema/markers.yaml)
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Number of threads for multiple inputs (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DICT_SCANNER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to initialize tracing subscriber: {}", e);
    }
}

/// `dict.txt.bz2` → `dict.json`; never the input itself
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let base = if input.extension().is_some_and(|ext| ext == "bz2") {
        input.with_extension("")
    } else {
        input.to_path_buf()
    };
    let candidate = base.with_extension(format.extension());
    if candidate == base {
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        base.with_file_name(format!("{}.entries.{}", stem, format.extension()))
    } else {
        candidate
    }
}

fn write_document(doc: &DocumentResult, path: &Path, format: OutputFormat) -> Result<(), Error> {
    let file = File::create(path).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
    write_entries(&mut writer, &doc.outcome.entries, format)?;
    writer.flush().map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn print_stats(doc: &DocumentResult, output: &Path) {
    let outcome = &doc.outcome;
    println!();
    println!("============================================================");
    println!("Input: {}", doc.path.display());
    println!("Output: {}", output.display());
    println!("Entries: {}", outcome.entries.len());
    println!("Subentries: {}", outcome.subentry_count());
    println!("Inherited senses: {}", outcome.inherited_count());
    println!("------------------------------------------------------------");
    println!("Issues: {}", outcome.issues.len());
    for kind in IssueKind::ALL {
        println!("  {}: {}", kind, outcome.issue_count(kind));
    }
    println!("------------------------------------------------------------");
    println!("Time: {:.2}s", doc.elapsed.as_secs_f64());
    println!("============================================================");
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    // Load marker table from schema YAML
    let table = match &args.markers {
        Some(path) => match MarkerTable::load(path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("Error loading marker schema: {}", e);
                std::process::exit(1);
            }
        },
        None => MarkerTable::builtin().clone(),
    };

    if args.output.is_some() && args.inputs.len() > 1 {
        eprintln!("Error: --output can only be used with a single input file.");
        std::process::exit(1);
    }

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    pb.set_message(format!("Parsing {} document(s)", args.inputs.len()));

    let config = ParallelConfig::with_threads(args.threads);
    let results = parse_documents(&args.inputs, &table, &config);
    pb.finish_and_clear();

    let mut first_error = None;
    for (input, result) in args.inputs.iter().zip(results) {
        let written = result.and_then(|doc| {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(input, args.format));
            write_document(&doc, &output, args.format)?;
            info!(input = %input.display(), output = %output.display(), "wrote entries");
            if !args.quiet {
                print_stats(&doc, &output);
            }
            Ok(())
        });

        if let Err(e) = written {
            eprintln!("Error processing {}: {}", input.display(), e);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn output_path_swaps_extension() {
        assert_eq!(
            default_output_path(Path::new("data/dict.txt"), OutputFormat::Json),
            PathBuf::from("data/dict.json")
        );
        assert_eq!(
            default_output_path(Path::new("data/dict.txt.bz2"), OutputFormat::Xml),
            PathBuf::from("data/dict.xml")
        );
    }

    #[test]
    fn output_path_never_overwrites_input() {
        assert_eq!(
            default_output_path(Path::new("data/dict.jsonl"), OutputFormat::Jsonl),
            PathBuf::from("data/dict.entries.jsonl")
        );
    }
}
