use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use xbrl2rdf::output::assemble_page;
use xbrl2rdf::run::RunContext;
use xbrl2rdf::source::{CompletedOutputs, LocalStore};

/// Convert XBRL instance documents and their taxonomy sets to RDF turtle.
#[derive(Parser)]
#[command(name = "xbrl2rdf", version, about)]
struct Cli {
    /// Instance file, or directory scanned for .xbrl files.
    input: PathBuf,

    /// Output directory.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Directory of unpacked taxonomy archives (with catalog.json).
    #[arg(short, long, value_name = "DIR")]
    taxonomies: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output.
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &cli.taxonomies {
        Some(dir) => LocalStore::with_catalog(dir)?,
        None => LocalStore::new(),
    };

    fs::create_dir_all(&cli.output)?;
    let mut completed = CompletedOutputs::load(&cli.output)?;

    let inputs = collect_inputs(&cli.input)?;
    let mut total_errors = 0u64;

    for input in &inputs {
        let uri = input.to_string_lossy().replace('\\', "/");
        let mut ctx = RunContext::new();
        ctx.completed = completed.entries().iter().cloned().collect();

        if let Err(e) = xbrl2rdf::convert_instance(&uri, &store, &mut ctx) {
            warn!(uri = %uri, error = %e, "instance conversion failed");
        }
        total_errors += ctx.counters.errors;
        write_outputs(&ctx, &cli.output, &mut completed)?;
    }

    completed.save()?;

    if !cli.quiet {
        eprintln!(
            "Converted {} file(s), {} error(s)",
            inputs.len(),
            total_errors
        );
    }
    Ok(())
}

/// A directory input is scanned for .xbrl files; anything else is taken as a
/// single instance document.
fn collect_inputs(input: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "xbrl"))
        .collect();
    files.sort();
    Ok(files)
}

/// Write every page the run produced and record the output basenames. Pages
/// sharing a stem (a deferred linkbase and its retry) land in one file, with
/// the later, complete page winning.
fn write_outputs(
    ctx: &RunContext,
    output_dir: &Path,
    completed: &mut CompletedOutputs,
) -> Result<(), Box<dyn std::error::Error>> {
    let prefix_block = ctx.registry.prefix_block();
    for (_, page) in ctx.pages() {
        let basename = format!("{}.ttl", page.stem);
        let content = assemble_page(&page.source_href, &prefix_block, &page.body);
        fs::write(output_dir.join(&basename), content)?;
        completed.insert(basename);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "xbrl2rdf=debug"
    } else if cli.quiet {
        "xbrl2rdf=error"
    } else {
        "xbrl2rdf=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
