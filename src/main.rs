use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use sfntcarve::{
    io_utils::{carve_cli_error, io_cli_error},
    report::{render_candidate, render_totals, write_csv, write_json},
    Carver, Collisions, Config,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

/// Find OpenType/TrueType fonts inside a binary blob and carve them out.
#[derive(Parser)]
#[command(name = "sfntcarve")]
struct Args {
    /// File to scan (disk image, firmware dump, resource bundle)
    input: PathBuf,
    /// Directory receiving the carved fonts, created if missing
    output: PathBuf,
    /// Bytes read per scan step
    #[arg(long, default_value_t = 64 * 1024)]
    chunk_size: usize,
    /// Also carve fonts without a family name, named by content hash
    #[arg(long)]
    save_unidentified: bool,
    /// Block size for table checksum computation
    #[arg(long, default_value_t = 4096)]
    checksum_buffer: usize,
    /// Block size for content hashing
    #[arg(long, default_value_t = 64 * 1024)]
    hash_buffer: usize,
    /// Let a later font overwrite an earlier one with the same name
    #[arg(long)]
    overwrite: bool,
    /// Plan and report without writing any font
    #[arg(long)]
    dry_run: bool,
    /// Write a JSON report of every valid candidate
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write a CSV summary of every valid candidate
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Only print the closing totals
    #[arg(long, short)]
    quiet: bool,
    /// Hide the scan progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config {
        chunk_size: args.chunk_size,
        save_unidentified: args.save_unidentified,
        checksum_buffer_size: args.checksum_buffer,
        hash_buffer_size: args.hash_buffer,
        collisions: if args.overwrite {
            Collisions::Overwrite
        } else {
            Collisions::Rename
        },
        dry_run: args.dry_run,
    };
    let carver = Carver::new(config).map_err(|e| carve_cli_error("invalid options", e))?;

    let mut file =
        File::open(&args.input).map_err(|e| io_cli_error("opening input file", &args.input, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| io_cli_error("reading input file", &args.input, e))?
        .len();
    if !args.dry_run {
        fs::create_dir_all(&args.output)
            .map_err(|e| io_cli_error("creating output directory", &args.output, e))?;
    }

    let bar = ProgressBar::new(file_size);
    if args.no_progress {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::with_template("scanning [{bar:40}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("=> "),
    );
    let hits = carver
        .scan(bar.wrap_read(&mut file))
        .map_err(|e| carve_cli_error("scanning input", e))?;
    bar.finish_and_clear();
    if !args.quiet {
        println!("found {} location candidates", hits.iter().filter(|h| h.is_candidate()).count());
    }

    let mut summary = carver
        .analyze(&mut file, &hits, file_size)
        .map_err(|e| carve_cli_error("validating candidates", e))?;
    if !args.quiet {
        for offset in &summary.collections {
            println!("found collection at 0x{offset:x} (skipped)");
        }
        for candidate in &summary.candidates {
            println!("{}", render_candidate(candidate));
        }
    }

    carver.extract_all(&mut file, &mut summary, &args.output);
    for failure in &summary.failures {
        eprintln!("{}", failure.error);
    }

    if let Some(path) = &args.json {
        let f = File::create(path).map_err(|e| io_cli_error("creating json", path, e))?;
        write_json(&summary, BufWriter::new(f))?;
    }
    if let Some(path) = &args.csv {
        let f = File::create(path).map_err(|e| io_cli_error("creating csv", path, e))?;
        write_csv(&summary, f)?;
    }

    print!("{}", render_totals(&summary, args.dry_run));
    if !summary.failures.is_empty() {
        return Err(format!("{} font(s) could not be written", summary.failures.len()).into());
    }
    Ok(())
}
