use clap::Parser;
use sfntcarve::{
    inspect_candidate,
    io_utils::{carve_cli_error, io_cli_error, simple_cli_error},
    report::render_candidate,
    Config,
};
use std::fs::File;
use std::path::PathBuf;

/// Dump the table directory and names of one sfnt inside a file.
#[derive(Parser)]
struct Args {
    /// File containing the font
    input: PathBuf,
    /// Offset of the sfnt header, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0", value_parser = parse_offset)]
    offset: u64,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_offset(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{s}': {e}"))
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
    let mut file =
        File::open(&args.input).map_err(|e| io_cli_error("opening input file", &args.input, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| io_cli_error("reading input file", &args.input, e))?
        .len();

    let config = Config {
        save_unidentified: true,
        ..Config::default()
    };
    let report = inspect_candidate(&mut file, 0, args.offset, file_size, &config)
        .map_err(|e| carve_cli_error("inspecting font", e))?
        .ok_or_else(|| {
            simple_cli_error(&format!(
                "no valid sfnt table directory at offset 0x{:x}",
                args.offset
            ))
        })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_candidate(&report));
    }
    Ok(())
}
