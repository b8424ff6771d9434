use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use clap::Parser as CliParser;
use colored::Colorize;
use serde_json::json;

use firmware_offset_finder::{
    batch,
    config::ScanConfig,
    engine::{find, find_xrefs},
    image::FirmwareImage,
    output,
    pattern::{parse, stringify},
};

#[derive(CliParser, Debug)]
#[command(name = "firmware-offset-finder")]
#[command(version)]
#[command(about = "Find patterns and x-refs in ARM firmware dumps", long_about = None)]
struct Args {
    /// Firmware dump file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Load address of the dump, hex
    #[arg(short, long, default_value = "A0000000")]
    base: String,

    /// Search alignment
    #[arg(short, long, default_value_t = 1)]
    align: usize,

    /// Pattern to search, repeatable
    #[arg(short, long)]
    pattern: Vec<String>,

    /// Address to search x-refs for, hex
    #[arg(short, long)]
    xrefs: Option<String>,

    /// Limit results count
    #[arg(short = 'n', long, default_value_t = 100)]
    limit: usize,

    /// Batch file with `ID: NAME = PATTERN` lines
    #[arg(long)]
    from_ini: Option<PathBuf>,

    /// Parse a pattern and print its canonical form
    #[arg(long)]
    prettify: Option<String>,

    /// Enable debug output
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Output as JSON
    #[arg(short = 'J', long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let as_json = args.json;

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(err) = run(&args) {
        if as_json {
            println!("{}", serde_json::to_string_pretty(&json!({ "error": err.to_string() }))
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)));
        } else {
            eprintln!("{} {}", "ERROR:".red().bold(), err);
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    // Prettify needs no firmware file at all.
    if let Some(text) = &args.prettify {
        let pretty = stringify(&parse(text)?);
        if args.json {
            print_json(&json!({ "pattern": pretty }));
        } else {
            println!("Pattern: {}", pretty);
        }
        return Ok(());
    }

    let config = ScanConfig {
        base: parse_hex(&args.base).context("invalid base address")?,
        align: args.align,
        limit: args.limit,
        verbose: args.verbose,
        json: args.json,
    };
    config.validate().map_err(|e| anyhow!(e))?;

    let file = args
        .file
        .as_ref()
        .ok_or_else(|| anyhow!("firmware file is required (-f FILE)"))?;
    let image = FirmwareImage::load(file, config.base, config.align)
        .with_context(|| format!("cannot load {}", file.display()))?;
    let view = image.view();

    if !args.pattern.is_empty() {
        let start = Instant::now();
        let mut blocks = Vec::new();
        for text in &args.pattern {
            let expr = parse(text)?;
            let results = find(&expr, &view, config.limit)?;
            if config.json {
                blocks.push(output::pattern_json(text, &expr.kind, &results));
            } else {
                print!("{}", output::render_pattern_results(text, &expr.kind, &results));
                println!();
            }
        }
        let elapsed = start.elapsed().as_millis();
        if config.json {
            print_json(&json!({ "patterns": blocks, "elapsed": elapsed }));
        } else {
            println!("Search done in {} ms", elapsed);
        }
    } else if let Some(addr) = &args.xrefs {
        let address = parse_hex(addr).context("invalid x-ref address")?;
        let start = Instant::now();
        let results = find_xrefs(address, &view, config.limit);
        let elapsed = start.elapsed().as_millis();
        if config.json {
            print_json(&json!({ "results": output::xrefs_json(&results), "elapsed": elapsed }));
        } else {
            print!("{}", output::render_xref_results(address, &results));
            println!("\nSearch done in {} ms", elapsed);
        }
    } else if let Some(ini) = &args.from_ini {
        let entries = batch::load(ini).with_context(|| format!("cannot load {}", ini.display()))?;
        let start = Instant::now();
        let mut blocks = Vec::new();
        for entry in &entries {
            // A broken entry must not sink the whole batch; it is reported
            // as "not found" and logged.
            let (kind, results) = match parse(&entry.pattern)
                .map_err(anyhow::Error::from)
                .and_then(|expr| Ok((expr.kind, find(&expr, &view, 1)?)))
            {
                Ok(found) => found,
                Err(err) => {
                    log::warn!("pattern for {} failed: {}", entry.name, err);
                    (firmware_offset_finder::PatternKind::Offset, Vec::new())
                }
            };
            if config.json {
                blocks.push(output::batch_json(entry, &kind, &results));
            } else {
                if entry.id > 0 && entry.id & 0xF == 0 {
                    println!();
                }
                println!("{}", output::batch_line(entry, results.first().map(|r| r.value)));
            }
        }
        let elapsed = start.elapsed().as_millis();
        if config.json {
            print_json(&json!({ "patterns": blocks, "elapsed": elapsed }));
        }
    } else {
        bail!("nothing to do: pass -p, -x, --from-ini or --prettify");
    }

    Ok(())
}

fn parse_hex(text: &str) -> anyhow::Result<u32> {
    let trimmed = text
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    Ok(u32::from_str_radix(trimmed, 16)?)
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("{} {}", "ERROR:".red().bold(), err),
    }
}
