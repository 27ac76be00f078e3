use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use wiktionary_bilingual::dump::{open_dump, parse_page_xml, scan_pages};
use wiktionary_bilingual::{Counters, Dictionary, ForeignParser, ParserConfig};

#[derive(Parser)]
#[command(name = "wiktionary-bilingual-rust")]
#[command(about = "Extracts English/foreign dictionary pairs from a Wiktionary XML dump")]
struct Args {
    /// Input XML file (.xml or .xml.bz2)
    input: PathBuf,

    /// Output JSONL file, one entry per line
    output: PathBuf,

    /// Language config YAML (default: built-in Italian)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write both indexes as JSONL, one row per line
    #[arg(long)]
    index_output: Option<PathBuf>,

    /// Limit number of pages to scan (for testing with raw dumps)
    #[arg(long)]
    page_limit: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Default)]
pub struct Stats {
    pub pages_scanned: usize,
    pub pages_parsed: usize,
    pub special: usize,
    pub redirects: usize,
    pub skipped: usize,
    pub entries_written: usize,
    pub english_keys: usize,
    pub foreign_keys: usize,
    pub index_rows: usize,
    pub elapsed: Duration,
}

fn print_stats(stats: &Stats, config: &ParserConfig, counters: &Counters) {
    println!();
    println!("============================================================");
    println!("Source: {}", config.source_name);
    println!("Pages scanned: {}", stats.pages_scanned);
    println!("Pages parsed: {}", stats.pages_parsed);
    println!("Entries written: {}", stats.entries_written);
    println!("English keys: {}", stats.english_keys);
    println!("Foreign keys: {}", stats.foreign_keys);
    println!("Index rows: {}", stats.index_rows);
    println!("------------------------------------------------------------");
    println!("Special pages: {}", stats.special);
    println!("Redirects: {}", stats.redirects);
    println!("Skipped: {}", stats.skipped);
    println!("------------------------------------------------------------");
    println!("Warnings: {}", counters.warnings());
    for (name, count) in counters.iter() {
        println!("  {}: {}", name, count);
    }
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!("Rate: {:.0} pages/sec", stats.pages_scanned as f64 / stats.elapsed.as_secs_f64().max(0.001));
    println!("============================================================");
}

fn load_config(path: Option<&PathBuf>) -> wiktionary_bilingual::Result<ParserConfig> {
    match path {
        Some(p) => ParserConfig::from_yaml_file(p),
        None => ParserConfig::italian(),
    }
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if !args.quiet {
        println!("Parsing: {}", args.input.display());
        println!("Output: {}", args.output.display());
        println!("Source: {}", config.source_name);
        if let Some(limit) = args.page_limit {
            println!("Page limit: {}", limit);
        }
        println!();
    }

    let start_time = Instant::now();
    let mut stats = Stats::default();
    let mut dict = Dictionary::new("en", config.source_name.clone());
    let mut parser = ForeignParser::new(config, Counters::new());

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb
    };

    let reader = open_dump(&args.input)?;
    scan_pages(reader, |page_xml| {
        if let Some(limit) = args.page_limit {
            if stats.pages_scanned >= limit {
                return false;
            }
        }
        stats.pages_scanned += 1;

        if stats.pages_scanned % 1000 == 0 {
            let elapsed = start_time.elapsed().as_secs_f64();
            let rate = stats.pages_scanned as f64 / elapsed;
            pb.set_message(format!(
                "Pages: {} | Entries: {} | Rate: {:.0} pg/s",
                stats.pages_scanned,
                dict.entries().len(),
                rate
            ));
        }

        let Some(page) = parse_page_xml(&page_xml) else {
            stats.skipped += 1;
            return true;
        };
        if page.ns != 0 || parser.config().is_ignorable_title(&page.title) {
            stats.special += 1;
            return true;
        }
        if page.is_redirect {
            stats.redirects += 1;
            return true;
        }

        parser.parse_page(&page.title, &page.text, &mut dict);
        stats.pages_parsed += 1;
        true
    })?;
    pb.finish_and_clear();

    let output = File::create(&args.output)?;
    let mut writer = BufWriter::with_capacity(256 * 1024, output);
    dict.write_entries_jsonl(&mut writer)?;
    writer.flush()?;

    if let Some(path) = &args.index_output {
        let output = File::create(path)?;
        let mut writer = BufWriter::with_capacity(256 * 1024, output);
        dict.english.write_jsonl(&mut writer)?;
        dict.foreign.write_jsonl(&mut writer)?;
        writer.flush()?;
    }

    stats.entries_written = dict.entries().len();
    stats.english_keys = dict.english.key_count();
    stats.foreign_keys = dict.foreign.key_count();
    stats.index_rows = dict.english.row_count() + dict.foreign.row_count();
    stats.elapsed = start_time.elapsed();

    if !args.quiet {
        print_stats(&stats, parser.config(), parser.diagnostics());
    }

    Ok(())
}
