use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;

use hansort::{RankTable, SortConfig, reset_sigpipe, sort_words};

#[derive(Parser)]
#[command(name = "hansort", about = "Sort Chinese words by pronunciation")]
struct Cli {
    /// Signature rank table, one SIGNATURE<TAB>RANK entry per line
    #[arg(short = 'd', long = "dict", value_name = "FILE")]
    dict: PathBuf,

    /// Word count above which the sharded parallel path is used
    #[arg(long = "threshold", value_name = "N")]
    threshold: Option<usize>,

    /// Number of producer workers for the sharded path
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<usize>,

    /// Write output to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Input file with one word per line, or - for stdin
    #[arg(default_value = "-")]
    input: String,
}

/// Buffer that holds input data, either memory-mapped or heap-allocated.
enum FileData {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl std::ops::Deref for FileData {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            FileData::Mmap(m) => m,
            FileData::Owned(v) => v,
        }
    }
}

/// Read the word list: mmap for file input (zero-copy), Vec for stdin.
/// One word per line; blank lines are skipped.
fn read_words(input: &str) -> Result<Vec<String>> {
    let buffer = if input == "-" {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        FileData::Owned(data)
    } else {
        let file = File::open(input).with_context(|| format!("open failed: {input}"))?;
        let metadata = file.metadata()?;
        if metadata.len() > 0 {
            FileData::Mmap(unsafe { Mmap::map(&file)? })
        } else {
            FileData::Owned(Vec::new())
        }
    };

    let data = &*buffer;
    let mut words = Vec::with_capacity(data.len() / 8 + 1);
    let mut start = 0usize;
    for pos in memchr::memchr_iter(b'\n', data).chain(std::iter::once(data.len())) {
        let mut end = pos;
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
        if end > start {
            let line = std::str::from_utf8(&data[start..end])
                .with_context(|| format!("input is not valid UTF-8 at byte {start}"))?;
            words.push(line.to_string());
        }
        start = pos + 1;
        if start >= data.len() {
            break;
        }
    }
    Ok(words)
}

fn run(cli: &Cli) -> Result<()> {
    let dict = File::open(&cli.dict)
        .with_context(|| format!("open failed: {}", cli.dict.display()))?;
    let table = RankTable::from_reader(BufReader::new(dict))
        .with_context(|| format!("bad rank table: {}", cli.dict.display()))?;

    let words = read_words(&cli.input)?;

    let mut config = SortConfig::default();
    if let Some(threshold) = cli.threshold {
        config.direct_threshold = threshold;
    }
    config.producers = cli.jobs;

    let sorted = sort_words(&words, &table, &config)?;

    let stdout = io::stdout();
    let mut writer: BufWriter<Box<dyn Write>> = match &cli.output {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("create failed: {}", path.display()))?,
        )),
        None => BufWriter::new(Box::new(stdout.lock())),
    };
    for word in sorted {
        writer.write_all(word.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn main() {
    reset_sigpipe();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("hansort: {e:#}");
        process::exit(1);
    }
}
