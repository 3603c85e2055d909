use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;

use kmer_repair::index::{KmerInfo, DEFAULT_PREFIX_LEN};
use kmer_repair::io;
use kmer_repair::repair::{self, RepairOpt, Repairer, RunReport};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "kmer-repair",
    author,
    version,
    about = "Repair DNA sequences against a set of trusted k-mer counts",
    arg_required_else_help = true
)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace regions of each FASTA sequence not covered by k-mers with the closest k-mer path
    Repair {
        /// Multi-FASTA sequences to repair ("-" for stdin)
        sequences: String,
        /// K-mer counts, one "kmer count" per line as written by `jellyfish dump -c` ("-" for stdin)
        kmer_counts: String,
        /// Longest unmatched interior gap (in k-mers) to attempt to repair
        #[arg(short = 'g', long = "max-gap", default_value_t = 500)]
        max_gap: usize,
        /// Give up on a gap when it has more candidate paths than this
        #[arg(short = 'x', long = "max-paths", default_value_t = 500,
              value_parser = clap::value_parser!(u32).range(1..))]
        max_paths: u32,
        /// Number of leading bases used as the directly addressed index prefix
        #[arg(short = 'p', long = "prefix-len", default_value_t = DEFAULT_PREFIX_LEN)]
        prefix_len: usize,
        /// Output FASTA path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<String>,
    },
    /// Load a k-mer count file and print the stored k-mers with their saturated counts
    Dump {
        /// K-mer counts ("-" for stdin)
        kmer_counts: String,
        /// Only print k-mers with at least this count
        #[arg(long = "min-count", default_value_t = 0)]
        min_count: u16,
        #[arg(short = 'p', long = "prefix-len", default_value_t = DEFAULT_PREFIX_LEN)]
        prefix_len: usize,
        /// Output path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Repair {
            sequences,
            kmer_counts,
            max_gap,
            max_paths,
            prefix_len,
            out,
            report,
        } => {
            let opt = RepairOpt { max_gap, max_paths: max_paths as usize, ..RepairOpt::default() };
            run_repair(&sequences, &kmer_counts, prefix_len, opt, out.as_deref(), report.as_deref())
        }
        Commands::Dump { kmer_counts, min_count, prefix_len, out } => {
            run_dump(&kmer_counts, min_count, prefix_len, out.as_deref())
        }
    }
}

fn open_output(out_path: Option<&str>) -> Result<Box<dyn Write>> {
    Ok(match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(p)
                .map_err(|e| anyhow::anyhow!("cannot create output '{}': {}", p, e))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    })
}

fn run_repair(
    sequences: &str,
    kmer_counts: &str,
    prefix_len: usize,
    opt: RepairOpt,
    out_path: Option<&str>,
    report_path: Option<&str>,
) -> Result<()> {
    io::check_inputs(sequences, kmer_counts)?;
    let started_at = chrono::Utc::now().to_rfc3339();

    let mut table = io::load_counts(io::open_input(kmer_counts)?, prefix_len)?;
    let kmer_len = table.index.kmer_len();
    let kmers_loaded = table.index.count_all();
    log::info!("kmer length {}, {} kmers in index", kmer_len, kmers_loaded);

    let reader = io::open_input(sequences)?;
    let mut out = open_output(out_path)?;
    let mut repairer = Repairer::new(&mut table.index, opt);
    repair::repair_fasta(reader, &mut out, &mut repairer)?;
    let stats = repairer.into_stats();

    let kmers_used = table.index.count_all_matching(KmerInfo::is_used_any);
    log::info!("{} kmers used in corrections", kmers_used);

    if let Some(path) = report_path {
        let report = RunReport {
            started_at,
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
            sequences: sequences.to_string(),
            kmer_counts: kmer_counts.to_string(),
            kmer_len,
            prefix_len: table.index.codec().prefix_len(),
            count_lines: table.lines,
            count_lines_skipped: table.skipped,
            kmers_loaded,
            kmers_used,
            max_gap: opt.max_gap,
            max_paths: opt.max_paths,
            stats,
        };
        report.write_to_file(path)?;
        log::info!("run report saved: {}", path);
    }
    Ok(())
}

fn run_dump(
    kmer_counts: &str,
    min_count: u16,
    prefix_len: usize,
    out_path: Option<&str>,
) -> Result<()> {
    let table = io::load_counts(io::open_input(kmer_counts)?, prefix_len)?;
    let selected = table.index.count_all_matching(|info| info.freq() >= min_count);
    log::info!("{} of {} kmers have count >= {}", selected, table.index.count_all(), min_count);

    let mut out = open_output(out_path)?;
    let mut result = Ok(());
    table.index.dump(true, |kmer, info| {
        if result.is_err() || info.freq() < min_count {
            return;
        }
        result = out
            .write_all(kmer)
            .and_then(|_| writeln!(out, "\t{}", info.freq()));
    });
    result?;
    out.flush()?;
    Ok(())
}
