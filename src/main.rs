use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use entrap_rust::digest::{CleavageRule, DigestOpt};
use entrap_rust::entrap::{self, report, EntrapOpt};
use entrap_rust::protein::{DbType, ProteinDb};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "entrap-rust",
    author,
    version,
    about = "Build composition-matched entrapment protein databases",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct DigestArgs {
    /// Cleavage rule (trypsin, trypsin-strict, lys-c, arg-c, glu-c, asp-n)
    #[arg(long, default_value_t = CleavageRule::Trypsin)]
    rule: CleavageRule,
    /// Minimum peptide length
    #[arg(long = "min-len", default_value_t = 6)]
    min_len: usize,
    /// Maximum peptide length (unlimited if omitted)
    #[arg(long = "max-len")]
    max_len: Option<usize>,
    #[arg(long = "missed-cleavages", default_value_t = 0)]
    missed_cleavages: usize,
}

impl DigestArgs {
    fn to_opt(&self) -> DigestOpt {
        DigestOpt {
            rule: self.rule,
            min_len: self.min_len,
            max_len: self.max_len,
            missed_cleavages: self.missed_cleavages,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the entrapment database from a host and a trap FASTA
    Build {
        /// Host (target) protein FASTA
        #[arg(short = 'i', long = "fasta-host")]
        fasta_host: PathBuf,
        /// Foreign (trap) protein FASTA
        #[arg(short = 't', long = "fasta-trap")]
        fasta_trap: PathBuf,
        /// Output directory (created if missing)
        #[arg(short = 'o', long = "out-dir")]
        out_dir: PathBuf,
        #[command(flatten)]
        digest: DigestArgs,
        /// Shuffle both databases with this seed after loading
        #[arg(long = "shuffle-seed")]
        shuffle_seed: Option<u64>,
        /// Worker threads (0 = all cores)
        #[arg(short = 'j', long = "threads", default_value_t = 0)]
        threads: usize,
        /// Residues per FASTA line (0 = no wrapping)
        #[arg(long = "line-width", default_value_t = 60)]
        line_width: usize,
        /// Skip the QC feature table
        #[arg(long = "no-qc")]
        no_qc: bool,
    },
    /// Compute protein and peptide QC features for a single FASTA
    Features {
        /// Protein FASTA
        #[arg(short = 'i', long = "fasta")]
        fasta: PathBuf,
        /// Output TSV path
        #[arg(short, long)]
        out: PathBuf,
        /// Label written in the db_type column
        #[arg(long = "db-type", default_value_t = DbType::Host)]
        db_type: DbType,
        #[command(flatten)]
        digest: DigestArgs,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let start = Instant::now();
    match cli.command {
        Commands::Build {
            fasta_host,
            fasta_trap,
            out_dir,
            digest,
            shuffle_seed,
            threads,
            line_width,
            no_qc,
        } => {
            let opt = EntrapOpt {
                digest: digest.to_opt(),
                shuffle_seed,
                threads,
                line_width,
                qc: !no_qc,
            };
            run_build(&fasta_host, &fasta_trap, &out_dir, &opt)?;
        }
        Commands::Features { fasta, out, db_type, digest } => {
            run_features(&fasta, &out, db_type, &digest.to_opt())?;
        }
    }
    tracing::info!("took {:.2} minutes", start.elapsed().as_secs_f64() / 60.0);
    Ok(())
}

fn run_build(host: &Path, trap: &Path, out_dir: &Path, opt: &EntrapOpt) -> Result<()> {
    for (what, path) in [("host", host), ("trap", trap)] {
        if !path.is_file() {
            anyhow::bail!("cannot open {} FASTA '{}': no such file", what, path.display());
        }
    }
    let summary = entrap::run(host, trap, out_dir, opt)
        .with_context(|| format!("failed to build entrapment database in '{}'", out_dir.display()))?;

    println!("host proteins:        {}", summary.n_host);
    println!("trap proteins loaded: {}", summary.n_trap_loaded);
    println!("trap removed:         {}", summary.n_trap_removed);
    println!("unique traps chosen:  {}", summary.n_unique_traps_selected);
    if let Some(d) = summary.distance {
        println!("distance min/mean/max: {:.3} / {:.3} / {:.3}", d.min, d.mean, d.max);
    }
    println!("output: {}", out_dir.display());
    Ok(())
}

fn run_features(fasta: &Path, out: &Path, db_type: DbType, opt: &DigestOpt) -> Result<()> {
    opt.validate()?;
    let db = ProteinDb::from_fasta(fasta, db_type)
        .with_context(|| format!("cannot load FASTA '{}'", fasta.display()))?;
    let rows = report::qc_rows(&db.records, opt);
    let fh = std::fs::File::create(out)
        .map_err(|e| anyhow::anyhow!("cannot create features file '{}': {}", out.display(), e))?;
    report::write_qc_table(&rows, std::io::BufWriter::new(fh))
        .with_context(|| format!("cannot write features to '{}'", out.display()))?;
    tracing::info!("wrote {} feature rows for {} proteins to {}", rows.len(), db.len(), out.display());
    Ok(())
}
