//! Entrapment 数据库构建流程：
//! 载入 -> 酶切 / 组成 -> 陷阱库污染过滤 -> 最近邻匹配 -> 拼接输出。

pub mod assemble;
pub mod filter;
pub mod matcher;
pub mod report;

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::digest::{digest_proteins, DigestOpt};
use crate::error::{EntrapError, EntrapResult};
use crate::protein::{DbType, ProteinDb};
pub use assemble::{assemble, DatasetRow, EntrapmentDataset};
pub use filter::{filter_trap, FilterReport, HostPeptideIndex};
pub use matcher::{match_nearest, Match};
pub use report::{RunSummary, StagedOutput};

/// 构建参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrapOpt {
    pub digest: DigestOpt,
    /// 若设置，载入后用该种子打乱宿主与陷阱库的顺序
    pub shuffle_seed: Option<u64>,
    /// 线程数（0 = 全部可用核心）
    pub threads: usize,
    /// 输出 FASTA 每行宽度（0 = 不换行）
    pub line_width: usize,
    /// 是否输出 QC 特征表
    pub qc: bool,
}

impl Default for EntrapOpt {
    fn default() -> Self {
        Self {
            digest: DigestOpt::default(),
            shuffle_seed: None,
            threads: 0,
            line_width: 60,
            qc: true,
        }
    }
}

impl EntrapOpt {
    pub fn validate(&self) -> EntrapResult<()> {
        self.digest.validate()
    }

    pub fn print(&self) {
        tracing::info!("Entrapment options:");
        tracing::info!("  rule = {}", self.digest.rule);
        tracing::info!("  min_len = {}", self.digest.min_len);
        match self.digest.max_len {
            Some(m) => tracing::info!("  max_len = {}", m),
            None => tracing::debug!("  max_len = unlimited"),
        }
        tracing::info!("  missed_cleavages = {}", self.digest.missed_cleavages);
        if self.threads == 0 {
            tracing::info!("  threads = all available cores");
        } else {
            tracing::info!("  threads = {}", self.threads);
        }
        tracing::debug!("  shuffle_seed = {:?}", self.shuffle_seed);
        tracing::debug!("  line_width = {}", self.line_width);
        tracing::debug!("  qc = {}", self.qc);
    }
}

/// 内存中构建的结果
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub dataset: EntrapmentDataset,
    pub matches: Vec<Match>,
    pub filter: FilterReport,
    pub n_host_peptides: usize,
    pub n_trap_peptides: usize,
}

/// 在当前 rayon 线程池中完成酶切、过滤、匹配与拼接
pub fn build_dataset(mut host: ProteinDb, mut trap: ProteinDb, opt: &EntrapOpt) -> EntrapResult<BuildOutcome> {
    opt.validate()?;
    debug_assert_eq!(host.db, DbType::Host);
    debug_assert_eq!(trap.db, DbType::Trap);

    if let Some(seed) = opt.shuffle_seed {
        host.shuffle(seed);
        trap.shuffle(seed);
    }

    tracing::info!("Digesting {} host and {} trap proteins ({})", host.len(), trap.len(), opt.digest.rule);
    let host_peptides = digest_proteins(&host.records, &opt.digest);
    let trap_peptides = digest_proteins(&trap.records, &opt.digest);
    tracing::info!("  host peptides: {}", host_peptides.len());
    tracing::info!("  trap peptides: {}", trap_peptides.len());

    let index = HostPeptideIndex::build(&host_peptides);
    let filter = filter_trap(&mut trap, &trap_peptides, &index);
    tracing::info!(
        "Contamination filter: removed {} of {} trap proteins ({} eligible)",
        filter.n_removed(),
        filter.loaded,
        filter.n_eligible()
    );
    if trap.is_empty() {
        return Err(EntrapError::NoEligibleCandidates { removed: filter.n_removed() });
    }

    tracing::info!("Matching {} host proteins against {} trap candidates", host.len(), trap.len());
    let matches = match_nearest(&host.composition, &trap.composition)?;
    let dataset = assemble(&host, &trap, &matches);

    Ok(BuildOutcome {
        dataset,
        matches,
        filter,
        n_host_peptides: host_peptides.len(),
        n_trap_peptides: trap_peptides.len(),
    })
}

/// 以 `threads` 个线程（0 = 全部核心）运行闭包
pub fn with_thread_pool<T, F>(threads: usize, f: F) -> EntrapResult<T>
where
    F: FnOnce() -> EntrapResult<T> + Send,
    T: Send,
{
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    pool.install(f)
}

/// 完整流程：读入两个 FASTA，构建数据集并写出到 `out_dir`（不存在则创建）。
/// 输出要么全部写成，要么一个也不留。
pub fn run<P, Q, R>(host_path: P, trap_path: Q, out_dir: R, opt: &EntrapOpt) -> EntrapResult<RunSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let start = Instant::now();
    let (host_path, trap_path, out_dir) = (host_path.as_ref(), trap_path.as_ref(), out_dir.as_ref());
    opt.validate()?;
    opt.print();

    let (outcome, n_host) = with_thread_pool(opt.threads, || {
        tracing::info!("Loading host FASTA {}", host_path.display());
        let host = ProteinDb::from_fasta(host_path, DbType::Host)?;
        tracing::info!("Loading trap FASTA {}", trap_path.display());
        let trap = ProteinDb::from_fasta(trap_path, DbType::Trap)?;
        let n_host = host.len();
        Ok((build_dataset(host, trap, opt)?, n_host))
    })?;

    let ds = &outcome.dataset;
    let mut staged = StagedOutput::new(out_dir)?;
    staged.stage(report::FASTA_FILE, |w| report::write_fasta(ds, w, opt.line_width))?;
    staged.stage(report::MATCH_TABLE_FILE, |w| report::write_match_table(ds, w))?;
    if opt.qc {
        let rows = report::dataset_qc_rows(ds, &opt.digest);
        staged.stage(report::QC_FILE, |w| report::write_qc_table(&rows, w))?;
    }

    let summary = RunSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        host_file: host_path.display().to_string(),
        trap_file: trap_path.display().to_string(),
        out_dir: out_dir.display().to_string(),
        command_line: std::env::args().collect::<Vec<_>>().join(" "),
        timestamp: chrono::Utc::now().to_rfc3339(),
        options: opt.clone(),
        n_host,
        n_trap_loaded: outcome.filter.loaded,
        n_trap_removed: outcome.filter.n_removed(),
        n_trap_eligible: outcome.filter.n_eligible(),
        n_unique_traps_selected: ds.n_unique_traps(),
        n_host_peptides: outcome.n_host_peptides,
        n_trap_peptides: outcome.n_trap_peptides,
        distance: ds.distance_stats(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    staged.stage(report::SUMMARY_FILE, |w| report::write_summary(&summary, w))?;
    staged.commit()?;
    tracing::info!("Wrote {} rows to {}", ds.len(), out_dir.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protein::ProteinRecord;

    fn db(kind: DbType, entries: &[(&str, &str)]) -> ProteinDb {
        let recs = entries
            .iter()
            .map(|(id, seq)| ProteinRecord::new(id, seq, kind))
            .collect();
        ProteinDb::from_records(kind, recs).unwrap()
    }

    #[test]
    fn contaminated_trap_is_never_selected() {
        let host = db(DbType::Host, &[("h1", "ELVISKLIVESR")]);
        // t1 has the closest composition but contains ELVISK
        let trap = db(
            DbType::Trap,
            &[("t1", "ELVISKLIVESRG"), ("t2", "WWWWWWWWWWWWWWWWWW")],
        );
        let out = build_dataset(host, trap, &EntrapOpt::default()).unwrap();
        assert_eq!(out.filter.n_removed(), 1);
        let traps = out.dataset.trap_rows();
        assert_eq!(traps.len(), 1);
        assert_eq!(&*traps[0].record.id, "t2");
    }

    #[test]
    fn proline_exception_peptides_are_shared() {
        // both digest to ... | PAAAAAR under default trypsin
        let host = db(DbType::Host, &[("h1", "CCCCCCMRPAAAAAR")]);
        let trap = db(
            DbType::Trap,
            &[("t1", "MMMMMWKPAAAAAR"), ("t2", "WWWWWWWWWWWW")],
        );
        let out = build_dataset(host, trap, &EntrapOpt::default()).unwrap();
        assert_eq!(out.filter.n_removed(), 1);
        assert_eq!(&*out.filter.removed[0].trap, "t1");
        assert_eq!(out.filter.removed[0].peptide, "PAAAAAR");
        assert_eq!(&*out.dataset.trap_rows()[0].record.id, "t2");
    }

    #[test]
    fn empty_pool_after_filtering_is_reported() {
        let host = db(DbType::Host, &[("h1", "ELVISKLIVESR")]);
        let trap = db(DbType::Trap, &[("t1", "AAAAAAKELVISK")]);
        match build_dataset(host, trap, &EntrapOpt::default()) {
            Err(EntrapError::NoEligibleCandidates { removed }) => assert_eq!(removed, 1),
            other => panic!("expected NoEligibleCandidates, got {:?}", other.map(|o| o.dataset.len())),
        }
    }

    #[test]
    fn shuffle_seed_does_not_change_pairs() {
        let host = db(
            DbType::Host,
            &[("h1", "MKTAYIAKQR"), ("h2", "GGGGCCCCAA"), ("h3", "WWYYFF"), ("h4", "DDEEDDEE")],
        );
        let trap = db(
            DbType::Trap,
            &[("t1", "RQKAIYATKM"), ("t2", "AACCCCGGGG"), ("t3", "FFYYWW"), ("t4", "EEDDEEDD"), ("t5", "PPPP")],
        );
        let pairs = |opt: &EntrapOpt| {
            let out = build_dataset(host.clone(), trap.clone(), opt).unwrap();
            let mut p: Vec<(String, String)> = out
                .dataset
                .trap_rows()
                .iter()
                .map(|r| (r.host_seed.as_deref().unwrap_or("").to_string(), r.record.id.to_string()))
                .collect();
            p.sort();
            p
        };
        let plain = pairs(&EntrapOpt::default());
        let shuffled = pairs(&EntrapOpt { shuffle_seed: Some(7), ..EntrapOpt::default() });
        let shuffled2 = pairs(&EntrapOpt { shuffle_seed: Some(42), ..EntrapOpt::default() });
        assert_eq!(plain, shuffled);
        assert_eq!(plain, shuffled2);
        assert_eq!(plain[0], ("h1".to_string(), "t1".to_string()));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let host = db(DbType::Host, &[("h1", "MKTAYIAKQR")]);
        let trap = db(DbType::Trap, &[("t1", "MKTAYIAKQR")]);
        let opt = EntrapOpt {
            digest: DigestOpt { min_len: 0, ..DigestOpt::default() },
            ..EntrapOpt::default()
        };
        assert!(matches!(build_dataset(host, trap, &opt), Err(EntrapError::Config { .. })));
    }

    #[test]
    fn thread_pool_runs_closure() {
        let v = with_thread_pool(2, || Ok(rayon::current_num_threads())).unwrap();
        assert_eq!(v, 2);
    }
}
