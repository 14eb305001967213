use std::collections::HashSet;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::assemble::{DistanceStats, EntrapmentDataset};
use super::EntrapOpt;
use crate::digest::{digest_sequence, DigestOpt};
use crate::error::EntrapResult;
use crate::feature::qc::SequenceFeatures;
use crate::io::fasta::FastaWriter;
use crate::protein::{DbType, ProteinRecord};

pub const FASTA_FILE: &str = "entrapment.fasta";
pub const MATCH_TABLE_FILE: &str = "entrapment.tsv";
pub const QC_FILE: &str = "qc_features.tsv";
pub const SUMMARY_FILE: &str = "summary.json";

// ── 原子输出 ──────────────────────────────────────────

/// 一组输出文件先写入 `dir` 下的临时文件，全部写完后才 `commit` 到目标名。
/// 任一写入失败时目标目录不出现新文件；`commit` 中途失败会删掉本次已落盘的文件。
pub struct StagedOutput {
    dir: PathBuf,
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutput {
    /// `dir` 不存在时创建
    pub fn new<P: AsRef<Path>>(dir: P) -> EntrapResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, staged: Vec::new() })
    }

    /// 用 `write` 生成文件 `name` 的内容
    pub fn stage<F>(&mut self, name: &str, write: F) -> EntrapResult<()>
    where
        F: FnOnce(&mut BufWriter<&mut std::fs::File>) -> EntrapResult<()>,
    {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            write(&mut w)?;
            w.flush()?;
        }
        self.staged.push((tmp, self.dir.join(name)));
        Ok(())
    }

    /// 依次重命名到目标路径（覆盖已有文件）
    pub fn commit(self) -> EntrapResult<Vec<PathBuf>> {
        let mut done: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (tmp, target) in self.staged {
            if let Err(e) = tmp.persist(&target) {
                for path in &done {
                    if let Err(rm) = std::fs::remove_file(path) {
                        tracing::warn!("cannot remove partial output {}: {}", path.display(), rm);
                    }
                }
                return Err(e.error.into());
            }
            done.push(target);
        }
        Ok(done)
    }
}

/// 写出合并 FASTA：宿主块在前、陷阱块在后
pub fn write_fasta<W: Write>(ds: &EntrapmentDataset, w: W, line_width: usize) -> EntrapResult<()> {
    let mut w = FastaWriter::new(w, line_width);
    for row in &ds.rows {
        w.write_record(&row.record.id, &row.record.sequence)?;
    }
    w.flush()
}

/// 写出配对表：id, db_type, host_seed, distance（宿主行后两列为空）
pub fn write_match_table<W: Write>(ds: &EntrapmentDataset, mut w: W) -> EntrapResult<()> {
    writeln!(w, "id\tdb_type\thost_seed\tdistance")?;
    for row in &ds.rows {
        let seed = row.host_seed.as_deref().unwrap_or("");
        let dist = row.distance.map(|d| format!("{:.6}", d)).unwrap_or_default();
        writeln!(w, "{}\t{}\t{}\t{}", row.record.id, row.db_type(), seed, dist)?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcKind {
    Protein,
    Peptide,
}

impl fmt::Display for QcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QcKind::Protein => "protein",
            QcKind::Peptide => "peptide",
        })
    }
}

/// QC 表的一行：蛋白行 name 为蛋白标识，肽段行 name 为肽段序列
#[derive(Debug, Clone, PartialEq)]
pub struct QcRow {
    pub kind: QcKind,
    pub db_type: DbType,
    pub name: String,
    pub features: SequenceFeatures,
}

/// 对一组蛋白计算蛋白级与肽段级特征。同一标识只处理一次，
/// 因此被多个宿主选中的陷阱蛋白不会重复计数。
pub fn qc_rows<'a, I>(records: I, opt: &DigestOpt) -> Vec<QcRow>
where
    I: IntoIterator<Item = &'a ProteinRecord>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for r in records {
        if !seen.insert(&*r.id) {
            continue;
        }
        out.push(QcRow {
            kind: QcKind::Protein,
            db_type: r.db,
            name: r.id.to_string(),
            features: SequenceFeatures::compute(&r.sequence),
        });
        for pep in digest_sequence(&r.sequence, opt) {
            let features = SequenceFeatures::compute(&pep);
            out.push(QcRow { kind: QcKind::Peptide, db_type: r.db, name: pep, features });
        }
    }
    out
}

/// 数据集的 QC 行：宿主块与陷阱块分别处理
pub fn dataset_qc_rows(ds: &EntrapmentDataset, opt: &DigestOpt) -> Vec<QcRow> {
    let mut rows = qc_rows(ds.host_rows().iter().map(|r| &r.record), opt);
    rows.extend(qc_rows(ds.trap_rows().iter().map(|r| &r.record), opt));
    rows
}

pub fn write_qc_table<W: Write>(rows: &[QcRow], mut w: W) -> EntrapResult<()> {
    writeln!(w, "kind\tdb_type\tname\t{}", SequenceFeatures::COLUMNS.join("\t"))?;
    for row in rows {
        writeln!(w, "{}\t{}\t{}\t{}", row.kind, row.db_type, row.name, row.features.to_tsv_fields())?;
    }
    w.flush()?;
    Ok(())
}

/// 一次运行的摘要，写为 summary.json
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub host_file: String,
    pub trap_file: String,
    pub out_dir: String,
    pub command_line: String,
    pub timestamp: String,
    pub options: EntrapOpt,
    pub n_host: usize,
    pub n_trap_loaded: usize,
    pub n_trap_removed: usize,
    pub n_trap_eligible: usize,
    pub n_unique_traps_selected: usize,
    pub n_host_peptides: usize,
    pub n_trap_peptides: usize,
    pub distance: Option<DistanceStats>,
    pub elapsed_secs: f64,
}

pub fn write_summary<W: Write>(summary: &RunSummary, mut w: W) -> EntrapResult<()> {
    serde_json::to_writer_pretty(&mut w, summary)?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrap::assemble::assemble;
    use crate::entrap::matcher::match_nearest;
    use crate::protein::ProteinDb;

    fn dataset() -> EntrapmentDataset {
        let host = ProteinDb::from_records(
            DbType::Host,
            vec![
                ProteinRecord::new("h1", "ELVISKLIVESR", DbType::Host),
                ProteinRecord::new("h2", "ELVISKLIVESK", DbType::Host),
            ],
        )
        .unwrap();
        let trap = ProteinDb::from_records(
            DbType::Trap,
            vec![ProteinRecord::new("t1", "GGGGGGKAAAAAAR", DbType::Trap)],
        )
        .unwrap();
        let matches = match_nearest(&host.composition, &trap.composition).unwrap();
        assemble(&host, &trap, &matches)
    }

    #[test]
    fn qc_rows_cover_proteins_and_peptides_once() {
        let rows = dataset_qc_rows(&dataset(), &DigestOpt::default());
        let proteins: Vec<&str> = rows
            .iter()
            .filter(|r| r.kind == QcKind::Protein)
            .map(|r| r.name.as_str())
            .collect();
        // t1 was selected twice but is reported once
        assert_eq!(proteins, vec!["h1", "h2", "t1"]);

        let trap_peps: Vec<&str> = rows
            .iter()
            .filter(|r| r.kind == QcKind::Peptide && r.db_type == DbType::Trap)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(trap_peps, vec!["GGGGGGK", "AAAAAAR"]);
    }

    #[test]
    fn tables_are_written() {
        let ds = dataset();

        let mut buf = Vec::new();
        write_match_table(&ds, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id\tdb_type\thost_seed\tdistance");
        assert_eq!(lines[1], "h1\thost\t\t");
        assert!(lines[3].starts_with("t1\ttrap\th1\t"));
        assert!(lines[4].starts_with("t1\ttrap\th2\t"));

        let mut buf = Vec::new();
        write_qc_table(&dataset_qc_rows(&ds, &DigestOpt::default()), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header.split('\t').count(), 3 + SequenceFeatures::COLUMNS.len());
        assert!(text.lines().any(|l| l.starts_with("peptide\thost\tELVISK\t6\t")));
    }

    #[test]
    fn staged_files_appear_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let ds = dataset();

        let mut staged = StagedOutput::new(&out).unwrap();
        staged.stage(FASTA_FILE, |w| write_fasta(&ds, w, 0)).unwrap();
        staged.stage(MATCH_TABLE_FILE, |w| write_match_table(&ds, w)).unwrap();
        assert!(!out.join(FASTA_FILE).exists());

        let written = staged.commit().unwrap();
        assert_eq!(written, vec![out.join(FASTA_FILE), out.join(MATCH_TABLE_FILE)]);
        assert!(std::fs::read_to_string(out.join(FASTA_FILE)).unwrap().starts_with(">h1\nELVISKLIVESR\n"));
        // only the two targets remain, no leftover temp files
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
    }

    #[test]
    fn failed_stage_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset();

        let mut staged = StagedOutput::new(dir.path()).unwrap();
        staged.stage(FASTA_FILE, |w| write_fasta(&ds, w, 60)).unwrap();
        let err = staged.stage(SUMMARY_FILE, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        });
        assert!(err.is_err());
        drop(staged);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_commit_removes_already_persisted_files() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset();
        // a directory squatting on the last target makes its rename fail
        std::fs::create_dir(dir.path().join(SUMMARY_FILE)).unwrap();

        let mut staged = StagedOutput::new(dir.path()).unwrap();
        staged.stage(FASTA_FILE, |w| write_fasta(&ds, w, 60)).unwrap();
        staged.stage(MATCH_TABLE_FILE, |w| write_match_table(&ds, w)).unwrap();
        staged.stage(SUMMARY_FILE, |w| Ok(writeln!(w, "{{}}")?)).unwrap();
        assert!(staged.commit().is_err());

        assert!(!dir.path().join(FASTA_FILE).exists());
        assert!(!dir.path().join(MATCH_TABLE_FILE).exists());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(SUMMARY_FILE)]);
    }
}
