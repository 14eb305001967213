use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{EntrapError, EntrapResult};
use crate::feature::composition::CompositionMatrix;
use crate::io::fasta::FastaReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Host,
    Trap,
}

impl DbType {
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Host => "host",
            DbType::Trap => "trap",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(DbType::Host),
            "trap" => Ok(DbType::Trap),
            _ => Err(format!("unknown database type '{}', expected 'host' or 'trap'", s)),
        }
    }
}

/// 载入后不可变的蛋白记录；id 与序列用 `Arc<str>` 共享，下游复制代价低
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub id: Arc<str>,
    pub sequence: Arc<str>,
    pub db: DbType,
}

impl ProteinRecord {
    pub fn new(id: &str, sequence: &str, db: DbType) -> Self {
        Self { id: Arc::from(id), sequence: Arc::from(sequence), db }
    }
}

/// 一个 FASTA 数据库：蛋白记录及其组成矩阵，第 i 行对应第 i 条记录
#[derive(Debug, Clone)]
pub struct ProteinDb {
    pub db: DbType,
    pub records: Vec<ProteinRecord>,
    pub composition: CompositionMatrix,
}

impl ProteinDb {
    /// 由记录构建并计算组成矩阵；标识重复时报错
    pub fn from_records(db: DbType, records: Vec<ProteinRecord>) -> EntrapResult<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        for r in &records {
            if !seen.insert(&*r.id) {
                return Err(EntrapError::DuplicateId { db, id: r.id.to_string() });
            }
        }
        let composition = CompositionMatrix::from_records(&records);
        Ok(Self { db, records, composition })
    }

    pub fn from_fasta<P: AsRef<Path>>(path: P, db: DbType) -> EntrapResult<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let fh = std::fs::File::open(path)?;
        let reader = FastaReader::new(std::io::BufReader::new(fh)).named(name.clone());

        let mut records = Vec::new();
        for rec in reader {
            let rec = rec?;
            records.push(ProteinRecord::new(&rec.header, &rec.seq, db));
        }
        if records.is_empty() {
            return Err(EntrapError::EmptyDatabase { db, source_name: name });
        }
        tracing::debug!("loaded {} {} proteins from {}", records.len(), db, name);
        Self::from_records(db, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| &*r.id)
    }

    /// 用固定种子打乱记录顺序（组成矩阵同步重排）
    pub fn shuffle(&mut self, seed: u64) {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        self.select(&order);
    }

    /// 只保留 `keep` 返回 true 的记录，返回被移除的数量
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&ProteinRecord) -> bool,
    {
        let order: Vec<usize> = (0..self.records.len())
            .filter(|&i| keep(&self.records[i]))
            .collect();
        let removed = self.records.len() - order.len();
        if removed > 0 {
            self.select(&order);
        }
        removed
    }

    fn select(&mut self, order: &[usize]) {
        self.records = order.iter().map(|&i| self.records[i].clone()).collect();
        self.composition = self.composition.select(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(ids: &[&str]) -> ProteinDb {
        let recs = ids
            .iter()
            .enumerate()
            .map(|(i, id)| ProteinRecord::new(id, &"A".repeat(i + 1), DbType::Trap))
            .collect();
        ProteinDb::from_records(DbType::Trap, recs).unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let recs = vec![
            ProteinRecord::new("p1", "MK", DbType::Host),
            ProteinRecord::new("p1", "MKR", DbType::Host),
        ];
        match ProteinDb::from_records(DbType::Host, recs) {
            Err(EntrapError::DuplicateId { db, id }) => {
                assert_eq!(db, DbType::Host);
                assert_eq!(id, "p1");
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn retain_keeps_composition_in_sync() {
        let mut d = db(&["a", "b", "c"]);
        let removed = d.retain(|r| &*r.id != "b");
        assert_eq!(removed, 1);
        assert_eq!(d.ids().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(d.composition.len(), 2);
        // "c" had sequence "AAA"
        assert_eq!(d.composition.row(1)[0], 3);
    }

    #[test]
    fn shuffle_is_seeded_and_keeps_rows_paired() {
        let mut a = db(&["a", "b", "c", "d", "e", "f"]);
        let mut b = a.clone();
        a.shuffle(42);
        b.shuffle(42);
        assert_eq!(a.ids().collect::<Vec<_>>(), b.ids().collect::<Vec<_>>());
        for (i, r) in a.records.iter().enumerate() {
            assert_eq!(a.composition.row(i)[0] as usize, r.sequence.len());
        }
    }

    #[test]
    fn db_type_display() {
        assert_eq!(DbType::Host.to_string(), "host");
        assert_eq!(DbType::Trap.as_str(), "trap");
        assert_eq!("TRAP".parse::<DbType>(), Ok(DbType::Trap));
        assert!("decoy".parse::<DbType>().is_err());
    }
}
