use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::matcher::Match;
use crate::protein::{DbType, ProteinDb, ProteinRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub record: ProteinRecord,
    /// 仅陷阱行：选中该蛋白的宿主标识
    pub host_seed: Option<Arc<str>>,
    /// 仅陷阱行：匹配距离
    pub distance: Option<f64>,
}

impl DatasetRow {
    pub fn db_type(&self) -> DbType {
        self.record.db
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// 最终的 entrapment 数据集：先全部宿主行，再每个匹配一条陷阱行
#[derive(Debug, Clone, Default)]
pub struct EntrapmentDataset {
    pub rows: Vec<DatasetRow>,
    n_host: usize,
}

impl EntrapmentDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn host_rows(&self) -> &[DatasetRow] {
        &self.rows[..self.n_host]
    }

    pub fn trap_rows(&self) -> &[DatasetRow] {
        &self.rows[self.n_host..]
    }

    /// 被选中的不同陷阱蛋白数量
    pub fn n_unique_traps(&self) -> usize {
        self.trap_rows()
            .iter()
            .map(|r| &*r.record.id)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn distance_stats(&self) -> Option<DistanceStats> {
        let ds: Vec<f64> = self.trap_rows().iter().filter_map(|r| r.distance).collect();
        if ds.is_empty() {
            return None;
        }
        let min = ds.iter().copied().fold(f64::INFINITY, f64::min);
        let max = ds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = ds.iter().sum::<f64>() / ds.len() as f64;
        Some(DistanceStats { min, mean, max })
    }
}

/// 拼接宿主块与陷阱块。`matches` 与宿主行一一对应（允许重复的陷阱蛋白）。
pub fn assemble(host: &ProteinDb, trap: &ProteinDb, matches: &[Match]) -> EntrapmentDataset {
    let mut rows = Vec::with_capacity(host.len() + matches.len());
    rows.extend(host.records.iter().map(|r| DatasetRow {
        record: r.clone(),
        host_seed: None,
        distance: None,
    }));
    for m in matches {
        rows.push(DatasetRow {
            record: trap.records[m.trap].clone(),
            host_seed: Some(Arc::clone(&host.records[m.host].id)),
            distance: Some(m.distance),
        });
    }
    EntrapmentDataset { rows, n_host: host.len() }
}
