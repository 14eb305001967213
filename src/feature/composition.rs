use std::sync::Arc;

use rayon::prelude::*;

use crate::protein::ProteinRecord;
use crate::util::aa;

/// 单条序列的氨基酸组成：20 个计数，列顺序同 [`aa::AMINO_ACIDS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Composition(pub [u32; aa::SIGMA]);

impl Composition {
    /// 统计标准氨基酸出现次数；非标准符号直接跳过，不报错
    pub fn from_seq(seq: &[u8]) -> Self {
        let mut counts = [0u32; aa::SIGMA];
        for &b in seq {
            if let Some(i) = aa::to_index(b) {
                counts[i] += 1;
            }
        }
        Self(counts)
    }

    #[inline]
    pub fn count(&self, residue: u8) -> u32 {
        aa::to_index(residue).map(|i| self.0[i]).unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

/// 平方欧氏距离，整数累加保证并列判断精确
#[inline]
pub fn squared_distance(a: &[u32], b: &[u32]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum()
}

/// 行优先展平的组成矩阵：`data[row * SIGMA + col]`，第 row 行对应 `ids[row]`
#[derive(Debug, Clone, Default)]
pub struct CompositionMatrix {
    ids: Vec<Arc<str>>,
    data: Vec<u32>,
}

impl CompositionMatrix {
    pub fn from_records(records: &[ProteinRecord]) -> Self {
        let rows: Vec<Composition> = records
            .par_iter()
            .map(|r| Composition::from_seq(r.sequence.as_bytes()))
            .collect();
        let ids = records.iter().map(|r| Arc::clone(&r.id)).collect();
        Self::from_rows(ids, &rows)
    }

    pub fn from_rows(ids: Vec<Arc<str>>, rows: &[Composition]) -> Self {
        debug_assert_eq!(ids.len(), rows.len());
        let mut data = Vec::with_capacity(rows.len() * aa::SIGMA);
        for c in rows {
            data.extend_from_slice(&c.0);
        }
        Self { ids, data }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[u32] {
        &self.data[i * aa::SIGMA..(i + 1) * aa::SIGMA]
    }

    pub fn id(&self, i: usize) -> &str {
        &self.ids[i]
    }

    /// 按给定行号顺序抽取子矩阵（用于过滤与打乱）
    pub fn select(&self, order: &[usize]) -> Self {
        let ids: Vec<Arc<str>> = order.iter().map(|&i| Arc::clone(&self.ids[i])).collect();
        let mut data = Vec::with_capacity(order.len() * aa::SIGMA);
        for &i in order {
            data.extend_from_slice(self.row(i));
        }
        Self { ids, data }
    }
}
