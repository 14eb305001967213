use rayon::prelude::*;

use crate::error::{EntrapError, EntrapResult};
use crate::feature::composition::{squared_distance, CompositionMatrix};

/// 一个宿主蛋白与其最近陷阱蛋白的配对（均为各自矩阵中的行号）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub host: usize,
    pub trap: usize,
    /// 欧氏距离（原始计数，未按长度归一化）
    pub distance: f64,
}

/// 对单个组成向量穷举所有陷阱行，返回 (行号, 平方距离)。
/// 距离相同时取标识字典序最小者，与载入顺序无关。
pub fn nearest_trap(query: &[u32], trap: &CompositionMatrix) -> Option<(usize, u64)> {
    let mut best: Option<(usize, u64)> = None;
    for j in 0..trap.len() {
        let d = squared_distance(query, trap.row(j));
        best = match best {
            None => Some((j, d)),
            Some((bj, bd)) if d < bd || (d == bd && trap.id(j) < trap.id(bj)) => Some((j, d)),
            keep => keep,
        };
    }
    best
}

/// 为每个宿主蛋白选出最近的陷阱蛋白。
///
/// 陷阱池在匹配过程中不缩减，同一陷阱蛋白可以被多个宿主选中；
/// 各宿主相互独立，按宿主并行计算，结果保持宿主输入顺序。
pub fn match_nearest(host: &CompositionMatrix, trap: &CompositionMatrix) -> EntrapResult<Vec<Match>> {
    if trap.is_empty() {
        return Err(EntrapError::NoEligibleCandidates { removed: 0 });
    }
    (0..host.len())
        .into_par_iter()
        .map(|i| {
            let (j, d) = nearest_trap(host.row(i), trap)
                .ok_or(EntrapError::NoEligibleCandidates { removed: 0 })?;
            Ok(Match { host: i, trap: j, distance: (d as f64).sqrt() })
        })
        .collect()
}
