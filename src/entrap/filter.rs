use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::digest::Peptide;
use crate::protein::ProteinDb;
use crate::util::aa;

/// 宿主肽段索引：I/L 归一化后的肽段 -> 产生它的宿主蛋白
#[derive(Debug, Default)]
pub struct HostPeptideIndex {
    map: HashMap<String, Vec<Arc<str>>>,
}

impl HostPeptideIndex {
    pub fn build(host_peptides: &[Peptide]) -> Self {
        let mut map: HashMap<String, Vec<Arc<str>>> = HashMap::with_capacity(host_peptides.len());
        for p in host_peptides {
            let proteins = map.entry(aa::normalize_il(&p.sequence)).or_default();
            if proteins.last() != Some(&p.protein) {
                proteins.push(Arc::clone(&p.protein));
            }
        }
        Self { map }
    }

    /// 不同（归一化后）肽段的数量
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 查询肽段（原始序列，内部做 I/L 归一化）出现在哪些宿主蛋白中
    pub fn shared_with(&self, peptide: &str) -> Option<&[Arc<str>]> {
        self.map.get(&aa::normalize_il(peptide)).map(Vec::as_slice)
    }
}

/// 一个被剔除的陷阱蛋白，附带一条与宿主共享的肽段作为证据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contamination {
    pub trap: Arc<str>,
    pub peptide: String,
    pub host: Arc<str>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    /// 过滤前陷阱蛋白数
    pub loaded: usize,
    pub removed: Vec<Contamination>,
}

impl FilterReport {
    pub fn n_removed(&self) -> usize {
        self.removed.len()
    }

    pub fn n_eligible(&self) -> usize {
        self.loaded - self.removed.len()
    }
}

/// 找出与宿主共享至少一条肽段的陷阱蛋白；每个蛋白只报告第一条共享肽段，
/// 按陷阱肽段的出现顺序排列
pub fn find_contaminated(trap_peptides: &[Peptide], index: &HostPeptideIndex) -> Vec<Contamination> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for p in trap_peptides {
        if seen.contains(&*p.protein) {
            continue;
        }
        if let Some(hosts) = index.shared_with(&p.sequence) {
            seen.insert(&*p.protein);
            out.push(Contamination {
                trap: Arc::clone(&p.protein),
                peptide: p.sequence.clone(),
                host: Arc::clone(&hosts[0]),
            });
        }
    }
    out
}

/// 从陷阱库中剔除与宿主共享肽段的蛋白（记录与组成矩阵同步删除）。
/// 宿主库从不修改。
pub fn filter_trap(trap: &mut ProteinDb, trap_peptides: &[Peptide], index: &HostPeptideIndex) -> FilterReport {
    let loaded = trap.len();
    let removed = find_contaminated(trap_peptides, index);
    if !removed.is_empty() {
        let blacklist: HashSet<&str> = removed.iter().map(|c| &*c.trap).collect();
        trap.retain(|r| !blacklist.contains(&*r.id));
    }
    for c in &removed {
        tracing::debug!("removed trap protein '{}': peptide {} shared with host '{}'", c.trap, c.peptide, c.host);
    }
    FilterReport { loaded, removed }
}
