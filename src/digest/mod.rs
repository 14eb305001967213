//! 蛋白酶切：按酶切规则把蛋白切成肽段，支持漏切与长度过滤。

pub mod rule;

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EntrapError, EntrapResult};
use crate::protein::ProteinRecord;
pub use rule::CleavageRule;

/// 肽段及其来源蛋白标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peptide {
    pub sequence: String,
    pub protein: Arc<str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestOpt {
    pub rule: CleavageRule,
    /// 最短肽段长度（含）
    pub min_len: usize,
    /// 最长肽段长度（含），None 表示不限
    pub max_len: Option<usize>,
    pub missed_cleavages: usize,
}

impl Default for DigestOpt {
    fn default() -> Self {
        Self {
            rule: CleavageRule::Trypsin,
            min_len: 6,
            max_len: None,
            missed_cleavages: 0,
        }
    }
}

impl DigestOpt {
    pub fn validate(&self) -> EntrapResult<()> {
        if self.min_len == 0 {
            return Err(EntrapError::Config {
                field: "min_len".to_string(),
                message: "minimum peptide length must be at least 1".to_string(),
            });
        }
        if let Some(max) = self.max_len {
            if max < self.min_len {
                return Err(EntrapError::Config {
                    field: "max_len".to_string(),
                    message: format!("max_len ({}) is smaller than min_len ({})", max, self.min_len),
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn keeps(&self, len: usize) -> bool {
        len >= self.min_len && self.max_len.map_or(true, |m| len <= m)
    }
}

/// 切单条序列，返回去重后的肽段（按首次出现顺序）
pub fn digest_sequence(seq: &str, opt: &DigestOpt) -> Vec<String> {
    let bytes = seq.as_bytes();
    if bytes.is_empty() {
        return Vec::new();
    }

    // 片段边界：0, 切点..., len
    let mut bounds = Vec::with_capacity(8);
    bounds.push(0);
    bounds.extend(opt.rule.cut_sites(bytes));
    bounds.push(bytes.len());

    let last = bounds.len() - 1;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for i in 0..last {
        let j_end = (i + 1 + opt.missed_cleavages).min(last);
        for j in (i + 1)..=j_end {
            let pep = &seq[bounds[i]..bounds[j]];
            if opt.keeps(pep.len()) && seen.insert(pep) {
                out.push(pep.to_string());
            }
        }
    }
    out
}

/// 对一组蛋白酶切；结果按蛋白输入顺序排列
pub fn digest_proteins(records: &[ProteinRecord], opt: &DigestOpt) -> Vec<Peptide> {
    records
        .par_iter()
        .flat_map_iter(|r| {
            digest_sequence(&r.sequence, opt)
                .into_iter()
                .map(move |sequence| Peptide { sequence, protein: Arc::clone(&r.id) })
        })
        .collect()
}
