use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 酶切规则。切点 p 表示在 `seq[p-1]` 与 `seq[p]` 之间切开，
/// 只在序列内部（1..len）产生，末端残基后不切。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleavageRule {
    /// K/R 之后，后接 P 时不切，但 W-K|P 与 M-R|P 仍然切（ExPASy 规则）
    #[default]
    Trypsin,
    /// K/R 之后，后接 P 时一律不切
    TrypsinStrict,
    /// K 之后
    LysC,
    /// R 之后
    ArgC,
    /// E 之后
    GluC,
    /// D 之前
    AspN,
}

impl CleavageRule {
    pub const ALL: [CleavageRule; 6] = [
        CleavageRule::Trypsin,
        CleavageRule::TrypsinStrict,
        CleavageRule::LysC,
        CleavageRule::ArgC,
        CleavageRule::GluC,
        CleavageRule::AspN,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CleavageRule::Trypsin => "trypsin",
            CleavageRule::TrypsinStrict => "trypsin-strict",
            CleavageRule::LysC => "lys-c",
            CleavageRule::ArgC => "arg-c",
            CleavageRule::GluC => "glu-c",
            CleavageRule::AspN => "asp-n",
        }
    }

    #[inline]
    fn cuts_at(self, seq: &[u8], p: usize) -> bool {
        let prev = seq[p - 1];
        let next = seq[p];
        match self {
            CleavageRule::TrypsinStrict => matches!(prev, b'K' | b'R') && next != b'P',
            CleavageRule::Trypsin => {
                if !matches!(prev, b'K' | b'R') {
                    return false;
                }
                if next != b'P' {
                    return true;
                }
                let before = if p >= 2 { seq[p - 2] } else { 0 };
                (prev == b'K' && before == b'W') || (prev == b'R' && before == b'M')
            }
            CleavageRule::LysC => prev == b'K',
            CleavageRule::ArgC => prev == b'R',
            CleavageRule::GluC => prev == b'E',
            CleavageRule::AspN => next == b'D',
        }
    }

    /// 返回所有内部切点（升序）
    pub fn cut_sites(self, seq: &[u8]) -> Vec<usize> {
        (1..seq.len()).filter(|&p| self.cuts_at(seq, p)).collect()
    }
}

impl fmt::Display for CleavageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CleavageRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        CleavageRule::ALL
            .iter()
            .copied()
            .find(|r| r.name() == key)
            .ok_or_else(|| {
                let names: Vec<&str> = CleavageRule::ALL.iter().map(|r| r.name()).collect();
                format!("unknown cleavage rule '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
