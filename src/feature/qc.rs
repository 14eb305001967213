use super::composition::Composition;
use crate::util::aa;

// ── 疏水性标度 ────────────────────────────────────────

/// Kyte-Doolittle (1982) hydropathy，下标同 aa::to_index
const KYTE_DOOLITTLE: [f64; aa::SIGMA] = [
    1.8,  // A
    2.5,  // C
    -3.5, // D
    -3.5, // E
    2.8,  // F
    -0.4, // G
    -3.2, // H
    4.5,  // I
    -3.9, // K
    3.8,  // L
    1.9,  // M
    -3.5, // N
    -1.6, // P
    -3.5, // Q
    -4.5, // R
    -0.8, // S
    -0.7, // T
    4.2,  // V
    -0.9, // W
    -1.3, // Y
];

// ── pKa（Lehninger）──────────────────────────────────

const PKA_NTERM: f64 = 9.69;
const PKA_CTERM: f64 = 2.34;
const PKA_K: f64 = 10.5;
const PKA_R: f64 = 12.4;
const PKA_H: f64 = 6.04;
const PKA_D: f64 = 3.86;
const PKA_E: f64 = 4.25;
const PKA_C: f64 = 8.33;
const PKA_Y: f64 = 10.0;

const PI_PRECISION: f64 = 0.01;

/// 数据库 QC 用的描述性序列特征
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceFeatures {
    pub length: usize,
    /// K + R
    pub kr: u32,
    /// F + W + Y
    pub aromatic: u32,
    /// D + E
    pub acids: u32,
    /// A + I + L + M + V
    pub aliphatic: u32,
    /// G + P + H
    pub hgp: u32,
    pub isoelectric_point: f64,
    pub gravy: f64,
}

impl SequenceFeatures {
    pub const COLUMNS: [&'static str; 8] = [
        "length",
        "KR",
        "aromatic",
        "acids",
        "aliphatic",
        "HGP",
        "isoelectric_point",
        "gravy",
    ];

    pub fn compute(seq: &str) -> Self {
        let comp = Composition::from_seq(seq.as_bytes());
        let sum = |residues: &[u8]| residues.iter().map(|&r| comp.count(r)).sum::<u32>();
        Self {
            length: seq.len(),
            kr: sum(&b"KR"[..]),
            aromatic: sum(&b"FWY"[..]),
            acids: sum(&b"DE"[..]),
            aliphatic: sum(&b"AILMV"[..]),
            hgp: sum(&b"GPH"[..]),
            isoelectric_point: isoelectric_point_of(&comp),
            gravy: gravy_of(&comp),
        }
    }

    /// 以制表符分隔输出，列顺序同 [`Self::COLUMNS`]
    pub fn to_tsv_fields(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}",
            self.length,
            self.kr,
            self.aromatic,
            self.acids,
            self.aliphatic,
            self.hgp,
            self.isoelectric_point,
            self.gravy
        )
    }
}

/// 平均 Kyte-Doolittle 疏水性，仅统计标准氨基酸；没有标准残基时为 0.0
pub fn gravy(seq: &str) -> f64 {
    gravy_of(&Composition::from_seq(seq.as_bytes()))
}

fn gravy_of(comp: &Composition) -> f64 {
    let n = comp.total();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = comp
        .0
        .iter()
        .zip(KYTE_DOOLITTLE.iter())
        .map(|(&c, &h)| c as f64 * h)
        .sum();
    sum / n as f64
}

/// Henderson-Hasselbalch 净电荷
fn net_charge(comp: &Composition, ph: f64) -> f64 {
    let pos = |pka: f64| 1.0 / (1.0 + 10_f64.powf(ph - pka));
    let neg = |pka: f64| 1.0 / (1.0 + 10_f64.powf(pka - ph));

    let mut charge = pos(PKA_NTERM) - neg(PKA_CTERM);
    charge += comp.count(b'K') as f64 * pos(PKA_K);
    charge += comp.count(b'R') as f64 * pos(PKA_R);
    charge += comp.count(b'H') as f64 * pos(PKA_H);
    charge -= comp.count(b'D') as f64 * neg(PKA_D);
    charge -= comp.count(b'E') as f64 * neg(PKA_E);
    charge -= comp.count(b'C') as f64 * neg(PKA_C);
    charge -= comp.count(b'Y') as f64 * neg(PKA_Y);
    charge
}

/// 等电点：在 pH [0, 14] 上二分求净电荷零点，区间宽度小于 0.01 时停止
pub fn isoelectric_point(seq: &str) -> f64 {
    isoelectric_point_of(&Composition::from_seq(seq.as_bytes()))
}

fn isoelectric_point_of(comp: &Composition) -> f64 {
    let mut lo = 0.0_f64;
    let mut hi = 14.0_f64;
    while hi - lo > PI_PRECISION {
        let mid = (lo + hi) / 2.0;
        if net_charge(comp, mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}
