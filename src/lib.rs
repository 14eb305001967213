//! # entrap-rust
//!
//! 蛋白质组学 entrapment 数据库构建工具。
//!
//! 给定一个宿主（host）蛋白 FASTA 和一个外源陷阱（trap）蛋白 FASTA，
//! 为每个宿主蛋白从陷阱库中选出氨基酸组成最接近的蛋白，并保证陷阱蛋白
//! 与宿主库不共享任何酶切肽段（I/L 视为相同）。结果可用于评估 FDR 控制。
//!
//! - **酶切**：trypsin 等规则，支持漏切与长度过滤
//! - **污染过滤**：剔除与宿主共享肽段的陷阱蛋白
//! - **最近邻匹配**：20 维组成向量上的欧氏距离，穷举且结果确定
//! - **QC**：蛋白 / 肽段级理化特征（pI、GRAVY 等）
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use entrap_rust::entrap::{self, EntrapOpt};
//!
//! let summary = entrap::run("host.fasta", "trap.fasta", "out", &EntrapOpt::default())?;
//! println!("selected {} unique trap proteins", summary.n_unique_traps_selected);
//! # Ok::<(), entrap_rust::error::EntrapError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA 读写
//! - [`protein`] — 蛋白记录与数据库
//! - [`feature`] — 组成向量与 QC 特征
//! - [`digest`] — 酶切规则与肽段生成
//! - [`entrap`] — 过滤、匹配、拼接与输出
//! - [`util`] — 氨基酸编码工具

pub mod error;
pub mod io;
pub mod util;
pub mod protein;
pub mod feature;
pub mod digest;
pub mod entrap;
