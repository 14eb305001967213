//! 序列特征：氨基酸组成向量（用于最近邻匹配）与 QC 描述性特征。

pub mod composition;
pub mod qc;
