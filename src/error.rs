use thiserror::Error;

use crate::protein::DbType;

#[derive(Debug, Error)]
pub enum EntrapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// FASTA 格式错误，定位到来源与行号（1-based）
    #[error("malformed FASTA '{source_name}' line {line}: {message}")]
    FastaParse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("{db} FASTA '{source_name}' contains no sequences")]
    EmptyDatabase { db: DbType, source_name: String },

    #[error("duplicate identifier '{id}' in {db} database")]
    DuplicateId { db: DbType, id: String },

    /// 过滤后陷阱库为空，无法匹配
    #[error(
        "no eligible entrapment candidates: trap pool is empty ({removed} proteins removed for sharing peptides with the host database)"
    )]
    NoEligibleCandidates { removed: usize },

    #[error("invalid configuration: {field} - {message}")]
    Config { field: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type EntrapResult<T> = Result<T, EntrapError>;
