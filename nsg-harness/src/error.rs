use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("could not open {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{path:?} is empty")]
    EmptyFile { path: PathBuf },
    #[error("{path:?}: invalid record header {header}")]
    InvalidHeader { path: PathBuf, header: i32 },
    #[error("{path:?}: record {record} has header {found}, expected {expected}")]
    MalformedRecord {
        path: PathBuf,
        record: usize,
        expected: i32,
        found: i32,
    },
    #[error("{path:?}: invalid graph: {reason}")]
    InvalidGraph { path: PathBuf, reason: String },
    #[error("graph has {nodes} nodes but there are {points} base vectors")]
    GraphSizeMismatch { nodes: usize, points: usize },
    #[error("base vectors have dimension {base}, query vectors have dimension {query}")]
    DimensionMismatch { base: usize, query: usize },
    #[error("{queries} queries but {groundtruth} groundtruth entries")]
    QueryCountMismatch { queries: usize, groundtruth: usize },
    #[error("search_L cannot be smaller than search_K! (search_L: {search_l}, search_K: {k})")]
    SearchListTooSmall { search_l: usize, k: usize },
}

pub type Result<T> = std::result::Result<T, HarnessError>;
