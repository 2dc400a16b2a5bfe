use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpError {
    #[error("{op}: shape mismatch for '{arg}': expected {expected}, got {got}")]
    ShapeMismatch {
        op: String,
        arg: String,
        expected: String,
        got: String,
    },
    #[error("{op}: type mismatch for '{arg}': expected {expected}, got {got}")]
    TypeMismatch {
        op: String,
        arg: String,
        expected: String,
        got: String,
    },
    #[error("{op}: unsupported dtype: {reason}")]
    UnsupportedDType { op: String, reason: String },
    #[error("{op}: unsupported storage type {stype} for '{arg}'")]
    UnsupportedStorage {
        op: String,
        arg: String,
        stype: String,
    },
    #[error("{op}: unsupported write mode {req}")]
    UnsupportedWriteMode { op: String, req: String },
    #[error("{op}: expected {expected} {what}, got {got}")]
    ArityMismatch {
        op: String,
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("invalid parameter '{key}': {reason}")]
    InvalidParam { key: String, reason: String },
    #[error("missing required parameter: {0}")]
    MissingParam(String),
    #[error("missing resource: {0}")]
    MissingResource(String),
    #[error("tensor error: {0}")]
    Tensor(#[from] dfx_tensor::TensorError),
}

pub type Result<T> = std::result::Result<T, OpError>;
