//! # 统一错误处理模块
//!
//! 定义 Fourband 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 使用 `models/bandstructure.rs` 的 Spin（错误信息中标注自旋通道）

use crate::models::Spin;
use thiserror::Error;

/// Fourband 统一错误类型
#[derive(Error, Debug)]
pub enum FourbandError {
    // ─────────────────────────────────────────────────────────────
    // 能带筛选错误
    // ─────────────────────────────────────────────────────────────
    #[error("No bands with energies inside the interpolation window for spin {spin}")]
    NoBandsInWindow { spin: Spin },

    #[error("Band structure has no {edge} around the Fermi level")]
    BandEdgeNotFound { edge: String },

    // ─────────────────────────────────────────────────────────────
    // 数值错误
    // ─────────────────────────────────────────────────────────────
    #[error("Fourier fit failed: {0}")]
    FitFailed(String),

    #[error("Energy array has {actual} columns but {expected} k-points were given")]
    DimensionMismatch { expected: usize, actual: usize },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, FourbandError>;
