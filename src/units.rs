//! # 单位换算常数
//!
//! 插值内核使用原子单位制 (Hartree / Bohr)，而能带结构容器使用
//! DFT 代码惯用的 eV / Å。换算在编排层进出内核处完成。
//!
//! ## 依赖关系
//! - 被 `interpolate/interpolater.rs` 使用

/// 1 Å 对应的 Bohr 数
pub const ANGSTROM: f64 = 1.889_726_124_625_770_2;

/// 1 eV 对应的 Hartree 数
pub const EV: f64 = 0.036_749_322_175_655;
