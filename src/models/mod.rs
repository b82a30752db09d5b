//! # 数据模型模块
//!
//! 定义晶体结构与能带结构数据模型。
//!
//! ## 依赖关系
//! - 被 `symmetry/` 和 `interpolate/` 使用
//! - 子模块: structure, bandstructure

pub mod bandstructure;
pub mod structure;

pub use bandstructure::{BandStructure, Spin};
pub use structure::{Atom, Crystal, Lattice};
