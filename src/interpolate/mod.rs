//! # 傅里叶插值模块
//!
//! 提供星函数拟合、密网格并行求值与插值编排。
//!
//! ## 子模块
//! - `data`: 插值内核的输入数据束 (原子单位制)
//! - `fourier`: 星函数、SKW 系数拟合与能带求值
//! - `interpolater`: 插值工作流编排
//!
//! ## 依赖关系
//! - 使用 `models/`、`symmetry/`、`units.rs`
//! - 使用 `rayon` + `num_cpus` 并行求值

pub mod data;
pub mod fourier;
pub mod interpolater;

pub use data::{DftData, MomentumMatrix};
pub use interpolater::Interpolater;
