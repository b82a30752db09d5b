//! # Fourband - 能带傅里叶插值工具库
//!
//! 将 DFT 计算得到的粗糙 k 点网格上的能带本征值，通过星函数
//! (Shankland-Koelling-Wood) 傅里叶插值展开到更密的倒空间网格上，
//! 为费米面与输运性质计算提供输入。
//!
//! ## 工作流程
//! 1. 由晶体结构求倒格矢等价类（对称性轨道）
//! 2. 按自旋通道拟合傅里叶系数（数据点处严格插值）
//! 3. 在密网格上并行求值，按能量窗口筛选能带
//! 4. 估计费米能级，k 点正则排序，组装新的能带结构
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── models/       (晶体结构与能带结构数据模型)
//!   ├── symmetry/     (对称操作、等价类、不可约网格)
//!   ├── interpolate/  (星函数拟合与插值编排)
//!   ├── units.rs      (单位换算常数)
//!   ├── utils/        (工具函数)
//!   └── error.rs      (错误处理)
//! ```

pub mod error;
pub mod interpolate;
pub mod models;
pub mod symmetry;
pub mod units;
pub mod utils;

pub use error::{FourbandError, Result};
pub use interpolate::{DftData, Interpolater, MomentumMatrix};
pub use models::{Atom, BandStructure, Crystal, Lattice, Spin};
