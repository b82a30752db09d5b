//! # 对称性分析模块
//!
//! 提供空间群旋转搜索、倒格矢等价类与不可约 k 点网格计算。
//!
//! ## 子模块
//! - `operations`: 整数旋转矩阵搜索（度规保持 + 原子映射）
//! - `sphere`: 球内格点枚举与对称性轨道分组
//! - `mesh`: 不可约倒空间网格及有符号网格地址
//!
//! ## 依赖关系
//! - 被 `interpolate/interpolater.rs` 使用
//! - 使用 `models/structure.rs`

pub mod mesh;
pub mod operations;
pub mod sphere;

pub use mesh::ir_reciprocal_mesh;
pub use operations::find_rotations;
pub use sphere::{get_equivalences, mesh_dimensions};
