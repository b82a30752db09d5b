//! # 插值输入数据束
//!
//! 按插值内核期望的原子单位制打包单个自旋通道的数据。每次
//! 插值调用按自旋新建一份，拟合完成即丢弃。
//!
//! ## 依赖关系
//! - 被 `interpolate/fourier.rs` 和 `interpolate/interpolater.rs` 使用

use serde::{Deserialize, Serialize};

/// 动量矩阵（能带导数），形状 [n_bands][n_kpoints]，每项为 3 维导数向量
pub type MomentumMatrix = Vec<Vec<[f64; 3]>>;

/// 单自旋通道的插值输入
///
/// 能量单位 Hartree，晶格矩阵单位 Bohr。晶格矩阵非奇异是调用方
/// 前置条件，不在此检查。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DftData {
    /// k 点分数坐标
    pub kpoints: Vec<[f64; 3]>,

    /// 能带能量 (Hartree)，形状 [n_bands, n_kpoints]
    pub ebands: Vec<Vec<f64>>,

    /// 晶格矩阵 (Bohr)
    pub lattice_matrix: [[f64; 3]; 3],

    /// 晶胞体积 (Bohr³)
    pub volume: f64,

    /// 可选的动量矩阵导数
    pub mommat: Option<MomentumMatrix>,
}

impl DftData {
    /// 打包单自旋通道的数据，体积取晶格行列式的绝对值
    ///
    /// `mommat` 仅随数据携带以保持接口一致，拟合不使用导数约束。
    pub fn new(
        kpoints: Vec<[f64; 3]>,
        ebands: Vec<Vec<f64>>,
        lattice_matrix: [[f64; 3]; 3],
        mommat: Option<MomentumMatrix>,
    ) -> Self {
        let volume = det3(&lattice_matrix).abs();
        DftData {
            kpoints,
            ebands,
            lattice_matrix,
            volume,
            mommat,
        }
    }

    /// 晶格矩阵访问器，插值内核约定的接口
    pub fn get_lattvec(&self) -> &[[f64; 3]; 3] {
        &self.lattice_matrix
    }
}

/// 3x3 矩阵行列式
fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_from_determinant() {
        let data = DftData::new(
            vec![[0.0, 0.0, 0.0]],
            vec![vec![0.0]],
            [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]],
            None,
        );

        assert!((data.volume - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_volume_is_absolute() {
        // 左手系晶格给出负行列式，体积仍为正
        let data = DftData::new(
            vec![],
            vec![],
            [[0.0, 2.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 2.0]],
            None,
        );

        assert!((data.volume - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_lattvec() {
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let data = DftData::new(vec![], vec![], m, None);

        assert_eq!(data.get_lattvec(), &m);
    }
}
