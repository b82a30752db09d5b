//! # 晶体结构数据模型
//!
//! 定义统一的晶体结构表示，供对称性搜索与插值使用。
//!
//! ## 依赖关系
//! - 被 `symmetry/` 和 `interpolate/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let alpha_rad = alpha.to_radians();
        let beta_rad = beta.to_radians();
        let gamma_rad = gamma.to_radians();

        // 计算晶格向量
        let cos_alpha = alpha_rad.cos();
        let cos_beta = beta_rad.cos();
        let cos_gamma = gamma_rad.cos();
        let sin_gamma = gamma_rad.sin();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();
        let c_vec = [c1, c2, c3];

        Lattice {
            matrix: [a_vec, b_vec, c_vec],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 计算度规张量 G = A·Aᵀ
    ///
    /// 整数旋转矩阵 W 是晶格对称操作当且仅当 W·G·Wᵀ = G。
    pub fn metric(&self) -> [[f64; 3]; 3] {
        let m = self.matrix;
        let mut g = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                g[i][j] = dot(&m[i], &m[j]);
            }
        }
        g
    }

    /// 计算倒格矢矩阵（行向量 b1, b2, b3，含 2π 因子）
    pub fn reciprocal(&self) -> [[f64; 3]; 3] {
        let m = self.matrix;
        let a = m[0];
        let b = m[1];
        let c = m[2];

        // 体积 V = a · (b × c)
        let b_cross_c = cross(&b, &c);
        let volume = dot(&a, &b_cross_c);

        if volume.abs() < 1e-10 {
            return [[0.0; 3]; 3];
        }

        // 倒格矢：b1 = 2π(b×c)/V, b2 = 2π(c×a)/V, b3 = 2π(a×b)/V
        let c_cross_a = cross(&c, &a);
        let a_cross_b = cross(&a, &b);
        let factor = 2.0 * PI / volume;

        [
            scale(&b_cross_c, factor),
            scale(&c_cross_a, factor),
            scale(&a_cross_b, factor),
        ]
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: &[f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }
}

/// 向量叉积
fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// 向量点积
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 向量数乘
fn scale(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表（分数坐标）
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let vol = lattice.volume().abs();

        // 5^3 = 125
        assert!((vol - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_metric_cubic() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let g = lattice.metric();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 16.0 } else { 0.0 };
                assert!((g[i][j] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_lattice_reciprocal_cubic() {
        let a = 2.0;
        let lattice = Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]);
        let recip = lattice.reciprocal();

        // |b_i| = 2π/a，且 b_i · a_j = 2π δ_ij
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 2.0 * PI / a } else { 0.0 };
                assert!((recip[i][j] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_lattice_hexagonal_volume() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let expected = 3.0 * 3.0 * 5.0 * (120.0_f64).to_radians().sin();

        assert!((lattice.volume().abs() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_frac_to_cart() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let cart = lattice.frac_to_cart(&[0.5, 0.25, 0.0]);

        assert!((cart[0] - 2.0).abs() < 1e-10);
        assert!((cart[1] - 1.0).abs() < 1e-10);
        assert!((cart[2]).abs() < 1e-10);
    }
}
