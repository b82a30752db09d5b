//! # 空间群旋转搜索
//!
//! 枚举保持晶格度规的整数旋转矩阵，再用原子映射（含分数平移搜索）
//! 筛选出晶体的空间群旋转部分。磁矩不同的同种原子按不同物种处理。
//!
//! ## 算法概述
//! 1. 候选矩阵：元素取值 {-1, 0, 1}，行列式 ±1
//! 2. 度规检验：W·G·Wᵀ = G
//! 3. 原子映射：存在平移 t 使 W·r + t 将修饰原子集映回自身
//!
//! ## 参考
//! - spglib 的旋转搜索思路（约化晶格下候选元素范围 [-1, 1]）
//!
//! ## 依赖关系
//! - 被 `symmetry/sphere.rs` 和 `symmetry/mesh.rs` 调用
//! - 使用 `models/structure.rs` 的 Crystal

use crate::models::Crystal;

/// 磁矩相等判据 (μB)
const MAGMOM_TOL: f64 = 1e-4;

/// 搜索晶体的空间群旋转部分
///
/// `magmom` 给定时，磁矩不同的原子视为不同物种；`symprec` 为
/// 原子位置匹配的笛卡尔距离容差 (Å)。无原子时返回纯晶格点群。
pub fn find_rotations(
    crystal: &Crystal,
    magmom: Option<&[f64]>,
    symprec: f64,
) -> Vec<[[i32; 3]; 3]> {
    let g = crystal.lattice.metric();

    // 度规容差取相对值，与原子位置容差解耦
    let g_max = g
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &x| acc.max(x.abs()));
    let metric_tol = 1e-5 * g_max.max(1.0);

    let mut rotations = Vec::new();

    for index in 0..19683 {
        let w = decode_candidate(index);

        if det3_i32(&w).abs() != 1 {
            continue;
        }
        if !preserves_metric(&w, &g, metric_tol) {
            continue;
        }
        if crystal.atoms.is_empty() || maps_atoms(crystal, magmom, &w, symprec) {
            rotations.push(w);
        }
    }

    rotations
}

/// 以 3 进制展开枚举元素取值 {-1, 0, 1} 的候选矩阵
fn decode_candidate(mut index: usize) -> [[i32; 3]; 3] {
    let mut w = [[0i32; 3]; 3];
    for row in &mut w {
        for entry in row.iter_mut() {
            *entry = (index % 3) as i32 - 1;
            index /= 3;
        }
    }
    w
}

/// 3x3 整数矩阵行列式
fn det3_i32(m: &[[i32; 3]; 3]) -> i32 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 检验 W·G·Wᵀ = G
fn preserves_metric(w: &[[i32; 3]; 3], g: &[[f64; 3]; 3], tol: f64) -> bool {
    for i in 0..3 {
        for j in 0..3 {
            let mut entry = 0.0;
            for k in 0..3 {
                for l in 0..3 {
                    entry += w[i][k] as f64 * g[k][l] * w[j][l] as f64;
                }
            }
            if (entry - g[i][j]).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// 整数旋转作用于分数坐标
fn apply_rotation(w: &[[i32; 3]; 3], r: &[f64; 3]) -> [f64; 3] {
    [
        w[0][0] as f64 * r[0] + w[0][1] as f64 * r[1] + w[0][2] as f64 * r[2],
        w[1][0] as f64 * r[0] + w[1][1] as f64 * r[1] + w[1][2] as f64 * r[2],
        w[2][0] as f64 * r[0] + w[2][1] as f64 * r[1] + w[2][2] as f64 * r[2],
    ]
}

/// 两个原子是否同物种（元素相同，给定磁矩时磁矩也相同）
fn same_species(crystal: &Crystal, magmom: Option<&[f64]>, i: usize, j: usize) -> bool {
    if crystal.atoms[i].element != crystal.atoms[j].element {
        return false;
    }
    match magmom {
        Some(m) if i < m.len() && j < m.len() => (m[i] - m[j]).abs() < MAGMOM_TOL,
        _ => true,
    }
}

/// 周期性边界下两分数坐标的笛卡尔距离
fn periodic_distance(crystal: &Crystal, a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let mut delta = [0.0; 3];
    for i in 0..3 {
        let mut d = a[i] - b[i];
        d -= d.round();
        delta[i] = d;
    }
    let cart = crystal.lattice.frac_to_cart(&delta);
    (cart[0] * cart[0] + cart[1] * cart[1] + cart[2] * cart[2]).sqrt()
}

/// 是否存在平移 t 使 (W, t) 将原子集映回自身
fn maps_atoms(crystal: &Crystal, magmom: Option<&[f64]>, w: &[[i32; 3]; 3], symprec: f64) -> bool {
    // 锚点取原子数最少的物种，减少候选平移数
    let natoms = crystal.atoms.len();
    let mut anchor = 0;
    let mut anchor_count = usize::MAX;
    for i in 0..natoms {
        let count = (0..natoms)
            .filter(|&j| same_species(crystal, magmom, i, j))
            .count();
        if count < anchor_count {
            anchor_count = count;
            anchor = i;
        }
    }

    let rotated_anchor = apply_rotation(w, &crystal.atoms[anchor].position);

    for target in 0..natoms {
        if !same_species(crystal, magmom, anchor, target) {
            continue;
        }
        let t = [
            crystal.atoms[target].position[0] - rotated_anchor[0],
            crystal.atoms[target].position[1] - rotated_anchor[1],
            crystal.atoms[target].position[2] - rotated_anchor[2],
        ];

        let all_mapped = (0..natoms).all(|i| {
            let rotated = apply_rotation(w, &crystal.atoms[i].position);
            let mapped = [rotated[0] + t[0], rotated[1] + t[1], rotated[2] + t[2]];
            (0..natoms).any(|j| {
                same_species(crystal, magmom, i, j)
                    && periodic_distance(crystal, &mapped, &crystal.atoms[j].position) < symprec
            })
        });

        if all_mapped {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    const SYMPREC: f64 = 1e-5;

    #[test]
    fn test_cubic_point_group() {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new("X", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0])]);

        let rotations = find_rotations(&crystal, None, SYMPREC);
        assert_eq!(rotations.len(), 48);
    }

    #[test]
    fn test_tetragonal_point_group() {
        let lattice = Lattice::from_parameters(4.0, 4.0, 6.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new("X", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0])]);

        let rotations = find_rotations(&crystal, None, SYMPREC);
        assert_eq!(rotations.len(), 16);
    }

    #[test]
    fn test_decoration_breaks_cubic_symmetry() {
        // 沿 x 轴的双原子修饰：立方点群退化为绕 x 轴的 16 个操作
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new(
            "X2",
            lattice,
            vec![
                Atom::new("X", [0.0, 0.0, 0.0]),
                Atom::new("X", [0.3, 0.0, 0.0]),
            ],
        );

        let rotations = find_rotations(&crystal, None, SYMPREC);
        assert_eq!(rotations.len(), 16);
    }

    #[test]
    fn test_identity_always_present() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 90.0, 95.0, 103.0);
        let crystal = Crystal::new("X", lattice, vec![Atom::new("X", [0.1, 0.2, 0.3])]);

        let rotations = find_rotations(&crystal, None, SYMPREC);
        let identity = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        assert!(rotations.contains(&identity));
    }

    #[test]
    fn test_magmom_keeps_compatible_rotations() {
        // 反铁磁 CsCl 型修饰：角原子与体心原子磁矩相反，
        // 纯点群旋转（t = 0）仍全部保留
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new(
            "X2",
            lattice,
            vec![
                Atom::new("X", [0.0, 0.0, 0.0]),
                Atom::new("X", [0.5, 0.5, 0.5]),
            ],
        );

        let rotations = find_rotations(&crystal, Some(&[1.0, -1.0]), SYMPREC);
        assert_eq!(rotations.len(), 48);
    }
}
