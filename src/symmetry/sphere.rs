//! # 倒格矢等价类
//!
//! 在逐步增大的球内枚举实空间格点，并按空间群旋转（可选时间反演）
//! 分组为对称性轨道。轨道总点数达到目标 k 点数后返回，供星函数
//! 拟合与插值网格尺寸推导使用。
//!
//! ## 依赖关系
//! - 被 `interpolate/interpolater.rs` 调用
//! - 使用 `symmetry/operations.rs` 搜索旋转
//! - 使用 `models/structure.rs` 的 Crystal

use crate::error::{FourbandError, Result};
use crate::models::Crystal;
use crate::symmetry::operations;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// 旋转搜索使用的原子位置容差 (Å)
const SYMPREC: f64 = 1e-5;

/// 球半径增长因子与迭代上限
const GROWTH: f64 = 1.3;
const MAX_ITER: usize = 60;

/// 计算倒格矢等价类
///
/// 返回的每个内层向量是一条对称性轨道（整数格点集合），按轨道
/// 半径升序排列，零向量自成第一类。等价类个数不少于 `nkpt`
/// 且至少为 2——星函数个数须不小于数据 k 点数，拟合才适定。
/// `time_reversal` 控制是否用 -W 扩充旋转集（自旋轨道耦合
/// 计算应关闭）。
pub fn get_equivalences(
    crystal: &Crystal,
    magmom: Option<&[f64]>,
    nkpt: f64,
    time_reversal: bool,
) -> Result<Vec<Vec<[i32; 3]>>> {
    let mut rotations: BTreeSet<[[i32; 3]; 3]> =
        operations::find_rotations(crystal, magmom, SYMPREC)
            .into_iter()
            .collect();
    if time_reversal {
        let negated: Vec<_> = rotations.iter().map(negate).collect();
        rotations.extend(negated);
    }
    let rotations: Vec<[[i32; 3]; 3]> = rotations.into_iter().collect();

    let target = nkpt.max(1.0);
    let volume = crystal.lattice.volume().abs();
    // 每条轨道约含 nsym 个格点，按此估计初始球体积
    let mut radius =
        (3.0 * target * rotations.len() as f64 * volume / (4.0 * PI)).cbrt();

    for _ in 0..MAX_ITER {
        let points = lattice_points_in_sphere(crystal, radius);
        let classes = group_into_orbits(crystal, &points, &rotations);

        if classes.len() as f64 >= target && classes.len() >= 2 {
            return Ok(classes);
        }
        radius *= GROWTH;
    }

    Err(FourbandError::Other(format!(
        "Equivalence sphere search did not converge for nkpt = {}",
        nkpt
    )))
}

/// 由等价类推导插值网格尺寸：逐分量 2·max|R_i| + 1
pub fn mesh_dimensions(equivalences: &[Vec<[i32; 3]>]) -> [usize; 3] {
    let mut max_abs = [0i32; 3];
    for class in equivalences {
        for vector in class {
            for i in 0..3 {
                max_abs[i] = max_abs[i].max(vector[i].abs());
            }
        }
    }
    [
        2 * max_abs[0] as usize + 1,
        2 * max_abs[1] as usize + 1,
        2 * max_abs[2] as usize + 1,
    ]
}

fn negate(w: &[[i32; 3]; 3]) -> [[i32; 3]; 3] {
    let mut n = *w;
    for row in &mut n {
        for entry in row.iter_mut() {
            *entry = -*entry;
        }
    }
    n
}

/// 枚举笛卡尔长度不超过 radius 的整数格点
///
/// 分量上界由倒格矢给出：|n_i| ≤ r·|b_i| / 2π。
fn lattice_points_in_sphere(crystal: &Crystal, radius: f64) -> Vec<[i32; 3]> {
    let recip = crystal.lattice.reciprocal();
    let mut bounds = [0i32; 3];
    for i in 0..3 {
        let b_norm = (recip[i][0] * recip[i][0]
            + recip[i][1] * recip[i][1]
            + recip[i][2] * recip[i][2])
            .sqrt();
        bounds[i] = (radius * b_norm / (2.0 * PI)).floor() as i32 + 1;
    }

    let mut points = Vec::new();
    for n0 in -bounds[0]..=bounds[0] {
        for n1 in -bounds[1]..=bounds[1] {
            for n2 in -bounds[2]..=bounds[2] {
                let frac = [n0 as f64, n1 as f64, n2 as f64];
                let cart = crystal.lattice.frac_to_cart(&frac);
                let norm = (cart[0] * cart[0] + cart[1] * cart[1] + cart[2] * cart[2]).sqrt();
                if norm <= radius + 1e-8 {
                    points.push([n0, n1, n2]);
                }
            }
        }
    }
    points
}

/// 按旋转集把格点分组为轨道，轨道按 (半径, 代表元) 升序
fn group_into_orbits(
    crystal: &Crystal,
    points: &[[i32; 3]],
    rotations: &[[[i32; 3]; 3]],
) -> Vec<Vec<[i32; 3]>> {
    let mut sorted: Vec<[i32; 3]> = points.to_vec();
    sorted.sort_by(|a, b| {
        let na = cart_norm(crystal, a);
        let nb = cart_norm(crystal, b);
        na.partial_cmp(&nb)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(b))
    });

    let mut visited: BTreeSet<[i32; 3]> = BTreeSet::new();
    let mut classes = Vec::new();

    for point in sorted {
        if visited.contains(&point) {
            continue;
        }
        let mut orbit: BTreeSet<[i32; 3]> = BTreeSet::new();
        for w in rotations {
            orbit.insert(rotate_int(w, &point));
        }
        visited.extend(orbit.iter());
        classes.push(orbit.into_iter().collect());
    }

    classes
}

fn cart_norm(crystal: &Crystal, n: &[i32; 3]) -> f64 {
    let cart = crystal
        .lattice
        .frac_to_cart(&[n[0] as f64, n[1] as f64, n[2] as f64]);
    (cart[0] * cart[0] + cart[1] * cart[1] + cart[2] * cart[2]).sqrt()
}

fn rotate_int(w: &[[i32; 3]; 3], n: &[i32; 3]) -> [i32; 3] {
    [
        w[0][0] * n[0] + w[0][1] * n[1] + w[0][2] * n[2],
        w[1][0] * n[0] + w[1][1] * n[1] + w[1][2] * n[2],
        w[2][0] * n[0] + w[2][1] * n[1] + w[2][2] * n[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn cubic_crystal() -> Crystal {
        let lattice = Lattice::from_parameters(1.0, 1.0, 1.0, 90.0, 90.0, 90.0);
        Crystal::new("X", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0])])
    }

    #[test]
    fn test_class_count_reaches_target() {
        let crystal = cubic_crystal();
        let classes = get_equivalences(&crystal, None, 10.0, true).unwrap();

        assert!(classes.len() >= 10);
        let total: usize = classes.iter().map(Vec::len).sum();
        assert!(total >= 10);
        assert_eq!(classes[0], vec![[0, 0, 0]]);
    }

    #[test]
    fn test_orbits_closed_under_rotations() {
        let crystal = cubic_crystal();
        let rotations = operations::find_rotations(&crystal, None, 1e-5);
        let classes = get_equivalences(&crystal, None, 20.0, true).unwrap();

        for class in &classes {
            for vector in class {
                for w in &rotations {
                    assert!(class.contains(&rotate_int(w, vector)));
                }
            }
        }
    }

    #[test]
    fn test_orbits_have_uniform_norm() {
        let crystal = cubic_crystal();
        let classes = get_equivalences(&crystal, Some(&[0.5]), 15.0, true).unwrap();

        for class in &classes {
            let norm = cart_norm(&crystal, &class[0]);
            for vector in class {
                assert!((cart_norm(&crystal, vector) - norm).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_cubic_shell_sizes() {
        let crystal = cubic_crystal();
        let classes = get_equivalences(&crystal, None, 10.0, true).unwrap();

        // 简单立方的前几个壳层：1, 6, 12, 8 个格点
        assert_eq!(classes[0].len(), 1);
        assert_eq!(classes[1].len(), 6);
        if classes.len() > 2 {
            assert_eq!(classes[2].len(), 12);
        }
    }

    #[test]
    fn test_mesh_dimensions_rule() {
        let equivalences = vec![
            vec![[0, 0, 0]],
            vec![[3, -2, 1], [-3, 2, -1]],
            vec![[1, 1, 0], [-1, -1, 0]],
        ];

        assert_eq!(mesh_dimensions(&equivalences), [7, 5, 3]);
    }
}
