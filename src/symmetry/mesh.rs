//! # 不可约倒空间网格
//!
//! 对给定网格尺寸生成有符号网格地址（spglib 约定），并用倒空间
//! 旋转（旋转矩阵转置）加时间反演求每个网格点所属轨道的最小
//! 平铺索引，得到不可约-完整网格映射。
//!
//! ## 依赖关系
//! - 被 `interpolate/interpolater.rs` 调用
//! - 使用 `symmetry/operations.rs` 搜索旋转
//! - 使用 `models/structure.rs` 的 Crystal

use crate::models::Crystal;
use crate::symmetry::operations;

/// 计算不可约倒空间网格
///
/// 返回 `(mapping, grid)`：`grid` 为全部网格点的有符号整数地址
/// （x 分量变化最快），`mapping[i]` 为第 i 个网格点轨道代表元的
/// 平铺索引。`symprec` 为原子位置匹配容差 (Å)。
pub fn ir_reciprocal_mesh(
    mesh: [usize; 3],
    crystal: &Crystal,
    symprec: f64,
) -> (Vec<usize>, Vec<[i64; 3]>) {
    let rotations = operations::find_rotations(crystal, None, symprec);

    // 倒空间旋转集 = 实空间旋转集的转置（群对求逆封闭）
    let recip_rotations: Vec<[[i32; 3]; 3]> = rotations.iter().map(transpose).collect();

    let m = [mesh[0] as i64, mesh[1] as i64, mesh[2] as i64];
    let mut grid = Vec::with_capacity(mesh[0] * mesh[1] * mesh[2]);
    for iz in 0..m[2] {
        for iy in 0..m[1] {
            for ix in 0..m[0] {
                grid.push([signed(ix, m[0]), signed(iy, m[1]), signed(iz, m[2])]);
            }
        }
    }

    let mapping = grid
        .iter()
        .map(|address| {
            let mut representative = flat_index(address, &m);
            for w in &recip_rotations {
                let rotated = rotate_address(w, address);
                representative = representative.min(flat_index(&rotated, &m));
                // 时间反演：k 与 -k 等价
                let negated = [-rotated[0], -rotated[1], -rotated[2]];
                representative = representative.min(flat_index(&negated, &m));
            }
            representative
        })
        .collect();

    (mapping, grid)
}

/// 无符号网格索引转有符号地址：大于 m/2 的分量回绕为负
fn signed(i: i64, m: i64) -> i64 {
    if i <= m / 2 {
        i
    } else {
        i - m
    }
}

/// 有符号地址的平铺索引（与生成顺序一致）
fn flat_index(address: &[i64; 3], m: &[i64; 3]) -> usize {
    let ix = address[0].rem_euclid(m[0]);
    let iy = address[1].rem_euclid(m[1]);
    let iz = address[2].rem_euclid(m[2]);
    (ix + m[0] * (iy + m[1] * iz)) as usize
}

fn transpose(w: &[[i32; 3]; 3]) -> [[i32; 3]; 3] {
    let mut t = [[0i32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            t[i][j] = w[j][i];
        }
    }
    t
}

fn rotate_address(w: &[[i32; 3]; 3], n: &[i64; 3]) -> [i64; 3] {
    [
        w[0][0] as i64 * n[0] + w[0][1] as i64 * n[1] + w[0][2] as i64 * n[2],
        w[1][0] as i64 * n[0] + w[1][1] as i64 * n[1] + w[1][2] as i64 * n[2],
        w[2][0] as i64 * n[0] + w[2][1] as i64 * n[1] + w[2][2] as i64 * n[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};
    use std::collections::BTreeSet;

    fn cubic_crystal() -> Crystal {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        Crystal::new("X", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0])])
    }

    #[test]
    fn test_grid_covers_signed_range() {
        let crystal = cubic_crystal();
        let (mapping, grid) = ir_reciprocal_mesh([3, 3, 3], &crystal, 0.1);

        assert_eq!(grid.len(), 27);
        assert_eq!(mapping.len(), 27);
        for address in &grid {
            for &component in address {
                assert!((-1..=1).contains(&component));
            }
        }
    }

    #[test]
    fn test_cubic_3x3x3_has_four_orbits() {
        let crystal = cubic_crystal();
        let (mapping, _) = ir_reciprocal_mesh([3, 3, 3], &crystal, 0.1);

        // 立方对称下的轨道：原点、面心型 (100)、棱型 (110)、角型 (111)
        let representatives: BTreeSet<usize> = mapping.iter().copied().collect();
        assert_eq!(representatives.len(), 4);
    }

    #[test]
    fn test_mapping_points_to_smaller_index() {
        let crystal = cubic_crystal();
        let (mapping, _) = ir_reciprocal_mesh([5, 5, 5], &crystal, 0.1);

        for (i, &rep) in mapping.iter().enumerate() {
            assert!(rep <= i);
            // 代表元自身映射到自身
            assert_eq!(mapping[rep], rep);
        }
    }

    #[test]
    fn test_anisotropic_mesh_shape() {
        let crystal = cubic_crystal();
        let (_, grid) = ir_reciprocal_mesh([7, 5, 3], &crystal, 0.1);

        assert_eq!(grid.len(), 7 * 5 * 3);
        // x 分量变化最快
        assert_eq!(grid[0], [0, 0, 0]);
        assert_eq!(grid[1], [1, 0, 0]);
    }
}
