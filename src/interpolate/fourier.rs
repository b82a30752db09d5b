//! # 星函数拟合与能带求值
//!
//! 实现 Shankland-Koelling-Wood 傅里叶插值：星函数在数据 k 点处
//! 严格插值，其余自由度由粗糙度泛函 (1 - 0.75x²)² + 0.75x⁶ 正则化，
//! 通过拉格朗日乘子线性方程组求解。密网格求值按 k 点数据并行。
//!
//! ## 参考
//! - Shankland (1971), Koelling & Wood (1986) 展开式
//! - BoltzTraP 系列程序的粗糙度泛函取值 c1 = c2 = 0.75
//!
//! ## 依赖关系
//! - 被 `interpolate/interpolater.rs` 调用
//! - 使用 `interpolate/data.rs` 的 DftData
//! - 使用 `rayon` 进行并行求值

use crate::error::{FourbandError, Result};
use crate::interpolate::data::DftData;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::f64::consts::PI;

/// 粗糙度泛函系数
const C1: f64 = 0.75;
const C2: f64 = 0.75;

/// 计算单个 k 点处所有星函数的值
///
/// S_m(k) = (1/|orbit_m|) Σ_R cos(2π k·R)。轨道对反演封闭时虚部
/// 严格抵消，星函数为实值。
pub fn star_values(equivalences: &[Vec<[i32; 3]>], kpoint: &[f64; 3]) -> Vec<f64> {
    equivalences
        .iter()
        .map(|class| {
            let sum: f64 = class
                .iter()
                .map(|r| {
                    let phase = 2.0
                        * PI
                        * (kpoint[0] * r[0] as f64
                            + kpoint[1] * r[1] as f64
                            + kpoint[2] * r[2] as f64);
                    phase.cos()
                })
                .sum();
            sum / class.len() as f64
        })
        .collect()
}

/// 拟合各能带的星函数展开系数
///
/// 返回形状 [n_bands, n_classes] 的系数数组。零星（零向量类）
/// 系数由数据点处的严格插值条件确定，其余系数最小化粗糙度。
pub fn fit_coefficients(data: &DftData, equivalences: &[Vec<[i32; 3]>]) -> Result<Vec<Vec<f64>>> {
    let nk = data.kpoints.len();
    let nclasses = equivalences.len();

    if nk == 0 {
        return Err(FourbandError::InvalidArgument(
            "cannot fit coefficients without k-points".to_string(),
        ));
    }
    for band in &data.ebands {
        if band.len() != nk {
            return Err(FourbandError::DimensionMismatch {
                expected: nk,
                actual: band.len(),
            });
        }
    }
    if nclasses < nk {
        return Err(FourbandError::FitFailed(format!(
            "{} equivalence classes cannot interpolate {} k-points",
            nclasses, nk
        )));
    }

    let zero_idx = equivalences
        .iter()
        .position(|class| class.contains(&[0, 0, 0]))
        .ok_or_else(|| {
            FourbandError::FitFailed("equivalences do not contain the zero vector".to_string())
        })?;

    let rho = roughness(data.get_lattvec(), equivalences, zero_idx);

    // 星函数矩阵 S[i][m] 与参考点（最后一个 k 点）差分 Δ[i][m]
    let s: Vec<Vec<f64>> = data
        .kpoints
        .iter()
        .map(|k| star_values(equivalences, k))
        .collect();
    let n = nk - 1;
    let delta: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..nclasses).map(|m| s[i][m] - s[n][m]).collect())
        .collect();

    // 拉格朗日乘子方程组 H·λ = e - e_ref，对所有能带共用
    let mut h = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut entry = 0.0;
            for m in 0..nclasses {
                if m != zero_idx {
                    entry += delta[i][m] * delta[j][m] / rho[m];
                }
            }
            h[i][j] = entry;
            h[j][i] = entry;
        }
    }

    let mut coefficients = Vec::with_capacity(data.ebands.len());
    for band in &data.ebands {
        let rhs: Vec<f64> = (0..n).map(|i| band[i] - band[n]).collect();
        let lambda = solve_linear(h.clone(), rhs)?;

        let mut coeffs = vec![0.0; nclasses];
        for m in 0..nclasses {
            if m == zero_idx {
                continue;
            }
            let mut c = 0.0;
            for i in 0..n {
                c += lambda[i] * delta[i][m];
            }
            coeffs[m] = c / rho[m];
        }

        // 零星系数固定参考点处的严格插值
        let mut tail = 0.0;
        for m in 0..nclasses {
            if m != zero_idx {
                tail += coeffs[m] * s[n][m];
            }
        }
        coeffs[zero_idx] = band[n] - tail;

        coefficients.push(coeffs);
    }

    Ok(coefficients)
}

/// 在给定 k 点处并行求值各能带能量
///
/// 返回形状 [n_bands, n_kpoints]，列序与输入 k 点一致（按网格
/// 索引确定性拼接，与线程完成顺序无关）。
pub fn bands_at(
    equivalences: &[Vec<[i32; 3]>],
    coefficients: &[Vec<f64>],
    kpoints: &[[f64; 3]],
    nworkers: usize,
) -> Result<Vec<Vec<f64>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nworkers)
        .build()
        .map_err(|e| FourbandError::Other(format!("Failed to build thread pool: {}", e)))?;

    let per_kpoint: Vec<Vec<f64>> = pool.install(|| {
        kpoints
            .par_iter()
            .map(|k| {
                let stars = star_values(equivalences, k);
                coefficients
                    .iter()
                    .map(|coeffs| {
                        coeffs
                            .iter()
                            .zip(stars.iter())
                            .map(|(c, s)| c * s)
                            .sum::<f64>()
                    })
                    .collect()
            })
            .collect()
    });

    // 转置为 [能带, k 点]
    let nbands = coefficients.len();
    let mut energies = vec![vec![0.0; kpoints.len()]; nbands];
    for (ik, values) in per_kpoint.iter().enumerate() {
        for (ib, &value) in values.iter().enumerate() {
            energies[ib][ik] = value;
        }
    }

    Ok(energies)
}

/// 生成内核内部顺序（符号优先字典序）的密网格 k 点
pub fn mesh_kpoints(mesh: [usize; 3]) -> Vec<[f64; 3]> {
    let half = [
        (mesh[0] as i64) / 2,
        (mesh[1] as i64) / 2,
        (mesh[2] as i64) / 2,
    ];
    let mut kpoints = Vec::with_capacity(mesh[0] * mesh[1] * mesh[2]);
    for n0 in -half[0]..=half[0] {
        for n1 in -half[1]..=half[1] {
            for n2 in -half[2]..=half[2] {
                kpoints.push([
                    n0 as f64 / mesh[0] as f64,
                    n1 as f64 / mesh[1] as f64,
                    n2 as f64 / mesh[2] as f64,
                ]);
            }
        }
    }
    kpoints.sort_by(sign_first_order);
    kpoints
}

/// 符号优先字典序：(x<0, x, y<0, y, z<0, z)
///
/// 内核生成网格时使用的顺序，非负分量排在负分量之前。
pub(crate) fn sign_first_order(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    for i in 0..3 {
        let order = (a[i] < 0.0)
            .cmp(&(b[i] < 0.0))
            .then(a[i].partial_cmp(&b[i]).unwrap_or(Ordering::Equal));
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

/// 普通字典序 (x, y, z)，对外可见的正则顺序
pub(crate) fn lexicographic_order(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    for i in 0..3 {
        let order = a[i].partial_cmp(&b[i]).unwrap_or(Ordering::Equal);
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

/// 各星的粗糙度 ρ_m = (1 - c1·x²)² + c2·x⁶，x = |R_m|/|R_min|
fn roughness(
    lattice: &[[f64; 3]; 3],
    equivalences: &[Vec<[i32; 3]>],
    zero_idx: usize,
) -> Vec<f64> {
    let norms: Vec<f64> = equivalences
        .iter()
        .map(|class| cart_norm(lattice, &class[0]))
        .collect();
    let r_min = norms
        .iter()
        .enumerate()
        .filter(|&(m, _)| m != zero_idx)
        .map(|(_, &norm)| norm)
        .fold(f64::INFINITY, f64::min);

    norms
        .iter()
        .enumerate()
        .map(|(m, &norm)| {
            if m == zero_idx {
                1.0
            } else {
                let x2 = (norm / r_min).powi(2);
                let base = 1.0 - C1 * x2;
                base * base + C2 * x2.powi(3)
            }
        })
        .collect()
}

fn cart_norm(lattice: &[[f64; 3]; 3], n: &[i32; 3]) -> f64 {
    let frac = [n[0] as f64, n[1] as f64, n[2] as f64];
    let mut cart = [0.0; 3];
    for i in 0..3 {
        cart[i] = frac[0] * lattice[0][i] + frac[1] * lattice[1][i] + frac[2] * lattice[2][i];
    }
    (cart[0] * cart[0] + cart[1] * cart[1] + cart[2] * cart[2]).sqrt()
}

/// 列主元高斯消元求解 A·x = b
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &x| acc.max(x.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 * scale {
            return Err(FourbandError::FitFailed(
                "singular interpolation system (duplicate k-points?)".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}
