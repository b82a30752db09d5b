//! # 插值编排器
//!
//! 连接对称性分析与星函数内核的编排层：准备输入数组、委托
//! 拟合与求值、按能量窗口筛选能带、估计费米能级、正则排序
//! k 点并组装输出能带结构。
//!
//! ## 算法概述（单次 interpolate_bands 调用）
//! 1. 求倒格矢等价类，推导插值网格尺寸
//! 2. 逐自旋转换单位、拟合星函数系数
//! 3. 确定能量窗口并筛选能带
//! 4. 密网格并行求值，回到 eV
//! 5. 非金属时重算价带指标，费米能级取带隙中点
//! 6. 取不可约网格，两趟排序对齐并正则化 k 点顺序
//!
//! ## 依赖关系
//! - 使用 `symmetry/` 与 `interpolate/fourier.rs` 作为黑盒
//! - 使用 `utils/output.rs` 打印费米能级重定位提示
//! - 使用 `units.rs` 做 eV↔Hartree、Å↔Bohr 换算

use crate::error::{FourbandError, Result};
use crate::interpolate::data::{DftData, MomentumMatrix};
use crate::interpolate::fourier;
use crate::models::{BandStructure, Crystal, Spin};
use crate::symmetry::{mesh, sphere};
use crate::units;
use crate::utils::output;
use std::collections::BTreeMap;

/// 不可约网格使用的对称性容差 (Å)
const IR_MESH_SYMPREC: f64 = 0.1;

/// 能带结构插值器
///
/// 持有一份能带结构与物理元数据，`interpolate_bands` 在更密的
/// k 点网格上生成新的能带结构。中间量（系数、能带筛选）只存在
/// 于单次调用的局部变量中，调用间不保留状态。
pub struct Interpolater {
    band_structure: BandStructure,
    soc: bool,
    spins: Vec<Spin>,
    /// 晶格矩阵 (Bohr)
    lattice_matrix: [[f64; 3]; 3],
    kpoints: Vec<[f64; 3]>,
    magmom: Option<Vec<f64>>,
    mommat: Option<MomentumMatrix>,
    structure: Crystal,
}

impl Interpolater {
    /// 创建插值器
    ///
    /// `soc` 标记能带结构是否含自旋轨道耦合（关闭时间反演扩充）；
    /// `magmom` 为各原子磁矩；`mommat` 为可选的动量矩阵导数，
    /// 仅随数据携带以保持接口一致，拟合不使用导数约束。
    pub fn new(
        band_structure: BandStructure,
        soc: bool,
        magmom: Option<Vec<f64>>,
        mommat: Option<MomentumMatrix>,
    ) -> Self {
        let spins = band_structure.spins();
        let mut lattice_matrix = band_structure.structure.lattice.matrix;
        for row in &mut lattice_matrix {
            for entry in row.iter_mut() {
                *entry *= units::ANGSTROM;
            }
        }
        let kpoints = band_structure.kpoints.clone();
        let structure = band_structure.structure.clone();

        Interpolater {
            band_structure,
            soc,
            spins,
            lattice_matrix,
            kpoints,
            magmom,
            mommat,
            structure,
        }
    }

    /// 使用默认参数插值：factor = 5，无能量窗口，全部核心并行
    pub fn interpolate_bands_default(&self) -> Result<(BandStructure, [usize; 3])> {
        self.interpolate_bands(5.0, None, -1)
    }

    /// 将能带插值到更密的 k 点网格
    ///
    /// `interpolation_factor` 乘以原 k 点数得到目标网格密度；
    /// `energy_cutoff` 给定时，只保留在参考能量 ± cutoff 窗口内
    /// 有态的能带（金属以费米能级为参考，否则为 VBM/CBM）；
    /// `nworkers` 控制求值并行度，-1 表示使用全部处理器核心。
    ///
    /// 返回新的能带结构与插值网格尺寸。
    pub fn interpolate_bands(
        &self,
        interpolation_factor: f64,
        energy_cutoff: Option<f64>,
        nworkers: isize,
    ) -> Result<(BandStructure, [usize; 3])> {
        if interpolation_factor <= 0.0 {
            return Err(FourbandError::InvalidArgument(format!(
                "interpolation_factor must be positive, got {}",
                interpolation_factor
            )));
        }
        // -1 在调用时解析为可用核心数，受限环境下行为正确
        let nworkers = match nworkers {
            -1 => num_cpus::get(),
            n if n > 0 => n as usize,
            n => {
                return Err(FourbandError::InvalidArgument(format!(
                    "nworkers must be positive or -1, got {}",
                    n
                )))
            }
        };

        let nkpt = self.kpoints.len() as f64 * interpolation_factor;
        let equivalences = sphere::get_equivalences(
            &self.structure,
            self.magmom.as_deref(),
            nkpt,
            !self.soc,
        )?;
        let interpolation_mesh = sphere::mesh_dimensions(&equivalences);

        // 逐自旋拟合星函数系数（能量换为 Hartree）
        let mut coefficients: BTreeMap<Spin, Vec<Vec<f64>>> = BTreeMap::new();
        for &spin in &self.spins {
            let ebands: Vec<Vec<f64>> = self.band_structure.bands[&spin]
                .iter()
                .map(|band| band.iter().map(|&e| e * units::EV).collect())
                .collect();
            let data = DftData::new(
                self.kpoints.clone(),
                ebands,
                self.lattice_matrix,
                self.mommat.clone(),
            );
            coefficients.insert(spin, fourier::fit_coefficients(&data, &equivalences)?);
        }

        let is_metal = self.band_structure.is_metal();

        // 确定能量窗口 (eV)
        let (min_e, max_e) = match energy_cutoff {
            Some(cutoff) if is_metal => (
                self.band_structure.efermi - cutoff,
                self.band_structure.efermi + cutoff,
            ),
            Some(cutoff) => (
                self.band_structure.vbm()? - cutoff,
                self.band_structure.cbm()? + cutoff,
            ),
            None => {
                let min = self
                    .band_structure
                    .bands
                    .values()
                    .flatten()
                    .flatten()
                    .fold(f64::INFINITY, |acc, &e| acc.min(e));
                let max = self
                    .band_structure
                    .bands
                    .values()
                    .flatten()
                    .flatten()
                    .fold(f64::NEG_INFINITY, |acc, &e| acc.max(e));
                // 全范围窗口：略微外扩使边界态严格落在窗口内
                (min - 1.0, max + 1.0)
            }
        };

        let dense_kpoints = fourier::mesh_kpoints(interpolation_mesh);
        let mut energies: BTreeMap<Spin, Vec<Vec<f64>>> = BTreeMap::new();
        let mut new_vb_idx: BTreeMap<Spin, usize> = BTreeMap::new();

        for &spin in &self.spins {
            // 窗口内任一 k 点有态的能带保留
            let ibands: Vec<bool> = self.band_structure.bands[&spin]
                .iter()
                .map(|band| band.iter().any(|&e| e > min_e && e < max_e))
                .collect();
            if !ibands.iter().any(|&keep| keep) {
                return Err(FourbandError::NoBandsInWindow { spin });
            }

            let selected: Vec<Vec<f64>> = coefficients[&spin]
                .iter()
                .zip(ibands.iter())
                .filter(|(_, &keep)| keep)
                .map(|(coeffs, _)| coeffs.clone())
                .collect();

            let mut interpolated =
                fourier::bands_at(&equivalences, &selected, &dense_kpoints, nworkers)?;
            // 内核输出 Hartree，换回 eV
            for band in &mut interpolated {
                for energy in band.iter_mut() {
                    *energy /= units::EV;
                }
            }
            energies.insert(spin, interpolated);

            if !is_metal {
                // 筛选后价带顶的新位置：数出原价带顶（含）之前保留的能带数
                let vb_idx = self.band_structure.valence_band_index(spin)?;
                let kept = ibands[..=vb_idx].iter().filter(|&&keep| keep).count();
                if kept == 0 {
                    return Err(FourbandError::NoBandsInWindow { spin });
                }
                new_vb_idx.insert(spin, kept - 1);
            }
        }

        let efermi = if is_metal {
            self.band_structure.efermi
        } else {
            self.recentered_fermi(&energies, &new_vb_idx)?
        };

        // 不可约网格（固定容差），网格索引除以网格尺寸得分数坐标
        let (_mapping, grid) =
            mesh::ir_reciprocal_mesh(interpolation_mesh, &self.structure, IR_MESH_SYMPREC);
        let mut full_kpoints: Vec<[f64; 3]> = grid
            .iter()
            .map(|address| {
                [
                    address[0] as f64 / interpolation_mesh[0] as f64,
                    address[1] as f64 / interpolation_mesh[1] as f64,
                    address[2] as f64 / interpolation_mesh[2] as f64,
                ]
            })
            .collect();

        // 第一趟：符号优先排序，使网格点与内核求值顺序对齐
        full_kpoints.sort_by(fourier::sign_first_order);

        // 第二趟：普通字典序，同一置换作用于各自旋的能量列
        let mut order: Vec<usize> = (0..full_kpoints.len()).collect();
        order.sort_by(|&i, &j| fourier::lexicographic_order(&full_kpoints[i], &full_kpoints[j]));
        let full_kpoints: Vec<[f64; 3]> = order.iter().map(|&i| full_kpoints[i]).collect();
        for band_set in energies.values_mut() {
            for band in band_set.iter_mut() {
                let reordered: Vec<f64> = order.iter().map(|&i| band[i]).collect();
                *band = reordered;
            }
        }

        let interpolated = BandStructure::new(
            full_kpoints,
            energies,
            self.band_structure.lattice.clone(),
            efermi,
            self.structure.clone(),
        )?;

        Ok((interpolated, interpolation_mesh))
    }

    /// 非金属费米能级：取插值后带隙中点
    fn recentered_fermi(
        &self,
        energies: &BTreeMap<Spin, Vec<Vec<f64>>>,
        new_vb_idx: &BTreeMap<Spin, usize>,
    ) -> Result<f64> {
        output::print_warning(
            "The Fermi level has been set to midway between the top of the valence band \
             and the bottom of the conduction band, and may differ from the Fermi energy \
             of the input band structure.",
        );

        let mut e_vbm = f64::NEG_INFINITY;
        let mut e_cbm = f64::INFINITY;
        for &spin in &self.spins {
            let vb_idx = new_vb_idx[&spin];
            let band_set = &energies[&spin];

            for band in &band_set[..=vb_idx] {
                for &e in band {
                    e_vbm = e_vbm.max(e);
                }
            }
            for band in &band_set[vb_idx + 1..] {
                for &e in band {
                    e_cbm = e_cbm.min(e);
                }
            }
        }

        if !e_vbm.is_finite() || !e_cbm.is_finite() {
            // 某侧没有任何保留能带，带隙中点无定义
            return Err(FourbandError::NoBandsInWindow {
                spin: self.spins[0],
            });
        }
        Ok((e_vbm + e_cbm) / 2.0)
    }
}
