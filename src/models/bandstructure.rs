//! # 能带结构数据模型
//!
//! 定义自旋通道与能带结构容器，以及金属性判断、带边查询等
//! 派生计算。语义对齐 pymatgen 的 BandStructure 约定。
//!
//! ## 依赖关系
//! - 被 `interpolate/` 使用
//! - 使用 `models/structure.rs` 的 Crystal, Lattice

use crate::error::{FourbandError, Result};
use crate::models::{Crystal, Lattice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 自旋通道标签
///
/// 非自旋极化计算只有 `Up` 一个通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Spin {
    Up,
    Down,
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Up => write!(f, "up"),
            Spin::Down => write!(f, "down"),
        }
    }
}

/// 能带结构
///
/// 能量数组按 [能带, k 点] 索引，单位 eV；k 点为倒空间分数坐标。
/// 假定能带按能量随带指标递增排列。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandStructure {
    /// k 点分数坐标列表
    pub kpoints: Vec<[f64; 3]>,

    /// 各自旋通道的能带能量，形状 [n_bands, n_kpoints]
    pub bands: BTreeMap<Spin, Vec<Vec<f64>>>,

    /// 实空间晶格 (Å)
    pub lattice: Lattice,

    /// 费米能级 (eV)
    pub efermi: f64,

    /// 所属晶体结构
    pub structure: Crystal,
}

impl BandStructure {
    /// 创建能带结构，校验每条能带的能量数与 k 点数一致
    pub fn new(
        kpoints: Vec<[f64; 3]>,
        bands: BTreeMap<Spin, Vec<Vec<f64>>>,
        lattice: Lattice,
        efermi: f64,
        structure: Crystal,
    ) -> Result<Self> {
        let nk = kpoints.len();
        for band_set in bands.values() {
            for band in band_set {
                if band.len() != nk {
                    return Err(FourbandError::DimensionMismatch {
                        expected: nk,
                        actual: band.len(),
                    });
                }
            }
        }

        Ok(BandStructure {
            kpoints,
            bands,
            lattice,
            efermi,
            structure,
        })
    }

    /// 自旋通道集合（有序）
    pub fn spins(&self) -> Vec<Spin> {
        self.bands.keys().copied().collect()
    }

    /// 是否为金属：任一能带横跨费米能级
    pub fn is_metal(&self) -> bool {
        self.bands.values().flatten().any(|band| {
            let min = band.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = band.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            min < self.efermi && self.efermi < max
        })
    }

    /// 价带顶能量：严格低于费米能级的最高能量
    pub fn vbm(&self) -> Result<f64> {
        self.bands
            .values()
            .flatten()
            .flatten()
            .filter(|&&e| e < self.efermi)
            .cloned()
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))))
            .ok_or_else(|| FourbandError::BandEdgeNotFound {
                edge: "valence band maximum".to_string(),
            })
    }

    /// 导带底能量：严格高于费米能级的最低能量
    pub fn cbm(&self) -> Result<f64> {
        self.bands
            .values()
            .flatten()
            .flatten()
            .filter(|&&e| e > self.efermi)
            .cloned()
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.min(e))))
            .ok_or_else(|| FourbandError::BandEdgeNotFound {
                edge: "conduction band minimum".to_string(),
            })
    }

    /// 某自旋通道的价带顶带指标（零基）
    ///
    /// 能带按能量递增排列，故取完全位于费米能级之下的能带数减一。
    pub fn valence_band_index(&self, spin: Spin) -> Result<usize> {
        let count = self
            .bands
            .get(&spin)
            .map(|band_set| {
                band_set
                    .iter()
                    .filter(|band| band.iter().all(|&e| e < self.efermi))
                    .count()
            })
            .unwrap_or(0);

        if count == 0 {
            return Err(FourbandError::BandEdgeNotFound {
                edge: format!("valence band for spin {}", spin),
            });
        }
        Ok(count - 1)
    }
}
