//! # 실수 유니터리 분해기
//!
//! 실수 직교 행렬을 (대각 보정 벡터, 메시 각도 행렬)로 분해하고 복원한다.
//! 두 알고리즘을 지원한다:
//! - Francis: 순차(staircase) 소거, 삼각 메시 배치
//! - Clements: 좌/우 교대 소거, 깊이 ≤ k의 직사각 메시 배치
//!
//! 배치 연산은 `[grid_rows, grid_cols, k, k]` 격자의 블록을 서로 독립으로
//! 처리한다. 입력이 정확히 직교가 아니면 복원 오차는 그 편차에 비례한다.

pub mod francis;
pub mod clements;

use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array3, Array4, ArrayView2, ArrayView3, ArrayView4};
use rayon::prelude::*;

use crate::core::mesh::{
    checkerboard_to_vector_batch, upper_triangle_to_vector_batch, vector_to_checkerboard_batch,
    vector_to_upper_triangle_batch, MeshPlan,
};

/// 분해 알고리즘 (구성 시 한 번 선택)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DecomposeAlg {
    Francis,
    Clements,
}

/// 실수 직교 행렬의 배치 분해/복원기
#[derive(Debug, Clone)]
pub struct RealUnitaryDecomposer {
    pub alg: DecomposeAlg,
}

impl RealUnitaryDecomposer {
    pub fn new(alg: DecomposeAlg) -> Self {
        Self { alg }
    }

    /// 단일 블록 분해: `U ≈ reconstruct(delta, phi_mat)`
    pub fn decompose(&self, u: &DMatrix<f32>) -> Result<(DVector<f32>, DMatrix<f32>), String> {
        if u.nrows() != u.ncols() {
            return Err(format!("정방 블록이 아님: {}x{}", u.nrows(), u.ncols()));
        }
        match self.alg {
            DecomposeAlg::Francis => Ok(francis::decompose(u)),
            DecomposeAlg::Clements => Ok(clements::decompose(u)),
        }
    }

    /// 단일 블록 복원. (delta, phi_mat)만의 순수 함수.
    pub fn reconstruct(
        &self,
        delta: &DVector<f32>,
        phi_mat: &DMatrix<f32>,
    ) -> Result<DMatrix<f32>, String> {
        let n = delta.len();
        if phi_mat.nrows() != n || phi_mat.ncols() != n {
            return Err(format!(
                "delta와 위상 행렬 크기 불일치: {} vs {}x{}",
                n,
                phi_mat.nrows(),
                phi_mat.ncols()
            ));
        }
        match self.alg {
            DecomposeAlg::Francis => Ok(francis::reconstruct(delta, phi_mat)),
            DecomposeAlg::Clements => Ok(clements::reconstruct(delta, phi_mat)),
        }
    }

    /// 배치 분해: `[p, q, k, k]` → (`[p, q, k]`, `[p, q, k, k]`)
    pub fn decompose_batch(
        &self,
        u: ArrayView4<f32>,
    ) -> Result<(Array3<f32>, Array4<f32>), String> {
        let (gr, gc, k, k2) = u.dim();
        if k != k2 {
            return Err(format!("정방 블록이 아님: {}x{}", k, k2));
        }
        let cells: Vec<(usize, usize)> = (0..gr)
            .flat_map(|r| (0..gc).map(move |c| (r, c)))
            .collect();
        let results: Result<Vec<_>, String> = cells
            .par_iter()
            .map(|&(r, c)| {
                let block = view_to_dmatrix(u.slice(s![r, c, .., ..]));
                let (delta, phi) = self.decompose(&block)?;
                Ok((r, c, delta, phi))
            })
            .collect();

        let mut delta_out = Array3::zeros((gr, gc, k));
        let mut phi_out = Array4::zeros((gr, gc, k, k));
        for (r, c, delta, phi) in results? {
            for i in 0..k {
                delta_out[[r, c, i]] = delta[i];
                for j in 0..k {
                    phi_out[[r, c, i, j]] = phi[(i, j)];
                }
            }
        }
        Ok((delta_out, phi_out))
    }

    /// 배치 복원: (`[p, q, k]`, `[p, q, k, k]`) → `[p, q, k, k]`
    pub fn reconstruct_batch(
        &self,
        delta: ArrayView3<f32>,
        phi_mat: ArrayView4<f32>,
    ) -> Result<Array4<f32>, String> {
        let (gr, gc, k) = delta.dim();
        let (pr, pc, pk, pk2) = phi_mat.dim();
        if (gr, gc) != (pr, pc) || k != pk || k != pk2 {
            return Err(format!(
                "격자 차원 불일치: delta [{},{},{}] vs phi [{},{},{},{}]",
                gr, gc, k, pr, pc, pk, pk2
            ));
        }
        let cells: Vec<(usize, usize)> = (0..gr)
            .flat_map(|r| (0..gc).map(move |c| (r, c)))
            .collect();
        let results: Result<Vec<_>, String> = cells
            .par_iter()
            .map(|&(r, c)| {
                let d = DVector::from_fn(k, |i, _| delta[[r, c, i]]);
                let p = view_to_dmatrix(phi_mat.slice(s![r, c, .., ..]));
                let u = self.reconstruct(&d, &p)?;
                Ok((r, c, u))
            })
            .collect();

        let mut out = Array4::zeros((gr, gc, k, k));
        for (r, c, u) in results? {
            for i in 0..k {
                for j in 0..k {
                    out[[r, c, i, j]] = u[(i, j)];
                }
            }
        }
        Ok(out)
    }

    /// 압축 벡터 → 메시 행렬 (토폴로지에 따라 삼각/체커보드)
    pub fn v2m_batch(&self, vecs: ArrayView3<f32>, dim: usize) -> Result<Array4<f32>, String> {
        match self.alg {
            DecomposeAlg::Francis => vector_to_upper_triangle_batch(vecs, dim),
            DecomposeAlg::Clements => {
                let plan = MeshPlan::new(dim);
                vector_to_checkerboard_batch(vecs, &plan)
            }
        }
    }

    /// 메시 행렬 → 압축 벡터
    pub fn m2v_batch(&self, mats: ArrayView4<f32>) -> Result<Array3<f32>, String> {
        match self.alg {
            DecomposeAlg::Francis => upper_triangle_to_vector_batch(mats),
            DecomposeAlg::Clements => {
                let dim = mats.dim().2;
                let plan = MeshPlan::new(dim);
                checkerboard_to_vector_batch(mats, &plan)
            }
        }
    }
}

pub(crate) fn view_to_dmatrix(view: ArrayView2<f32>) -> DMatrix<f32> {
    DMatrix::from_fn(view.nrows(), view.ncols(), |r, c| view[[r, c]])
}

/// 두 열에 대한 기본 회전의 우측 곱: `T ← T · R(p, q, θ)`
pub(crate) fn rotate_cols(t: &mut DMatrix<f32>, p: usize, q: usize, theta: f32) {
    let (cos_t, sin_t) = (theta.cos(), theta.sin());
    for r in 0..t.nrows() {
        let a = t[(r, p)];
        let b = t[(r, q)];
        t[(r, p)] = cos_t * a + sin_t * b;
        t[(r, q)] = -sin_t * a + cos_t * b;
    }
}

/// 두 행에 대한 기본 회전의 좌측 곱: `T ← R(p, q, θ) · T`
pub(crate) fn rotate_rows(t: &mut DMatrix<f32>, p: usize, q: usize, theta: f32) {
    let (cos_t, sin_t) = (theta.cos(), theta.sin());
    for c in 0..t.ncols() {
        let a = t[(p, c)];
        let b = t[(q, c)];
        t[(p, c)] = cos_t * a - sin_t * b;
        t[(q, c)] = sin_t * a + cos_t * b;
    }
}

#[cfg(test)]
pub mod __tests__;
