//! 삼각 메시 배치 (순차 분해용)
//!
//! `k(k-1)/2`개의 각도가 `k×k` 행렬의 순상삼각(strict upper triangle)을
//! 행 우선 순서로 채운다. 나머지 칸은 정보가 없으며 0으로 둔다.

use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, ArrayView3, ArrayView4, s};

use super::check_vector_len;

/// 압축 벡터 → 순상삼각 행렬
pub fn vector_to_upper_triangle(vec: ArrayView1<f32>, dim: usize) -> Result<Array2<f32>, String> {
    check_vector_len(vec.len(), dim)?;
    let mut mat = Array2::zeros((dim, dim));
    let mut t = 0;
    for i in 0..dim {
        for j in i + 1..dim {
            mat[[i, j]] = vec[t];
            t += 1;
        }
    }
    Ok(mat)
}

/// 순상삼각 행렬 → 압축 벡터
pub fn upper_triangle_to_vector(mat: ArrayView2<f32>) -> Result<Array1<f32>, String> {
    let (rows, cols) = mat.dim();
    if rows != cols {
        return Err(format!("정방 행렬이 아님: {}x{}", rows, cols));
    }
    let mut vec = Array1::zeros(rows * (rows.saturating_sub(1)) / 2);
    let mut t = 0;
    for i in 0..rows {
        for j in i + 1..rows {
            vec[t] = mat[[i, j]];
            t += 1;
        }
    }
    Ok(vec)
}

/// 배치 버전: `[p, q, L]` → `[p, q, k, k]`
pub fn vector_to_upper_triangle_batch(
    vecs: ArrayView3<f32>,
    dim: usize,
) -> Result<Array4<f32>, String> {
    let (gr, gc, len) = vecs.dim();
    check_vector_len(len, dim)?;
    let mut out = Array4::zeros((gr, gc, dim, dim));
    for r in 0..gr {
        for c in 0..gc {
            let mat = vector_to_upper_triangle(vecs.slice(s![r, c, ..]), dim)?;
            out.slice_mut(s![r, c, .., ..]).assign(&mat);
        }
    }
    Ok(out)
}

/// 배치 버전: `[p, q, k, k]` → `[p, q, L]`
pub fn upper_triangle_to_vector_batch(mats: ArrayView4<f32>) -> Result<Array3<f32>, String> {
    let (gr, gc, dim, dim2) = mats.dim();
    if dim != dim2 {
        return Err(format!("정방 블록이 아님: {}x{}", dim, dim2));
    }
    let mut out = Array3::zeros((gr, gc, dim * (dim.saturating_sub(1)) / 2));
    for r in 0..gr {
        for c in 0..gc {
            let vec = upper_triangle_to_vector(mats.slice(s![r, c, .., ..]))?;
            out.slice_mut(s![r, c, ..]).assign(&vec);
        }
    }
    Ok(out)
}
