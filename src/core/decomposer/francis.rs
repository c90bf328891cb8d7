//! 순차(Francis/Reck 계열) 분해
//!
//! 행 i의 비대각 원소를 열 쌍 (i, j) 회전으로 차례로 소거해
//! `U · R_1 ··· R_m = D`를 만든다. 복원은 소거의 역순으로
//! `U = D · R_m⁻¹ ··· R_1⁻¹`. 각도는 순상삼각 `[i, j]` 칸에 저장된다.

use nalgebra::{DMatrix, DVector};

use super::rotate_cols;

pub fn decompose(u: &DMatrix<f32>) -> (DVector<f32>, DMatrix<f32>) {
    let n = u.nrows();
    let mut t = u.clone();
    let mut phi = DMatrix::zeros(n, n);
    if n >= 2 {
        for i in 0..n - 1 {
            for j in i + 1..n {
                // T[i, j]를 0으로: θ = atan2(T[i,j], T[i,i])
                let theta = t[(i, j)].atan2(t[(i, i)]);
                rotate_cols(&mut t, i, j, theta);
                phi[(i, j)] = theta;
            }
        }
    }
    let delta = DVector::from_fn(n, |r, _| t[(r, r)]);
    (delta, phi)
}

pub fn reconstruct(delta: &DVector<f32>, phi: &DMatrix<f32>) -> DMatrix<f32> {
    let n = delta.len();
    let mut w = DMatrix::from_fn(n, n, |r, c| if r == c { delta[r] } else { 0.0 });
    if n >= 2 {
        for i in (0..n - 1).rev() {
            for j in (i + 1..n).rev() {
                rotate_cols(&mut w, i, j, -phi[(i, j)]);
            }
        }
    }
    w
}
