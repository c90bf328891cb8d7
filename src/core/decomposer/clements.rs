//! 직사각(Clements 계열) 분해
//!
//! 반대각선을 따라 좌/우 곱을 교대하며 인접 모드 쌍 회전으로 소거해
//! `L_K ··· L_1 · U · R_1 ··· R_M = D`를 만든 뒤, 대각 D를 좌회전들
//! 너머로 밀어 `U = D · Ã_1 ··· Ã_K · R_M⁻¹ ··· R_1⁻¹` 형태로 정리한다.
//! 밀기에는 `D · R(p, q, θ) · D = R(p, q, sign(d_p·d_q)·θ)` 관계를 쓴다.
//! 이 곱 순서가 곧 체커보드 배치 계획(`MeshPlan`)의 슬롯 순서다.

use nalgebra::{DMatrix, DVector};

use super::{rotate_cols, rotate_rows};
use crate::core::mesh::MeshPlan;

pub fn decompose(u: &DMatrix<f32>) -> (DVector<f32>, DMatrix<f32>) {
    let n = u.nrows();
    let mut t = u.clone();
    let mut left: Vec<(usize, f32)> = Vec::new();
    let mut right: Vec<(usize, f32)> = Vec::new();
    if n >= 2 {
        for i in 0..n - 1 {
            if i % 2 == 0 {
                // 우측 곱으로 소거: T[n-1-j, i-j] ← 0, 열 쌍 (i-j, i-j+1)
                for j in 0..=i {
                    let r = n - 1 - j;
                    let p = i - j;
                    let theta = (-t[(r, p)]).atan2(t[(r, p + 1)]);
                    rotate_cols(&mut t, p, p + 1, theta);
                    right.push((p, theta));
                }
            } else {
                // 좌측 곱으로 소거: T[n+j-i-2, j-1] ← 0, 행 쌍 (n+j-i-3, n+j-i-2)
                for j in 1..=i + 1 {
                    let r = n + j - i - 2;
                    let c = j - 1;
                    let p = n + j - i - 3;
                    let theta = (-t[(r, c)]).atan2(t[(p, c)]);
                    rotate_rows(&mut t, p, p + 1, theta);
                    left.push((p, theta));
                }
            }
        }
    }
    let delta = DVector::from_fn(n, |r, _| t[(r, r)]);

    let plan = MeshPlan::new(n);
    let mut phi = DMatrix::zeros(n, n);
    let mut slot = 0;
    for &(p, theta) in &left {
        let sign = if delta[p] * delta[p + 1] < 0.0 { -1.0 } else { 1.0 };
        let (pp, col) = plan.slots[slot];
        debug_assert_eq!(pp, p);
        phi[(p, col)] = -sign * theta;
        slot += 1;
    }
    for &(p, theta) in right.iter().rev() {
        let (pp, col) = plan.slots[slot];
        debug_assert_eq!(pp, p);
        phi[(p, col)] = -theta;
        slot += 1;
    }
    (delta, phi)
}

pub fn reconstruct(delta: &DVector<f32>, phi: &DMatrix<f32>) -> DMatrix<f32> {
    let n = delta.len();
    let mut w = DMatrix::from_fn(n, n, |r, c| if r == c { delta[r] } else { 0.0 });
    let plan = MeshPlan::new(n);
    for &(p, col) in &plan.slots {
        rotate_cols(&mut w, p, p + 1, phi[(p, col)]);
    }
    w
}
