//! 체커보드 메시 배치 (직사각 분해용)
//!
//! 직사각(Clements) 메시는 인접 모드 쌍에 작용하는 회전들을 깊이 ≤ k의
//! 열로 겹쳐 배치한다. 각도는 `k×k` 행렬의 (모드 쌍, 열) 칸에 흩어지며
//! 점유 패턴은 대각선이 교대로 나타나는 체커보드 형태가 된다.
//! 벡터 순서는 분해의 곱 순서와 동일하게 정의되어 분해기와 코덱이
//! 항상 같은 칸을 바라본다.

use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, ArrayView3, ArrayView4, s};

use super::check_vector_len;

/// 직사각 메시 배치 계획
///
/// `slots[t] = (p, col)`: 곱 순서 t번째 회전이 모드 쌍 (p, p+1)에 작용하고
/// 메시 행렬의 `[p, col]` 칸에 저장됨을 뜻한다. k에만 의존하는 순수 데이터.
#[derive(Debug, Clone)]
pub struct MeshPlan {
    pub dim: usize,
    pub slots: Vec<(usize, usize)>,
}

impl MeshPlan {
    pub fn new(dim: usize) -> Self {
        // 교대 소거 순서에서 좌회전/우회전의 모드 쌍 시퀀스를 뽑는다
        let mut left_pairs = Vec::new();
        let mut right_pairs = Vec::new();
        if dim >= 2 {
            for i in 0..dim - 1 {
                if i % 2 == 0 {
                    for j in 0..=i {
                        right_pairs.push(i - j);
                    }
                } else {
                    for j in 1..=i + 1 {
                        left_pairs.push(dim + j - i - 3);
                    }
                }
            }
        }
        // 곱 순서: 좌회전은 만난 순서대로, 우회전은 역순으로
        let mut order = left_pairs;
        order.extend(right_pairs.into_iter().rev());

        // 모드 쌍이 겹치지 않도록 각 회전을 가장 이른 열에 배치
        let mut last_col = vec![-1i64; dim.max(1)];
        let mut slots = Vec::with_capacity(order.len());
        for &p in &order {
            let col = (last_col[p].max(last_col[p + 1]) + 1) as usize;
            debug_assert!(col < dim, "메시 깊이 초과: col={} dim={}", col, dim);
            last_col[p] = col as i64;
            last_col[p + 1] = col as i64;
            slots.push((p, col));
        }
        MeshPlan { dim, slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// 압축 벡터 → 체커보드 행렬
pub fn vector_to_checkerboard(vec: ArrayView1<f32>, plan: &MeshPlan) -> Result<Array2<f32>, String> {
    check_vector_len(vec.len(), plan.dim)?;
    let mut mat = Array2::zeros((plan.dim, plan.dim));
    for (t, &(p, col)) in plan.slots.iter().enumerate() {
        mat[[p, col]] = vec[t];
    }
    Ok(mat)
}

/// 체커보드 행렬 → 압축 벡터
pub fn checkerboard_to_vector(mat: ArrayView2<f32>, plan: &MeshPlan) -> Result<Array1<f32>, String> {
    let (rows, cols) = mat.dim();
    if rows != plan.dim || cols != plan.dim {
        return Err(format!(
            "메시 행렬 크기 불일치: {}x{} vs k={}",
            rows, cols, plan.dim
        ));
    }
    let mut vec = Array1::zeros(plan.len());
    for (t, &(p, col)) in plan.slots.iter().enumerate() {
        vec[t] = mat[[p, col]];
    }
    Ok(vec)
}

/// 배치 버전: `[p, q, L]` → `[p, q, k, k]`
pub fn vector_to_checkerboard_batch(
    vecs: ArrayView3<f32>,
    plan: &MeshPlan,
) -> Result<Array4<f32>, String> {
    let (gr, gc, len) = vecs.dim();
    check_vector_len(len, plan.dim)?;
    let mut out = Array4::zeros((gr, gc, plan.dim, plan.dim));
    for r in 0..gr {
        for c in 0..gc {
            let mat = vector_to_checkerboard(vecs.slice(s![r, c, ..]), plan)?;
            out.slice_mut(s![r, c, .., ..]).assign(&mat);
        }
    }
    Ok(out)
}

/// 배치 버전: `[p, q, k, k]` → `[p, q, L]`
pub fn checkerboard_to_vector_batch(
    mats: ArrayView4<f32>,
    plan: &MeshPlan,
) -> Result<Array3<f32>, String> {
    let (gr, gc, ..) = mats.dim();
    let mut out = Array3::zeros((gr, gc, plan.len()));
    for r in 0..gr {
        for c in 0..gc {
            let vec = checkerboard_to_vector(mats.slice(s![r, c, .., ..]), plan)?;
            out.slice_mut(s![r, c, ..]).assign(&vec);
        }
    }
    Ok(out)
}
