//! # MZI 메시 레이아웃 코덱
//!
//! 길이 `k(k-1)/2`의 압축 위상각 벡터를 2차원 메시 배치로 변환하고 복원한다.
//! 삼각(triangular) 토폴로지와 체커보드(rectangular) 토폴로지를 지원한다.

pub mod triangular;
pub mod checkerboard;

pub use triangular::{
    upper_triangle_to_vector, upper_triangle_to_vector_batch, vector_to_upper_triangle,
    vector_to_upper_triangle_batch,
};
pub use checkerboard::{
    checkerboard_to_vector, checkerboard_to_vector_batch, vector_to_checkerboard,
    vector_to_checkerboard_batch, MeshPlan,
};

/// `k×k` 메시의 압축 벡터 길이
pub fn mesh_vector_len(dim: usize) -> usize {
    dim * (dim.saturating_sub(1)) / 2
}

/// 벡터 길이가 `k(k-1)/2`와 일치하는지 검사
pub fn check_vector_len(len: usize, dim: usize) -> Result<(), String> {
    let expected = mesh_vector_len(dim);
    if len != expected {
        return Err(format!(
            "위상 벡터 길이 불일치: {} vs {} (k={})",
            len, expected, dim
        ));
    }
    Ok(())
}
