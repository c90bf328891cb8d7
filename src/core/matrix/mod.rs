//! # 블록 타일링 유틸리티
//!
//! 임의 크기의 밀집 행렬을 `k×k` 블록 격자로 자르고 되붙인다.
//! 나누어떨어지지 않는 차원은 0으로 패딩한다.

pub mod tiling;

pub use tiling::{merge_chunks, merge_chunks_trimmed, partition_chunks};

#[cfg(test)]
pub mod __tests__;
