use crate::core::matrix::{merge_chunks, merge_chunks_trimmed, partition_chunks};
use ndarray::Array2;

fn sample_dense(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(r, c)| (r * 100 + c) as f32)
}

#[test]
fn test_partition_merge_roundtrip_exact_multiple() {
    let dense = sample_dense(8, 12);
    let blocks = partition_chunks(dense.view(), 4).unwrap();
    assert_eq!(blocks.dim(), (2, 3, 4, 4));
    let merged = merge_chunks(blocks.view());
    assert_eq!(dense, merged);
}

#[test]
fn test_partition_pads_and_trim_restores() {
    // 10×7을 k=4로 자르면 3×2 격자로 패딩된다
    let dense = sample_dense(10, 7);
    let blocks = partition_chunks(dense.view(), 4).unwrap();
    assert_eq!(blocks.dim(), (3, 2, 4, 4));

    // 패딩 영역은 0
    assert_eq!(blocks[[2, 1, 3, 3]], 0.0);

    let restored = merge_chunks_trimmed(blocks.view(), 10, 7).unwrap();
    assert_eq!(dense, restored);
}

#[test]
fn test_block_placement() {
    let dense = sample_dense(8, 8);
    let blocks = partition_chunks(dense.view(), 4).unwrap();
    // 블록 (1, 1)은 원본의 [4.., 4..] 영역
    assert_eq!(blocks[[1, 1, 0, 0]], dense[[4, 4]]);
    assert_eq!(blocks[[1, 1, 3, 2]], dense[[7, 6]]);
}

#[test]
fn test_invalid_inputs_fail() {
    let dense = sample_dense(4, 4);
    assert!(partition_chunks(dense.view(), 0).is_err());

    let blocks = partition_chunks(dense.view(), 4).unwrap();
    assert!(merge_chunks_trimmed(blocks.view(), 5, 4).is_err());
}
