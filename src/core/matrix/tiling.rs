//! 밀집 행렬 ↔ 블록 격자 변환

use ndarray::{s, Array2, Array4, ArrayView2, ArrayView4};

/// `(rows, cols)` 행렬을 0 패딩해 `[grid_rows, grid_cols, k, k]`로 자른다.
/// 블록 (r, c)는 원본의 `[r·k .. r·k+k, c·k .. c·k+k]` 영역을 담는다.
pub fn partition_chunks(dense: ArrayView2<f32>, block: usize) -> Result<Array4<f32>, String> {
    if block == 0 {
        return Err("블록 크기는 0일 수 없음".to_string());
    }
    let (rows, cols) = dense.dim();
    let grid_rows = rows.div_ceil(block);
    let grid_cols = cols.div_ceil(block);
    let mut out = Array4::zeros((grid_rows, grid_cols, block, block));
    for r in 0..rows {
        for c in 0..cols {
            out[[r / block, c / block, r % block, c % block]] = dense[[r, c]];
        }
    }
    Ok(out)
}

/// 블록 격자를 `[grid_rows·k, grid_cols·k]` 밀집 행렬로 되붙인다
pub fn merge_chunks(blocks: ArrayView4<f32>) -> Array2<f32> {
    let (gr, gc, k, _) = blocks.dim();
    let mut out = Array2::zeros((gr * k, gc * k));
    for r in 0..gr {
        for c in 0..gc {
            out.slice_mut(s![r * k..(r + 1) * k, c * k..(c + 1) * k])
                .assign(&blocks.slice(s![r, c, .., ..]));
        }
    }
    out
}

/// 되붙인 뒤 패딩을 잘라 원래 `(rows, cols)` 형상으로 돌려준다
pub fn merge_chunks_trimmed(
    blocks: ArrayView4<f32>,
    rows: usize,
    cols: usize,
) -> Result<Array2<f32>, String> {
    let merged = merge_chunks(blocks);
    let (mr, mc) = merged.dim();
    if rows > mr || cols > mc {
        return Err(format!(
            "잘라낼 크기가 격자보다 큼: ({}, {}) vs ({}, {})",
            rows, cols, mr, mc
        ));
    }
    Ok(merged.slice(s![..rows, ..cols]).to_owned())
}
