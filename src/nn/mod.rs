//! # MZI 블록 레이어
//!
//! SVD 블로킹 + 위상 메시 파라미터화 기반의 선형/합성곱 레이어

pub mod linear;
pub mod conv2d;
pub mod snapshot;

pub use linear::{MziBlockLinear, MziLayerConfig};
pub use conv2d::{MziBlockConv2d, MziConv2dConfig};
pub use snapshot::LayerSnapshot;

#[cfg(test)]
pub mod __tests__;
