//! MZI ONN (Mach-Zehnder 간섭계 광학 신경망) 라이브러리
//!
//! 광학 위상 시프터 메시로 신경망 가중치를 표현하고
//! {weight, usv, phase, voltage} 네 표현을 서로 변환하는 라이브러리

pub mod core;
pub mod nn;

// 핵심 모듈들 재수출
pub use core::{
    // 분해기
    DecomposeAlg, RealUnitaryDecomposer,
    // 양자화기
    MeshMode, PhaseQuantizer,
    // 표현 동기화
    BlockParams, Mode, ModePayload, UpdateList,
    // 타일링
    merge_chunks, merge_chunks_trimmed, partition_chunks,
};
pub use nn::{LayerSnapshot, MziBlockConv2d, MziBlockLinear, MziConv2dConfig, MziLayerConfig};
