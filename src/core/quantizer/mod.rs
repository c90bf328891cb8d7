//! # 위상 양자화기
//!
//! 연속 위상을 하드웨어가 실제로 구현 가능한 값으로 사상한다.
//! 전압 비선형성 `phase = gamma · voltage²`, 비트폭 반올림,
//! 소자별 감마 변이 노이즈, 인접 시프터 간 크로스토크 결합을 모델링한다.

pub mod phase_quantizer;
pub mod voltage;

pub use phase_quantizer::{MeshMode, PhaseQuantizer};
pub use voltage::{phase_to_voltage, phase_to_voltage_batch, voltage_to_phase, voltage_to_phase_batch};
