//! 구동 전압 ↔ 위상 비선형 사상
//!
//! 물리 관계 `phase = gamma · voltage²`. 위상은 [0, 2π)로 래핑한 뒤
//! 전압으로 변환하므로 왕복은 2π 법(modulo)으로 위상을 보존한다.

use ndarray::Array3;

pub fn phase_to_voltage(phase: f32, gamma: f32) -> f32 {
    (phase.rem_euclid(2.0 * std::f32::consts::PI) / gamma).sqrt()
}

pub fn voltage_to_phase(voltage: f32, gamma: f32) -> f32 {
    gamma * voltage * voltage
}

pub fn phase_to_voltage_batch(phase: &Array3<f32>, gamma: f32) -> Array3<f32> {
    phase.mapv(|p| phase_to_voltage(p, gamma))
}

pub fn voltage_to_phase_batch(voltage: &Array3<f32>, gamma: f32) -> Array3<f32> {
    voltage.mapv(|v| voltage_to_phase(v, gamma))
}
