//! 활성 모드의 파라미터 페이로드
//!
//! 네 표현 중 진실의 원천 하나를 태그된 합(union)으로 담는다.
//! 스냅샷 직렬화와 복원에 쓰이며, 잘못된 조합 상태는 타입으로 배제된다.

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use super::block_params::BlockParams;
use super::mode::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModePayload {
    Weight {
        weight: Array4<f32>,
    },
    Usv {
        u: Array4<f32>,
        s: Array3<f32>,
        v: Array4<f32>,
    },
    Phase {
        delta_u: Array3<f32>,
        phase_u: Array3<f32>,
        phase_s: Array3<f32>,
        delta_v: Array3<f32>,
        phase_v: Array3<f32>,
        s_scale: Array3<f32>,
    },
    Voltage {
        delta_u: Array3<f32>,
        voltage_u: Array3<f32>,
        voltage_s: Array3<f32>,
        delta_v: Array3<f32>,
        voltage_v: Array3<f32>,
        s_scale: Array3<f32>,
    },
}

impl ModePayload {
    pub fn mode(&self) -> Mode {
        match self {
            ModePayload::Weight { .. } => Mode::Weight,
            ModePayload::Usv { .. } => Mode::Usv,
            ModePayload::Phase { .. } => Mode::Phase,
            ModePayload::Voltage { .. } => Mode::Voltage,
        }
    }

    /// 저장소에서 활성 모드의 버퍼를 복사해 페이로드를 만든다
    pub fn capture(params: &BlockParams, mode: Mode) -> Self {
        match mode {
            Mode::Weight => ModePayload::Weight {
                weight: params.weight.clone(),
            },
            Mode::Usv => ModePayload::Usv {
                u: params.u.clone(),
                s: params.s.clone(),
                v: params.v.clone(),
            },
            Mode::Phase => ModePayload::Phase {
                delta_u: params.delta_u.clone(),
                phase_u: params.phase_u.clone(),
                phase_s: params.phase_s.clone(),
                delta_v: params.delta_v.clone(),
                phase_v: params.phase_v.clone(),
                s_scale: params.s_scale.clone(),
            },
            Mode::Voltage => ModePayload::Voltage {
                delta_u: params.delta_u.clone(),
                voltage_u: params.voltage_u.clone(),
                voltage_s: params.voltage_s.clone(),
                delta_v: params.delta_v.clone(),
                voltage_v: params.voltage_v.clone(),
                s_scale: params.s_scale.clone(),
            },
        }
    }

    /// 페이로드를 저장소의 해당 버퍼에 되쓴다. 형상이 다르면 실패.
    pub fn restore(&self, params: &mut BlockParams) -> Result<(), String> {
        match self {
            ModePayload::Weight { weight } => {
                check_shape4("weight", weight.dim(), params.weight.dim())?;
                params.weight.assign(weight);
            }
            ModePayload::Usv { u, s, v } => {
                check_shape4("u", u.dim(), params.u.dim())?;
                check_shape3("s", s.dim(), params.s.dim())?;
                check_shape4("v", v.dim(), params.v.dim())?;
                params.u.assign(u);
                params.s.assign(s);
                params.v.assign(v);
            }
            ModePayload::Phase {
                delta_u,
                phase_u,
                phase_s,
                delta_v,
                phase_v,
                s_scale,
            } => {
                check_shape3("delta_u", delta_u.dim(), params.delta_u.dim())?;
                check_shape3("phase_u", phase_u.dim(), params.phase_u.dim())?;
                check_shape3("phase_s", phase_s.dim(), params.phase_s.dim())?;
                check_shape3("delta_v", delta_v.dim(), params.delta_v.dim())?;
                check_shape3("phase_v", phase_v.dim(), params.phase_v.dim())?;
                check_shape3("s_scale", s_scale.dim(), params.s_scale.dim())?;
                params.delta_u.assign(delta_u);
                params.phase_u.assign(phase_u);
                params.phase_s.assign(phase_s);
                params.delta_v.assign(delta_v);
                params.phase_v.assign(phase_v);
                params.s_scale.assign(s_scale);
            }
            ModePayload::Voltage {
                delta_u,
                voltage_u,
                voltage_s,
                delta_v,
                voltage_v,
                s_scale,
            } => {
                check_shape3("delta_u", delta_u.dim(), params.delta_u.dim())?;
                check_shape3("voltage_u", voltage_u.dim(), params.voltage_u.dim())?;
                check_shape3("voltage_s", voltage_s.dim(), params.voltage_s.dim())?;
                check_shape3("delta_v", delta_v.dim(), params.delta_v.dim())?;
                check_shape3("voltage_v", voltage_v.dim(), params.voltage_v.dim())?;
                check_shape3("s_scale", s_scale.dim(), params.s_scale.dim())?;
                params.delta_u.assign(delta_u);
                params.voltage_u.assign(voltage_u);
                params.voltage_s.assign(voltage_s);
                params.delta_v.assign(delta_v);
                params.voltage_v.assign(voltage_v);
                params.s_scale.assign(s_scale);
            }
        }
        Ok(())
    }
}

fn check_shape3(
    name: &str,
    got: (usize, usize, usize),
    expected: (usize, usize, usize),
) -> Result<(), String> {
    if got != expected {
        return Err(format!("{} 형상 불일치: {:?} vs {:?}", name, got, expected));
    }
    Ok(())
}

fn check_shape4(
    name: &str,
    got: (usize, usize, usize, usize),
    expected: (usize, usize, usize, usize),
) -> Result<(), String> {
    if got != expected {
        return Err(format!("{} 형상 불일치: {:?} vs {:?}", name, got, expected));
    }
    Ok(())
}
