//! 블록 격자 파라미터 저장소와 표현 간 변환

use nalgebra::DMatrix;
use ndarray::{s, Array3, Array4};
use rayon::prelude::*;

use crate::core::decomposer::{view_to_dmatrix, DecomposeAlg, RealUnitaryDecomposer};
use crate::core::mesh::mesh_vector_len;
use crate::core::quantizer::{phase_to_voltage_batch, voltage_to_phase_batch};

use super::mode::UpdateList;

/// `[grid_rows, grid_cols]` 격자의 `k×k` 블록들에 대한 네 표현 버퍼.
///
/// 변환의 미분 가능성:
/// - weight ↔ usv, usv → weight: 미분 가능
/// - usv → phase: 분해가 회전 순서의 이산적 선택이라 스냅샷 전용
/// - phase → usv: cos 경로는 미분 가능, delta는 이산 스냅샷
/// - phase ↔ voltage: 원소별 비선형 사상
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub block: usize,
    pub gamma: f32,
    pub weight: Array4<f32>,
    pub u: Array4<f32>,
    pub s: Array3<f32>,
    pub v: Array4<f32>,
    pub delta_u: Array3<f32>,
    pub phase_u: Array3<f32>,
    pub phase_s: Array3<f32>,
    pub delta_v: Array3<f32>,
    pub phase_v: Array3<f32>,
    pub s_scale: Array3<f32>,
    pub voltage_u: Array3<f32>,
    pub voltage_s: Array3<f32>,
    pub voltage_v: Array3<f32>,
    decomposer: RealUnitaryDecomposer,
}

impl BlockParams {
    pub fn new(
        grid_rows: usize,
        grid_cols: usize,
        block: usize,
        alg: DecomposeAlg,
        gamma: f32,
    ) -> Self {
        let phase_len = mesh_vector_len(block);
        Self {
            grid_rows,
            grid_cols,
            block,
            gamma,
            weight: Array4::zeros((grid_rows, grid_cols, block, block)),
            u: Array4::zeros((grid_rows, grid_cols, block, block)),
            s: Array3::zeros((grid_rows, grid_cols, block)),
            v: Array4::zeros((grid_rows, grid_cols, block, block)),
            delta_u: Array3::zeros((grid_rows, grid_cols, block)),
            phase_u: Array3::zeros((grid_rows, grid_cols, phase_len)),
            phase_s: Array3::zeros((grid_rows, grid_cols, block)),
            delta_v: Array3::zeros((grid_rows, grid_cols, block)),
            phase_v: Array3::zeros((grid_rows, grid_cols, phase_len)),
            s_scale: Array3::zeros((grid_rows, grid_cols, 1)),
            voltage_u: Array3::zeros((grid_rows, grid_cols, phase_len)),
            voltage_s: Array3::zeros((grid_rows, grid_cols, block)),
            voltage_v: Array3::zeros((grid_rows, grid_cols, phase_len)),
            decomposer: RealUnitaryDecomposer::new(alg),
        }
    }

    pub fn decomposer(&self) -> &RealUnitaryDecomposer {
        &self.decomposer
    }

    /// weight → usv. 블록별 완전 SVD. 미분 가능 경로.
    pub fn build_usv_from_weight(&mut self) -> Result<(), String> {
        let (gr, gc, k) = (self.grid_rows, self.grid_cols, self.block);
        let cells: Vec<(usize, usize)> = (0..gr)
            .flat_map(|r| (0..gc).map(move |c| (r, c)))
            .collect();
        let results: Result<Vec<_>, String> = cells
            .par_iter()
            .map(|&(r, c)| {
                let block = view_to_dmatrix(self.weight.slice(s![r, c, .., ..]));
                let svd = block.svd(true, true);
                let u = svd.u.ok_or("SVD U 행렬이 계산되지 않음")?;
                let v_t = svd.v_t.ok_or("SVD V^T 행렬이 계산되지 않음")?;
                Ok((r, c, u, svd.singular_values, v_t))
            })
            .collect();
        for (r, c, u, sv, v_t) in results? {
            for i in 0..k {
                self.s[[r, c, i]] = sv[i];
                for j in 0..k {
                    self.u[[r, c, i, j]] = u[(i, j)];
                    self.v[[r, c, i, j]] = v_t[(i, j)];
                }
            }
        }
        Ok(())
    }

    /// usv → weight. `W = U · diag(S) · V`. 미분 가능 경로.
    pub fn build_weight_from_usv(&mut self) {
        let (gr, gc, k) = (self.grid_rows, self.grid_cols, self.block);
        for r in 0..gr {
            for c in 0..gc {
                for i in 0..k {
                    for j in 0..k {
                        let mut acc = 0.0;
                        for m in 0..k {
                            acc += self.u[[r, c, i, m]] * self.s[[r, c, m]] * self.v[[r, c, m, j]];
                        }
                        self.weight[[r, c, i, j]] = acc;
                    }
                }
            }
        }
    }

    /// usv → phase. U와 V를 독립적으로 분해하고 S를 코사인 감쇠로 부호화.
    /// 스냅샷 전용 (미분 불가).
    pub fn build_phase_from_usv(&mut self) -> Result<(), String> {
        let (delta_u, phi_u) = self.decomposer.decompose_batch(self.u.view())?;
        self.delta_u = delta_u;
        self.phase_u = self.decomposer.m2v_batch(phi_u.view())?;

        let (delta_v, phi_v) = self.decomposer.decompose_batch(self.v.view())?;
        self.delta_v = delta_v;
        self.phase_v = self.decomposer.m2v_batch(phi_v.view())?;

        // s_scale = max|S|, phase_s = acos(S / s_scale).
        // 모두 0인 블록은 스케일 0으로 두고 위상을 0에 고정한다 (NaN 방지).
        let (gr, gc, k) = (self.grid_rows, self.grid_cols, self.block);
        for r in 0..gr {
            for c in 0..gc {
                let mut scale = 0.0f32;
                for i in 0..k {
                    scale = scale.max(self.s[[r, c, i]].abs());
                }
                self.s_scale[[r, c, 0]] = scale;
                for i in 0..k {
                    self.phase_s[[r, c, i]] = if scale > 0.0 {
                        (self.s[[r, c, i]] / scale).clamp(-1.0, 1.0).acos()
                    } else {
                        0.0
                    };
                }
            }
        }
        Ok(())
    }

    /// phase → usv. 전달된 위상 텐서로 재구성한다.
    /// 생략된 하위 경로는 캐시된 U/S/V를 그대로 둔다.
    pub fn build_usv_from_phase(
        &mut self,
        phase_u: &Array3<f32>,
        phase_s: &Array3<f32>,
        phase_v: &Array3<f32>,
        update_list: UpdateList,
    ) -> Result<(), String> {
        if update_list.phase_u {
            let phi = self.decomposer.v2m_batch(phase_u.view(), self.block)?;
            self.u = self
                .decomposer
                .reconstruct_batch(self.delta_u.view(), phi.view())?;
        }
        if update_list.phase_v {
            let phi = self.decomposer.v2m_batch(phase_v.view(), self.block)?;
            self.v = self
                .decomposer
                .reconstruct_batch(self.delta_v.view(), phi.view())?;
        }
        if update_list.phase_s {
            let (gr, gc, k) = (self.grid_rows, self.grid_cols, self.block);
            if phase_s.dim() != (gr, gc, k) {
                return Err(format!(
                    "phase_s 차원 불일치: {:?} vs ({}, {}, {})",
                    phase_s.dim(),
                    gr,
                    gc,
                    k
                ));
            }
            for r in 0..gr {
                for c in 0..gc {
                    let scale = self.s_scale[[r, c, 0]];
                    for i in 0..k {
                        self.s[[r, c, i]] = scale * phase_s[[r, c, i]].cos();
                    }
                }
            }
        }
        Ok(())
    }

    /// phase → weight 체인
    pub fn build_weight_from_phase(
        &mut self,
        phase_u: &Array3<f32>,
        phase_s: &Array3<f32>,
        phase_v: &Array3<f32>,
        update_list: UpdateList,
    ) -> Result<(), String> {
        self.build_usv_from_phase(phase_u, phase_s, phase_v, update_list)?;
        self.build_weight_from_usv();
        Ok(())
    }

    /// weight → phase 체인
    pub fn build_phase_from_weight(&mut self) -> Result<(), String> {
        self.build_usv_from_weight()?;
        self.build_phase_from_usv()
    }

    /// phase → voltage. 성분별로 서로 다른 감마를 허용한다.
    pub fn build_voltage_from_phase(&mut self, gamma_u: f32, gamma_s: f32, gamma_v: f32) {
        self.voltage_u = phase_to_voltage_batch(&self.phase_u, gamma_u);
        self.voltage_s = phase_to_voltage_batch(&self.phase_s, gamma_s);
        self.voltage_v = phase_to_voltage_batch(&self.phase_v, gamma_v);
    }

    /// voltage → phase 역사상 (2π 법으로 위상 보존)
    pub fn build_phase_from_voltage(&mut self, gamma_u: f32, gamma_s: f32, gamma_v: f32) {
        self.phase_u = voltage_to_phase_batch(&self.voltage_u, gamma_u);
        self.phase_s = voltage_to_phase_batch(&self.voltage_s, gamma_s);
        self.phase_v = voltage_to_phase_batch(&self.voltage_v, gamma_v);
    }

    /// 단일 블록을 밀집 행렬로 꺼낸다 (검증/테스트용)
    pub fn weight_block(&self, r: usize, c: usize) -> DMatrix<f32> {
        view_to_dmatrix(self.weight.slice(s![r, c, .., ..]))
    }
}
