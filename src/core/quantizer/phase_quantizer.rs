//! 위상 양자화기 본체

use ndarray::{s, Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::core::mesh::{
    checkerboard_to_vector, upper_triangle_to_vector, vector_to_checkerboard,
    vector_to_upper_triangle, MeshPlan,
};

/// 크로스토크 결합이 일어나는 메시 배치 종류
///
/// Diagonal은 S 경로(대각 감쇠) 전용으로, 메시 배치가 없어 크로스토크를
/// 절대 적용하지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MeshMode {
    Rectangle,
    Triangle,
    Diagonal,
}

/// 위상 텐서 `[grid_rows, grid_cols, L]`에 대한 하드웨어 충실도 양자화기
///
/// 감마 변이 노이즈는 `set_gamma_noise` 호출 시점에 한 번 샘플링되어
/// 다음 호출까지 고정 재사용된다 (읽을 때마다 재샘플링하지 않음).
#[derive(Debug, Clone)]
pub struct PhaseQuantizer {
    pub bit: u32,
    pub v_pi: f32,
    pub v_max: f32,
    pub gamma: f32,
    pub gamma_noise_std: f32,
    pub crosstalk_factor: f32,
    pub crosstalk_filter_size: usize,
    pub mode: MeshMode,
    random_state: u64,
    noise: Option<Array3<f32>>,
}

impl PhaseQuantizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bit: u32,
        v_pi: f32,
        v_max: f32,
        gamma_noise_std: f32,
        crosstalk_factor: f32,
        crosstalk_filter_size: usize,
        random_state: u64,
        mode: MeshMode,
    ) -> Self {
        Self {
            bit,
            v_pi,
            v_max,
            gamma: std::f32::consts::PI / (v_pi * v_pi),
            gamma_noise_std,
            crosstalk_factor,
            crosstalk_filter_size,
            mode,
            random_state,
            noise: None,
        }
    }

    pub fn set_bitwidth(&mut self, bit: u32) {
        self.bit = bit;
    }

    pub fn set_crosstalk_factor(&mut self, crosstalk_factor: f32) {
        self.crosstalk_factor = crosstalk_factor;
    }

    /// 소자별 감마 변이 노이즈를 재설정한다.
    ///
    /// 같은 (std, shape, random_state)로 다시 호출하면 동일한 노이즈가
    /// 재현된다. std ≤ 0이면 노이즈를 끈다.
    pub fn set_gamma_noise(
        &mut self,
        noise_std: f32,
        shape: (usize, usize, usize),
        random_state: u64,
    ) {
        self.gamma_noise_std = noise_std;
        self.random_state = random_state;
        if noise_std > 0.0 {
            let mut rng = StdRng::seed_from_u64(random_state);
            self.noise = Some(Array3::from_shape_fn(shape, |_| {
                let z: f32 = rng.sample(StandardNormal);
                z * noise_std
            }));
        } else {
            self.noise = None;
        }
    }

    /// 위상 텐서를 물리적으로 실현 가능한 값으로 양자화한다.
    ///
    /// 1. [0, 2π) 래핑 후 `v = sqrt(phase/gamma)`, [0, v_max]로 클리핑
    /// 2. bit < 16이면 전압을 2^bit 균일 레벨로 반올림
    /// 3. 위상 복원 시 감마에 변이 노이즈를 더해 `(gamma+noise)·v²`
    /// 4. 메시 배치 위에서 크로스토크 커널과 컨볼루션 (Diagonal 제외)
    ///
    /// 값을 덮어쓰는 비가역 연산이므로 이 함수의 도함수는 항등으로
    /// 정의한다(straight-through estimator). 입력이 유한하면 출력도 항상
    /// 유한하며 에러를 내지 않는다.
    pub fn quantize(&self, phases: &Array3<f32>) -> Array3<f32> {
        let rounding = self.bit < 16;
        let noisy = self.gamma_noise_std > 1e-5
            && self
                .noise
                .as_ref()
                .map(|n| n.dim() == phases.dim())
                .unwrap_or(false);
        let coupled = self.crosstalk_factor > 1e-5 && self.mode != MeshMode::Diagonal;
        if !rounding && !noisy && !coupled {
            return phases.clone();
        }

        let mut voltage = phases.mapv(|p| {
            super::voltage::phase_to_voltage(p, self.gamma).clamp(0.0, self.v_max)
        });
        if rounding {
            // bit=0도 유한해야 하므로 레벨 수는 최소 1
            let levels = ((1u32 << self.bit) - 1).max(1);
            let step = self.v_max / levels as f32;
            voltage.mapv_inplace(|v| (v / step).round() * step);
        }

        let mut out = match (noisy, self.noise.as_ref()) {
            (true, Some(noise)) => {
                let mut out = voltage;
                ndarray::Zip::from(&mut out).and(noise).for_each(|v, &n| {
                    *v = (self.gamma + n) * *v * *v;
                });
                out
            }
            _ => voltage.mapv(|v| self.gamma * v * v),
        };

        if coupled {
            out = self.apply_crosstalk(&out);
        }
        out
    }

    /// 블록별 메시 배치 위 컨볼루션으로 인접 결합을 모델링한다.
    /// 커널은 중심 1, 그 외 crosstalk_factor. 점유되지 않은 칸은 0이라
    /// 결합에 기여하지 않는다.
    fn apply_crosstalk(&self, phases: &Array3<f32>) -> Array3<f32> {
        let (gr, gc, len) = phases.dim();
        let dim = match block_dim_for_len(len) {
            Some(d) => d,
            None => return phases.clone(),
        };
        let plan = match self.mode {
            MeshMode::Rectangle => Some(MeshPlan::new(dim)),
            _ => None,
        };

        let radius = self.crosstalk_filter_size / 2;
        let mut out = phases.clone();
        for r in 0..gr {
            for c in 0..gc {
                let vec = phases.slice(s![r, c, ..]);
                let layout = match &plan {
                    Some(p) => vector_to_checkerboard(vec, p).expect("검증된 길이"),
                    None => vector_to_upper_triangle(vec, dim).expect("검증된 길이"),
                };
                let coupled = convolve_2d(&layout, radius, self.crosstalk_factor);
                let vec_out = match &plan {
                    Some(p) => checkerboard_to_vector(coupled.view(), p).expect("검증된 길이"),
                    None => upper_triangle_to_vector(coupled.view()).expect("정방 배치"),
                };
                out.slice_mut(s![r, c, ..]).assign(&vec_out);
            }
        }
        out
    }
}

/// `L = k(k-1)/2`에서 k를 복원한다. 유효하지 않으면 None.
fn block_dim_for_len(len: usize) -> Option<usize> {
    let dim = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
    if dim >= 1 && dim * (dim - 1) / 2 == len {
        Some(dim)
    } else {
        None
    }
}

/// 제로 패딩 2D 컨볼루션. 커널: 중심 1.0, 반경 radius 내 나머지는 factor.
fn convolve_2d(mat: &Array2<f32>, radius: usize, factor: f32) -> Array2<f32> {
    let (rows, cols) = mat.dim();
    let r = radius as isize;
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let mut acc = 0.0;
        for di in -r..=r {
            for dj in -r..=r {
                let ii = i as isize + di;
                let jj = j as isize + dj;
                if ii < 0 || jj < 0 || ii >= rows as isize || jj >= cols as isize {
                    continue;
                }
                let w = if di == 0 && dj == 0 { 1.0 } else { factor };
                acc += w * mat[[ii as usize, jj as usize]];
            }
        }
        acc
    })
}
