//! MZI 블록 선형 레이어
//!
//! 가중치를 `k×k` 블록 격자로 자르고 각 블록을 MZI 메시로 파라미터화한다.
//! 활성 모드가 phase면 가중치를 읽을 때마다 양자화기가 즉석에서 적용되며
//! 저장된 위상 값 자체는 덮어쓰지 않는다.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::decomposer::DecomposeAlg;

use crate::core::math::{gen_gaussian_noise, kaiming_normal_4d};
use crate::core::matrix::{merge_chunks_trimmed, partition_chunks};
use crate::core::params::{BlockParams, Mode, ModePayload, UpdateList};
use crate::core::quantizer::{MeshMode, PhaseQuantizer};

use super::snapshot::LayerSnapshot;

/// 소자 구동 한계 전압 (V)
pub const V_MAX: f32 = 10.8;
/// π 위상 이동에 필요한 전압 (V)
pub const V_PI: f32 = 4.36;

/// MZI 선형 레이어 설정
#[derive(Debug, Clone)]
pub struct MziLayerConfig {
    pub miniblock: usize,
    pub mode: Mode,
    pub decompose_alg: DecomposeAlg,
    pub use_bias: bool,
    pub photodetect: bool,
    pub seed: u64,
}

impl Default for MziLayerConfig {
    fn default() -> Self {
        Self {
            miniblock: 4,
            mode: Mode::Weight,
            decompose_alg: DecomposeAlg::Clements,
            use_bias: true,
            photodetect: true,
            seed: 0,
        }
    }
}

/// MZI 블록 선형 레이어
#[derive(Debug, Clone)]
pub struct MziBlockLinear {
    pub in_features: usize,
    pub out_features: usize,
    pub miniblock: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub in_features_pad: usize,
    pub out_features_pad: usize,
    pub mode: Mode,
    pub params: BlockParams,
    pub bias: Option<Vec<f32>>,
    pub gamma: f32,
    pub w_bit: u32,
    pub gamma_noise_std: f32,
    pub crosstalk_factor: f32,
    pub phase_noise_std: f32,
    pub photodetect: bool,
    noise_random_state: u64,
    phase_u_quantizer: PhaseQuantizer,
    phase_s_quantizer: PhaseQuantizer,
    phase_v_quantizer: PhaseQuantizer,
    phase_noise_rng: StdRng,
    cached_weight: Option<Array2<f32>>,
}

impl MziBlockLinear {
    pub fn new(
        in_features: usize,
        out_features: usize,
        config: Option<MziLayerConfig>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config.unwrap_or_default();
        if config.miniblock == 0 {
            return Err("miniblock은 0일 수 없음".into());
        }
        if config.mode == Mode::Voltage {
            return Err("voltage 모드의 순전파 경로는 지원되지 않음".into());
        }
        let k = config.miniblock;
        let grid_rows = out_features.div_ceil(k);
        let grid_cols = in_features.div_ceil(k);
        let gamma = std::f32::consts::PI / (V_PI * V_PI);
        let (mesh_mode, crosstalk_filter_size) = match config.decompose_alg {
            DecomposeAlg::Clements => (MeshMode::Rectangle, 5),
            DecomposeAlg::Francis => (MeshMode::Triangle, 3),
        };

        let make_quantizer = |mode: MeshMode, size: usize| {
            PhaseQuantizer::new(32, V_PI, V_MAX, 0.0, 0.0, size, 0, mode)
        };

        let mut layer = Self {
            in_features,
            out_features,
            miniblock: k,
            grid_rows,
            grid_cols,
            in_features_pad: grid_cols * k,
            out_features_pad: grid_rows * k,
            mode: config.mode,
            params: BlockParams::new(grid_rows, grid_cols, k, config.decompose_alg, gamma),
            bias: if config.use_bias {
                Some(vec![0.0; out_features])
            } else {
                None
            },
            gamma,
            w_bit: 32,
            gamma_noise_std: 0.0,
            crosstalk_factor: 0.0,
            phase_noise_std: 0.0,
            photodetect: config.photodetect,
            noise_random_state: 0,
            phase_u_quantizer: make_quantizer(mesh_mode, crosstalk_filter_size),
            phase_s_quantizer: make_quantizer(MeshMode::Diagonal, crosstalk_filter_size),
            phase_v_quantizer: make_quantizer(mesh_mode, crosstalk_filter_size),
            phase_noise_rng: StdRng::seed_from_u64(0),
            cached_weight: None,
        };
        layer.reset_parameters(config.seed)?;
        Ok(layer)
    }

    /// 모드에 맞는 초기화. Kaiming 정규로 가중치를 뽑고 활성 표현을 채운다.
    pub fn reset_parameters(&mut self, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let shape = (
            self.grid_rows,
            self.grid_cols,
            self.miniblock,
            self.miniblock,
        );
        self.params.weight = kaiming_normal_4d(shape, self.in_features.max(1), &mut rng);
        match self.mode {
            Mode::Weight => {}
            Mode::Usv => {
                self.params.build_usv_from_weight()?;
                // usv 모드는 단위 특이값에서 학습을 시작한다
                self.params.s.fill(1.0);
                self.params.build_weight_from_usv();
            }
            Mode::Phase => {
                self.params.build_phase_from_weight()?;
            }
            Mode::Voltage => {
                return Err("voltage 모드는 초기화를 지원하지 않음".into());
            }
        }
        if let Some(bias) = &mut self.bias {
            bias.iter_mut().for_each(|b| *b = 0.0);
        }
        self.cached_weight = None;
        Ok(())
    }

    /// 기존 밀집 레이어 가중치에서 생성한다 (weight → usv → phase 동기화 1회)
    pub fn from_weights(
        weights: &[f32],
        bias: Option<&[f32]>,
        in_features: usize,
        out_features: usize,
        config: Option<MziLayerConfig>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if weights.len() != in_features * out_features {
            return Err(format!(
                "가중치 크기 불일치: {} vs {}x{}",
                weights.len(),
                out_features,
                in_features
            )
            .into());
        }
        let mut layer = Self::new(in_features, out_features, config)?;
        let dense = Array2::from_shape_vec((out_features, in_features), weights.to_vec())?;
        layer.params.weight = partition_chunks(dense.view(), layer.miniblock)?;
        layer.sync_parameters(Mode::Weight)?;
        if let Some(b) = bias {
            if b.len() != out_features {
                return Err(format!("편향 크기 불일치: {} vs {}", b.len(), out_features).into());
            }
            layer.bias = Some(b.to_vec());
        }
        Ok(layer)
    }

    /// 소스 표현에서 나머지 모든 표현을 동기화한다
    pub fn sync_parameters(&mut self, src: Mode) -> Result<(), Box<dyn std::error::Error>> {
        match src {
            Mode::Weight => {
                self.params.build_phase_from_weight()?;
            }
            Mode::Usv => {
                self.params.build_phase_from_usv()?;
                self.params.build_weight_from_usv();
            }
            Mode::Phase => {
                let (phase_u, phase_s, phase_v) = self.effective_phases();
                self.params
                    .build_weight_from_phase(&phase_u, &phase_s, &phase_v, UpdateList::all())?;
            }
            Mode::Voltage => {
                return Err("voltage 소스 동기화는 지원되지 않음".into());
            }
        }
        self.cached_weight = None;
        Ok(())
    }

    /// 읽기 시점 양자화: 저장된 위상은 그대로 두고 양자화된 사본을 돌려준다
    fn effective_phases(
        &mut self,
    ) -> (
        ndarray::Array3<f32>,
        ndarray::Array3<f32>,
        ndarray::Array3<f32>,
    ) {
        let quantize_on =
            self.w_bit < 16 || self.gamma_noise_std > 1e-5 || self.crosstalk_factor > 1e-5;
        let mut phase_u = if quantize_on {
            self.phase_u_quantizer.quantize(&self.params.phase_u)
        } else {
            self.params.phase_u.clone()
        };
        let phase_s = if quantize_on {
            self.phase_s_quantizer.quantize(&self.params.phase_s)
        } else {
            self.params.phase_s.clone()
        };
        let mut phase_v = if quantize_on {
            self.phase_v_quantizer.quantize(&self.params.phase_v)
        } else {
            self.params.phase_v.clone()
        };
        if self.phase_noise_std > 1e-5 {
            // phase_s는 보호된다고 가정
            let std = self.phase_noise_std;
            let trunc = Some((-2.0 * std, 2.0 * std));
            let noise_u =
                gen_gaussian_noise(phase_u.dim(), 0.0, std, trunc, &mut self.phase_noise_rng);
            let noise_v =
                gen_gaussian_noise(phase_v.dim(), 0.0, std, trunc, &mut self.phase_noise_rng);
            phase_u += &noise_u;
            phase_v += &noise_v;
        }
        (phase_u, phase_s, phase_v)
    }

    /// 활성 모드에서 밀집 가중치 `[out, in]`을 물질화한다
    pub fn build_weight(
        &mut self,
        update_list: UpdateList,
    ) -> Result<Array2<f32>, Box<dyn std::error::Error>> {
        match self.mode {
            Mode::Weight => {}
            Mode::Usv => {
                self.params.build_weight_from_usv();
            }
            Mode::Phase => {
                let (phase_u, phase_s, phase_v) = self.effective_phases();
                self.params
                    .build_weight_from_phase(&phase_u, &phase_s, &phase_v, update_list)?;
            }
            Mode::Voltage => {
                return Err("voltage 모드의 순전파 경로는 지원되지 않음".into());
            }
        }
        Ok(merge_chunks_trimmed(
            self.params.weight.view(),
            self.out_features,
            self.in_features,
        )?)
    }

    /// 가중치 캐시 미리 생성
    pub fn preload_weight(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let weight = self.build_weight(UpdateList::all())?;
        self.cached_weight = Some(weight);
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.cached_weight = None;
    }

    /// 순전파. 캐시가 없으면 매 호출 가중치를 다시 물질화한다.
    pub fn forward(&mut self, input: &[f32]) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        if input.len() != self.in_features {
            return Err(
                format!("입력 크기 불일치: {} vs {}", input.len(), self.in_features).into(),
            );
        }
        let weight = match self.cached_weight.clone() {
            Some(w) => w,
            None => self.build_weight(UpdateList::all())?,
        };
        let mut output = vec![0.0f32; self.out_features];
        for (o, out_val) in output.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (i, &x) in input.iter().enumerate() {
                acc += weight[[o, i]] * x;
            }
            *out_val = acc;
        }
        if self.photodetect {
            output.iter_mut().for_each(|y| *y = *y * *y);
        }
        if let Some(bias) = &self.bias {
            for (y, &b) in output.iter_mut().zip(bias.iter()) {
                *y += b;
            }
        }
        Ok(output)
    }

    /// 배치 순전파
    pub fn forward_batch(
        &mut self,
        inputs: &[Vec<f32>],
    ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            outputs.push(self.forward(input)?);
        }
        Ok(outputs)
    }

    /// 감마 변이 노이즈 재설정. 같은 (std, random_state)는 같은 노이즈를 재현한다.
    pub fn set_gamma_noise(&mut self, noise_std: f32, random_state: u64) {
        self.gamma_noise_std = noise_std;
        self.noise_random_state = random_state;
        self.phase_u_quantizer
            .set_gamma_noise(noise_std, self.params.phase_u.dim(), random_state);
        self.phase_s_quantizer
            .set_gamma_noise(noise_std, self.params.phase_s.dim(), random_state);
        self.phase_v_quantizer
            .set_gamma_noise(noise_std, self.params.phase_v.dim(), random_state);
        self.cached_weight = None;
    }

    pub fn set_crosstalk_factor(&mut self, crosstalk_factor: f32) {
        self.crosstalk_factor = crosstalk_factor;
        self.phase_u_quantizer.set_crosstalk_factor(crosstalk_factor);
        self.phase_s_quantizer.set_crosstalk_factor(crosstalk_factor);
        self.phase_v_quantizer.set_crosstalk_factor(crosstalk_factor);
        self.cached_weight = None;
    }

    pub fn set_weight_bitwidth(&mut self, w_bit: u32) {
        self.w_bit = w_bit;
        self.phase_u_quantizer.set_bitwidth(w_bit);
        self.phase_s_quantizer.set_bitwidth(w_bit);
        self.phase_v_quantizer.set_bitwidth(w_bit);
        self.cached_weight = None;
    }

    /// 위상 자체에 더해지는 가우시안 변동 (±2σ 절단)
    pub fn set_phase_variation(&mut self, noise_std: f32, random_state: u64) {
        self.phase_noise_std = noise_std;
        self.phase_noise_rng = StdRng::seed_from_u64(random_state);
        self.cached_weight = None;
    }

    /// 활성 모드에서 학습 가능한 파라미터 이름들
    pub fn trainable_parameters(&self) -> Vec<&'static str> {
        match self.mode {
            Mode::Weight => vec!["weight"],
            Mode::Usv => vec!["u", "s", "v"],
            Mode::Phase => vec!["phase_u", "phase_s", "phase_v", "s_scale"],
            Mode::Voltage => vec![
                "voltage_u",
                "voltage_s",
                "voltage_v",
                "s_scale",
            ],
        }
    }

    /// 학습되지 않는 캐시 버퍼 이름들
    pub fn buffers(&self) -> Vec<&'static str> {
        let trainable = self.trainable_parameters();
        [
            "weight", "u", "s", "v", "delta_u", "phase_u", "phase_s", "delta_v", "phase_v",
            "s_scale", "voltage_u", "voltage_s", "voltage_v",
        ]
        .into_iter()
        .filter(|name| !trainable.contains(name))
        .collect()
    }

    /// 활성 모드 버퍼 + 설정 스칼라 스냅샷
    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            payload: ModePayload::capture(&self.params, self.mode),
            w_bit: self.w_bit,
            gamma_noise_std: self.gamma_noise_std,
            noise_random_state: self.noise_random_state,
            crosstalk_factor: self.crosstalk_factor,
            phase_noise_std: self.phase_noise_std,
        }
    }

    /// 스냅샷 복원 후 나머지 표현을 재동기화한다
    pub fn restore(&mut self, snapshot: &LayerSnapshot) -> Result<(), Box<dyn std::error::Error>> {
        if snapshot.payload.mode() != self.mode {
            return Err(format!(
                "스냅샷 모드 불일치: {} vs {}",
                snapshot.payload.mode(),
                self.mode
            )
            .into());
        }
        snapshot.payload.restore(&mut self.params)?;
        self.set_weight_bitwidth(snapshot.w_bit);
        self.set_crosstalk_factor(snapshot.crosstalk_factor);
        self.set_gamma_noise(snapshot.gamma_noise_std, snapshot.noise_random_state);
        self.phase_noise_std = snapshot.phase_noise_std;
        self.sync_parameters(self.mode)?;
        Ok(())
    }
}
