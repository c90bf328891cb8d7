//! MZI 블록 합성곱 레이어
//!
//! `(C_in, kh, kw)`를 펼친 축을 입력으로 하는 블록 선형 파라미터화를
//! 그대로 쓰고, 순전파만 물질화된 밀집 가중치로 직접 합성곱한다.

use ndarray::Array4;

use crate::core::params::{Mode, UpdateList};

use super::linear::{MziBlockLinear, MziLayerConfig};
use super::snapshot::LayerSnapshot;

/// MZI 합성곱 레이어 설정
#[derive(Debug, Clone)]
pub struct MziConv2dConfig {
    pub layer: MziLayerConfig,
    pub stride: (usize, usize),
    pub padding: (usize, usize),
    pub dilation: (usize, usize),
}

impl Default for MziConv2dConfig {
    fn default() -> Self {
        Self {
            layer: MziLayerConfig::default(),
            stride: (1, 1),
            padding: (0, 0),
            dilation: (1, 1),
        }
    }
}

/// MZI 블록 합성곱 레이어
#[derive(Debug, Clone)]
pub struct MziBlockConv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: (usize, usize),
    pub stride: (usize, usize),
    pub padding: (usize, usize),
    pub dilation: (usize, usize),
    pub in_channels_flat: usize,
    pub linear: MziBlockLinear,
}

impl MziBlockConv2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        config: Option<MziConv2dConfig>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config.unwrap_or_default();
        let in_channels_flat = in_channels * kernel_size.0 * kernel_size.1;
        let linear = MziBlockLinear::new(in_channels_flat, out_channels, Some(config.layer))?;
        Ok(Self {
            in_channels,
            out_channels,
            kernel_size,
            stride: config.stride,
            padding: config.padding,
            dilation: config.dilation,
            in_channels_flat,
            linear,
        })
    }

    /// 기존 합성곱 가중치 `[out_c, in_c, kh, kw]`(행 우선 평탄화)에서 생성
    pub fn from_weights(
        weights: &[f32],
        bias: Option<&[f32]>,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        config: Option<MziConv2dConfig>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config.unwrap_or_default();
        let in_channels_flat = in_channels * kernel_size.0 * kernel_size.1;
        if weights.len() != out_channels * in_channels_flat {
            return Err(format!(
                "가중치 크기 불일치: {} vs {}x{}",
                weights.len(),
                out_channels,
                in_channels_flat
            )
            .into());
        }
        let linear = MziBlockLinear::from_weights(
            weights,
            bias,
            in_channels_flat,
            out_channels,
            Some(config.layer),
        )?;
        Ok(Self {
            in_channels,
            out_channels,
            kernel_size,
            stride: config.stride,
            padding: config.padding,
            dilation: config.dilation,
            in_channels_flat,
            linear,
        })
    }

    pub fn mode(&self) -> Mode {
        self.linear.mode
    }

    /// 출력 공간 크기
    pub fn get_output_dim(&self, img_height: usize, img_width: usize) -> (usize, usize) {
        let h = (img_height + 2 * self.padding.0)
            .saturating_sub(self.dilation.0 * (self.kernel_size.0 - 1) + 1)
            / self.stride.0
            + 1;
        let w = (img_width + 2 * self.padding.1)
            .saturating_sub(self.dilation.1 * (self.kernel_size.1 - 1) + 1)
            / self.stride.1
            + 1;
        (h, w)
    }

    /// 순전파: `[N, C, H, W]` → `[N, out_c, H', W']`
    pub fn forward(&mut self, x: &Array4<f32>) -> Result<Array4<f32>, Box<dyn std::error::Error>> {
        let (batch, channels, height, width) = x.dim();
        if channels != self.in_channels {
            return Err(format!(
                "입력 채널 불일치: {} vs {}",
                channels, self.in_channels
            )
            .into());
        }
        let weight = self.linear.build_weight(UpdateList::all())?;
        let (h_out, w_out) = self.get_output_dim(height, width);
        let (kh, kw) = self.kernel_size;
        let (sh, sw) = self.stride;
        let (ph, pw) = self.padding;
        let (dh, dw) = self.dilation;

        let mut out = Array4::zeros((batch, self.out_channels, h_out, w_out));
        for n in 0..batch {
            for oc in 0..self.out_channels {
                for oh in 0..h_out {
                    for ow in 0..w_out {
                        let mut acc = 0.0f32;
                        for ic in 0..self.in_channels {
                            for ki in 0..kh {
                                for kj in 0..kw {
                                    let ih = (oh * sh + ki * dh) as isize - ph as isize;
                                    let iw = (ow * sw + kj * dw) as isize - pw as isize;
                                    if ih < 0
                                        || iw < 0
                                        || ih >= height as isize
                                        || iw >= width as isize
                                    {
                                        continue;
                                    }
                                    let flat = ic * kh * kw + ki * kw + kj;
                                    acc += x[[n, ic, ih as usize, iw as usize]]
                                        * weight[[oc, flat]];
                                }
                            }
                        }
                        out[[n, oc, oh, ow]] = acc;
                    }
                }
            }
        }

        if self.linear.photodetect {
            out.mapv_inplace(|y| y * y);
        }
        if let Some(bias) = &self.linear.bias {
            for n in 0..batch {
                for oc in 0..self.out_channels {
                    for oh in 0..h_out {
                        for ow in 0..w_out {
                            out[[n, oc, oh, ow]] += bias[oc];
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    // 파라미터화 관련 동작은 내부 선형 기계에 위임한다

    pub fn sync_parameters(&mut self, src: Mode) -> Result<(), Box<dyn std::error::Error>> {
        self.linear.sync_parameters(src)
    }

    pub fn set_gamma_noise(&mut self, noise_std: f32, random_state: u64) {
        self.linear.set_gamma_noise(noise_std, random_state);
    }

    pub fn set_crosstalk_factor(&mut self, crosstalk_factor: f32) {
        self.linear.set_crosstalk_factor(crosstalk_factor);
    }

    pub fn set_weight_bitwidth(&mut self, w_bit: u32) {
        self.linear.set_weight_bitwidth(w_bit);
    }

    pub fn set_phase_variation(&mut self, noise_std: f32, random_state: u64) {
        self.linear.set_phase_variation(noise_std, random_state);
    }

    pub fn trainable_parameters(&self) -> Vec<&'static str> {
        self.linear.trainable_parameters()
    }

    pub fn snapshot(&self) -> LayerSnapshot {
        self.linear.snapshot()
    }

    pub fn restore(&mut self, snapshot: &LayerSnapshot) -> Result<(), Box<dyn std::error::Error>> {
        self.linear.restore(snapshot)
    }
}
