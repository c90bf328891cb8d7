//! 초기화와 노이즈 생성 헬퍼

use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Kaiming 정규 초기화: `N(0, sqrt(2 / fan_in))`
pub fn kaiming_normal_4d(
    shape: (usize, usize, usize, usize),
    fan_in: usize,
    rng: &mut StdRng,
) -> Array4<f32> {
    let std = (2.0 / fan_in.max(1) as f32).sqrt();
    Array4::from_shape_fn(shape, |_| {
        let z: f32 = rng.sample(StandardNormal);
        z * std
    })
}

/// 절단 가우시안 노이즈 텐서. `trunc`가 있으면 해당 구간으로 클램프한다.
pub fn gen_gaussian_noise(
    shape: (usize, usize, usize),
    mean: f32,
    std: f32,
    trunc: Option<(f32, f32)>,
    rng: &mut StdRng,
) -> Array3<f32> {
    if std <= 0.0 {
        return Array3::from_elem(shape, mean);
    }
    Array3::from_shape_fn(shape, |_| {
        let z: f32 = rng.sample(StandardNormal);
        let x = mean + z * std;
        match trunc {
            Some((lo, hi)) => x.clamp(lo, hi),
            None => x,
        }
    })
}
