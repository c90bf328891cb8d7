use crate::core::decomposer::DecomposeAlg;
use crate::core::params::Mode;
use crate::nn::{MziBlockConv2d, MziConv2dConfig, MziLayerConfig};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn plain_config(mode: Mode) -> MziConv2dConfig {
    MziConv2dConfig {
        layer: MziLayerConfig {
            miniblock: 4,
            mode,
            decompose_alg: DecomposeAlg::Clements,
            use_bias: false,
            photodetect: false,
            seed: 5,
        },
        stride: (1, 1),
        padding: (0, 0),
        dilation: (1, 1),
    }
}

#[test]
fn test_output_dim() {
    let conv = MziBlockConv2d::new(2, 3, (3, 3), Some(plain_config(Mode::Weight))).unwrap();
    assert_eq!(conv.get_output_dim(8, 8), (6, 6));

    let mut config = plain_config(Mode::Weight);
    config.padding = (1, 1);
    config.stride = (2, 2);
    let conv = MziBlockConv2d::new(2, 3, (3, 3), Some(config)).unwrap();
    assert_eq!(conv.get_output_dim(8, 8), (4, 4));
}

#[test]
fn test_one_by_one_kernel_equals_channel_mix() {
    // 1×1 커널 합성곱은 픽셀별 채널 혼합과 같다
    let mut rng = StdRng::seed_from_u64(2);
    let (in_c, out_c) = (3, 2);
    let weights: Vec<f32> = (0..out_c * in_c).map(|_| rng.gen_range(-0.5..0.5)).collect();
    let mut conv = MziBlockConv2d::from_weights(
        &weights,
        None,
        in_c,
        out_c,
        (1, 1),
        Some(plain_config(Mode::Phase)),
    )
    .unwrap();

    let x = Array4::from_shape_fn((1, in_c, 3, 3), |_| rng.gen_range(-1.0f32..1.0));
    let y = conv.forward(&x).unwrap();
    assert_eq!(y.dim(), (1, out_c, 3, 3));

    for oc in 0..out_c {
        for h in 0..3 {
            for w in 0..3 {
                let mut expected = 0.0;
                for ic in 0..in_c {
                    expected += weights[oc * in_c + ic] * x[[0, ic, h, w]];
                }
                assert!(
                    (y[[0, oc, h, w]] - expected).abs() < 1e-3,
                    "({}, {}, {}) 불일치: {} vs {}",
                    oc,
                    h,
                    w,
                    y[[0, oc, h, w]],
                    expected
                );
            }
        }
    }
}

#[test]
fn test_padded_conv_matches_reference() {
    let mut rng = StdRng::seed_from_u64(4);
    let (in_c, out_c, kh, kw) = (2, 2, 3, 3);
    let weights: Vec<f32> = (0..out_c * in_c * kh * kw)
        .map(|_| rng.gen_range(-0.3..0.3))
        .collect();
    let bias: Vec<f32> = (0..out_c).map(|_| rng.gen_range(-0.1..0.1)).collect();

    let mut config = plain_config(Mode::Weight);
    config.padding = (1, 1);
    config.layer.use_bias = true;
    let mut conv =
        MziBlockConv2d::from_weights(&weights, Some(&bias), in_c, out_c, (kh, kw), Some(config))
            .unwrap();

    let x = Array4::from_shape_fn((2, in_c, 4, 4), |_| rng.gen_range(-1.0f32..1.0));
    let y = conv.forward(&x).unwrap();
    assert_eq!(y.dim(), (2, out_c, 4, 4));

    // 독립 참조 구현과 비교
    for n in 0..2 {
        for oc in 0..out_c {
            for oh in 0..4usize {
                for ow in 0..4usize {
                    let mut expected = bias[oc];
                    for ic in 0..in_c {
                        for ki in 0..kh {
                            for kj in 0..kw {
                                let ih = oh as isize + ki as isize - 1;
                                let iw = ow as isize + kj as isize - 1;
                                if ih < 0 || iw < 0 || ih >= 4 || iw >= 4 {
                                    continue;
                                }
                                let flat = ic * kh * kw + ki * kw + kj;
                                expected +=
                                    x[[n, ic, ih as usize, iw as usize]] * weights[oc * in_c * kh * kw + flat];
                            }
                        }
                    }
                    assert!(
                        (y[[n, oc, oh, ow]] - expected).abs() < 1e-4,
                        "({}, {}, {}, {}) 불일치",
                        n,
                        oc,
                        oh,
                        ow
                    );
                }
            }
        }
    }
}

#[test]
fn test_photodetect_squares_output() {
    let mut config = plain_config(Mode::Weight);
    config.layer.photodetect = true;
    let mut conv = MziBlockConv2d::new(1, 1, (1, 1), Some(config)).unwrap();
    let x = Array4::from_elem((1, 1, 2, 2), 1.0f32);
    let y = conv.forward(&x).unwrap();
    // 광검출기는 진폭을 제곱하므로 출력은 음수가 될 수 없다
    assert!(y.iter().all(|&v| v >= 0.0));
}
