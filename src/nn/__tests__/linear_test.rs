use crate::core::decomposer::DecomposeAlg;
use crate::core::params::{Mode, UpdateList};
use crate::nn::{MziBlockLinear, MziLayerConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn phase_config(alg: DecomposeAlg) -> MziLayerConfig {
    MziLayerConfig {
        miniblock: 4,
        mode: Mode::Phase,
        decompose_alg: alg,
        use_bias: false,
        photodetect: false,
        seed: 3,
    }
}

#[test]
fn test_phase_mode_matches_weight_mode() {
    // 경계 시나리오: k=4, bit=32, 노이즈 0, 크로스토크 0에서
    // phase → weight 물질화가 원래 가중치를 재현한다
    for &alg in &[DecomposeAlg::Francis, DecomposeAlg::Clements] {
        let mut layer = MziBlockLinear::new(8, 8, Some(phase_config(alg))).unwrap();
        let original = crate::core::matrix::merge_chunks_trimmed(
            layer.params.weight.view(),
            8,
            8,
        )
        .unwrap();
        let rebuilt = layer.build_weight(UpdateList::all()).unwrap();
        let err = original
            .iter()
            .zip(rebuilt.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(err < 1e-4, "{:?} 경계 시나리오 오차 {}", alg, err);
    }
}

#[test]
fn test_from_weights_matches_dense_forward() {
    let (out_f, in_f) = (6, 10);
    let mut rng = StdRng::seed_from_u64(8);
    let weights: Vec<f32> = (0..out_f * in_f).map(|_| rng.gen_range(-0.5..0.5)).collect();
    let bias: Vec<f32> = (0..out_f).map(|_| rng.gen_range(-0.1..0.1)).collect();
    let input: Vec<f32> = (0..in_f).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut layer = MziBlockLinear::from_weights(
        &weights,
        Some(&bias),
        in_f,
        out_f,
        Some(phase_config(DecomposeAlg::Clements)),
    )
    .unwrap();
    let output = layer.forward(&input).unwrap();

    for o in 0..out_f {
        let mut expected = bias[o];
        for i in 0..in_f {
            expected += weights[o * in_f + i] * input[i];
        }
        assert!(
            (output[o] - expected).abs() < 1e-3,
            "출력 {} 불일치: {} vs {}",
            o,
            output[o],
            expected
        );
    }
}

#[test]
fn test_bitwidth_quantization_is_read_time_only() {
    let mut layer = MziBlockLinear::new(8, 8, Some(phase_config(DecomposeAlg::Clements))).unwrap();
    let full = layer.build_weight(UpdateList::all()).unwrap();

    layer.set_weight_bitwidth(4);
    let coarse = layer.build_weight(UpdateList::all()).unwrap();
    let max_diff = full
        .iter()
        .zip(coarse.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(max_diff > 1e-5, "4비트 양자화가 아무 효과도 없음");
    assert!(coarse.iter().all(|x| x.is_finite()));

    // 저장된 위상은 덮어쓰지 않으므로 비트폭 복귀 시 원래 가중치로 돌아온다
    layer.set_weight_bitwidth(32);
    let restored = layer.build_weight(UpdateList::all()).unwrap();
    assert_eq!(full, restored);
}

#[test]
fn test_gamma_noise_reproducible_at_layer_level() {
    let mut layer = MziBlockLinear::new(8, 8, Some(phase_config(DecomposeAlg::Clements))).unwrap();
    layer.set_gamma_noise(0.01, 1234);
    let w1 = layer.build_weight(UpdateList::all()).unwrap();
    let w2 = layer.build_weight(UpdateList::all()).unwrap();
    // 노이즈는 set_gamma_noise 시점에 고정된다
    assert_eq!(w1, w2);

    layer.set_gamma_noise(0.01, 1234);
    let w3 = layer.build_weight(UpdateList::all()).unwrap();
    assert_eq!(w1, w3);

    layer.set_gamma_noise(0.01, 9);
    let w4 = layer.build_weight(UpdateList::all()).unwrap();
    assert_ne!(w1, w4);
}

#[test]
fn test_voltage_mode_not_supported() {
    let config = MziLayerConfig {
        mode: Mode::Voltage,
        ..MziLayerConfig::default()
    };
    assert!(MziBlockLinear::new(8, 8, Some(config)).is_err());

    let mut layer = MziBlockLinear::new(8, 8, None).unwrap();
    assert!(layer.sync_parameters(Mode::Voltage).is_err());
}

#[test]
fn test_trainable_parameter_registration() {
    let layer = MziBlockLinear::new(8, 8, Some(phase_config(DecomposeAlg::Clements))).unwrap();
    let trainable = layer.trainable_parameters();
    assert_eq!(trainable, vec!["phase_u", "phase_s", "phase_v", "s_scale"]);
    let buffers = layer.buffers();
    assert!(buffers.contains(&"weight"));
    assert!(buffers.contains(&"delta_u"));
    assert!(!buffers.contains(&"phase_u"));
}

#[test]
fn test_snapshot_roundtrip_through_file() {
    let mut layer = MziBlockLinear::new(8, 8, Some(phase_config(DecomposeAlg::Clements))).unwrap();
    layer.set_weight_bitwidth(8);
    let reference = layer.build_weight(UpdateList::all()).unwrap();

    let snapshot = layer.snapshot();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layer.bin");
    snapshot.save(&path).unwrap();

    let loaded = crate::nn::LayerSnapshot::load(&path).unwrap();
    let mut fresh =
        MziBlockLinear::new(8, 8, Some(phase_config(DecomposeAlg::Clements))).unwrap();
    fresh.restore(&loaded).unwrap();
    let rebuilt = fresh.build_weight(UpdateList::all()).unwrap();
    assert_eq!(reference, rebuilt);

    // JSON 내보내기도 동작해야 한다
    assert!(snapshot.to_json().unwrap().contains("w_bit"));
}

#[test]
fn test_cached_weight_fast_path() {
    let mut layer = MziBlockLinear::new(4, 4, Some(phase_config(DecomposeAlg::Francis))).unwrap();
    let input = vec![0.5f32; 4];
    let slow = layer.forward(&input).unwrap();
    layer.preload_weight().unwrap();
    let fast = layer.forward(&input).unwrap();
    assert_eq!(slow, fast);
    layer.clear_cache();
}
