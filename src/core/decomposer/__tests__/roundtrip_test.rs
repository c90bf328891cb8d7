use crate::core::decomposer::{DecomposeAlg, RealUnitaryDecomposer};
use nalgebra::{DMatrix, DVector};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 시드 고정 난수 행렬의 QR 분해로 직교 행렬을 만든다
fn random_orthogonal(dim: usize, seed: u64) -> DMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let m = DMatrix::from_fn(dim, dim, |_, _| rng.gen_range(-1.0f32..1.0));
    m.qr().q()
}

fn max_abs_diff(a: &DMatrix<f32>, b: &DMatrix<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

fn check_roundtrip(alg: DecomposeAlg, dim: usize, seed: u64, tol: f32) {
    let u = random_orthogonal(dim, seed);
    let decomposer = RealUnitaryDecomposer::new(alg);
    let (delta, phi) = decomposer.decompose(&u).unwrap();
    let rebuilt = decomposer.reconstruct(&delta, &phi).unwrap();
    let err = max_abs_diff(&u, &rebuilt);
    assert!(
        err < tol,
        "{:?} k={} 왕복 오차 과대: {}",
        alg,
        dim,
        err
    );
}

#[test]
fn test_francis_roundtrip_small() {
    for dim in 2..=8 {
        check_roundtrip(DecomposeAlg::Francis, dim, 42 + dim as u64, 1e-4);
    }
}

#[test]
fn test_clements_roundtrip_small() {
    for dim in 2..=8 {
        check_roundtrip(DecomposeAlg::Clements, dim, 42 + dim as u64, 1e-4);
    }
}

#[test]
fn test_roundtrip_medium_and_large() {
    for &dim in &[16, 32, 64] {
        check_roundtrip(DecomposeAlg::Francis, dim, 7, 1e-4);
        check_roundtrip(DecomposeAlg::Clements, dim, 7, 1e-4);
    }
}

#[test]
fn test_delta_is_signs_for_orthogonal_input() {
    for &alg in &[DecomposeAlg::Francis, DecomposeAlg::Clements] {
        let u = random_orthogonal(6, 99);
        let decomposer = RealUnitaryDecomposer::new(alg);
        let (delta, _) = decomposer.decompose(&u).unwrap();
        for i in 0..6 {
            assert!(
                (delta[i].abs() - 1.0).abs() < 1e-4,
                "{:?} delta[{}] = {}",
                alg,
                i,
                delta[i]
            );
        }
    }
}

#[test]
fn test_degenerate_one_by_one() {
    for &alg in &[DecomposeAlg::Francis, DecomposeAlg::Clements] {
        let decomposer = RealUnitaryDecomposer::new(alg);
        let u = DMatrix::from_element(1, 1, -1.0f32);
        let (delta, phi) = decomposer.decompose(&u).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0], -1.0);
        let rebuilt = decomposer.reconstruct(&delta, &phi).unwrap();
        assert_eq!(rebuilt[(0, 0)], -1.0);
    }
}

#[test]
fn test_near_orthogonal_input_stays_finite() {
    // 정확히 직교가 아니어도 실패하지 않고 유한한 결과를 낸다
    let mut u = random_orthogonal(5, 3);
    u[(0, 0)] += 1e-3;
    for &alg in &[DecomposeAlg::Francis, DecomposeAlg::Clements] {
        let decomposer = RealUnitaryDecomposer::new(alg);
        let (delta, phi) = decomposer.decompose(&u).unwrap();
        let rebuilt = decomposer.reconstruct(&delta, &phi).unwrap();
        assert!(rebuilt.iter().all(|x| x.is_finite()));
        assert!(delta.iter().all(|x| x.is_finite()));
        let _ = phi;
    }
}

#[test]
fn test_batch_matches_per_block() {
    let dims = (2usize, 3usize, 4usize);
    let mut grid = Array4::zeros((dims.0, dims.1, dims.2, dims.2));
    let mut blocks = Vec::new();
    for r in 0..dims.0 {
        for c in 0..dims.1 {
            let u = random_orthogonal(dims.2, (r * 10 + c) as u64);
            for i in 0..dims.2 {
                for j in 0..dims.2 {
                    grid[[r, c, i, j]] = u[(i, j)];
                }
            }
            blocks.push(u);
        }
    }
    let decomposer = RealUnitaryDecomposer::new(DecomposeAlg::Clements);
    let (delta_b, phi_b) = decomposer.decompose_batch(grid.view()).unwrap();
    let rebuilt_b = decomposer
        .reconstruct_batch(delta_b.view(), phi_b.view())
        .unwrap();

    let mut idx = 0;
    for r in 0..dims.0 {
        for c in 0..dims.1 {
            let (delta, phi) = decomposer.decompose(&blocks[idx]).unwrap();
            for i in 0..dims.2 {
                assert!((delta_b[[r, c, i]] - delta[i]).abs() < 1e-6);
                for j in 0..dims.2 {
                    assert!((phi_b[[r, c, i, j]] - phi[(i, j)]).abs() < 1e-6);
                    assert!((rebuilt_b[[r, c, i, j]] - blocks[idx][(i, j)]).abs() < 1e-4);
                }
            }
            idx += 1;
        }
    }
}

#[test]
fn test_shape_mismatch_fails() {
    let decomposer = RealUnitaryDecomposer::new(DecomposeAlg::Francis);
    let delta = DVector::from_element(4, 1.0f32);
    let phi = DMatrix::zeros(3, 3);
    assert!(decomposer.reconstruct(&delta, &phi).is_err());

    let non_square = DMatrix::<f32>::zeros(3, 4);
    assert!(decomposer.decompose(&non_square).is_err());
}

#[test]
fn test_mesh_vector_roundtrip_through_codec() {
    // 분해 → m2v → v2m → 복원이 직접 복원과 일치
    for &alg in &[DecomposeAlg::Francis, DecomposeAlg::Clements] {
        let dim = 6;
        let u = random_orthogonal(dim, 11);
        let decomposer = RealUnitaryDecomposer::new(alg);
        let mut grid = Array4::zeros((1, 1, dim, dim));
        for i in 0..dim {
            for j in 0..dim {
                grid[[0, 0, i, j]] = u[(i, j)];
            }
        }
        let (delta, phi) = decomposer.decompose_batch(grid.view()).unwrap();
        let vec = decomposer.m2v_batch(phi.view()).unwrap();
        assert_eq!(vec.dim().2, dim * (dim - 1) / 2);
        let phi2 = decomposer.v2m_batch(vec.view(), dim).unwrap();
        assert_eq!(phi, phi2);
        let rebuilt = decomposer.reconstruct_batch(delta.view(), phi2.view()).unwrap();
        for i in 0..dim {
            for j in 0..dim {
                assert!((rebuilt[[0, 0, i, j]] - u[(i, j)]).abs() < 1e-4);
            }
        }
    }
}
