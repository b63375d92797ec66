use crate::nn::Init;
use crate::nn::init::rng_from_seed;

#[test]
fn test_zeros_init() {
    let mut rng = rng_from_seed(Some(0));
    let bias = Init::Zeros.generate_with_rng(&[4], &mut rng);
    assert_eq!(bias.shape(), &[4]);
    assert_eq!(bias.to_vec(), vec![0.0; 4]);
}

#[test]
fn test_glorot_for_kernel_fans() {
    // [4, 4, 3, 64]：fan_in = 16 * 3，fan_out = 16 * 64
    assert_eq!(
        Init::glorot_for_kernel(&[4, 4, 3, 64], 3, 64),
        Init::GlorotUniform {
            fan_in: 48,
            fan_out: 1024
        }
    );
}

#[test]
fn test_glorot_uniform_within_limit_and_seeded() {
    let init = Init::glorot_for_kernel(&[3, 3, 8, 16], 8, 16);
    let limit = (6.0f32 / (72.0 + 144.0)).sqrt();

    let a = init.generate_with_rng(&[3, 3, 8, 16], &mut rng_from_seed(Some(7)));
    let b = init.generate_with_rng(&[3, 3, 8, 16], &mut rng_from_seed(Some(7)));
    assert_eq!(a, b);
    assert!(a.min().unwrap() >= -limit);
    assert!(a.max().unwrap() <= limit);
    assert!(a.max().unwrap() > a.min().unwrap());
}
