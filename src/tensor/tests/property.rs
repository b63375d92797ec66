use crate::tensor::Tensor;

#[test]
fn test_dimension_and_channels() {
    let tensor = Tensor::zeros(&[2, 5, 7, 3]);
    assert_eq!(tensor.dimension(), 4);
    assert_eq!(tensor.size(), 2 * 5 * 7 * 3);
    assert_eq!(tensor.channels(), 3);

    let scalar = Tensor::new(&[1.], &[]);
    assert_eq!(scalar.channels(), 1);
}

#[test]
fn test_index_nhwc() {
    #[rustfmt::skip]
    let mut tensor = Tensor::new(
        &[
            1., 2.,   3., 4.,
            5., 6.,   7., 8.,
        ],
        &[1, 2, 2, 2],
    );
    assert_eq!(tensor[[0, 0, 1, 0]], 3.);
    assert_eq!(tensor[[0, 1, 1, 1]], 8.);

    tensor[[0, 1, 0, 1]] = -6.;
    assert_eq!(tensor.as_slice()[5], -6.);
}
