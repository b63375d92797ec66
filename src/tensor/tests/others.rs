use crate::tensor::Tensor;

#[test]
fn test_map() {
    let tensor = Tensor::new(&[-1., 0., 2.], &[3]);
    assert_eq!(tensor.map(|x| x * 2.).to_vec(), vec![-2., 0., 4.]);

    let mut tensor = tensor;
    tensor.map_inplace(|x| x.max(0.));
    assert_eq!(tensor.to_vec(), vec![0., 0., 2.]);
}

#[test]
fn test_min_max() {
    let tensor = Tensor::new(&[3., -1., 4., 2.], &[2, 2]);
    assert_eq!(tensor.min(), Some(-1.));
    assert_eq!(tensor.max(), Some(4.));

    let empty = Tensor::zeros(&[0, 3]);
    assert_eq!(empty.min(), None);
    assert_eq!(empty.max(), None);
}
