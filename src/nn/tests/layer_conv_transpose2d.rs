/*
 * @Description  : ConvTranspose2d layer 单元测试（NHWC 布局）
 */

use crate::errors::TensorError;
use crate::nn::{ConvTranspose2d, Module, Padding};
use crate::tensor::Tensor;

#[test]
fn test_conv_transpose2d_lazy_build_shapes() {
    let mut up = ConvTranspose2d::new(8, (4, 4), (2, 2), Padding::Same, true).unwrap();
    assert!(!up.is_built());

    let x = Tensor::new_random(-1., 1., &[2, 5, 7, 3]);
    let y = up.forward(&x, true).unwrap();
    assert_eq!(y.shape(), &[2, 10, 14, 8]);
    assert_eq!(up.in_channels(), Some(3));
    assert_eq!(up.kernel().unwrap().shape(), &[4, 4, 8, 3]);
    assert_eq!(up.num_params(), 4 * 4 * 8 * 3 + 8);
}

#[test]
fn test_conv_transpose2d_kernel2_stride2_scatter() {
    // 2x2 核、步长2：每个输入像素恰好复制到一个 2x2 块
    let mut up = ConvTranspose2d::new(1, (2, 2), (2, 2), Padding::Same, false).unwrap();
    up.set_kernel(Tensor::ones(&[2, 2, 1, 1])).unwrap();

    let x = Tensor::new(&[1., 2., 3., 4.], &[1, 2, 2, 1]);
    let y = up.forward(&x, true).unwrap();
    assert_eq!(y.shape(), &[1, 4, 4, 1]);
    #[rustfmt::skip]
    let expected = vec![
        1., 1., 2., 2.,
        1., 1., 2., 2.,
        3., 3., 4., 4.,
        3., 3., 4., 4.,
    ];
    assert_eq!(y.to_vec(), expected);
}

#[test]
fn test_conv_transpose2d_valid_overlap() {
    // 3x3 核、步长2、valid：输出 2*2 + (3-2) = 5，重叠处累加
    let mut up = ConvTranspose2d::new(1, (3, 3), (2, 2), Padding::Valid, false).unwrap();
    up.set_kernel(Tensor::ones(&[3, 3, 1, 1])).unwrap();

    let x = Tensor::new(&[1., 2., 3., 4.], &[1, 2, 2, 1]);
    let y = up.forward(&x, true).unwrap();
    assert_eq!(y.shape(), &[1, 5, 5, 1]);
    #[rustfmt::skip]
    let expected = vec![
        1., 1., 3., 2., 2.,
        1., 1., 3., 2., 2.,
        4., 4., 10., 6., 6.,
        3., 3., 7., 4., 4.,
        3., 3., 7., 4., 4.,
    ];
    assert_eq!(y.to_vec(), expected);
}

#[test]
fn test_conv_transpose2d_same_crops_leading_edge() {
    // 4x4 核、步长2、same：从完整输出(6x6)前侧裁掉1，保留 4x4
    let mut up = ConvTranspose2d::new(1, (4, 4), (2, 2), Padding::Same, false).unwrap();
    up.set_kernel(Tensor::ones(&[4, 4, 1, 1])).unwrap();

    let x = Tensor::new(&[1., 2., 3., 4.], &[1, 2, 2, 1]);
    let y = up.forward(&x, true).unwrap();
    assert_eq!(y.shape(), &[1, 4, 4, 1]);
    // 完整输出中行0..4由第0行输入覆盖、行2..6由第1行输入覆盖，列同理
    #[rustfmt::skip]
    let expected = vec![
        1., 3., 3., 2.,
        4., 10., 10., 6.,
        4., 10., 10., 6.,
        3., 7., 7., 4.,
    ];
    assert_eq!(y.to_vec(), expected);
}

#[test]
fn test_conv_transpose2d_channels_and_bias() {
    // 1x1 核：out[oc] = sum_ic x[ic] * K[oc, ic] + b[oc]
    let mut up = ConvTranspose2d::new(2, (1, 1), (2, 2), Padding::Same, true).unwrap();
    #[rustfmt::skip]
    up.set_kernel(Tensor::new(
        &[
            1., 2.,    // oc=0
            -1., 0.5,  // oc=1
        ],
        &[1, 1, 2, 2],
    ))
    .unwrap();
    up.set_bias(Tensor::new(&[0.5, -0.5], &[2])).unwrap();

    let x = Tensor::new(&[2., 4.], &[1, 1, 1, 2]);
    let y = up.forward(&x, false).unwrap();
    assert_eq!(y.shape(), &[1, 2, 2, 2]);
    // 只有(0,0)接收到输入，其余位置仅有偏置
    assert_eq!(y.to_vec(), vec![10.5, -0.5, 0.5, -0.5, 0.5, -0.5, 0.5, -0.5]);
}

/// valid 填充下空间尺寸为0的输入仍有 max(k - s, 0) 的输出，只含偏置
#[test]
fn test_conv_transpose2d_valid_empty_input_keeps_bias() {
    let mut up = ConvTranspose2d::new(1, (4, 4), (2, 2), Padding::Valid, true).unwrap();
    up.build(1).unwrap();
    up.set_bias(Tensor::new(&[5.], &[1])).unwrap();

    let y = up.forward(&Tensor::zeros(&[1, 0, 2, 1]), true).unwrap();
    assert_eq!(y.shape(), &[1, 2, 6, 1]);
    assert_eq!(y.to_vec(), vec![5.0; 12]);
}

#[test]
fn test_conv_transpose2d_input_errors() {
    let mut up = ConvTranspose2d::new(2, (4, 4), (2, 2), Padding::Same, true).unwrap();
    assert!(matches!(
        up.forward(&Tensor::zeros(&[8, 8]), true),
        Err(TensorError::DimensionMismatch { .. })
    ));

    up.build(3).unwrap();
    assert!(matches!(
        up.forward(&Tensor::zeros(&[1, 2, 2, 5]), true),
        Err(TensorError::ShapeMismatch { .. })
    ));
    assert!(up.set_kernel(Tensor::zeros(&[4, 4, 3, 2])).is_err());
    up.set_kernel(Tensor::zeros(&[4, 4, 2, 3])).unwrap();
}
