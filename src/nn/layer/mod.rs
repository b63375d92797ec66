/*
 * @Description  : Layer 模块 - block 内部使用的基础层（卷积、转置卷积、批归一化、激活）
 *
 * 所有卷积相关层的输入/输出均为 NHWC：[batch, height, width, channels]
 */

pub mod activation;
mod batch_norm;
mod conv2d;
mod conv_transpose2d;

pub use activation::{Activation, LEAKY_RELU_SLOPE};
pub use batch_norm::{BatchNorm, RunningStats};
pub use conv2d::Conv2d;
pub use conv_transpose2d::ConvTranspose2d;

use crate::errors::TensorError;

/// 校验输入为 4D NHWC 张量，返回`[batch, height, width, channels]`
pub(crate) fn check_nhwc(shape: &[usize], layer: &str) -> Result<[usize; 4], TensorError> {
    match *shape {
        [n, h, w, c] => Ok([n, h, w, c]),
        _ => Err(TensorError::DimensionMismatch {
            expected: 4,
            got: shape.len(),
            message: format!("{layer}的输入必须是 4D [batch, H, W, C]，单样本请使用 [1, H, W, C]"),
        }),
    }
}
