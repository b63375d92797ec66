use ndarray::{Array, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::errors::TensorError;

mod ops {
    pub mod others;
}

mod index;
mod property;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 卷积相关的层统一使用4维`NHWC`布局，即`[batch, height, width, channels]`。
/// 注：内部数据始终保持标准（行优先、连续）内存布局，`as_slice()`依赖这一点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]...；
    /// 若为更高维度的数组，`shape`可以是[n,h,w,c]等。
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let expected_len = shape.iter().product::<usize>();
        assert!(
            data.len() == expected_len,
            "{}",
            TensorError::DataLengthMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        Tensor::from_vec(data.to_vec(), shape)
    }

    /// 与`new`相同，但直接接管`data`的所有权，避免一次拷贝
    pub(crate) fn from_vec(data: Vec<f32>, shape: &[usize]) -> Tensor {
        let len = data.len();
        let data = Array::from_shape_vec(IxDyn(shape), data).unwrap_or_else(|_| {
            panic!(
                "{}",
                TensorError::DataLengthMismatch {
                    data_len: len,
                    shape: shape.to_vec(),
                }
            )
        });
        Tensor { data }
    }

    /// 创建一个元素全为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor::full(0.0, shape)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor::full(1.0, shape)
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间
    pub fn new_random(min: f32, max: f32, shape: &[usize]) -> Tensor {
        Tensor::new_random_with_rng(min, max, shape, &mut rand::thread_rng())
    }

    /// 同`new_random`，但使用指定的随机数生成器（用于可复现的初始化）
    pub fn new_random_with_rng<R: Rng + ?Sized>(
        min: f32,
        max: f32,
        shape: &[usize],
        rng: &mut R,
    ) -> Tensor {
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(rng))
            .collect::<Vec<_>>();
        Tensor::from_vec(data, shape)
    }
}
