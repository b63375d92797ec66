use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tensor::Tensor;

/// 卷积层参数的初始化方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// 全零（偏置）
    Zeros,
    /// Glorot/Xavier 均匀分布初始化：U(-limit, limit)，limit = sqrt(6 / (fan_in + fan_out))
    GlorotUniform { fan_in: usize, fan_out: usize },
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self {
            Self::Zeros => Tensor::zeros(shape),
            Self::GlorotUniform { fan_in, fan_out } => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Tensor::new_random_with_rng(-limit, limit, shape, rng)
            }
        }
    }

    /// 卷积核 `[kh, kw, c_a, c_b]` 的 Glorot 初始化：感受野大小乘以输入/输出通道数
    pub fn glorot_for_kernel(kernel_shape: &[usize; 4], in_channels: usize, out_channels: usize) -> Self {
        let receptive_field = kernel_shape[0] * kernel_shape[1];
        Self::GlorotUniform {
            fan_in: receptive_field * in_channels,
            fan_out: receptive_field * out_channels,
        }
    }
}

/// 有种子时得到可复现的 RNG，否则从系统熵源初始化
pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}
