/*
 * @Description  : 激活函数（闭合枚举 + 纯函数查表）
 *
 * 激活方式在构造 block 时确定一次，前向传播时只做一次查表得到函数指针，
 * 不再逐次比较字符串。
 */

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::ConfigurationError;
use crate::tensor::Tensor;

/// Leaky ReLU 负半轴斜率（与 TensorFlow `tf.nn.leaky_relu` 的默认 alpha 一致）
pub const LEAKY_RELU_SLOPE: f32 = 0.2;

/// 激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// 恒等映射（不做激活）
    None,
    Relu,
    LeakyRelu,
    Sigmoid,
}

/// 与`Activation`声明顺序一致的函数表
const ACTIVATION_TABLE: [fn(f32) -> f32; 4] = [identity, relu, leaky_relu, sigmoid];

impl Activation {
    pub const ALL: [Activation; 4] = [Self::None, Self::Relu, Self::LeakyRelu, Self::Sigmoid];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Relu => "relu",
            Self::LeakyRelu => "leaky_relu",
            Self::Sigmoid => "sigmoid",
        }
    }

    /// 查表得到对应的逐元素函数
    pub fn function(&self) -> fn(f32) -> f32 {
        ACTIVATION_TABLE[*self as usize]
    }

    /// 对张量逐元素应用激活函数
    pub fn apply(&self, x: &Tensor) -> Tensor {
        if *self == Self::None {
            return x.clone();
        }
        x.map(self.function())
    }

    /// 原地应用激活函数
    pub fn apply_inplace(&self, x: &mut Tensor) {
        if *self != Self::None {
            x.map_inplace(self.function());
        }
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Activation {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|activation| activation.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigurationError::UnknownActivation(s.to_string()))
    }
}

pub fn identity(x: f32) -> f32 {
    x
}

/// max(x, 0)
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// x if x > 0, else LEAKY_RELU_SLOPE * x
pub fn leaky_relu(x: f32) -> f32 {
    if x > 0.0 { x } else { LEAKY_RELU_SLOPE * x }
}

/// 1 / (1 + e^-x)，按符号分支以避免大|x|时溢出
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
