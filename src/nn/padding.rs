/*
 * @Author       : 老董
 * @Date         : 2026-09-27
 * @Description  : 卷积/转置卷积的填充策略与输出尺寸计算（与 TensorFlow 的约定一致）
 *
 * 卷积（步长 s，核 k，输入 n）：
 * - same : out = ceil(n / s)，总填充 = max((out-1)*s + k - n, 0)，前侧取一半（向下取整），多出的1个像素补在后侧
 * - valid: out = ceil((n - k + 1) / s)，无填充
 *
 * 转置卷积：
 * - same : out = n * s，从完整输出的前侧裁掉 max(k - s, 0) / 2
 * - valid: out = n * s + max(k - s, 0)，不裁剪
 */

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::{ConfigurationError, TensorError};

/// 填充策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// 步长为1时输出与输入空间尺寸相同
    #[default]
    Same,
    /// 不填充
    Valid,
}

impl Padding {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Valid => "valid",
        }
    }

    /// 卷积在某一空间维度上的输出长度
    pub fn conv_output_len(
        &self,
        input_len: usize,
        kernel: usize,
        stride: usize,
    ) -> Result<usize, TensorError> {
        match self {
            Self::Same => Ok(input_len.div_ceil(stride)),
            Self::Valid => {
                if kernel > input_len {
                    return Err(TensorError::InvalidOperation(format!(
                        "valid卷积的核大小{kernel}不能超过输入尺寸{input_len}"
                    )));
                }
                Ok((input_len - kernel + 1).div_ceil(stride))
            }
        }
    }

    /// 卷积在某一空间维度上前侧（上/左）的零填充数
    pub fn conv_pad_before(&self, input_len: usize, kernel: usize, stride: usize) -> usize {
        match self {
            Self::Same => {
                let output_len = input_len.div_ceil(stride);
                let needed = (output_len.saturating_sub(1) * stride + kernel).saturating_sub(input_len);
                needed / 2
            }
            Self::Valid => 0,
        }
    }

    /// 转置卷积在某一空间维度上的输出长度
    pub fn conv_transpose_output_len(&self, input_len: usize, kernel: usize, stride: usize) -> usize {
        match self {
            Self::Same => input_len * stride,
            Self::Valid => input_len * stride + kernel.saturating_sub(stride),
        }
    }

    /// 转置卷积在某一空间维度上从完整输出前侧裁掉的长度
    pub fn conv_transpose_crop_before(&self, kernel: usize, stride: usize) -> usize {
        match self {
            Self::Same => kernel.saturating_sub(stride) / 2,
            Self::Valid => 0,
        }
    }
}

impl Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Padding {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "same" => Ok(Self::Same),
            "valid" => Ok(Self::Valid),
            _ => Err(ConfigurationError::UnknownPadding(s.to_string())),
        }
    }
}
