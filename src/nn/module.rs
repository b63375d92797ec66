/*
 * @Author       : 老董
 * @Date         : 2026-09-27
 * @Description  : Module trait 定义（所有层与 block 共有的"层能力"）
 */

use crate::errors::{StateError, TensorError};
use crate::nn::state::StateDict;
use crate::tensor::Tensor;

/// 模块 trait
///
/// # 设计原则
/// - `new()` **不是** trait 方法（各层配置各异）
/// - `forward()` 统一签名：输入张量 + 是否训练模式
/// - 可学习参数与不可学习的缓冲区（如批归一化的滑动统计量）分开暴露，
///   二者合起来构成可保存/加载的状态
///
/// # 使用示例
///
/// ```ignore
/// use gan_ops::nn::{DownsampleBlock, DownsampleConfig, Module};
///
/// let mut down = DownsampleBlock::new(DownsampleConfig::new(64, 4, 2))?;
/// let y = down.forward(&x, true)?;
/// println!("参数量：{}", down.num_params());
/// ```
pub trait Module {
    /// 前向传播
    ///
    /// `training` 为 true 时，含批归一化的模块会使用 batch 统计量并更新滑动统计量；
    /// 为 false 时使用滑动统计量，且不产生任何副作用
    fn forward(&mut self, x: &Tensor, training: bool) -> Result<Tensor, TensorError>;

    /// 所有可学习参数（带名称）；尚未构建（未见过输入）时为空
    fn named_parameters(&self) -> Vec<(String, &Tensor)>;

    /// 所有不可学习但需要保存的缓冲区（带名称）
    fn named_buffers(&self) -> Vec<(String, &Tensor)> {
        Vec::new()
    }

    /// 从状态字典中恢复参数与缓冲区，尚未构建的模块会按状态中的形状完成构建
    fn load_state_dict(&mut self, state: &StateDict) -> Result<(), StateError>;

    /// 可学习参数的标量总数
    fn num_params(&self) -> usize {
        self.named_parameters()
            .iter()
            .map(|(_, tensor)| tensor.size())
            .sum()
    }

    /// 参数与缓冲区的快照
    fn state_dict(&self) -> StateDict {
        self.named_parameters()
            .into_iter()
            .chain(self.named_buffers())
            .map(|(name, tensor)| (name, tensor.clone()))
            .collect()
    }
}

/// 给子模块的条目名加上前缀，如`kernel` -> `conv.kernel`
pub(crate) fn with_prefix<'a>(
    prefix: &str,
    entries: Vec<(String, &'a Tensor)>,
) -> Vec<(String, &'a Tensor)> {
    entries
        .into_iter()
        .map(|(name, tensor)| (format!("{prefix}.{name}"), tensor))
        .collect()
}
