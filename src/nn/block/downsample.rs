/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 下采样块：步长卷积 → 可选批归一化 → 激活（relu / leaky_relu / none）
 *
 * 典型用法：U-Net 生成器的编码器、PatchGAN 判别器
 */

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigurationError, StateError, TensorError};
use crate::nn::block::check_activation;
use crate::nn::layer::{Activation, BatchNorm, Conv2d};
use crate::nn::module::with_prefix;
use crate::nn::state::{StateDict, ensure_known_prefixes, load_sub_module};
use crate::nn::{Module, Padding};
use crate::tensor::Tensor;

/// 下采样块的构造参数，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownsampleConfig {
    /// 输出通道数
    pub filters: usize,
    /// 正方形卷积核边长
    pub kernel_size: usize,
    pub strides: usize,
    #[serde(default)]
    pub padding: Padding,
    /// 启用时卷积不带偏置（由批归一化的 beta 代替）
    pub apply_batchnorm: bool,
    pub activation: Activation,
    /// 参数初始化的随机种子
    #[serde(default)]
    pub seed: Option<u64>,
}

impl DownsampleConfig {
    /// 默认：`same`填充、启用批归一化、relu 激活
    pub fn new(filters: usize, kernel_size: usize, strides: usize) -> Self {
        Self {
            filters,
            kernel_size,
            strides,
            padding: Padding::Same,
            apply_batchnorm: true,
            activation: Activation::Relu,
            seed: None,
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_batchnorm(mut self, apply_batchnorm: bool) -> Self {
        self.apply_batchnorm = apply_batchnorm;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// 下采样块
#[derive(Debug, Clone)]
pub struct DownsampleBlock {
    config: DownsampleConfig,
    conv: Conv2d,
    batchnorm: Option<BatchNorm>,
}

impl DownsampleBlock {
    pub const ALLOWED_ACTIVATIONS: &'static [Activation] =
        &[Activation::Relu, Activation::LeakyRelu, Activation::None];

    /// 创建下采样块；激活函数不在允许集合内、或数值参数非法时立即返回`ConfigurationError`
    pub fn new(config: DownsampleConfig) -> Result<Self, ConfigurationError> {
        check_activation(
            "DownsampleBlock",
            config.activation,
            Self::ALLOWED_ACTIVATIONS,
            &["relu", "leaky_relu", "none"],
        )?;
        let conv = Conv2d::new(
            config.filters,
            (config.kernel_size, config.kernel_size),
            (config.strides, config.strides),
            config.padding,
            !config.apply_batchnorm,
        )?
        .with_seed(config.seed);
        let batchnorm = config.apply_batchnorm.then(BatchNorm::new);
        log::debug!("创建 DownsampleBlock：{config:?}");
        Ok(Self {
            config,
            conv,
            batchnorm,
        })
    }

    /// 以训练模式前向传播
    pub fn call(&mut self, x: &Tensor) -> Result<Tensor, TensorError> {
        self.forward(x, true)
    }

    pub fn config(&self) -> &DownsampleConfig {
        &self.config
    }

    pub fn conv(&self) -> &Conv2d {
        &self.conv
    }

    pub fn conv_mut(&mut self) -> &mut Conv2d {
        &mut self.conv
    }

    pub fn batchnorm(&self) -> Option<&BatchNorm> {
        self.batchnorm.as_ref()
    }

    pub fn activation(&self) -> Activation {
        self.config.activation
    }

    /// 输入形状为`input_shape`时的输出形状
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, TensorError> {
        self.conv.output_shape(input_shape)
    }
}

impl Module for DownsampleBlock {
    fn forward(&mut self, x: &Tensor, training: bool) -> Result<Tensor, TensorError> {
        // 卷积
        let mut x = self.conv.forward(x, training)?;

        // 批归一化
        if let Some(batchnorm) = self.batchnorm.as_mut() {
            x = batchnorm.forward(&x, training)?;
        }

        // 激活
        self.config.activation.apply_inplace(&mut x);
        Ok(x)
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = with_prefix("conv", self.conv.named_parameters());
        if let Some(batchnorm) = &self.batchnorm {
            params.extend(with_prefix("batchnorm", batchnorm.named_parameters()));
        }
        params
    }

    fn named_buffers(&self) -> Vec<(String, &Tensor)> {
        self.batchnorm
            .as_ref()
            .map(|batchnorm| with_prefix("batchnorm", batchnorm.named_buffers()))
            .unwrap_or_default()
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<(), StateError> {
        let prefixes: &[&str] = if self.batchnorm.is_some() {
            &["conv", "batchnorm"]
        } else {
            &["conv"]
        };
        ensure_known_prefixes(state, prefixes)?;

        // 各子模块全部载入成功后再一并替换
        let conv = load_sub_module(&self.conv, state, "conv")?;
        let batchnorm = match &self.batchnorm {
            Some(batchnorm) => Some(load_sub_module(batchnorm, state, "batchnorm")?),
            None => None,
        };
        self.conv = conv;
        self.batchnorm = batchnorm;
        Ok(())
    }
}
