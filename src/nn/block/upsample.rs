/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 上采样块：步长固定为2的转置卷积 → 可选批归一化 → 激活（relu / sigmoid）
 *
 * 没有"none"选项：用作生成器最后一层时须以 sigmoid 把输出限制在 [0, 1]
 */

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigurationError, StateError, TensorError};
use crate::nn::block::check_activation;
use crate::nn::layer::{Activation, BatchNorm, ConvTranspose2d};
use crate::nn::module::with_prefix;
use crate::nn::state::{StateDict, ensure_known_prefixes, load_sub_module};
use crate::nn::{Module, Padding};
use crate::tensor::Tensor;

/// 上采样块的构造参数（步长不可配置，固定为`UpsampleBlock::STRIDE`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsampleConfig {
    pub filters: usize,
    pub kernel_size: usize,
    #[serde(default)]
    pub padding: Padding,
    pub apply_batchnorm: bool,
    pub activation: Activation,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl UpsampleConfig {
    /// 默认：`same`填充、启用批归一化、relu 激活
    pub fn new(filters: usize, kernel_size: usize) -> Self {
        Self {
            filters,
            kernel_size,
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

/// 上采样块
#[derive(Debug, Clone)]
pub struct UpsampleBlock {
    config: UpsampleConfig,
    up_conv: ConvTranspose2d,
    batchnorm: Option<BatchNorm>,
}

impl UpsampleBlock {
    /// 空间分辨率放大倍数
    pub const STRIDE: usize = 2;
    pub const ALLOWED_ACTIVATIONS: &'static [Activation] =
        &[Activation::Relu, Activation::Sigmoid];

    /// 创建上采样块；激活函数不在 {relu, sigmoid} 内、或数值参数非法时立即返回`ConfigurationError`
    pub fn new(config: UpsampleConfig) -> Result<Self, ConfigurationError> {
        check_activation(
            "UpsampleBlock",
            config.activation,
            Self::ALLOWED_ACTIVATIONS,
            &["relu", "sigmoid"],
        )?;
        let up_conv = ConvTranspose2d::new(
            config.filters,
            (config.kernel_size, config.kernel_size),
            (Self::STRIDE, Self::STRIDE),
            config.padding,
            !config.apply_batchnorm,
        )?
        .with_seed(config.seed);
        let batchnorm = config.apply_batchnorm.then(BatchNorm::new);
        log::debug!("创建 UpsampleBlock：{config:?}");
        Ok(Self {
            config,
            up_conv,
            batchnorm,
        })
    }

    /// 以训练模式前向传播
    pub fn call(&mut self, x: &Tensor) -> Result<Tensor, TensorError> {
        self.forward(x, true)
    }

    pub fn config(&self) -> &UpsampleConfig {
        &self.config
    }

    pub fn up_conv(&self) -> &ConvTranspose2d {
        &self.up_conv
    }

    pub fn up_conv_mut(&mut self) -> &mut ConvTranspose2d {
        &mut self.up_conv
    }

    pub fn batchnorm(&self) -> Option<&BatchNorm> {
        self.batchnorm.as_ref()
    }

    pub fn activation(&self) -> Activation {
        self.config.activation
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, TensorError> {
        self.up_conv.output_shape(input_shape)
    }
}

impl Module for UpsampleBlock {
    fn forward(&mut self, x: &Tensor, training: bool) -> Result<Tensor, TensorError> {
        // 转置卷积
        let mut x = self.up_conv.forward(x, training)?;

        // 批归一化
        if let Some(batchnorm) = self.batchnorm.as_mut() {
            x = batchnorm.forward(&x, training)?;
        }

        // 激活
        self.config.activation.apply_inplace(&mut x);
        Ok(x)
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = with_prefix("up_conv", self.up_conv.named_parameters());
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
            &["up_conv", "batchnorm"]
        } else {
            &["up_conv"]
        };
        ensure_known_prefixes(state, prefixes)?;

        // 各子模块全部载入成功后再一并替换
        let up_conv = load_sub_module(&self.up_conv, state, "up_conv")?;
        let batchnorm = match &self.batchnorm {
            Some(batchnorm) => Some(load_sub_module(batchnorm, state, "batchnorm")?),
            None => None,
        };
        self.up_conv = up_conv;
        self.batchnorm = batchnorm;
        Ok(())
    }
}
