/*
 * @Description  : Block 模块 - 由"空间变换 → 可选批归一化 → 激活"线性组合而成的 GAN 积木
 */

mod downsample;
mod upsample;

pub use downsample::{DownsampleBlock, DownsampleConfig};
pub use upsample::{UpsampleBlock, UpsampleConfig};

use crate::errors::ConfigurationError;
use crate::nn::layer::Activation;

fn check_activation(
    block: &'static str,
    activation: Activation,
    allowed: &[Activation],
    allowed_names: &'static [&'static str],
) -> Result<(), ConfigurationError> {
    if allowed.contains(&activation) {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedActivation {
            block,
            activation: activation.name().to_string(),
            allowed: allowed_names,
        })
    }
}
