/*
 * @Description  : 负责神经网络（neural network）积木的构建：基础层、GAN 下/上采样块及其状态读写
 */

pub mod block;
mod init;
pub mod layer;
mod module;
mod padding;
pub mod state;

pub use block::{DownsampleBlock, DownsampleConfig, UpsampleBlock, UpsampleConfig};
pub use init::Init;
pub use layer::{
    Activation, BatchNorm, Conv2d, ConvTranspose2d, LEAKY_RELU_SLOPE, RunningStats,
};
pub use module::Module;
pub use padding::Padding;
pub use state::{StateDict, load_state, save_state};

#[cfg(test)]
mod tests;
