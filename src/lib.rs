//! # GAN Ops
//!
//! `gan_ops`提供GAN（如pix2pix的U-Net生成器、PatchGAN判别器）中最常用的两种积木：
//! - [`DownsampleBlock`](nn::DownsampleBlock)：步长卷积 → 可选批归一化 → 激活（relu/leaky_relu/none）；
//! - [`UpsampleBlock`](nn::UpsampleBlock)：步长为2的转置卷积 → 可选批归一化 → 激活（relu/sigmoid）。
//!
//! 张量统一采用`NHWC`（batch, height, width, channels）布局。
//! 本库只负责前向计算与归一化统计量的维护，不涉及梯度、优化器与训练循环。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
