/*
 * @Author       : 老董
 * @Date         : 2026-09-28
 * @Description  : Conv2d (2D 卷积) 层 - NHWC 布局
 *
 * 输入/输出形状：
 * - 输入：[batch_size, H, W, in_channels]
 * - 输出：[batch_size, H', W', filters]
 * - 卷积核：[kernel_h, kernel_w, in_channels, filters]
 *
 * 输出尺寸见 `Padding::conv_output_len`
 *
 * 输入通道数在第一次前向传播时确定（也可显式调用 `build`），参数只创建一次。
 */

use rayon::prelude::*;

use crate::errors::{ConfigurationError, StateError, TensorError};
use crate::nn::init::{Init, rng_from_seed};
use crate::nn::layer::check_nhwc;
use crate::nn::state::{StateDict, ensure_known_entries, take_entry};
use crate::nn::{Module, Padding};
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
struct ConvParams {
    kernel: Tensor,
    bias: Option<Tensor>,
}

/// Conv2d (2D 卷积) 层：`output = conv2d(x, K) + b`
#[derive(Debug, Clone)]
pub struct Conv2d {
    filters: usize,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: Padding,
    use_bias: bool,
    seed: Option<u64>,
    params: Option<ConvParams>,
}

impl Conv2d {
    /// 创建新的 Conv2d 层（尚未分配参数）
    ///
    /// # 参数
    /// - `filters`: 输出通道数
    /// - `kernel_size`: 卷积核大小 (kH, kW)
    /// - `stride`: 步长 (sH, sW)
    /// - `padding`: 填充策略
    /// - `use_bias`: 是否使用偏置
    pub fn new(
        filters: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: Padding,
        use_bias: bool,
    ) -> Result<Self, ConfigurationError> {
        ConfigurationError::check_at_least("filters", filters, 1)?;
        ConfigurationError::check_at_least("kernel_size", kernel_size.0.min(kernel_size.1), 1)?;
        ConfigurationError::check_at_least("strides", stride.0.min(stride.1), 1)?;
        Ok(Self {
            filters,
            kernel_size,
            stride,
            padding,
            use_bias,
            seed: None,
            params: None,
        })
    }

    /// 指定参数初始化的随机种子（确保可重复性）
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// 按输入通道数创建参数：卷积核 Glorot 均匀初始化，偏置零初始化。
    /// 已构建时只校验通道数是否一致
    pub fn build(&mut self, in_channels: usize) -> Result<(), TensorError> {
        if let Some(built) = self.in_channels() {
            return if built == in_channels {
                Ok(())
            } else {
                Err(TensorError::ShapeMismatch {
                    expected: vec![built],
                    got: vec![in_channels],
                    message: "Conv2d 已按其他输入通道数构建".to_string(),
                })
            };
        }
        if in_channels == 0 {
            return Err(TensorError::InvalidOperation(
                "Conv2d 的输入通道数不能为0".to_string(),
            ));
        }

        let shape = self.kernel_shape(in_channels);
        let mut rng = rng_from_seed(self.seed);
        let kernel = Init::glorot_for_kernel(&shape, in_channels, self.filters)
            .generate_with_rng(&shape, &mut rng);
        let bias = self
            .use_bias
            .then(|| Init::Zeros.generate_with_rng(&[self.filters], &mut rng));
        log::debug!(
            "Conv2d 构建完成：卷积核{:?}，偏置：{}",
            shape,
            self.use_bias
        );
        self.params = Some(ConvParams { kernel, bias });
        Ok(())
    }

    /// 输入形状为`input_shape`时的输出形状
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, TensorError> {
        let [batch, in_h, in_w, _] = check_nhwc(input_shape, "Conv2d")?;
        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        Ok(vec![
            batch,
            self.padding.conv_output_len(in_h, k_h, stride_h)?,
            self.padding.conv_output_len(in_w, k_w, stride_w)?,
            self.filters,
        ])
    }

    /// 直接设置卷积核（形状须为 [kH, kW, in_channels, filters]），未构建时会顺带完成构建
    pub fn set_kernel(&mut self, kernel: Tensor) -> Result<(), TensorError> {
        let in_channels = match *kernel.shape() {
            [k_h, k_w, c_in, c_out]
                if (k_h, k_w) == self.kernel_size && c_out == self.filters && c_in > 0 =>
            {
                c_in
            }
            _ => {
                return Err(TensorError::ShapeMismatch {
                    expected: self.kernel_shape(self.in_channels().unwrap_or(0)).to_vec(),
                    got: kernel.shape().to_vec(),
                    message: "Conv2d 卷积核形状不符".to_string(),
                });
            }
        };
        match self.params.as_mut() {
            Some(params) if params.kernel.shape()[2] == in_channels => {
                params.kernel = kernel;
                Ok(())
            }
            Some(params) => Err(TensorError::ShapeMismatch {
                expected: params.kernel.shape().to_vec(),
                got: kernel.shape().to_vec(),
                message: "Conv2d 已按其他输入通道数构建".to_string(),
            }),
            None => {
                let bias = self.use_bias.then(|| Tensor::zeros(&[self.filters]));
                self.params = Some(ConvParams { kernel, bias });
                Ok(())
            }
        }
    }

    /// 直接设置偏置（形状须为 [filters]），要求层已构建且启用了偏置
    pub fn set_bias(&mut self, bias: Tensor) -> Result<(), TensorError> {
        if bias.shape() != [self.filters] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.filters],
                got: bias.shape().to_vec(),
                message: "Conv2d 偏置形状不符".to_string(),
            });
        }
        match self.params.as_mut().and_then(|params| params.bias.as_mut()) {
            Some(slot) => {
                *slot = bias;
                Ok(())
            }
            None => Err(TensorError::InvalidOperation(
                "Conv2d 未构建或未启用偏置，无法设置偏置".to_string(),
            )),
        }
    }

    fn kernel_shape(&self, in_channels: usize) -> [usize; 4] {
        [self.kernel_size.0, self.kernel_size.1, in_channels, self.filters]
    }

    /// 执行卷积运算（Rayon 在 batch 维度并行）
    fn convolve(&self, x: &Tensor, params: &ConvParams) -> Result<Tensor, TensorError> {
        let [batch_size, in_h, in_w, in_c] = check_nhwc(x.shape(), "Conv2d")?;
        let output_shape = self.output_shape(x.shape())?;
        let (out_h, out_w, out_c) = (output_shape[1], output_shape[2], output_shape[3]);
        if output_shape.iter().product::<usize>() == 0 {
            return Ok(Tensor::zeros(&output_shape));
        }

        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        let pad_top = self.padding.conv_pad_before(in_h, k_h, stride_h) as isize;
        let pad_left = self.padding.conv_pad_before(in_w, k_w, stride_w) as isize;

        let input = x.as_slice();
        let kernel = params.kernel.as_slice();
        let bias = params.bias.as_ref().map(Tensor::as_slice);
        let single_input_size = in_h * in_w * in_c;
        let single_output_size = out_h * out_w * out_c;

        let mut output = vec![0.0f32; batch_size * single_output_size];
        output
            .par_chunks_mut(single_output_size)
            .zip(input.par_chunks(single_input_size.max(1)))
            .for_each(|(sample_out, sample_in)| {
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let pixel = &mut sample_out[(oh * out_w + ow) * out_c..][..out_c];
                        if let Some(bias) = bias {
                            pixel.copy_from_slice(bias);
                        }
                        for ki in 0..k_h {
                            let ih = (oh * stride_h + ki) as isize - pad_top;
                            if ih < 0 || ih >= in_h as isize {
                                continue;
                            }
                            for kj in 0..k_w {
                                let iw = (ow * stride_w + kj) as isize - pad_left;
                                if iw < 0 || iw >= in_w as isize {
                                    continue;
                                }
                                let in_pixel =
                                    &sample_in[(ih as usize * in_w + iw as usize) * in_c..][..in_c];
                                let kernel_base = (ki * k_w + kj) * in_c * out_c;
                                for (ic, &value) in in_pixel.iter().enumerate() {
                                    let kernel_row = &kernel[kernel_base + ic * out_c..][..out_c];
                                    for (o, &w) in pixel.iter_mut().zip(kernel_row) {
                                        *o += value * w;
                                    }
                                }
                            }
                        }
                    }
                }
            });

        Ok(Tensor::from_vec(output, &output_shape))
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    pub fn stride(&self) -> (usize, usize) {
        self.stride
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn use_bias(&self) -> bool {
        self.use_bias
    }

    pub fn is_built(&self) -> bool {
        self.params.is_some()
    }

    /// 已构建时返回输入通道数
    pub fn in_channels(&self) -> Option<usize> {
        self.params.as_ref().map(|params| params.kernel.shape()[2])
    }

    pub fn kernel(&self) -> Option<&Tensor> {
        self.params.as_ref().map(|params| &params.kernel)
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.params.as_ref().and_then(|params| params.bias.as_ref())
    }
}

impl Module for Conv2d {
    fn forward(&mut self, x: &Tensor, _training: bool) -> Result<Tensor, TensorError> {
        let [_, _, _, in_channels] = check_nhwc(x.shape(), "Conv2d")?;
        self.build(in_channels)?;
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| TensorError::InvalidOperation("Conv2d 参数未构建".to_string()))?;
        self.convolve(x, params)
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = Vec::new();
        if let Some(kernel) = self.kernel() {
            params.push(("kernel".to_string(), kernel));
        }
        if let Some(bias) = self.bias() {
            params.push(("bias".to_string(), bias));
        }
        params
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<(), StateError> {
        let known: &[&str] = if self.use_bias { &["kernel", "bias"] } else { &["kernel"] };
        ensure_known_entries(state, known)?;

        let in_channels = match self.in_channels() {
            Some(in_channels) => in_channels,
            None => state
                .get("kernel")
                .and_then(|kernel| kernel.shape().get(2).copied())
                .ok_or_else(|| StateError::MissingEntry("kernel".to_string()))?,
        };
        let kernel = take_entry(state, "kernel", Some(&self.kernel_shape(in_channels)))?;
        let bias = if self.use_bias {
            Some(take_entry(state, "bias", Some(&[self.filters]))?)
        } else {
            None
        };
        self.params = Some(ConvParams { kernel, bias });
        Ok(())
    }
}
