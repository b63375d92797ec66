/*
 * @Author       : 老董
 * @Date         : 2026-09-28
 * @Description  : ConvTranspose2d (2D 转置卷积) 层 - NHWC 布局，常用于生成器中的上采样
 *
 * 输入/输出形状：
 * - 输入：[batch_size, H, W, in_channels]
 * - 输出：[batch_size, H', W', filters]
 * - 卷积核：[kernel_h, kernel_w, filters, in_channels]（即对应正向卷积核的输入/输出通道互换）
 *
 * 计算方式：每个输入像素按步长"散射"到输出上，
 * out[ih*s + ki - crop, iw*s + kj - crop, oc] += x[ih, iw, ic] * K[ki, kj, oc, ic]
 * 输出尺寸与裁剪量见 `Padding::conv_transpose_output_len` / `conv_transpose_crop_before`
 */

use rayon::prelude::*;

use crate::errors::{ConfigurationError, StateError, TensorError};
use crate::nn::init::{Init, rng_from_seed};
use crate::nn::layer::check_nhwc;
use crate::nn::state::{StateDict, ensure_known_entries, take_entry};
use crate::nn::{Module, Padding};
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
struct ConvTransposeParams {
    kernel: Tensor,
    bias: Option<Tensor>,
}

/// ConvTranspose2d (2D 转置卷积) 层
#[derive(Debug, Clone)]
pub struct ConvTranspose2d {
    filters: usize,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: Padding,
    use_bias: bool,
    seed: Option<u64>,
    params: Option<ConvTransposeParams>,
}

impl ConvTranspose2d {
    /// 创建新的 ConvTranspose2d 层（尚未分配参数），参数含义同 `Conv2d::new`
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

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// 按输入通道数创建参数，已构建时只校验通道数是否一致
    pub fn build(&mut self, in_channels: usize) -> Result<(), TensorError> {
        if let Some(built) = self.in_channels() {
            return if built == in_channels {
                Ok(())
            } else {
                Err(TensorError::ShapeMismatch {
                    expected: vec![built],
                    got: vec![in_channels],
                    message: "ConvTranspose2d 已按其他输入通道数构建".to_string(),
                })
            };
        }
        if in_channels == 0 {
            return Err(TensorError::InvalidOperation(
                "ConvTranspose2d 的输入通道数不能为0".to_string(),
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
            "ConvTranspose2d 构建完成：卷积核{:?}，偏置：{}",
            shape,
            self.use_bias
        );
        self.params = Some(ConvTransposeParams { kernel, bias });
        Ok(())
    }

    /// 输入形状为`input_shape`时的输出形状
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, TensorError> {
        let [batch, in_h, in_w, _] = check_nhwc(input_shape, "ConvTranspose2d")?;
        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        Ok(vec![
            batch,
            self.padding.conv_transpose_output_len(in_h, k_h, stride_h),
            self.padding.conv_transpose_output_len(in_w, k_w, stride_w),
            self.filters,
        ])
    }

    /// 直接设置卷积核（形状须为 [kH, kW, filters, in_channels]），未构建时会顺带完成构建
    pub fn set_kernel(&mut self, kernel: Tensor) -> Result<(), TensorError> {
        let in_channels = match *kernel.shape() {
            [k_h, k_w, c_out, c_in]
                if (k_h, k_w) == self.kernel_size && c_out == self.filters && c_in > 0 =>
            {
                c_in
            }
            _ => {
                return Err(TensorError::ShapeMismatch {
                    expected: self.kernel_shape(self.in_channels().unwrap_or(0)).to_vec(),
                    got: kernel.shape().to_vec(),
                    message: "ConvTranspose2d 卷积核形状不符".to_string(),
                });
            }
        };
        match self.params.as_mut() {
            Some(params) if params.kernel.shape()[3] == in_channels => {
                params.kernel = kernel;
                Ok(())
            }
            Some(params) => Err(TensorError::ShapeMismatch {
                expected: params.kernel.shape().to_vec(),
                got: kernel.shape().to_vec(),
                message: "ConvTranspose2d 已按其他输入通道数构建".to_string(),
            }),
            None => {
                let bias = self.use_bias.then(|| Tensor::zeros(&[self.filters]));
                self.params = Some(ConvTransposeParams { kernel, bias });
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
                message: "ConvTranspose2d 偏置形状不符".to_string(),
            });
        }
        match self.params.as_mut().and_then(|params| params.bias.as_mut()) {
            Some(slot) => {
                *slot = bias;
                Ok(())
            }
            None => Err(TensorError::InvalidOperation(
                "ConvTranspose2d 未构建或未启用偏置，无法设置偏置".to_string(),
            )),
        }
    }

    fn kernel_shape(&self, in_channels: usize) -> [usize; 4] {
        [self.kernel_size.0, self.kernel_size.1, self.filters, in_channels]
    }

    /// 执行转置卷积（Rayon 在 batch 维度并行）
    fn convolve_transpose(
        &self,
        x: &Tensor,
        params: &ConvTransposeParams,
    ) -> Result<Tensor, TensorError> {
        let [batch_size, in_h, in_w, in_c] = check_nhwc(x.shape(), "ConvTranspose2d")?;
        let output_shape = self.output_shape(x.shape())?;
        let (out_h, out_w, out_c) = (output_shape[1], output_shape[2], output_shape[3]);
        if output_shape.iter().product::<usize>() == 0 {
            return Ok(Tensor::zeros(&output_shape));
        }

        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        let crop_top = self.padding.conv_transpose_crop_before(k_h, stride_h) as isize;
        let crop_left = self.padding.conv_transpose_crop_before(k_w, stride_w) as isize;

        let input = x.as_slice();
        let kernel = params.kernel.as_slice();
        let bias = params.bias.as_ref().map(Tensor::as_slice);
        let single_input_size = in_h * in_w * in_c;
        let single_output_size = out_h * out_w * out_c;

        // 先整体写入偏置：输入空间尺寸为0时（valid 下输出仍非空）也要生效
        let output_len = batch_size * single_output_size;
        let mut output: Vec<f32> = match bias {
            Some(bias) => bias.iter().copied().cycle().take(output_len).collect(),
            None => vec![0.0f32; output_len],
        };
        if single_input_size == 0 {
            return Ok(Tensor::from_vec(output, &output_shape));
        }
        output
            .par_chunks_mut(single_output_size)
            .zip(input.par_chunks(single_input_size))
            .for_each(|(sample_out, sample_in)| {
                for ih in 0..in_h {
                    for iw in 0..in_w {
                        let in_pixel = &sample_in[(ih * in_w + iw) * in_c..][..in_c];
                        for ki in 0..k_h {
                            let oh = (ih * stride_h + ki) as isize - crop_top;
                            if oh < 0 || oh >= out_h as isize {
                                continue;
                            }
                            for kj in 0..k_w {
                                let ow = (iw * stride_w + kj) as isize - crop_left;
                                if ow < 0 || ow >= out_w as isize {
                                    continue;
                                }
                                let pixel = &mut sample_out
                                    [(oh as usize * out_w + ow as usize) * out_c..][..out_c];
                                let kernel_base = (ki * k_w + kj) * out_c * in_c;
                                for (oc, o) in pixel.iter_mut().enumerate() {
                                    let kernel_row = &kernel[kernel_base + oc * in_c..][..in_c];
                                    *o += in_pixel
                                        .iter()
                                        .zip(kernel_row)
                                        .map(|(&value, &w)| value * w)
                                        .sum::<f32>();
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

    pub fn in_channels(&self) -> Option<usize> {
        self.params.as_ref().map(|params| params.kernel.shape()[3])
    }

    pub fn kernel(&self) -> Option<&Tensor> {
        self.params.as_ref().map(|params| &params.kernel)
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.params.as_ref().and_then(|params| params.bias.as_ref())
    }
}

impl Module for ConvTranspose2d {
    fn forward(&mut self, x: &Tensor, _training: bool) -> Result<Tensor, TensorError> {
        let [_, _, _, in_channels] = check_nhwc(x.shape(), "ConvTranspose2d")?;
        self.build(in_channels)?;
        let params = self.params.as_ref().ok_or_else(|| {
            TensorError::InvalidOperation("ConvTranspose2d 参数未构建".to_string())
        })?;
        self.convolve_transpose(x, params)
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
                .and_then(|kernel| kernel.shape().get(3).copied())
                .ok_or_else(|| StateError::MissingEntry("kernel".to_string()))?,
        };
        let kernel = take_entry(state, "kernel", Some(&self.kernel_shape(in_channels)))?;
        let bias = if self.use_bias {
            Some(take_entry(state, "bias", Some(&[self.filters]))?)
        } else {
            None
        };
        self.params = Some(ConvTransposeParams { kernel, bias });
        Ok(())
    }
}
