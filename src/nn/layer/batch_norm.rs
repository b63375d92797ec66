/*
 * @Author       : 老董
 * @Date         : 2026-09-30
 * @Description  : BatchNorm（批归一化）层，沿最后一维（通道）归一化
 *
 * 训练模式：y = gamma * (x - batch_mean) / sqrt(batch_var + eps) + beta，
 *           并更新 running = running * momentum + batch * (1 - momentum)
 * 推理模式：使用滑动统计量，不修改任何状态
 *
 * batch_var 为有偏方差（除以样本数）
 */

use crate::errors::{StateError, TensorError};
use crate::nn::Module;
use crate::nn::state::{StateDict, ensure_known_entries, take_entry};
use crate::tensor::Tensor;

/// 推理阶段使用的滑动统计量，只能通过训练模式下的前向传播更新
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats {
    mean: Tensor,
    variance: Tensor,
}

impl RunningStats {
    fn new(channels: usize) -> Self {
        Self {
            mean: Tensor::zeros(&[channels]),
            variance: Tensor::ones(&[channels]),
        }
    }

    pub fn mean(&self) -> &Tensor {
        &self.mean
    }

    pub fn variance(&self) -> &Tensor {
        &self.variance
    }

    fn update(&mut self, batch_mean: &[f32], batch_variance: &[f32], momentum: f32) {
        let blend = |running: &mut [f32], batch: &[f32]| {
            for (r, &b) in running.iter_mut().zip(batch) {
                *r = *r * momentum + b * (1.0 - momentum);
            }
        };
        blend(self.mean.as_slice_mut(), batch_mean);
        blend(self.variance.as_slice_mut(), batch_variance);
        log::trace!(
            "BatchNorm 滑动统计量已更新：mean={:?}, variance={:?}",
            self.mean.as_slice(),
            self.variance.as_slice()
        );
    }
}

#[derive(Debug, Clone)]
struct BatchNormParams {
    gamma: Tensor,
    beta: Tensor,
    running: RunningStats,
}

/// BatchNorm 层
#[derive(Debug, Clone)]
pub struct BatchNorm {
    momentum: f32,
    epsilon: f32,
    params: Option<BatchNormParams>,
}

impl Default for BatchNorm {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchNorm {
    pub const DEFAULT_MOMENTUM: f32 = 0.99;
    pub const DEFAULT_EPSILON: f32 = 1e-3;

    pub fn new() -> Self {
        Self::with_hyper_params(Self::DEFAULT_MOMENTUM, Self::DEFAULT_EPSILON)
    }

    pub fn with_hyper_params(momentum: f32, epsilon: f32) -> Self {
        Self {
            momentum,
            epsilon,
            params: None,
        }
    }

    /// 按通道数创建参数：gamma=1，beta=0，滑动均值=0，滑动方差=1
    pub fn build(&mut self, channels: usize) -> Result<(), TensorError> {
        if let Some(built) = self.channels() {
            return if built == channels {
                Ok(())
            } else {
                Err(TensorError::ShapeMismatch {
                    expected: vec![built],
                    got: vec![channels],
                    message: "BatchNorm 已按其他通道数构建".to_string(),
                })
            };
        }
        if channels == 0 {
            return Err(TensorError::InvalidOperation(
                "BatchNorm 的通道数不能为0".to_string(),
            ));
        }
        log::debug!("BatchNorm 构建完成：通道数{channels}");
        self.params = Some(BatchNormParams {
            gamma: Tensor::ones(&[channels]),
            beta: Tensor::zeros(&[channels]),
            running: RunningStats::new(channels),
        });
        Ok(())
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn is_built(&self) -> bool {
        self.params.is_some()
    }

    pub fn channels(&self) -> Option<usize> {
        self.params.as_ref().map(|params| params.gamma.size())
    }

    pub fn gamma(&self) -> Option<&Tensor> {
        self.params.as_ref().map(|params| &params.gamma)
    }

    pub fn beta(&self) -> Option<&Tensor> {
        self.params.as_ref().map(|params| &params.beta)
    }

    pub fn running_stats(&self) -> Option<&RunningStats> {
        self.params.as_ref().map(|params| &params.running)
    }
}

/// 逐通道的均值与有偏方差（f64 累加）
fn channel_moments(data: &[f32], channels: usize) -> (Vec<f32>, Vec<f32>) {
    let count = (data.len() / channels) as f64;
    let mut sum = vec![0.0f64; channels];
    for row in data.chunks_exact(channels) {
        for (s, &v) in sum.iter_mut().zip(row) {
            *s += v as f64;
        }
    }
    let mean: Vec<f64> = sum.iter().map(|s| s / count).collect();

    let mut squared = vec![0.0f64; channels];
    for row in data.chunks_exact(channels) {
        for ((s, &v), m) in squared.iter_mut().zip(row).zip(&mean) {
            let d = v as f64 - m;
            *s += d * d;
        }
    }
    (
        mean.iter().map(|&m| m as f32).collect(),
        squared.iter().map(|s| (s / count) as f32).collect(),
    )
}

impl Module for BatchNorm {
    fn forward(&mut self, x: &Tensor, training: bool) -> Result<Tensor, TensorError> {
        if x.dimension() == 0 {
            return Err(TensorError::DimensionMismatch {
                expected: 1,
                got: 0,
                message: "BatchNorm 的输入至少需要1维（最后一维为通道）".to_string(),
            });
        }
        let channels = x.channels();
        self.build(channels)?;
        let (momentum, epsilon) = (self.momentum, self.epsilon);
        let params = self
            .params
            .as_mut()
            .ok_or_else(|| TensorError::InvalidOperation("BatchNorm 参数未构建".to_string()))?;
        if x.size() == 0 {
            return Ok(x.clone());
        }

        let (mean, variance) = if training {
            let (batch_mean, batch_variance) = channel_moments(x.as_slice(), channels);
            params
                .running
                .update(&batch_mean, &batch_variance, momentum);
            (batch_mean, batch_variance)
        } else {
            (
                params.running.mean.to_vec(),
                params.running.variance.to_vec(),
            )
        };

        // y = x * scale + shift
        let scale: Vec<f32> = params
            .gamma
            .as_slice()
            .iter()
            .zip(&variance)
            .map(|(&g, &v)| g / (v + epsilon).sqrt())
            .collect();
        let shift: Vec<f32> = params
            .beta
            .as_slice()
            .iter()
            .zip(&mean)
            .zip(&scale)
            .map(|((&b, &m), &s)| b - m * s)
            .collect();

        let mut output = x.clone();
        for row in output.as_slice_mut().chunks_exact_mut(channels) {
            for ((o, &s), &t) in row.iter_mut().zip(&scale).zip(&shift) {
                *o = *o * s + t;
            }
        }
        Ok(output)
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        match &self.params {
            Some(params) => vec![
                ("gamma".to_string(), &params.gamma),
                ("beta".to_string(), &params.beta),
            ],
            None => Vec::new(),
        }
    }

    fn named_buffers(&self) -> Vec<(String, &Tensor)> {
        match &self.params {
            Some(params) => vec![
                ("running_mean".to_string(), &params.running.mean),
                ("running_variance".to_string(), &params.running.variance),
            ],
            None => Vec::new(),
        }
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<(), StateError> {
        ensure_known_entries(
            state,
            &["gamma", "beta", "running_mean", "running_variance"],
        )?;
        let channels = match self.channels() {
            Some(channels) => channels,
            None => state
                .get("gamma")
                .map(Tensor::size)
                .ok_or_else(|| StateError::MissingEntry("gamma".to_string()))?,
        };
        let shape = [channels];
        self.params = Some(BatchNormParams {
            gamma: take_entry(state, "gamma", Some(&shape))?,
            beta: take_entry(state, "beta", Some(&shape))?,
            running: RunningStats {
                mean: take_entry(state, "running_mean", Some(&shape))?,
                variance: take_entry(state, "running_variance", Some(&shape))?,
            },
        });
        Ok(())
    }
}
