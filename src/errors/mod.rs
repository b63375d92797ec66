use thiserror::Error;
mod ops;
pub use self::ops::*;

/// 构建（block/layer）时的配置错误，一律在构造阶段同步抛出，而非拖延到第一次前向传播
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    // 数字比较用
    #[error("{value_name}须{operator}{threshold}，但得到{value}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: usize,
        value: usize,
    },
    #[error("{block}不支持激活函数`{activation}`，可选项为：{allowed:?}")]
    UnsupportedActivation {
        block: &'static str,
        activation: String,
        allowed: &'static [&'static str],
    },
    #[error("未知的激活函数名称`{0}`")]
    UnknownActivation(String),
    #[error("未知的填充策略`{0}`，仅支持`same`或`valid`")]
    UnknownPadding(String),
}

impl ConfigurationError {
    /// 校验`value`不小于`threshold`
    pub(crate) fn check_at_least(
        value_name: &str,
        value: usize,
        threshold: usize,
    ) -> Result<(), Self> {
        if value >= threshold {
            Ok(())
        } else {
            Err(Self::ValueMustSatisfyComparison {
                value_name: value_name.to_string(),
                operator: ComparisonOperator::GreaterOrEqual,
                threshold,
                value,
            })
        }
    }
}

/// 前向传播时与张量形状相关的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("{message}：期望形状{expected:?}，实际得到{got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("{message}：期望{expected}维，实际得到{got}维")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        message: String,
    },
    #[error("数据长度{data_len}与形状{shape:?}的元素个数不一致")]
    DataLengthMismatch { data_len: usize, shape: Vec<usize> },
    #[error("无效操作：{0}")]
    InvalidOperation(String),
}

/// 保存/加载模型状态时的错误
#[derive(Error, Debug)]
pub enum StateError {
    #[error("读写状态文件失败：{0}")]
    Io(#[from] std::io::Error),
    #[error("（反）序列化状态失败：{0}")]
    Serialization(#[from] bincode::Error),
    #[error("状态中缺少条目`{0}`")]
    MissingEntry(String),
    #[error("状态中存在无法识别的条目`{0}`")]
    UnexpectedEntry(String),
    #[error("条目`{name}`形状不一致：期望{expected:?}，实际得到{got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl StateError {
    /// 给条目名补上子模块前缀，如`running_mean` -> `batchnorm.running_mean`
    pub(crate) fn with_prefix(self, prefix: &str) -> Self {
        match self {
            Self::MissingEntry(name) => Self::MissingEntry(format!("{prefix}.{name}")),
            Self::UnexpectedEntry(name) => Self::UnexpectedEntry(format!("{prefix}.{name}")),
            Self::ShapeMismatch {
                name,
                expected,
                got,
            } => Self::ShapeMismatch {
                name: format!("{prefix}.{name}"),
                expected,
                got,
            },
            other => other,
        }
    }
}
