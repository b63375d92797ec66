use std::fmt::{self, Display};

/// 数值校验中使用的比较关系，目前只有层/块的超参数下限校验用到`≥`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    GreaterOrEqual,
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterOrEqual => f.write_str("≥"),
        }
    }
}
