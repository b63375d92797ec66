/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 模块状态（参数 + 缓冲区）的收集、校验与磁盘读写
 */

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::StateError;
use crate::nn::Module;
use crate::tensor::Tensor;

/// 名称 -> 张量，按名称有序，保证序列化结果稳定
pub type StateDict = BTreeMap<String, Tensor>;

/// 将模块状态以 bincode 格式写入`path`
pub fn save_state<M: Module + ?Sized, P: AsRef<Path>>(
    module: &M,
    path: P,
) -> Result<(), StateError> {
    let state = module.state_dict();
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    bincode::serialize_into(&mut writer, &state)?;
    writer.flush()?;
    log::debug!(
        "已保存{}个状态条目到{}",
        state.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// 从`path`读取状态并加载到模块中
pub fn load_state<M: Module + ?Sized, P: AsRef<Path>>(
    module: &mut M,
    path: P,
) -> Result<(), StateError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let state: StateDict = bincode::deserialize_from(reader)?;
    module.load_state_dict(&state)?;
    log::debug!(
        "已从{}加载{}个状态条目",
        path.as_ref().display(),
        state.len()
    );
    Ok(())
}

/// 取出`prefix.`开头的条目并去掉前缀，用于把状态分发给子模块
fn sub_dict(state: &StateDict, prefix: &str) -> StateDict {
    let prefix = format!("{prefix}.");
    state
        .iter()
        .filter_map(|(name, tensor)| {
            name.strip_prefix(&prefix)
                .map(|rest| (rest.to_string(), tensor.clone()))
        })
        .collect()
}

/// 把子模块的状态载入其副本，成功时返回副本，失败时不影响原模块；
/// 报错中的条目名会补回`prefix.`前缀
pub(crate) fn load_sub_module<M: Module + Clone>(
    module: &M,
    state: &StateDict,
    prefix: &str,
) -> Result<M, StateError> {
    let mut staged = module.clone();
    staged
        .load_state_dict(&sub_dict(state, prefix))
        .map_err(|error| error.with_prefix(prefix))?;
    Ok(staged)
}

/// 取出名为`name`的条目；若给出`expected`则校验形状
pub(crate) fn take_entry(
    state: &StateDict,
    name: &str,
    expected: Option<&[usize]>,
) -> Result<Tensor, StateError> {
    let tensor = state
        .get(name)
        .ok_or_else(|| StateError::MissingEntry(name.to_string()))?;
    if let Some(expected) = expected {
        if tensor.shape() != expected {
            return Err(StateError::ShapeMismatch {
                name: name.to_string(),
                expected: expected.to_vec(),
                got: tensor.shape().to_vec(),
            });
        }
    }
    Ok(tensor.clone())
}

/// 校验状态中没有模块不认识的条目
pub(crate) fn ensure_known_entries(state: &StateDict, known: &[&str]) -> Result<(), StateError> {
    match state.keys().find(|name| !known.contains(&name.as_str())) {
        Some(name) => Err(StateError::UnexpectedEntry(name.clone())),
        None => Ok(()),
    }
}

/// 校验状态中的每个条目都属于某个已知子模块（以`prefix.`开头）
pub(crate) fn ensure_known_prefixes(
    state: &StateDict,
    prefixes: &[&str],
) -> Result<(), StateError> {
    let is_known = |name: &str| {
        prefixes.iter().any(|prefix| {
            name.strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'))
        })
    };
    match state.keys().find(|name| !is_known(name.as_str())) {
        Some(name) => Err(StateError::UnexpectedEntry(name.clone())),
        None => Ok(()),
    }
}
