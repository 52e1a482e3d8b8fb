//! 宿主应用接口：导入操作符调用、选择集读写、多处理器时的显式选择。

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use super::definition::{OperatorContext, OperatorId};
use super::error::HostError;
use super::registry::RegisteredHandler;

/// 宿主中对象或节点的标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 一次导入操作符调用。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportCall {
    #[serde(serialize_with = "serialize_display")]
    pub operator: OperatorId,
    pub context: OperatorContext,
    pub filepath: PathBuf,
    pub kwargs: Map<String, Value>,
}

fn serialize_display<S: serde::Serializer>(value: &OperatorId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// 宿主应用（如 3D 编辑器）需要提供的能力。
pub trait ImportHost {
    /// 宿主是否认识该操作符；不认识时引擎降级为空操作。
    fn has_operator(&self, _operator: &OperatorId) -> bool {
        true
    }

    fn invoke_import(&mut self, call: &ImportCall) -> Result<(), HostError>;

    /// 当前选中的对象。
    fn selected_objects(&self) -> Vec<EntityId>;

    /// 当前选中的节点，没有节点编辑器的宿主返回空。
    fn selected_nodes(&self) -> Vec<EntityId> {
        Vec::new()
    }

    /// 用给定集合替换当前选择。
    fn select(&mut self, objects: &[EntityId], nodes: &[EntityId]);

    fn set_active_node(&mut self, _node: &EntityId) {}
}

/// 多个处理器都能处理本次投放时，由用户显式选择。
pub trait HandlerChooser {
    /// 返回选中的候选下标；`None` 表示取消。
    fn choose(&mut self, candidates: &[&RegisteredHandler]) -> Option<usize>;
}

impl<F> HandlerChooser for F
where
    F: FnMut(&[&RegisteredHandler]) -> Option<usize>,
{
    fn choose(&mut self, candidates: &[&RegisteredHandler]) -> Option<usize> {
        self(candidates)
    }
}
