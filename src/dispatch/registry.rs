//! # 处理器注册表
//!
//! ## 设计思路
//!
//! 注册表是加载后的处理器集合，负责按"编辑器区域 + 扩展名"挑选候选处理器。
//! 每个处理器按加载顺序分配稳定的注册 id：
//! 操作符 `drag_import.import_<n>`、文件处理器 `DRAG_IMPORT_FH_handle<n>`。
//!
//! ## 实现思路
//!
//! - 用 `Vec` 保存，保持配置顺序；标签唯一，`upsert` 原位替换。
//! - `reload` 先清空再从 `ConfigStore` 重建，id 随之重新编号。

use std::path::Path;

use log::{debug, info};

use super::config::{ConfigError, ConfigStore};
use super::definition::HandlerDefinition;

pub const OPERATOR_ID_PREFIX: &str = "drag_import.import_";
pub const FILE_HANDLER_ID_PREFIX: &str = "DRAG_IMPORT_FH_handle";

/// 已注册的处理器。
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredHandler {
    pub operator_idname: String,
    pub handle_idname: String,
    pub definition: HandlerDefinition,
}

impl RegisteredHandler {
    fn new(index: usize, definition: HandlerDefinition) -> Self {
        Self {
            operator_idname: format!("{OPERATOR_ID_PREFIX}{index}"),
            handle_idname: format!("{FILE_HANDLER_ID_PREFIX}{index}"),
            definition,
        }
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }
}

#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<RegisteredHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = HandlerDefinition>) -> Self {
        let mut registry = Self::new();
        for definition in definitions {
            registry.upsert(definition);
        }
        registry
    }

    pub fn reload(&mut self, store: &ConfigStore) -> Result<usize, ConfigError> {
        let definitions = store.load()?;
        self.clear();
        for definition in definitions {
            self.upsert(definition);
        }
        info!("🔄 处理器注册表已重建，共 {} 个", self.handlers.len());
        Ok(self.handlers.len())
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&RegisteredHandler> {
        self.handlers.iter().find(|h| h.label() == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredHandler> {
        self.handlers.iter()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &HandlerDefinition> {
        self.handlers.iter().map(|h| &h.definition)
    }

    /// 在 `area` 中轮询通过、且能处理 `files` 中至少一个文件的处理器，按注册顺序返回。
    pub fn candidates<S: AsRef<str>>(&self, area: &str, files: &[S]) -> Vec<&RegisteredHandler> {
        let matched: Vec<_> = self
            .handlers
            .iter()
            .filter(|h| h.definition.polls(area))
            .filter(|h| files.iter().any(|f| h.definition.accepts(file_name(f.as_ref()))))
            .collect();
        debug!("区域 {} 匹配到 {} 个处理器", area, matched.len());
        matched
    }

    /// 新增或替换同标签处理器，返回其注册信息。
    pub fn upsert(&mut self, definition: HandlerDefinition) -> &RegisteredHandler {
        match self.handlers.iter().position(|h| h.label() == definition.label) {
            Some(index) => {
                self.handlers[index].definition = definition;
                &self.handlers[index]
            }
            None => {
                let index = self.next_index();
                self.handlers.push(RegisteredHandler::new(index, definition));
                &self.handlers[self.handlers.len() - 1]
            }
        }
    }

    pub fn remove(&mut self, label: &str) -> Option<HandlerDefinition> {
        let index = self.handlers.iter().position(|h| h.label() == label)?;
        Some(self.handlers.remove(index).definition)
    }

    pub fn save(&self, store: &ConfigStore) -> Result<(), ConfigError> {
        let definitions: Vec<_> = self.definitions().cloned().collect();
        store.save(&definitions)
    }

    fn next_index(&self) -> usize {
        self.handlers
            .iter()
            .filter_map(|h| h.operator_idname.strip_prefix(OPERATOR_ID_PREFIX)?.parse::<usize>().ok())
            .max()
            .map_or(0, |max| max + 1)
    }
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}
