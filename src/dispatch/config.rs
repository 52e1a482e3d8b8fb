//! # 配置文件读写
//!
//! `config/` 目录下每个 `*.json` 文件是一个分类，文件内容是 `标签 → 记录` 的 JSON 对象。
//!
//! - 读取：按文件名排序依次加载，键顺序保持文件中的顺序（`serde_json` 的 `preserve_order`）；
//!   后出现的同名标签原位替换先出现的。
//! - 保存：按分类分组写回 `<category>.json`（美化输出）；已不再有处理器的分类文件会被删除，
//!   否则重新加载时旧文件里的同名标签会覆盖刚保存的修改。

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{Map, Value};

use super::definition::{DEFAULT_CATEGORY, HandlerDefinition, HandlerRecord};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("读写配置文件 '{}' 失败：{source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析配置文件 '{}' 失败：{source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("序列化处理器配置失败：{0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// 处理器配置目录。
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 目录下所有配置文件，按文件名排序。目录不存在时返回空列表。
    pub fn config_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::io(&self.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    pub fn load(&self) -> Result<Vec<HandlerDefinition>, ConfigError> {
        let mut definitions: Vec<HandlerDefinition> = Vec::new();

        for path in self.config_files()? {
            let category = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            let content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
            let records: Map<String, Value> = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

            for (label, value) in records {
                let record: HandlerRecord = serde_json::from_value(value).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
                let definition = HandlerDefinition::from_record(label, category.clone(), record);
                match definitions.iter_mut().find(|d| d.label == definition.label) {
                    Some(existing) => {
                        debug!("🔁 标签 '{}' 被 '{}' 中的同名配置覆盖", definition.label, path.display());
                        *existing = definition;
                    }
                    None => definitions.push(definition),
                }
            }
        }

        info!("📂 已从 {} 加载 {} 条处理器配置", self.dir.display(), definitions.len());
        Ok(definitions)
    }

    pub fn save(&self, definitions: &[HandlerDefinition]) -> Result<(), ConfigError> {
        let mut groups: Vec<(&str, Map<String, Value>)> = Vec::new();
        for definition in definitions {
            let value = serde_json::to_value(definition.to_record())?;
            let category = definition.category.as_str();
            match groups.iter_mut().find(|(name, _)| *name == category) {
                Some((_, records)) => {
                    records.insert(definition.label.clone(), value);
                }
                None => {
                    let mut records = Map::new();
                    records.insert(definition.label.clone(), value);
                    groups.push((category, records));
                }
            }
        }

        for stale in self.config_files()? {
            let in_use = stale
                .file_stem()
                .is_some_and(|stem| groups.iter().any(|(category, _)| stem == *category));
            if !in_use {
                fs::remove_file(&stale).map_err(|e| ConfigError::io(&stale, e))?;
                info!("🗑️ 已删除空分类配置：{}", stale.display());
            }
        }

        if groups.is_empty() {
            debug!("没有需要保存的处理器配置");
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;

        for (category, records) in groups {
            let path = self.dir.join(format!("{category}.json"));
            let content = serde_json::to_string_pretty(&Value::Object(records))?;
            fs::write(&path, content).map_err(|e| ConfigError::io(&path, e))?;
            info!("💾 已保存处理器配置：{}", path.display());
        }
        Ok(())
    }
}
