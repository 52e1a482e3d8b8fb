//! 资源目录管理模块
//!
//! # 设计思路
//!
//! 统一管理处理器配置、钩子脚本、粘贴图片的存放位置，支持通过参数或环境变量自定义根目录，
//! 并在目录不存在时自动创建。
//!
//! ```text
//! <asset>/
//! ├── config/      处理器配置（每个分类一个 *.json）
//! ├── scripts/     钩子脚本
//! ├── pasted/      从剪贴板粘贴的图片
//! └── settings.json
//! ```
//!
//! # 实现思路
//!
//! - 优先使用显式传入的目录，其次是 `DRAG_IMPORT_ASSET_DIR` 环境变量，最后回退到当前目录下的 `asset`。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const ASSET_DIR_ENV: &str = "DRAG_IMPORT_ASSET_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "default.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// 资源目录布局
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 解析资源根目录：显式参数 > 环境变量 > `./asset`。
    pub fn resolve(custom_dir: Option<&Path>) -> Result<Self, AppError> {
        if let Some(dir) = custom_dir.filter(|d| !d.as_os_str().is_empty()) {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(ASSET_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let cwd = std::env::current_dir().map_err(|e| AppError::Storage(format!("获取当前目录失败: {}", e)))?;
        Ok(Self::new(cwd.join("asset")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn default_config_file(&self) -> PathBuf {
        self.config_dir().join(DEFAULT_CONFIG_FILE)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn pasted_dir(&self) -> PathBuf {
        self.root.join("pasted")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// 创建全部子目录
    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [self.config_dir(), self.scripts_dir(), self.pasted_dir()] {
            if !dir.exists() {
                fs::create_dir_all(&dir)
                    .map_err(|e| AppError::Storage(format!("创建目录 '{}' 失败: {}", dir.display(), e)))?;
            }
        }
        Ok(())
    }
}
