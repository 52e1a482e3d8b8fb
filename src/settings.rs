use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::clipboard::ClipboardFormat;
use crate::dispatch::DEFAULT_POLL_AREA;
use crate::error::AppError;

/// 持久化在 `settings.json` 中的应用设置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 读取剪贴板图片时的格式优先级。
    pub image_priority: Vec<ClipboardFormat>,
    /// 粘贴图片的文件名前缀，后面拼接时间戳。
    pub paste_file_stem: String,
    /// 命令行未指定区域时使用的编辑器区域。
    pub default_area: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            image_priority: ClipboardFormat::IMAGE_PRIORITY.to_vec(),
            paste_file_stem: "clipboard".to_string(),
            default_area: DEFAULT_POLL_AREA.to_string(),
        }
    }
}

/// 读取设置；文件不存在返回默认值，无法解析时记警告并返回默认值。
pub fn load_settings(path: &Path) -> Result<AppSettings, AppError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<AppSettings>(&content) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!("⚠️ 解析设置文件 {} 失败，使用默认设置: {}", path.display(), e);
            Ok(AppSettings::default())
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), AppError> {
    let content =
        serde_json::to_string_pretty(settings).map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        std::env::temp_dir().join(format!("drag_import_settings_{nanos}")).join(name)
    }

    #[test]
    fn missing_or_broken_file_yields_defaults() {
        let path = temp_file("settings.json");
        assert_eq!(load_settings(&path).unwrap(), AppSettings::default());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2").unwrap();
        assert_eq!(load_settings(&path).unwrap(), AppSettings::default());

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn partial_file_fills_defaults_and_round_trips() {
        let path = temp_file("settings.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "image_priority": ["DIB"], "default_area": "NODE_EDITOR" }"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.image_priority, [ClipboardFormat::Dib]);
        assert_eq!(settings.default_area, "NODE_EDITOR");
        assert_eq!(settings.paste_file_stem, "clipboard");

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
