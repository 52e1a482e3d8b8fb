//! # 非 Windows 回退后端（arboard）
//!
//! 只能提供文本与图片两种格式：
//! - 文本映射为 `CF_UNICODETEXT`（UTF-16LE + NUL），与 Windows 保持同一解码路径；
//! - 图片由 arboard 给出 RGBA 像素，这里编码为 PNG 后以注册格式 `"PNG"` 暴露。
//!
//! 文件列表在这些平台上不可用，`CF_HDROP` 始终视为不存在。

use std::borrow::Cow;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use super::dropfiles::{decode_unicode_text, encode_unicode_text};
use super::format::{CF_UNICODETEXT, PNG_FORMAT_NAMES};
use super::{ClipboardBackend, ClipboardError};

/// 回退后端给 PNG 分配的固定编号。
const PNG_FORMAT_ID: u32 = 0xC000;

#[derive(Default)]
pub struct ArboardClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Access("剪贴板未打开".to_string()))
    }

    fn read_png(&mut self) -> Result<Vec<u8>, ClipboardError> {
        let image = self
            .inner()?
            .get_image()
            .map_err(|e| ClipboardError::Access(format!("读取图片失败：{}", e)))?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                &image.bytes,
                image.width as u32,
                image.height as u32,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| ClipboardError::malformed(format!("PNG 编码失败：{}", e)))?;
        Ok(png)
    }
}

impl ClipboardBackend for ArboardClipboard {
    fn open(&mut self) -> Result<(), ClipboardError> {
        if self.inner.is_some() {
            return Err(ClipboardError::Access("剪贴板已被打开".to_string()));
        }
        let clipboard = arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        self.inner = Some(clipboard);
        Ok(())
    }

    fn close(&mut self) {
        self.inner = None;
    }

    fn is_format_available(&mut self, format_id: u32) -> bool {
        let Some(clipboard) = self.inner.as_mut() else {
            return false;
        };
        match format_id {
            CF_UNICODETEXT => clipboard.get_text().is_ok(),
            PNG_FORMAT_ID => clipboard.get_image().is_ok(),
            _ => false,
        }
    }

    fn register_format(&mut self, name: &str) -> Result<u32, ClipboardError> {
        if PNG_FORMAT_NAMES.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            Ok(PNG_FORMAT_ID)
        } else {
            Err(ClipboardError::Access(format!("当前平台不支持注册格式 '{}'", name)))
        }
    }

    fn read_data(&mut self, format_id: u32) -> Result<Vec<u8>, ClipboardError> {
        match format_id {
            CF_UNICODETEXT => {
                let text = self
                    .inner()?
                    .get_text()
                    .map_err(|e| ClipboardError::Access(format!("读取文本失败：{}", e)))?;
                Ok(encode_unicode_text(&text))
            }
            PNG_FORMAT_ID => self.read_png(),
            other => Err(ClipboardError::Access(format!("当前平台不支持读取格式 {}", other))),
        }
    }

    fn enumerate_formats(&mut self) -> Result<Vec<u32>, ClipboardError> {
        self.inner()?;
        Ok([CF_UNICODETEXT, PNG_FORMAT_ID]
            .into_iter()
            .filter(|&id| self.is_format_available(id))
            .collect())
    }

    fn format_name(&mut self, format_id: u32) -> Option<String> {
        (format_id == PNG_FORMAT_ID).then(|| PNG_FORMAT_NAMES[0].to_string())
    }

    fn empty(&mut self) -> Result<(), ClipboardError> {
        self.inner()?
            .clear()
            .map_err(|e| ClipboardError::Access(format!("清空剪贴板失败：{}", e)))
    }

    fn write_data(&mut self, format_id: u32, data: &[u8]) -> Result<(), ClipboardError> {
        match format_id {
            CF_UNICODETEXT => self
                .inner()?
                .set_text(decode_unicode_text(data))
                .map_err(|e| ClipboardError::Access(format!("写入文本失败：{}", e))),
            PNG_FORMAT_ID => {
                let rgba = image::load_from_memory(data)
                    .map_err(|e| ClipboardError::malformed(format!("PNG 解码失败：{}", e)))?
                    .to_rgba8();
                let (width, height) = rgba.dimensions();
                let image_data = arboard::ImageData {
                    width: width as usize,
                    height: height as usize,
                    bytes: Cow::Owned(rgba.into_raw()),
                };
                self.inner()?
                    .set_image(image_data)
                    .map_err(|e| ClipboardError::Access(format!("写入图片失败：{}", e)))
            }
            other => Err(ClipboardError::Access(format!("当前平台不支持写入格式 {}", other))),
        }
    }
}
