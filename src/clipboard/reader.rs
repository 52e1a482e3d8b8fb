//! # 剪贴板读取会话
//!
//! ## 设计思路
//!
//! 剪贴板是系统级共享资源，访问纪律是“打开 → 完成所有读取 → 关闭”。
//! `ClipboardReader::open` 返回 `ClipboardSession` 守卫，所有读写方法只存在于守卫上，
//! 因此“未打开就读取”在类型层面不可能发生。
//!
//! ## 实现思路
//!
//! - `ClipboardSession` 采用 RAII：`Drop` 中调用 `close`，
//!   无论成功、`?` 提前返回还是解码报错，关闭都是最后一个动作。
//! - 读取前先检查格式是否可用，不可用直接返回 `ClipboardError::Empty`，不返回部分数据。
//! - PNG 为注册格式，按 `"PNG"` → `"image/png"` 依次解析编号。

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::bitmap::{bmp_to_dib, dib_to_bmp, dibv5_to_bmp};
use super::dropfiles::{decode_unicode_text, encode_unicode_text, parse_file_list};
use super::format::{CF_DIB, CF_DIBV5, CF_UNICODETEXT, standard_format_name};
use super::{ClipboardBackend, ClipboardError, ClipboardFormat};

/// 解码后的图片文件类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Bmp,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }
}

/// 从剪贴板取得的、可直接写盘的完整图片文件。
#[derive(Debug, Clone)]
pub struct ClipboardImage {
    pub kind: ImageKind,
    /// 数据实际来自哪个剪贴板格式。
    pub source: ClipboardFormat,
    pub bytes: Vec<u8>,
}

impl ClipboardImage {
    /// 从文件头读取宽高，不做完整解码。
    pub fn dimensions(&self) -> Result<(u32, u32), ClipboardError> {
        image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| ClipboardError::malformed(format!("无法读取图片尺寸：{}", e)))
    }

    /// 写入 `dir/stem.<png|bmp>`，目录不存在时自动创建。
    pub fn save(&self, dir: &Path, stem: &str) -> Result<PathBuf, ClipboardError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", stem, self.kind.extension()));
        fs::write(&path, &self.bytes)?;
        log::info!("🖼️ 剪贴板图片已保存（{}）: {}", self.source.name(), path.display());
        Ok(path)
    }
}

/// 剪贴板读取器，持有具体后端。
pub struct ClipboardReader<B: ClipboardBackend> {
    backend: B,
}

impl<B: ClipboardBackend> ClipboardReader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// 独占打开剪贴板，返回的会话离开作用域时自动关闭。
    pub fn open(&mut self) -> Result<ClipboardSession<'_, B>, ClipboardError> {
        self.backend.open()?;
        log::debug!("📋 剪贴板已打开");
        Ok(ClipboardSession { backend: &mut self.backend })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

/// 一次打开的剪贴板会话。
pub struct ClipboardSession<'a, B: ClipboardBackend> {
    backend: &'a mut B,
}

impl<B: ClipboardBackend> ClipboardSession<'_, B> {
    /// 显式关闭；等价于直接丢弃会话。
    pub fn close(self) {}

    pub fn is_format_available(&mut self, format: ClipboardFormat) -> bool {
        self.available_id(format).is_some()
    }

    /// 当前剪贴板上所有格式：`(编号, 名称)`，按系统枚举顺序。
    pub fn available_formats(&mut self) -> Result<Vec<(u32, String)>, ClipboardError> {
        let ids = self.backend.enumerate_formats()?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let name = self
                    .backend
                    .format_name(id)
                    .or_else(|| standard_format_name(id).map(str::to_string))
                    .unwrap_or_default();
                (id, name)
            })
            .collect())
    }

    pub fn read_text(&mut self) -> Result<String, ClipboardError> {
        let data = self.read_checked(ClipboardFormat::UnicodeText)?;
        Ok(decode_unicode_text(&data))
    }

    /// 读取资源管理器复制的文件列表（绝对路径，按枚举顺序）。
    pub fn read_file_paths(&mut self) -> Result<Vec<String>, ClipboardError> {
        let data = self.read_checked(ClipboardFormat::FileDropList)?;
        let paths = parse_file_list(&data)?;
        log::info!("📁 从剪贴板读取到 {} 个文件", paths.len());
        Ok(paths)
    }

    /// 读取指定的图片格式并转成完整图片文件；该格式不在剪贴板上时返回 `Empty`。
    pub fn read_image_format(&mut self, format: ClipboardFormat) -> Result<ClipboardImage, ClipboardError> {
        if !format.is_image() {
            return Err(ClipboardError::UnsupportedImageFormat);
        }
        let data = self.read_checked(format)?;
        let (kind, bytes) = match format {
            ClipboardFormat::Png => (ImageKind::Png, data),
            ClipboardFormat::DibV5 => (ImageKind::Bmp, dibv5_to_bmp(&data)?),
            _ => (ImageKind::Bmp, dib_to_bmp(&data)?),
        };
        log::debug!("🖼️ 读取剪贴板图片：{}（{} 字节）", format.name(), bytes.len());
        Ok(ClipboardImage { kind, source: format, bytes })
    }

    /// 按优先级读取第一个可用的图片格式；一个都没有时返回 `UnsupportedImageFormat`。
    pub fn read_image(&mut self, priority: &[ClipboardFormat]) -> Result<ClipboardImage, ClipboardError> {
        for &format in priority {
            if !format.is_image() {
                log::debug!("⏭️ 跳过非图片格式 {}", format.name());
                continue;
            }
            if self.is_format_available(format) {
                return self.read_image_format(format);
            }
        }
        Err(ClipboardError::UnsupportedImageFormat)
    }

    /// 使用默认优先级（PNG > DIBV5 > DIB）读取图片。
    pub fn read_default_image(&mut self) -> Result<ClipboardImage, ClipboardError> {
        self.read_image(&ClipboardFormat::IMAGE_PRIORITY)
    }

    pub fn empty(&mut self) -> Result<(), ClipboardError> {
        self.backend.empty()
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.backend.write_data(CF_UNICODETEXT, &encode_unicode_text(text))
    }

    pub fn write_png(&mut self, png: &[u8]) -> Result<(), ClipboardError> {
        let format_id = self.backend.register_format(ClipboardFormat::Png.registered_names()[0])?;
        self.backend.write_data(format_id, png)
    }

    /// 写入完整 `.bmp` 文件：去掉文件头，按信息头版本选择 `CF_DIBV5` 或 `CF_DIB`。
    pub fn write_bitmap_file(&mut self, bmp: &[u8]) -> Result<(), ClipboardError> {
        let (dib, is_v5_family) = bmp_to_dib(bmp)?;
        let format_id = if is_v5_family { CF_DIBV5 } else { CF_DIB };
        self.backend.write_data(format_id, dib)
    }

    /// 按扩展名把图片文件写入剪贴板（仅支持 png / bmp）。
    pub fn write_image_file(&mut self, path: &Path) -> Result<(), ClipboardError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => self.write_png(&fs::read(path)?),
            "bmp" => self.write_bitmap_file(&fs::read(path)?),
            _ => Err(ClipboardError::UnsupportedImageFormat),
        }
    }

    fn available_id(&mut self, format: ClipboardFormat) -> Option<u32> {
        if let Some(id) = format.standard_id() {
            return self.backend.is_format_available(id).then_some(id);
        }
        for name in format.registered_names() {
            match self.backend.register_format(name) {
                Ok(id) if self.backend.is_format_available(id) => return Some(id),
                Ok(_) => {}
                Err(err) => log::debug!("注册格式 '{}' 失败: {}", name, err),
            }
        }
        None
    }

    fn read_checked(&mut self, format: ClipboardFormat) -> Result<Vec<u8>, ClipboardError> {
        let format_id = self.available_id(format).ok_or(ClipboardError::Empty(format))?;
        self.backend.read_data(format_id)
    }
}

impl<B: ClipboardBackend> Drop for ClipboardSession<'_, B> {
    fn drop(&mut self) {
        self.backend.close();
        log::debug!("📋 剪贴板已关闭");
    }
}
