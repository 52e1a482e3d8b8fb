//! # 剪贴板格式表
//!
//! 标准格式使用固定编号（与 Win32 `CF_*` 常量一致），
//! PNG 属于注册格式，编号由运行时 `RegisterClipboardFormatW` 决定，
//! 因此这里只记录注册名称（`"PNG"` 优先，`"image/png"` 备选）。

use serde::{Deserialize, Serialize};

pub const CF_BITMAP: u32 = 2;
pub const CF_DIB: u32 = 8;
pub const CF_UNICODETEXT: u32 = 13;
pub const CF_HDROP: u32 = 15;
pub const CF_DIBV5: u32 = 17;

/// PNG 的注册名称，按优先级排列。
pub const PNG_FORMAT_NAMES: [&str; 2] = ["PNG", "image/png"];

/// 本模块能解码的剪贴板格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipboardFormat {
    #[serde(rename = "UNICODETEXT")]
    UnicodeText,
    #[serde(rename = "HDROP")]
    FileDropList,
    #[serde(rename = "DIB")]
    Dib,
    #[serde(rename = "DIBV5")]
    DibV5,
    #[serde(rename = "PNG")]
    Png,
}

impl ClipboardFormat {
    pub const ALL: [ClipboardFormat; 5] = [
        ClipboardFormat::UnicodeText,
        ClipboardFormat::FileDropList,
        ClipboardFormat::Dib,
        ClipboardFormat::DibV5,
        ClipboardFormat::Png,
    ];

    /// 默认的图片读取优先级：PNG > DIBV5 > DIB。
    pub const IMAGE_PRIORITY: [ClipboardFormat; 3] =
        [ClipboardFormat::Png, ClipboardFormat::DibV5, ClipboardFormat::Dib];

    /// 标准格式的固定编号；注册格式（PNG）返回 `None`。
    pub fn standard_id(self) -> Option<u32> {
        match self {
            Self::UnicodeText => Some(CF_UNICODETEXT),
            Self::FileDropList => Some(CF_HDROP),
            Self::Dib => Some(CF_DIB),
            Self::DibV5 => Some(CF_DIBV5),
            Self::Png => None,
        }
    }

    /// 注册格式的名称列表；标准格式为空。
    pub fn registered_names(self) -> &'static [&'static str] {
        match self {
            Self::Png => &PNG_FORMAT_NAMES,
            _ => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UnicodeText => "CF_UNICODETEXT",
            Self::FileDropList => "CF_HDROP",
            Self::Dib => "CF_DIB",
            Self::DibV5 => "CF_DIBV5",
            Self::Png => "PNG",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Dib | Self::DibV5 | Self::Png)
    }
}

/// 标准格式没有注册名，枚举格式时用这张表补齐显示名称。
pub fn standard_format_name(format_id: u32) -> Option<&'static str> {
    let name = match format_id {
        1 => "CF_TEXT",
        2 => "CF_BITMAP",
        3 => "CF_METAFILEPICT",
        4 => "CF_SYLK",
        5 => "CF_DIF",
        6 => "CF_TIFF",
        7 => "CF_OEMTEXT",
        8 => "CF_DIB",
        9 => "CF_PALETTE",
        10 => "CF_PENDATA",
        11 => "CF_RIFF",
        12 => "CF_WAVE",
        13 => "CF_UNICODETEXT",
        14 => "CF_ENHMETAFILE",
        15 => "CF_HDROP",
        16 => "CF_LOCALE",
        17 => "CF_DIBV5",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ids_match_win32_constants() {
        assert_eq!(ClipboardFormat::UnicodeText.standard_id(), Some(13));
        assert_eq!(ClipboardFormat::FileDropList.standard_id(), Some(15));
        assert_eq!(ClipboardFormat::Dib.standard_id(), Some(8));
        assert_eq!(ClipboardFormat::DibV5.standard_id(), Some(17));
        assert_eq!(ClipboardFormat::Png.standard_id(), None);
        assert_eq!(ClipboardFormat::Png.registered_names(), &["PNG", "image/png"]);
    }

    #[test]
    fn standard_format_names_cover_builtin_range_only() {
        assert_eq!(standard_format_name(CF_HDROP), Some("CF_HDROP"));
        assert_eq!(standard_format_name(CF_BITMAP), Some("CF_BITMAP"));
        assert_eq!(standard_format_name(0xC0DE), None);
    }

    #[test]
    fn formats_serialize_with_clipboard_names() {
        let json = serde_json::to_string(&ClipboardFormat::IMAGE_PRIORITY).expect("serialize");
        assert_eq!(json, r#"["PNG","DIBV5","DIB"]"#);
    }
}
