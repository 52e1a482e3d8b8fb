//! # 位图头解析与 BMP 文件重建
//!
//! ## 设计思路
//!
//! 剪贴板中的 `CF_DIB` / `CF_DIBV5` 只包含信息头 + 像素，没有 14 字节的文件头。
//! 这里按固定偏移读取信息头字段，校验压缩方式后补一个 `BITMAPFILEHEADER`，
//! 得到可以直接写盘、交给下游读取器的完整 `.bmp`。
//!
//! ## 实现思路
//!
//! - 所有字段按小端读取，偏移由位图头布局标准固定。
//! - DIBV5 额外打补丁：`BI_RGB` 改写为 `BI_BITFIELDS` 并写入 RGBA 掩码，
//!   已是 `BI_BITFIELDS` 的仅补 alpha 掩码，保证下游识别 alpha 通道。
//! - 补丁对已打过补丁的数据再次执行结果逐字节一致。

use super::ClipboardError;

pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
pub const V4_HEADER_SIZE: usize = 108;
pub const V5_HEADER_SIZE: usize = 124;

pub const BI_RGB: u32 = 0;
pub const BI_BITFIELDS: u32 = 3;

const COMPRESSION_OFFSET: usize = 16;
const MASKS_OFFSET: usize = 40;
const ALPHA_MASK_OFFSET: usize = 52;
const MASKS_END: usize = 56;

/// 红 / 绿 / 蓝 / alpha 掩码（0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000，小端）。
const RGBA_BITMASKS: [u8; 16] = [0, 0, 255, 0, 0, 255, 0, 0, 255, 0, 0, 0, 0, 0, 0, 255];
const ALPHA_BITMASK: [u8; 4] = [0, 0, 0, 255];

/// 支持的压缩方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Rgb,
    BitFields,
}

impl Compression {
    pub fn from_raw(raw: u32) -> Result<Self, ClipboardError> {
        match raw {
            BI_RGB => Ok(Self::Rgb),
            BI_BITFIELDS => Ok(Self::BitFields),
            other => Err(ClipboardError::UnsupportedCompression(other)),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Rgb => BI_RGB,
            Self::BitFields => BI_BITFIELDS,
        }
    }
}

/// DIB 信息头中解码需要的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub bit_count: u16,
    pub compression: Compression,
    pub colors_used: u32,
}

impl BitmapHeader {
    /// 从 DIB 数据开头解析信息头。
    pub fn parse(dib: &[u8]) -> Result<Self, ClipboardError> {
        if dib.len() < INFO_HEADER_SIZE {
            return Err(ClipboardError::malformed(format!(
                "DIB 数据只有 {} 字节，不足一个信息头（{} 字节）",
                dib.len(),
                INFO_HEADER_SIZE
            )));
        }

        let header_size = read_u32(dib, 0);
        if (header_size as usize) < INFO_HEADER_SIZE || header_size as usize > dib.len() {
            return Err(ClipboardError::malformed(format!(
                "信息头大小字段异常：{}（数据长度 {}）",
                header_size,
                dib.len()
            )));
        }

        Ok(Self {
            header_size,
            width: read_i32(dib, 4),
            height: read_i32(dib, 8),
            bit_count: read_u16(dib, 14),
            compression: Compression::from_raw(read_u32(dib, COMPRESSION_OFFSET))?,
            colors_used: read_u32(dib, 32),
        })
    }

    /// 旧式 40 字节信息头 + BI_BITFIELDS 时，三个颜色掩码紧跟在信息头之后。
    pub fn trailing_mask_size(&self) -> usize {
        if self.compression == Compression::BitFields && self.header_size as usize == INFO_HEADER_SIZE {
            12
        } else {
            0
        }
    }

    pub fn color_table_size(&self) -> usize {
        let entries = if self.colors_used != 0 {
            self.colors_used as usize
        } else if self.bit_count <= 8 {
            1usize << self.bit_count
        } else {
            0
        };
        entries * 4
    }

    /// 像素数据在完整 BMP 文件中的偏移。
    pub fn pixel_offset(&self) -> usize {
        FILE_HEADER_SIZE + self.header_size as usize + self.trailing_mask_size() + self.color_table_size()
    }
}

/// 构造 14 字节 `BITMAPFILEHEADER`。
pub fn file_header(file_size: usize, pixel_offset: usize) -> Result<[u8; FILE_HEADER_SIZE], ClipboardError> {
    let size = u32::try_from(file_size)
        .map_err(|_| ClipboardError::malformed(format!("位图过大：{} 字节", file_size)))?;
    let offset = u32::try_from(pixel_offset)
        .map_err(|_| ClipboardError::malformed(format!("像素偏移越界：{}", pixel_offset)))?;

    let mut header = [0u8; FILE_HEADER_SIZE];
    header[0..2].copy_from_slice(b"BM");
    header[2..6].copy_from_slice(&size.to_le_bytes());
    // 6..10 为两个保留字段，必须为 0
    header[10..14].copy_from_slice(&offset.to_le_bytes());
    Ok(header)
}

/// `CF_DIB` → 完整 BMP 文件。
pub fn dib_to_bmp(dib: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let header = BitmapHeader::parse(dib)?;
    wrap_with_file_header(dib, &header)
}

/// `CF_DIBV5` → 完整 BMP 文件（先打 alpha 补丁）。
pub fn dibv5_to_bmp(dib: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let mut data = dib.to_vec();
    patch_dibv5(&mut data)?;
    let header = BitmapHeader::parse(&data)?;
    wrap_with_file_header(&data, &header)
}

/// 就地修补 V5 信息头的压缩方式与颜色掩码。
pub fn patch_dibv5(dib: &mut [u8]) -> Result<(), ClipboardError> {
    if dib.len() < V5_HEADER_SIZE {
        return Err(ClipboardError::malformed(format!(
            "CF_DIBV5 数据只有 {} 字节，不足一个 V5 信息头（{} 字节）",
            dib.len(),
            V5_HEADER_SIZE
        )));
    }

    match Compression::from_raw(read_u32(dib, COMPRESSION_OFFSET))? {
        Compression::Rgb => {
            dib[COMPRESSION_OFFSET..COMPRESSION_OFFSET + 4]
                .copy_from_slice(&BI_BITFIELDS.to_le_bytes());
            dib[MASKS_OFFSET..MASKS_END].copy_from_slice(&RGBA_BITMASKS);
        }
        Compression::BitFields => {
            dib[ALPHA_MASK_OFFSET..MASKS_END].copy_from_slice(&ALPHA_BITMASK);
        }
    }
    Ok(())
}

/// 从完整 BMP 文件中剥离文件头，返回 DIB 与应使用的剪贴板格式是否为 V5。
///
/// 信息头大小为 56 / 108 / 124 时视为 V5 族（写入 `CF_DIBV5`），否则写入 `CF_DIB`。
pub fn bmp_to_dib(bmp: &[u8]) -> Result<(&[u8], bool), ClipboardError> {
    if bmp.len() < FILE_HEADER_SIZE + 4 || &bmp[0..2] != b"BM" {
        return Err(ClipboardError::malformed("不是有效的 BMP 文件（缺少 'BM' 文件头）"));
    }
    let dib = &bmp[FILE_HEADER_SIZE..];
    let header_size = read_u32(dib, 0) as usize;
    let is_v5_family = matches!(header_size, 56 | V4_HEADER_SIZE | V5_HEADER_SIZE);
    Ok((dib, is_v5_family))
}

fn wrap_with_file_header(dib: &[u8], header: &BitmapHeader) -> Result<Vec<u8>, ClipboardError> {
    let total = FILE_HEADER_SIZE + dib.len();
    let file_header = file_header(total, header.pixel_offset())?;

    let mut bmp = Vec::with_capacity(total);
    bmp.extend_from_slice(&file_header);
    bmp.extend_from_slice(dib);
    Ok(bmp)
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    read_u32(data, offset) as i32
}
