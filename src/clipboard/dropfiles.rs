//! # `CF_HDROP` / `CF_UNICODETEXT` 数据块解析
//!
//! `CF_HDROP` 的全局内存是一个 `DROPFILES` 结构（20 字节）加上以双 NUL 结尾的路径列表：
//!
//! ```text
//! 0   pFiles  u32   路径列表相对结构起点的偏移
//! 4   pt      POINT 投放坐标（8 字节）
//! 12  fNC     BOOL
//! 16  fWide   BOOL  非 0 表示路径为 UTF-16LE，否则为 ANSI
//! ```
//!
//! 解析直接基于字节完成，等价于逐个调用 `DragQueryFileW`，但可以脱离系统剪贴板测试。

use super::ClipboardError;

pub const DROPFILES_SIZE: usize = 20;

/// 解析 `DROPFILES` 内存块，按枚举顺序返回路径。
pub fn parse_file_list(data: &[u8]) -> Result<Vec<String>, ClipboardError> {
    if data.len() < DROPFILES_SIZE {
        return Err(ClipboardError::malformed(format!(
            "CF_HDROP 数据只有 {} 字节，不足 DROPFILES 结构（{} 字节）",
            data.len(),
            DROPFILES_SIZE
        )));
    }

    let offset = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if offset < DROPFILES_SIZE || offset > data.len() {
        return Err(ClipboardError::malformed(format!(
            "CF_HDROP 路径偏移越界：{}（数据长度 {}）",
            offset,
            data.len()
        )));
    }
    let wide = u32::from_le_bytes([data[16], data[17], data[18], data[19]]) != 0;
    let list = &data[offset..];

    let paths = if wide {
        split_wide(list)
    } else {
        list.split(|&b| b == 0)
            .take_while(|entry| !entry.is_empty())
            .map(|entry| String::from_utf8_lossy(entry).into_owned())
            .collect()
    };
    Ok(paths)
}

/// 构造宽字符 `DROPFILES` 内存块（内存剪贴板与写入路径使用）。
pub fn encode_file_list<S: AsRef<str>>(paths: &[S]) -> Vec<u8> {
    let mut data = Vec::with_capacity(DROPFILES_SIZE + paths.len() * 64);
    data.extend_from_slice(&(DROPFILES_SIZE as u32).to_le_bytes());
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&1u32.to_le_bytes());
    for path in paths {
        for unit in path.as_ref().encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);
    }
    data.extend_from_slice(&[0, 0]);
    data
}

/// 解码 `CF_UNICODETEXT`：UTF-16LE，截止到第一个 NUL。
pub fn decode_unicode_text(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// 编码为 `CF_UNICODETEXT`，附带结尾 NUL。
pub fn encode_unicode_text(text: &str) -> Vec<u8> {
    let mut data: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    data.extend_from_slice(&[0, 0]);
    data
}

fn split_wide(list: &[u8]) -> Vec<String> {
    let units: Vec<u16> = list
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    units
        .split(|&unit| unit == 0)
        .take_while(|entry| !entry.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}
