//! Мелкие утилиты: позиционное чтение/запись, фиксированные строки, hex.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{ImgfsError, Result};

pub fn read_at(mut f: &File, offset: u64, buf: &mut [u8]) -> Result<()> {
    f.seek(SeekFrom::Start(offset))?;
    f.read_exact(buf)?;
    Ok(())
}

pub fn write_at(mut f: &File, offset: u64, buf: &[u8]) -> Result<()> {
    f.seek(SeekFrom::Start(offset))?;
    f.write_all(buf)?;
    Ok(())
}

/// Append at EOF, returns the offset the bytes landed at.
pub fn append(mut f: &File, buf: &[u8]) -> Result<u64> {
    let off = f.seek(SeekFrom::End(0))?;
    f.write_all(buf)?;
    Ok(off)
}

/// Записать строку в NUL‑дополненное поле фиксированной ширины.
/// Последний байт поля всегда остаётся нулём.
pub fn put_fixed_str(field: &mut [u8], s: &str, what: &str) -> Result<()> {
    if s.len() >= field.len() {
        return Err(ImgfsError::invalid(format!(
            "{} too long: {} bytes (max {})",
            what,
            s.len(),
            field.len() - 1
        )));
    }
    if s.as_bytes().contains(&0) {
        return Err(ImgfsError::invalid(format!("{} contains NUL", what)));
    }
    field.fill(0);
    field[..s.len()].copy_from_slice(s.as_bytes());
    Ok(())
}

/// Прочитать строку из NUL‑дополненного поля (до первого NUL).
pub fn get_fixed_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Lowercase hex, two digits per byte.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Найти подпоследовательность (аналог strstr для байтов).
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
