//! Header-only reading of image dimensions (JPEG SOFn, PNG IHDR).
//! Пиксели не декодируются; неизвестный формат: None.

use byteorder::{BigEndian, ByteOrder};

const PNG_SIG: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(PNG_SIG) {
        return png_dimensions(bytes);
    }
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        return jpeg_dimensions(bytes);
    }
    None
}

fn png_dimensions(b: &[u8]) -> Option<(u32, u32)> {
    // sig(8) + len(4) + "IHDR"(4) + width(4) + height(4)
    if b.len() < 24 || &b[12..16] != b"IHDR" {
        return None;
    }
    Some((BigEndian::read_u32(&b[16..20]), BigEndian::read_u32(&b[20..24])))
}

fn jpeg_dimensions(b: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2usize;
    while i + 1 < b.len() {
        if b[i] != 0xFF {
            return None;
        }
        let marker = b[i + 1];
        match marker {
            // fill bytes
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            // EOI / SOS before any SOF
            0xD9 | 0xDA => return None,
            _ => {}
        }
        if i + 4 > b.len() {
            return None;
        }
        let seg_len = BigEndian::read_u16(&b[i + 2..i + 4]) as usize;
        if seg_len < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // [len u16][precision u8][height u16][width u16]
            if i + 9 > b.len() {
                return None;
            }
            let h = BigEndian::read_u16(&b[i + 5..i + 7]) as u32;
            let w = BigEndian::read_u16(&b[i + 7..i + 9]) as u32;
            return Some((w, h));
        }
        i += 2 + seg_len;
    }
    None
}
