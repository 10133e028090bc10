use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{
    HDR_OFF_MAX_FILES, HDR_OFF_NAME, HDR_OFF_NB_FILES, HDR_OFF_RESIZED_RES, HDR_OFF_UNUSED_32,
    HDR_OFF_UNUSED_64, HDR_OFF_VERSION, HEADER_NAME_LEN, HEADER_SIZE, MAX_MAX_FILES,
};
use crate::error::{ImgfsError, Result};
use crate::imgfs::Resolution;
use crate::util::{get_fixed_str, put_fixed_str};

/// Заголовок контейнера (64 байта, LE).
///
/// `resized_res` = [thumb_w, thumb_h, small_w, small_h].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgfsHeader {
    pub name: [u8; HEADER_NAME_LEN],
    pub version: u32,
    pub nb_files: u32,
    pub max_files: u32,
    pub resized_res: [u16; 4],
    pub unused_32: u32,
    pub unused_64: u64,
}

impl Default for ImgfsHeader {
    fn default() -> Self {
        Self {
            name: [0u8; HEADER_NAME_LEN],
            version: 0,
            nb_files: 0,
            max_files: 0,
            resized_res: [0; 4],
            unused_32: 0,
            unused_64: 0,
        }
    }
}

impl ImgfsHeader {
    pub fn new(name: &str, max_files: u32, thumb: (u16, u16), small: (u16, u16)) -> Result<Self> {
        let mut h = Self {
            max_files,
            resized_res: [thumb.0, thumb.1, small.0, small.1],
            ..Self::default()
        };
        put_fixed_str(&mut h.name, name, "imgFS name")?;
        Ok(h)
    }

    pub fn name_str(&self) -> String {
        get_fixed_str(&self.name)
    }

    /// Целевое разрешение для производного варианта (None для оригинала).
    pub fn resized(&self, res: Resolution) -> Option<(u16, u16)> {
        match res {
            Resolution::Thumb => Some((self.resized_res[0], self.resized_res[1])),
            Resolution::Small => Some((self.resized_res[2], self.resized_res[3])),
            Resolution::Orig => None,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[HDR_OFF_NAME..HDR_OFF_NAME + HEADER_NAME_LEN].copy_from_slice(&self.name);
        LittleEndian::write_u32(&mut buf[HDR_OFF_VERSION..HDR_OFF_VERSION + 4], self.version);
        LittleEndian::write_u32(&mut buf[HDR_OFF_NB_FILES..HDR_OFF_NB_FILES + 4], self.nb_files);
        LittleEndian::write_u32(&mut buf[HDR_OFF_MAX_FILES..HDR_OFF_MAX_FILES + 4], self.max_files);
        LittleEndian::write_u16_into(
            &self.resized_res,
            &mut buf[HDR_OFF_RESIZED_RES..HDR_OFF_RESIZED_RES + 8],
        );
        LittleEndian::write_u32(&mut buf[HDR_OFF_UNUSED_32..HDR_OFF_UNUSED_32 + 4], self.unused_32);
        LittleEndian::write_u64(&mut buf[HDR_OFF_UNUSED_64..HDR_OFF_UNUSED_64 + 8], self.unused_64);
        buf
    }

    /// Декодирование + проверка инвариантов (nb_files <= max_files, разумный max_files).
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(ImgfsError::invalid(format!(
                "header buffer too small: {} < {}",
                buf.len(),
                HEADER_SIZE
            )));
        }
        let mut name = [0u8; HEADER_NAME_LEN];
        name.copy_from_slice(&buf[HDR_OFF_NAME..HDR_OFF_NAME + HEADER_NAME_LEN]);
        let mut resized_res = [0u16; 4];
        LittleEndian::read_u16_into(
            &buf[HDR_OFF_RESIZED_RES..HDR_OFF_RESIZED_RES + 8],
            &mut resized_res,
        );

        let h = Self {
            name,
            version: LittleEndian::read_u32(&buf[HDR_OFF_VERSION..HDR_OFF_VERSION + 4]),
            nb_files: LittleEndian::read_u32(&buf[HDR_OFF_NB_FILES..HDR_OFF_NB_FILES + 4]),
            max_files: LittleEndian::read_u32(&buf[HDR_OFF_MAX_FILES..HDR_OFF_MAX_FILES + 4]),
            resized_res,
            unused_32: LittleEndian::read_u32(&buf[HDR_OFF_UNUSED_32..HDR_OFF_UNUSED_32 + 4]),
            unused_64: LittleEndian::read_u64(&buf[HDR_OFF_UNUSED_64..HDR_OFF_UNUSED_64 + 8]),
        };

        if h.max_files > MAX_MAX_FILES {
            return Err(ImgfsError::io_msg(format!(
                "corrupt header: max_files {} exceeds limit {}",
                h.max_files, MAX_MAX_FILES
            )));
        }
        if h.nb_files > h.max_files {
            return Err(ImgfsError::io_msg(format!(
                "corrupt header: nb_files {} > max_files {}",
                h.nb_files, h.max_files
            )));
        }
        Ok(h)
    }
}
