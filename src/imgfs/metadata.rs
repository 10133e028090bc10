use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{
    EMPTY, IMG_ID_LEN, NB_RES, NON_EMPTY, RECORD_SIZE, REC_OFF_IMG_ID, REC_OFF_IS_VALID,
    REC_OFF_OFFSET, REC_OFF_ORIG_RES, REC_OFF_SHA, REC_OFF_SIZE, REC_OFF_UNUSED_16, SHA256_LEN,
};
use crate::error::{ImgfsError, Result};
use crate::imgfs::Resolution;
use crate::util::{get_fixed_str, put_fixed_str};

/// Запись таблицы метаданных (один слот, 208 байт LE).
///
/// Позиция в таблице служит неявным идентификатором слота. Запись с
/// `is_valid == EMPTY` это пустой слот или tombstone; её offset/size не имеют смысла.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgMetadata {
    pub img_id: [u8; IMG_ID_LEN],
    pub sha: [u8; SHA256_LEN],
    pub orig_res: [u32; 2],
    pub size: [u32; NB_RES],
    pub offset: [u64; NB_RES],
    pub is_valid: u16,
    pub unused_16: u16,
}

impl Default for ImgMetadata {
    fn default() -> Self {
        Self {
            img_id: [0u8; IMG_ID_LEN],
            sha: [0u8; SHA256_LEN],
            orig_res: [0; 2],
            size: [0; NB_RES],
            offset: [0; NB_RES],
            is_valid: EMPTY,
            unused_16: 0,
        }
    }
}

impl ImgMetadata {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_valid == NON_EMPTY
    }

    pub fn img_id_str(&self) -> String {
        get_fixed_str(&self.img_id)
    }

    pub fn set_img_id(&mut self, id: &str) -> Result<()> {
        put_fixed_str(&mut self.img_id, id, "image ID")
            .map_err(|e| ImgfsError::InvalidImgId(e.to_string()))
    }

    /// Совпадение id без аллокации строки.
    pub fn id_eq(&self, id: &str) -> bool {
        let end = self.img_id.iter().position(|&b| b == 0).unwrap_or(IMG_ID_LEN);
        &self.img_id[..end] == id.as_bytes()
    }

    /// (offset, size) варианта, если он материализован. Нулевая пара = ещё нет.
    pub fn variant(&self, res: Resolution) -> Option<(u64, u32)> {
        let i = res.index();
        if self.offset[i] == 0 || self.size[i] == 0 {
            None
        } else {
            Some((self.offset[i], self.size[i]))
        }
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= RECORD_SIZE);
        buf[REC_OFF_IMG_ID..REC_OFF_IMG_ID + IMG_ID_LEN].copy_from_slice(&self.img_id);
        buf[REC_OFF_SHA..REC_OFF_SHA + SHA256_LEN].copy_from_slice(&self.sha);
        LittleEndian::write_u32_into(&self.orig_res, &mut buf[REC_OFF_ORIG_RES..REC_OFF_ORIG_RES + 8]);
        LittleEndian::write_u32_into(&self.size, &mut buf[REC_OFF_SIZE..REC_OFF_SIZE + NB_RES * 4]);
        LittleEndian::write_u64_into(
            &self.offset,
            &mut buf[REC_OFF_OFFSET..REC_OFF_OFFSET + NB_RES * 8],
        );
        LittleEndian::write_u16(&mut buf[REC_OFF_IS_VALID..REC_OFF_IS_VALID + 2], self.is_valid);
        LittleEndian::write_u16(&mut buf[REC_OFF_UNUSED_16..REC_OFF_UNUSED_16 + 2], self.unused_16);
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < RECORD_SIZE {
            return Err(ImgfsError::invalid(format!(
                "metadata buffer too small: {} < {}",
                buf.len(),
                RECORD_SIZE
            )));
        }
        let mut m = Self::default();
        m.img_id.copy_from_slice(&buf[REC_OFF_IMG_ID..REC_OFF_IMG_ID + IMG_ID_LEN]);
        m.sha.copy_from_slice(&buf[REC_OFF_SHA..REC_OFF_SHA + SHA256_LEN]);
        LittleEndian::read_u32_into(&buf[REC_OFF_ORIG_RES..REC_OFF_ORIG_RES + 8], &mut m.orig_res);
        LittleEndian::read_u32_into(&buf[REC_OFF_SIZE..REC_OFF_SIZE + NB_RES * 4], &mut m.size);
        LittleEndian::read_u64_into(
            &buf[REC_OFF_OFFSET..REC_OFF_OFFSET + NB_RES * 8],
            &mut m.offset,
        );
        m.is_valid = LittleEndian::read_u16(&buf[REC_OFF_IS_VALID..REC_OFF_IS_VALID + 2]);
        m.unused_16 = LittleEndian::read_u16(&buf[REC_OFF_UNUSED_16..REC_OFF_UNUSED_16 + 2]);
        Ok(m)
    }
}
