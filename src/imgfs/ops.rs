//! Store operations on an open container: list / insert / read / delete.
//!
//! Порядок записи на диск при мутации: данные (если есть) → запись слота → заголовок.
//! Таблица в памяти меняется только после успешной записи.

use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::consts::{EMPTY, MAX_IMG_ID, NON_EMPTY, ORIG_RES, SHA256_LEN};
use crate::error::{ImgfsError, Result};
use crate::imgfs::display::{render_header, render_metadata};
use crate::imgfs::dims::image_dimensions;
use crate::imgfs::{ImgMetadata, ImgfsFile, Resolution};
use crate::util::{append, read_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Stdout,
    Json,
}

#[derive(Serialize)]
struct JsonList<'a> {
    #[serde(rename = "Images")]
    images: Vec<&'a str>,
}

pub fn validate_img_id(img_id: &str) -> Result<()> {
    if img_id.is_empty() || img_id.len() > MAX_IMG_ID {
        return Err(ImgfsError::InvalidImgId(format!(
            "'{}' (length must be in 1..={})",
            img_id, MAX_IMG_ID
        )));
    }
    if img_id.as_bytes().contains(&0) {
        return Err(ImgfsError::InvalidImgId("contains NUL".into()));
    }
    Ok(())
}

impl ImgfsFile {
    pub fn list(&self, mode: ListMode) -> Result<String> {
        self.file()?;
        match mode {
            ListMode::Stdout => {
                let mut out = render_header(&self.header);
                if self.header.nb_files == 0 {
                    out.push_str("<< empty imgFS >>\n");
                } else {
                    for (_, m) in self.valid_records() {
                        out.push_str(&render_metadata(m));
                    }
                }
                Ok(out)
            }
            ListMode::Json => {
                let ids: Vec<String> = self.valid_records().map(|(_, m)| m.img_id_str()).collect();
                let body = JsonList {
                    images: ids.iter().map(String::as_str).collect(),
                };
                serde_json::to_string(&body)
                    .map_err(|e| ImgfsError::io_msg(format!("json encode: {}", e)))
            }
        }
    }

    /// Вставка оригинала. Возвращает индекс занятого слота.
    ///
    /// Одинаковый id среди живых записей → DuplicateId. Одинаковый SHA-256 →
    /// новая запись разделяет offset/size всех вариантов с существующей.
    pub fn insert(&mut self, image: &[u8], img_id: &str) -> Result<usize> {
        let f = self.writable_file()?;
        validate_img_id(img_id)?;
        if image.is_empty() {
            return Err(ImgfsError::invalid("empty image"));
        }
        let size = u32::try_from(image.len())
            .map_err(|_| ImgfsError::invalid(format!("image too large: {} bytes", image.len())))?;

        if self.header.nb_files >= self.header.max_files {
            return Err(ImgfsError::Full(self.header.max_files));
        }
        let index = self
            .metadata
            .iter()
            .position(|m| !m.is_valid())
            .ok_or(ImgfsError::Full(self.header.max_files))?;

        if self.find(img_id).is_some() {
            return Err(ImgfsError::DuplicateId(img_id.to_string()));
        }

        let digest = Sha256::digest(image);
        let mut sha = [0u8; SHA256_LEN];
        sha.copy_from_slice(&digest);

        let mut rec = ImgMetadata::default();
        rec.set_img_id(img_id)?;
        rec.sha = sha;

        let twin = self.valid_records().find(|(_, m)| m.sha == sha).map(|(i, m)| (i, m.clone()));
        match twin {
            Some((j, existing)) => {
                debug!("imgfs insert: '{}' dedups content of slot {}", img_id, j);
                rec.offset = existing.offset;
                rec.size = existing.size;
                rec.orig_res = existing.orig_res;
            }
            None => {
                let offset = append(f, image)?;
                rec.offset[ORIG_RES] = offset;
                rec.size[ORIG_RES] = size;
                match image_dimensions(image) {
                    Some((w, h)) => rec.orig_res = [w, h],
                    None => warn!("imgfs insert: '{}': unknown image format, storing 0x0", img_id),
                }
            }
        }
        rec.is_valid = NON_EMPTY;

        let mut header = self.header.clone();
        header.nb_files += 1;
        header.version = header.version.wrapping_add(1);

        self.write_record_raw(index, &rec)?;
        self.write_header_raw(&header)?;
        self.metadata[index] = rec;
        self.header = header;

        info!("imgfs insert: '{}' -> slot {} ({} bytes)", img_id, index, size);
        Ok(index)
    }

    /// Прочитать вариант изображения. Tombstone никогда не отдаётся.
    pub fn read(&self, img_id: &str, res: Resolution) -> Result<Vec<u8>> {
        let f = self.file()?;
        validate_img_id(img_id)?;
        let index = self
            .find(img_id)
            .ok_or_else(|| ImgfsError::ImageNotFound(img_id.to_string()))?;
        self.read_slot(f, index, res)
    }

    /// Чтение по индексу слота (только живые записи).
    pub fn read_index(&self, index: usize, res: Resolution) -> Result<Vec<u8>> {
        let f = self.file()?;
        if self.record(index).is_none() {
            return Err(ImgfsError::ImageNotFound(format!("slot {}", index)));
        }
        self.read_slot(f, index, res)
    }

    fn read_slot(&self, f: &std::fs::File, index: usize, res: Resolution) -> Result<Vec<u8>> {
        let m = &self.metadata[index];
        let (offset, size) = m.variant(res).ok_or_else(|| {
            ImgfsError::Resolutions(format!(
                "{} variant of '{}' is not materialized",
                res,
                m.img_id_str()
            ))
        })?;

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(size as usize)?;
        buf.resize(size as usize, 0);
        read_at(f, offset, &mut buf)?;
        Ok(buf)
    }

    /// Пометить запись недействительной (tombstone). Содержимое слота остаётся
    /// до следующей вставки в этот слот.
    pub fn delete(&mut self, img_id: &str) -> Result<()> {
        self.writable_file()?;
        validate_img_id(img_id)?;
        let index = self
            .find(img_id)
            .ok_or_else(|| ImgfsError::ImageNotFound(img_id.to_string()))?;

        let mut rec = self.metadata[index].clone();
        rec.is_valid = EMPTY;

        let mut header = self.header.clone();
        header.nb_files = header.nb_files.saturating_sub(1);
        header.version = header.version.wrapping_add(1);

        self.write_record_raw(index, &rec)?;
        self.write_header_raw(&header)?;
        self.metadata[index] = rec;
        self.header = header;

        info!("imgfs delete: '{}' (slot {})", img_id, index);
        Ok(())
    }
}
