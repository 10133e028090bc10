//! Open container handle: file + in-memory header + metadata table.
//!
//! Файл: [header HEADER_SIZE][max_files × RECORD_SIZE][данные изображений ...]
//!
//! Политика:
//! - open() читает заголовок и таблицу целиком; при любой ошибке (короткое чтение,
//!   open, аллокация) ничего не остаётся захваченным, RAII освобождает file/table.
//! - close() идемпотентен: безопасен на уже закрытом handle.
//! - Синхронизации нет: разделяемый handle защищает вызывающий (см. service).

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info, warn};

use crate::config::CreateOptions;
use crate::consts::{HEADER_SIZE, RECORD_SIZE};
use crate::error::{ImgfsError, Result};
use crate::imgfs::{ImgMetadata, ImgfsHeader};
use crate::util::write_at;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        self == OpenMode::ReadWrite
    }

    fn options(self) -> OpenOptions {
        let mut o = OpenOptions::new();
        o.read(true);
        if self.is_writable() {
            o.write(true);
        }
        o
    }
}

/// Accepts fopen-style mode strings ("rb", "rb+", "r+b", ...).
impl FromStr for OpenMode {
    type Err = ImgfsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "r" | "rb" => Ok(OpenMode::ReadOnly),
            "r+" | "rb+" | "r+b" => Ok(OpenMode::ReadWrite),
            other => Err(ImgfsError::invalid(format!("unsupported open mode '{}'", other))),
        }
    }
}

#[derive(Debug)]
pub struct ImgfsFile {
    pub(crate) path: PathBuf,
    pub(crate) file: Option<File>,
    pub(crate) mode: OpenMode,
    pub header: ImgfsHeader,
    pub metadata: Vec<ImgMetadata>,
}

impl ImgfsFile {
    /// Открыть контейнер: заголовок, затем ровно max_files записей.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ImgfsError::invalid("empty imgFS path"));
        }

        let mut file = mode.options().open(path)?;

        let mut hdr = [0u8; HEADER_SIZE];
        file.read_exact(&mut hdr)?;
        let header = ImgfsHeader::decode(&hdr)?;

        let n = header.max_files as usize;
        let table_len = n
            .checked_mul(RECORD_SIZE)
            .ok_or_else(|| ImgfsError::OutOfMemory(format!("metadata table of {} records", n)))?;

        let mut raw: Vec<u8> = Vec::new();
        raw.try_reserve_exact(table_len)?;
        raw.resize(table_len, 0);
        file.read_exact(&mut raw)?;

        let mut metadata = Vec::new();
        metadata.try_reserve_exact(n)?;
        for chunk in raw.chunks_exact(RECORD_SIZE) {
            metadata.push(ImgMetadata::decode(chunk)?);
        }

        debug!(
            "imgfs open: path={}, mode={:?}, nb_files={}, max_files={}",
            path.display(),
            mode,
            header.nb_files,
            header.max_files
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            mode,
            header,
            metadata,
        })
    }

    /// Создать новый контейнер (перезаписывает существующий файл) и вернуть
    /// handle в режиме ReadWrite.
    pub fn create<P: AsRef<Path>>(path: P, opts: &CreateOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ImgfsError::invalid("empty imgFS path"));
        }
        opts.validate()?;

        let header = ImgfsHeader::new(&opts.name, opts.max_files, opts.thumb_res, opts.small_res)?;
        let n = opts.max_files as usize;

        // Заголовок + таблица из нулевых записей одним буфером.
        let total = HEADER_SIZE + n * RECORD_SIZE;
        let mut out: Vec<u8> = Vec::new();
        out.try_reserve_exact(total)?;
        out.extend_from_slice(&header.encode());
        out.resize(total, 0);

        let mut metadata = Vec::new();
        metadata.try_reserve_exact(n)?;
        metadata.resize(n, ImgMetadata::default());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        write_at(&file, 0, &out)?;
        file.sync_all()?;

        info!(
            "imgfs create: path={}, {} item(s) written (header + {} slots)",
            path.display(),
            1 + n,
            n
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            mode: OpenMode::ReadWrite,
            header,
            metadata,
        })
    }

    /// Освободить файл и таблицу. Повторный вызов: no-op.
    pub fn close(&mut self) {
        if let Some(f) = self.file.take() {
            if self.mode.is_writable() {
                if let Err(e) = f.sync_all() {
                    warn!("imgfs close: sync {} failed: {}", self.path.display(), e);
                }
            }
            debug!("imgfs close: {}", self.path.display());
        }
        self.metadata = Vec::new();
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub(crate) fn file(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| ImgfsError::invalid("imgFS handle is closed"))
    }

    pub(crate) fn writable_file(&self) -> Result<&File> {
        let f = self.file()?;
        if !self.mode.is_writable() {
            return Err(ImgfsError::invalid("imgFS opened read-only"));
        }
        Ok(f)
    }

    /// Живая запись по индексу слота. Tombstone/пустой слот/вне диапазона: None.
    pub fn record(&self, index: usize) -> Option<&ImgMetadata> {
        self.metadata.get(index).filter(|m| m.is_valid())
    }

    /// Индекс живой записи с данным id.
    pub fn find(&self, img_id: &str) -> Option<usize> {
        if img_id.is_empty() {
            return None;
        }
        self.metadata
            .iter()
            .position(|m| m.is_valid() && m.id_eq(img_id))
    }

    /// Итератор по живым записям: (slot, record).
    pub fn valid_records(&self) -> impl Iterator<Item = (usize, &ImgMetadata)> {
        self.metadata.iter().enumerate().filter(|(_, m)| m.is_valid())
    }

    pub fn write_header(&self) -> Result<()> {
        self.write_header_raw(&self.header)
    }

    pub fn write_record(&self, index: usize) -> Result<()> {
        let m = self.metadata.get(index).ok_or_else(|| {
            ImgfsError::invalid(format!(
                "slot {} out of range (max_files={})",
                index, self.header.max_files
            ))
        })?;
        self.write_record_raw(index, m)
    }

    /// Запись слота на диск без изменения таблицы в памяти.
    pub(crate) fn write_record_raw(&self, index: usize, m: &ImgMetadata) -> Result<()> {
        let f = self.writable_file()?;
        write_at(f, record_offset(index), &m.encode())
    }

    pub(crate) fn write_header_raw(&self, h: &ImgfsHeader) -> Result<()> {
        let f = self.writable_file()?;
        write_at(f, 0, &h.encode())
    }
}

#[inline]
pub fn record_offset(index: usize) -> u64 {
    (HEADER_SIZE + index * RECORD_SIZE) as u64
}
