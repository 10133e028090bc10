//! Error types for imgfs.
//!
//! `ErrorKind` делит ошибки на ядро (InvalidArgument, OutOfMemory, Io: соединение,
//! контейнер, ответ) и ошибки операций над хранилищем.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfMemory,
    Io,
    NotFound,
    DuplicateId,
    Full,
    Resolutions,
    InvalidImgId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::Io => "I/O error",
            ErrorKind::NotFound => "image not found",
            ErrorKind::DuplicateId => "existing image ID",
            ErrorKind::Full => "imgFS is full",
            ErrorKind::Resolutions => "invalid resolution(s)",
            ErrorKind::InvalidImgId => "invalid image ID",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ImgfsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Пир закрыл соединение (read вернул 0).
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("malformed message: {0}")]
    Malformed(String),

    /// Буфер соединения заполнен, а полного сообщения так и нет.
    #[error("frame buffer exhausted at {0} bytes without a complete message")]
    CapacityExhausted(usize),

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("existing image ID: {0}")]
    DuplicateId(String),

    #[error("imgFS is full ({0} images)")]
    Full(u32),

    #[error("invalid resolution(s): {0}")]
    Resolutions(String),

    #[error("invalid image ID: {0}")]
    InvalidImgId(String),
}

impl ImgfsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImgfsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ImgfsError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            ImgfsError::Io(_)
            | ImgfsError::ConnectionClosed
            | ImgfsError::Malformed(_)
            | ImgfsError::CapacityExhausted(_)
            | ImgfsError::Dispatch(_) => ErrorKind::Io,
            ImgfsError::ImageNotFound(_) => ErrorKind::NotFound,
            ImgfsError::DuplicateId(_) => ErrorKind::DuplicateId,
            ImgfsError::Full(_) => ErrorKind::Full,
            ImgfsError::Resolutions(_) => ErrorKind::Resolutions,
            ImgfsError::InvalidImgId(_) => ErrorKind::InvalidImgId,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ImgfsError::InvalidArgument(msg.into())
    }

    pub(crate) fn io_msg(msg: impl Into<String>) -> Self {
        ImgfsError::Io(std::io::Error::new(std::io::ErrorKind::Other, msg.into()))
    }
}

impl From<TryReserveError> for ImgfsError {
    fn from(e: TryReserveError) -> Self {
        ImgfsError::OutOfMemory(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImgfsError>;
