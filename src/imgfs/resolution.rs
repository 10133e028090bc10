//! Resolution variants (thumbnail / small / original) and their slot indices.

use std::fmt;
use std::str::FromStr;

use crate::consts::{ORIG_RES, SMALL_RES, THUMB_RES};
use crate::error::ImgfsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Thumb,
    Small,
    Orig,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Thumb, Resolution::Small, Resolution::Orig];

    /// Слот в массивах offset/size записи метаданных.
    pub fn index(self) -> usize {
        match self {
            Resolution::Thumb => THUMB_RES,
            Resolution::Small => SMALL_RES,
            Resolution::Orig => ORIG_RES,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.index() == i)
    }

    /// "original"/"orig", "thumbnail"/"thumb", "small". Всё остальное: None.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "thumb" | "thumbnail" => Some(Resolution::Thumb),
            "small" => Some(Resolution::Small),
            "orig" | "original" => Some(Resolution::Orig),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resolution::Thumb => "thumbnail",
            Resolution::Small => "small",
            Resolution::Orig => "original",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = ImgfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::from_name(s)
            .ok_or_else(|| ImgfsError::Resolutions(format!("unknown resolution '{}'", s)))
    }
}

/// Name → slot index; `None` is the not-found sentinel (also for a missing name).
pub fn resolution_atoi(name: Option<&str>) -> Option<usize> {
    name.and_then(Resolution::from_name).map(Resolution::index)
}
