//! Human-readable dumps of the header and of metadata records.

use std::fmt::Write as _;

use crate::consts::{MAX_IMGFS_NAME, ORIG_RES, SMALL_RES, THUMB_RES};
use crate::imgfs::{ImgMetadata, ImgfsFile, ImgfsHeader};
use crate::util::hex_string;

const STARS: &str = "*****************************************";

/// Lowercase hex of the content digest (64 chars for SHA-256).
pub fn sha_to_string(sha: &[u8]) -> String {
    hex_string(sha)
}

pub fn render_header(h: &ImgfsHeader) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", STARS);
    let _ = writeln!(out, "********** IMGFS HEADER START ***********");
    let _ = writeln!(out, "TYPE: {:>width$}", h.name_str(), width = MAX_IMGFS_NAME);
    let _ = writeln!(out, "VERSION: {}", h.version);
    let _ = writeln!(out, "IMAGE COUNT: {}\t\tMAX IMAGES: {}", h.nb_files, h.max_files);
    let _ = writeln!(
        out,
        "THUMBNAIL: {} x {}\tSMALL: {} x {}",
        h.resized_res[2 * THUMB_RES],
        h.resized_res[2 * THUMB_RES + 1],
        h.resized_res[2 * SMALL_RES],
        h.resized_res[2 * SMALL_RES + 1]
    );
    let _ = writeln!(out, "*********** IMGFS HEADER END ************");
    let _ = writeln!(out, "{}", STARS);
    out
}

pub fn render_metadata(m: &ImgMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "IMAGE ID: {}", m.img_id_str());
    let _ = writeln!(out, "SHA: {}", sha_to_string(&m.sha));
    let _ = writeln!(out, "VALID: {}", m.is_valid);
    let _ = writeln!(out, "UNUSED: {}", m.unused_16);
    let _ = writeln!(
        out,
        "OFFSET ORIG. : {}\t\tSIZE ORIG. : {}",
        m.offset[ORIG_RES], m.size[ORIG_RES]
    );
    let _ = writeln!(
        out,
        "OFFSET THUMB.: {}\t\tSIZE THUMB.: {}",
        m.offset[THUMB_RES], m.size[THUMB_RES]
    );
    let _ = writeln!(
        out,
        "OFFSET SMALL : {}\t\tSIZE SMALL : {}",
        m.offset[SMALL_RES], m.size[SMALL_RES]
    );
    let _ = writeln!(out, "ORIGINAL: {} x {}", m.orig_res[0], m.orig_res[1]);
    let _ = writeln!(out, "{}", STARS);
    out
}

impl ImgfsFile {
    /// Диагностика: заголовок + все слоты, включая tombstone'ы.
    pub fn dump(&self) -> String {
        let mut out = render_header(&self.header);
        for (i, m) in self.metadata.iter().enumerate() {
            let _ = writeln!(out, "SLOT: {}", i);
            out.push_str(&render_metadata(m));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NON_EMPTY;

    #[test]
    fn header_text_is_stable() {
        let mut h = ImgfsHeader::new("Family Album 24", 10, (64, 64), (256, 256)).unwrap();
        h.version = 2;
        h.nb_files = 1;
        let s = render_header(&h);
        let expected = format!(
            "{STARS}\n********** IMGFS HEADER START ***********\n\
TYPE: {:>31}\nVERSION: 2\nIMAGE COUNT: 1\t\tMAX IMAGES: 10\n\
THUMBNAIL: 64 x 64\tSMALL: 256 x 256\n\
*********** IMGFS HEADER END ************\n{STARS}\n",
            "Family Album 24"
        );
        assert_eq!(s, expected);
    }

    #[test]
    fn metadata_text_has_fixed_width_sha() {
        let mut m = ImgMetadata::default();
        m.set_img_id("pic1").unwrap();
        m.sha[0] = 0x0a;
        m.sha[31] = 0xff;
        m.is_valid = NON_EMPTY;
        m.offset[ORIG_RES] = 2144;
        m.size[ORIG_RES] = 72876;
        m.orig_res = [1200, 800];

        let s = render_metadata(&m);
        let sha_line = s.lines().nth(1).unwrap();
        let hex = sha_line.strip_prefix("SHA: ").unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("0a00"));
        assert!(hex.ends_with("00ff"));
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(s.contains("VALID: 1\n"));
        assert!(s.contains("OFFSET ORIG. : 2144\t\tSIZE ORIG. : 72876\n"));
        assert!(s.contains("ORIGINAL: 1200 x 800\n"));
        // детерминизм
        assert_eq!(s, render_metadata(&m));
    }
}
