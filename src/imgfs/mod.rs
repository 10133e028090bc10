//! imgfs container: fixed header + fixed-length metadata table + image bytes.

pub mod dims;
pub mod display;
pub mod file;
pub mod header;
pub mod metadata;
pub mod ops;
pub mod resolution;

pub use dims::image_dimensions;
pub use display::{render_header, render_metadata, sha_to_string};
pub use file::{record_offset, ImgfsFile, OpenMode};
pub use header::ImgfsHeader;
pub use metadata::ImgMetadata;
pub use ops::{validate_img_id, ListMode};
pub use resolution::{resolution_atoi, Resolution};
