//! Общие константы форматов (container header, metadata table, HTTP framing).

// -------- Container header --------
// Layout (LE, 64 байта, без выравнивания):
// [name 32][version u32][nb_files u32][max_files u32][resized_res 4*u16][unused_32 u32][unused_64 u64]
pub const MAX_IMGFS_NAME: usize = 31;
pub const HEADER_NAME_LEN: usize = MAX_IMGFS_NAME + 1;
pub const HEADER_SIZE: usize = HEADER_NAME_LEN + 4 + 4 + 4 + 4 * 2 + 4 + 8;

pub const HDR_OFF_NAME: usize = 0;
pub const HDR_OFF_VERSION: usize = HDR_OFF_NAME + HEADER_NAME_LEN;
pub const HDR_OFF_NB_FILES: usize = HDR_OFF_VERSION + 4;
pub const HDR_OFF_MAX_FILES: usize = HDR_OFF_NB_FILES + 4;
pub const HDR_OFF_RESIZED_RES: usize = HDR_OFF_MAX_FILES + 4;
pub const HDR_OFF_UNUSED_32: usize = HDR_OFF_RESIZED_RES + 4 * 2;
pub const HDR_OFF_UNUSED_64: usize = HDR_OFF_UNUSED_32 + 4;

/// Имя контейнера по умолчанию.
pub const DEFAULT_IMGFS_NAME: &str = "ImgFS";

// -------- Metadata record --------
// Layout (LE, 208 байт):
// [img_id 128][sha 32][orig_res 2*u32][size 3*u32][offset 3*u64][is_valid u16][unused_16 u16]
pub const MAX_IMG_ID: usize = 127;
pub const IMG_ID_LEN: usize = MAX_IMG_ID + 1;
pub const SHA256_LEN: usize = 32;
pub const NB_RES: usize = 3;
pub const RECORD_SIZE: usize = IMG_ID_LEN + SHA256_LEN + 2 * 4 + NB_RES * 4 + NB_RES * 8 + 2 + 2;

pub const REC_OFF_IMG_ID: usize = 0;
pub const REC_OFF_SHA: usize = REC_OFF_IMG_ID + IMG_ID_LEN;
pub const REC_OFF_ORIG_RES: usize = REC_OFF_SHA + SHA256_LEN;
pub const REC_OFF_SIZE: usize = REC_OFF_ORIG_RES + 2 * 4;
pub const REC_OFF_OFFSET: usize = REC_OFF_SIZE + NB_RES * 4;
pub const REC_OFF_IS_VALID: usize = REC_OFF_OFFSET + NB_RES * 8;
pub const REC_OFF_UNUSED_16: usize = REC_OFF_IS_VALID + 2;

pub const EMPTY: u16 = 0;
pub const NON_EMPTY: u16 = 1;

// -------- Resolution slots --------
pub const THUMB_RES: usize = 0;
pub const SMALL_RES: usize = 1;
pub const ORIG_RES: usize = 2;

// -------- Creation limits --------
pub const DEFAULT_MAX_FILES: u32 = 128;
pub const MAX_MAX_FILES: u32 = 100_000;
pub const DEFAULT_THUMB_RES: (u16, u16) = (64, 64);
pub const DEFAULT_SMALL_RES: (u16, u16) = (256, 256);
pub const MAX_THUMB_RES: u16 = 128;
pub const MAX_SMALL_RES: u16 = 512;

// -------- HTTP framing --------
pub const HTTP_PROTOCOL_ID: &str = "HTTP/1.1 ";
pub const HTTP_LINE_DELIM: &str = "\r\n";
pub const HTTP_HDR_END_DELIM: &str = "\r\n\r\n";
pub const CONTENT_LENGTH_HDR: &str = "Content-Length: ";

pub const HTTP_OK: &str = "200 OK";
pub const HTTP_FOUND: &str = "302 Found";
pub const HTTP_BAD_REQUEST: &str = "400 Bad Request";
pub const HTTP_NOT_FOUND: &str = "404 Not Found";
pub const HTTP_INTERNAL_ERROR: &str = "500 Internal Server Error";

/// Начальная ёмкость буфера соединения (и потолок для заголовка запроса).
pub const MAX_HEADER_SIZE: usize = 8192;
pub const MAX_HEADERS: usize = 40;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
