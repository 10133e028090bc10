//! Message parser seam + the default HTTP/1.1 request parser.
//!
//! Контракт: parse(buf) →
//! - Ok(Incomplete { content_len }): нужно больше байт; content_len > 0, если
//!   заголовок уже разобран и объявлена длина тела;
//! - Ok(Complete { message, content_len }): сообщение целиком в буфере;
//! - Err(Malformed): мусор, соединение закрывается без ответа.

use crate::consts::{HTTP_HDR_END_DELIM, HTTP_LINE_DELIM, MAX_HEADERS};
use crate::error::{ImgfsError, Result};
use crate::http::HttpMessage;
use crate::util::find_subslice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<M> {
    Incomplete { content_len: usize },
    Complete { message: M, content_len: usize },
}

pub trait MessageParser: Send + Sync {
    type Message: Send;

    fn parse(&self, buf: &[u8]) -> Result<ParseOutcome<Self::Message>>;
}

/// Минимальный разбор запроса: стартовая строка, заголовки, тело по Content-Length.
/// Chunked transfer encoding не поддерживается.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpParser;

impl MessageParser for HttpParser {
    type Message = HttpMessage;

    fn parse(&self, buf: &[u8]) -> Result<ParseOutcome<HttpMessage>> {
        let Some(hdr_end) = find_subslice(buf, HTTP_HDR_END_DELIM.as_bytes()) else {
            return Ok(ParseOutcome::Incomplete { content_len: 0 });
        };

        let head = std::str::from_utf8(&buf[..hdr_end])
            .map_err(|_| ImgfsError::Malformed("non UTF-8 header block".into()))?;
        let mut lines = head.split(HTTP_LINE_DELIM);

        let start = lines.next().unwrap_or_default();
        let mut parts = start.splitn(3, ' ');
        let method = parts.next().filter(|s| !s.is_empty());
        let uri = parts.next().filter(|s| !s.is_empty());
        let version = parts.next();
        let (method, uri) = match (method, uri, version) {
            (Some(m), Some(u), Some(v)) if v.starts_with("HTTP/") => (m, u),
            _ => {
                return Err(ImgfsError::Malformed(format!(
                    "bad request line '{}'",
                    start
                )))
            }
        };

        let mut headers = Vec::new();
        let mut content_len = 0usize;
        for line in lines {
            let (k, v) = line
                .split_once(':')
                .ok_or_else(|| ImgfsError::Malformed(format!("bad header line '{}'", line)))?;
            let (k, v) = (k.trim(), v.trim());
            if k.is_empty() {
                return Err(ImgfsError::Malformed("empty header name".into()));
            }
            if headers.len() >= MAX_HEADERS {
                return Err(ImgfsError::Malformed(format!(
                    "too many headers (max {})",
                    MAX_HEADERS
                )));
            }
            if k.eq_ignore_ascii_case("Content-Length") {
                // только десятичные цифры: без знака и пустого значения
                if !v.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
                    return Err(ImgfsError::Malformed(format!("bad Content-Length '{}'", v)));
                }
                content_len = v
                    .parse::<usize>()
                    .map_err(|_| ImgfsError::Malformed(format!("bad Content-Length '{}'", v)))?;
            }
            headers.push((k.to_string(), v.to_string()));
        }

        let body_start = hdr_end + HTTP_HDR_END_DELIM.len();
        let available = buf.len() - body_start;
        if available < content_len {
            return Ok(ParseOutcome::Incomplete { content_len });
        }

        let message = HttpMessage {
            method: method.to_string(),
            uri: uri.to_string(),
            headers,
            body: buf[body_start..body_start + content_len].to_vec(),
        };
        Ok(ParseOutcome::Complete {
            message,
            content_len,
        })
    }
}
