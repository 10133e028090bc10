//! Reply builder: one exact-size allocation, one write.
//!
//! Формат: `<HTTP/1.1 ><status>\r\n<headers>Content-Length: <n>\r\n\r\n<body>`
//! `headers`: либо пусто, либо набор строк, каждая заканчивается "\r\n".

use std::io::Write;

use crate::consts::{CONTENT_LENGTH_HDR, HTTP_HDR_END_DELIM, HTTP_LINE_DELIM, HTTP_PROTOCOL_ID};
use crate::error::{ImgfsError, Result};
use crate::metrics;

/// Количество десятичных цифр в n (0 → 1).
pub fn decimal_digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

/// Точный размер ответа в байтах.
pub fn reply_size(status: &str, headers: &str, body_len: usize) -> usize {
    HTTP_PROTOCOL_ID.len()
        + status.len()
        + HTTP_LINE_DELIM.len()
        + headers.len()
        + CONTENT_LENGTH_HDR.len()
        + decimal_digits(body_len)
        + HTTP_HDR_END_DELIM.len()
        + body_len
}

/// Собрать ответ в памяти (без отправки).
pub fn build_reply(status: &str, headers: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
    if status.is_empty() {
        return Err(ImgfsError::invalid("empty reply status"));
    }
    if status.contains(['\r', '\n']) {
        return Err(ImgfsError::invalid("reply status contains a line break"));
    }
    if !headers.is_empty() && !headers.ends_with(HTTP_LINE_DELIM) {
        return Err(ImgfsError::invalid("reply headers must end with CRLF"));
    }

    let body = body.unwrap_or_default();
    let size = reply_size(status, headers, body.len());
    let text_len = size - body.len();

    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(size)?;
    write!(
        buf,
        "{}{}{}{}{}{}{}",
        HTTP_PROTOCOL_ID,
        status,
        HTTP_LINE_DELIM,
        headers,
        CONTENT_LENGTH_HDR,
        body.len(),
        HTTP_HDR_END_DELIM
    )?;
    if buf.len() != text_len {
        return Err(ImgfsError::invalid(format!(
            "reply header overflow: wrote {} bytes, reserved {}",
            buf.len(),
            text_len
        )));
    }
    buf.extend_from_slice(body);
    Ok(buf)
}

/// Собрать и отправить ответ одним write. Повторов нет.
pub fn http_reply<W: Write + ?Sized>(
    conn: &mut W,
    status: &str,
    headers: &str,
    body: Option<&[u8]>,
) -> Result<()> {
    let buf = build_reply(status, headers, body)?;
    conn.write_all(&buf)?;
    conn.flush()?;
    metrics::record_reply(buf.len());
    Ok(())
}
