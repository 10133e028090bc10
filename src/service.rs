//! Default dispatcher: maps HTTP requests onto store operations.
//!
//! Маршруты:
//!   GET  /imgfs/list                          → JSON {"Images":[...]}
//!   GET  /imgfs/read?res=<r>&img_id=<id>      → байты изображения
//!   GET  /imgfs/delete?img_id=<id>            → 302 на /index.html
//!   POST /imgfs/insert?name=<id>   (body)     → 302 на /index.html
//!
//! Handle контейнера общий для всех worker'ов, поэтому сидит за Mutex.
//! Ошибки хранилища отвечаются 500 с текстом ошибки; dispatch при этом успешен.

use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::consts::{HTTP_BAD_REQUEST, HTTP_FOUND, HTTP_INTERNAL_ERROR, HTTP_NOT_FOUND, HTTP_OK};
use crate::error::{ImgfsError, Result};
use crate::http::{http_reply, Dispatcher, HttpMessage};
use crate::imgfs::{ImgfsFile, ListMode, OpenMode, Resolution};

pub const URI_ROOT: &str = "/imgfs";
const INDEX_LOCATION: &str = "Location: /index.html\r\n";

/// Ответ до сериализации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: &'static str,
    pub headers: String,
    pub body: Vec<u8>,
}

impl Reply {
    fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: HTTP_OK,
            headers: format!("Content-Type: {}\r\n", content_type),
            body,
        }
    }

    fn redirect_index() -> Self {
        Self {
            status: HTTP_FOUND,
            headers: INDEX_LOCATION.to_string(),
            body: Vec::new(),
        }
    }

    fn error(status: &'static str, msg: &str) -> Self {
        Self {
            status,
            headers: String::new(),
            body: format!("Error: {}\n", msg).into_bytes(),
        }
    }

    pub fn send(&self, conn: &mut dyn Write) -> Result<()> {
        let body = if self.body.is_empty() {
            None
        } else {
            Some(self.body.as_slice())
        };
        http_reply(conn, self.status, &self.headers, body)
    }
}

pub struct ImgfsService {
    store: Mutex<ImgfsFile>,
}

impl ImgfsService {
    pub fn new(store: ImgfsFile) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(ImgfsFile::open(path, OpenMode::ReadWrite)?))
    }

    /// Забрать handle обратно (например, чтобы закрыть при остановке).
    pub fn into_inner(self) -> Result<ImgfsFile> {
        self.store
            .into_inner()
            .map_err(|_| ImgfsError::io_msg("imgFS lock poisoned"))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ImgfsFile>> {
        self.store
            .lock()
            .map_err(|_| ImgfsError::io_msg("imgFS lock poisoned"))
    }

    /// Маршрутизация без записи в соединение (удобно для тестов).
    pub fn route(&self, msg: &HttpMessage) -> Reply {
        let path = msg.path();
        let res = match path.strip_prefix(URI_ROOT) {
            Some("/list") => self.handle_list(),
            Some("/read") => self.handle_read(msg),
            Some("/delete") => self.handle_delete(msg),
            Some("/insert") => self.handle_insert(msg),
            _ => return Reply::error(HTTP_NOT_FOUND, &format!("unknown URI {}", path)),
        };
        match res {
            Ok(reply) => reply,
            Err(ImgfsError::InvalidArgument(m)) => Reply::error(HTTP_BAD_REQUEST, &m),
            Err(e) => {
                debug!("service: {} {} -> {}", msg.method, msg.uri, e);
                Reply::error(HTTP_INTERNAL_ERROR, &e.to_string())
            }
        }
    }

    fn handle_list(&self) -> Result<Reply> {
        let store = self.lock()?;
        let json = store.list(ListMode::Json)?;
        Ok(Reply::ok("application/json", json.into_bytes()))
    }

    fn handle_read(&self, msg: &HttpMessage) -> Result<Reply> {
        let res_name = required_param(msg, "res")?;
        let img_id = required_param(msg, "img_id")?;
        let res: Resolution = res_name.parse()?;
        let store = self.lock()?;
        let bytes = store.read(&img_id, res)?;
        Ok(Reply::ok("image/jpeg", bytes))
    }

    fn handle_delete(&self, msg: &HttpMessage) -> Result<Reply> {
        let img_id = required_param(msg, "img_id")?;
        let mut store = self.lock()?;
        store.delete(&img_id)?;
        Ok(Reply::redirect_index())
    }

    fn handle_insert(&self, msg: &HttpMessage) -> Result<Reply> {
        if !msg.is_method("POST") {
            return Err(ImgfsError::invalid(format!(
                "insert requires POST, got {}",
                msg.method
            )));
        }
        let name = required_param(msg, "name")?;
        if msg.body.is_empty() {
            return Err(ImgfsError::invalid("insert without body"));
        }
        let mut store = self.lock()?;
        store.insert(&msg.body, &name)?;
        Ok(Reply::redirect_index())
    }
}

fn required_param(msg: &HttpMessage, name: &str) -> Result<String> {
    msg.query_param(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ImgfsError::invalid(format!("missing '{}' parameter", name)))
}

impl Dispatcher<HttpMessage> for ImgfsService {
    fn handle(&self, msg: &HttpMessage, conn: &mut dyn Write) -> Result<()> {
        let reply = self.route(msg);
        if reply.status != HTTP_OK {
            warn!("service: {} {} -> {}", msg.method, msg.uri, reply.status);
        }
        reply.send(conn)
    }
}
