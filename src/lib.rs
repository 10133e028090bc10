// Базовые модули
pub mod consts;
pub mod error;
pub mod util; // src/util/mod.rs
pub mod config;
pub mod metrics;

// Контейнер изображений (src/imgfs/{mod,header,metadata,file,ops,dims,display,resolution}.rs)
pub mod imgfs;

// HTTP-фронтенд (src/http/{mod,frame,parser,message,reply,connection,server}.rs)
pub mod http;

// Диспетчер по умолчанию: HTTP → операции над контейнером
pub mod service;

// CLI (imgfscmd)
pub mod cli;

// Удобные реэкспорты
pub use config::{ConfigBuilder, CreateOptions, ImgfsConfig};
pub use error::{ErrorKind, ImgfsError, Result};
pub use http::{
    handle_connection, http_reply, Dispatcher, FrameAccumulator, FrameState, HttpMessage,
    HttpParser, MessageParser, ParseOutcome, Server,
};
pub use imgfs::{ImgfsFile, ListMode, OpenMode, Resolution};
pub use service::ImgfsService;
