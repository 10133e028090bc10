//! Server context: passive socket + parser + dispatcher, one worker thread per
//! accepted connection.
//!
//! Жизненный цикл: bind → accept_one()/run() → shutdown(). Каждый worker
//! возвращает собственный Result через JoinHandle.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::config::ImgfsConfig;
use crate::error::Result;
use crate::http::connection::{handle_connection, Dispatcher};
use crate::http::parser::MessageParser;
use crate::metrics;

pub type WorkerHandle = JoinHandle<Result<usize>>;

pub struct Server<P, D: ?Sized> {
    cfg: ImgfsConfig,
    listener: TcpListener,
    parser: Arc<P>,
    dispatcher: Arc<D>,
    next_worker: u64,
}

impl<P, D> Server<P, D>
where
    P: MessageParser + 'static,
    D: Dispatcher<P::Message> + ?Sized + 'static,
{
    pub fn bind(cfg: ImgfsConfig, parser: P, dispatcher: Arc<D>) -> Result<Self> {
        cfg.validate()?;
        let listener = TcpListener::bind(&cfg.listen_addr)?;
        info!("imgfs server listening on {}", listener.local_addr()?);
        Ok(Self {
            cfg,
            listener,
            parser: Arc::new(parser),
            dispatcher,
            next_worker: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Принять одно соединение и отдать его новому worker'у.
    /// Ошибка accept возвращается вызывающему; уже работающие worker'ы не трогаются.
    pub fn accept_one(&mut self) -> Result<WorkerHandle> {
        let (stream, peer) = self.listener.accept()?;
        metrics::record_connection_accepted();
        self.spawn_worker(stream, peer)
    }

    fn spawn_worker(&mut self, mut stream: TcpStream, peer: SocketAddr) -> Result<WorkerHandle> {
        self.next_worker += 1;
        let name = format!("{}-{}", self.cfg.worker_name_prefix, self.next_worker);
        let parser = Arc::clone(&self.parser);
        let dispatcher = Arc::clone(&self.dispatcher);
        let cap = self.cfg.max_header_size;

        debug!("accepted {} -> {}", peer, name);
        let handle = thread::Builder::new().name(name).spawn(move || {
            let res = handle_connection(&mut stream, &*parser, &*dispatcher, cap);
            match &res {
                Ok(n) => debug!("connection {} done: {} message(s)", peer, n),
                Err(e) => {
                    metrics::record_connection_failed();
                    warn!("connection {} closed: {}", peer, e);
                }
            }
            let _ = stream.shutdown(Shutdown::Both);
            res
        })?;
        Ok(handle)
    }

    /// Accept loop. Never returns under normal operation; accept errors are
    /// logged and the loop keeps going.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.accept_one() {
                Ok(_detached) => {}
                Err(e) => warn!("accept failed: {}", e),
            }
        }
    }

    /// Закрыть пассивный сокет (ровно один раз: self потребляется).
    pub fn shutdown(self) {
        let m = metrics::snapshot();
        match self.listener.local_addr() {
            Ok(addr) => info!("imgfs server on {} shut down", addr),
            Err(_) => info!("imgfs server shut down"),
        }
        info!(
            "metrics: accepted={} failed={} dispatched={} replies={} (avg {:.1} B) growths={}",
            m.connections_accepted,
            m.connections_failed,
            m.messages_dispatched,
            m.replies_sent,
            m.avg_reply_bytes(),
            m.buffer_growths
        );
        drop(self.listener);
    }
}
