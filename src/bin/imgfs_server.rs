use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};

use std::path::PathBuf;
use std::sync::Arc;

use imgfs::{ConfigBuilder, HttpParser, ImgfsService, Server};

#[derive(Parser, Debug)]
#[command(
    name = "imgfs_server",
    version,
    about = "HTTP front end for an imgFS container"
)]
struct Opt {
    /// Контейнер; иначе IMGFS_STORE_PATH
    file: Option<PathBuf>,
    /// Адрес прослушивания; иначе IMGFS_LISTEN_ADDR / IMGFS_PORT
    #[arg(long)]
    addr: Option<String>,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opt = Opt::parse();

    let mut b = ConfigBuilder::new();
    if let Some(addr) = opt.addr {
        b = b.listen_addr(addr);
    }
    if opt.file.is_some() {
        b = b.store_path(opt.file);
    }
    let cfg = b.build();

    let path = cfg
        .store_path
        .clone()
        .ok_or_else(|| anyhow!("no imgFS file given (argument or IMGFS_STORE_PATH)"))?;
    let service = ImgfsService::open(&path)
        .with_context(|| format!("open imgFS {}", path.display()))?;
    info!("serving {} with {}", path.display(), cfg);

    let mut server = Server::bind(cfg, HttpParser, Arc::new(service))
        .context("bind imgfs server")?;
    server.run()?;
    server.shutdown();
    Ok(())
}
