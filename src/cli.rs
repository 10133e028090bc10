use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::CreateOptions;
use crate::imgfs::{ImgfsFile, ListMode, OpenMode, Resolution};

#[derive(Parser, Debug)]
#[command(
    name = "imgfscmd",
    version,
    about = "Image store container: create, list, insert, read, delete",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Создать пустой контейнер
    Create {
        path: PathBuf,
        #[arg(long)]
        max_files: Option<u32>,
        #[arg(long, num_args = 2, value_names = ["W", "H"])]
        thumb_res: Option<Vec<u16>>,
        #[arg(long, num_args = 2, value_names = ["W", "H"])]
        small_res: Option<Vec<u16>>,
        #[arg(long)]
        name: Option<String>,
    },
    List {
        path: PathBuf,
        /// JSON вместо текстового дампа
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Insert {
        path: PathBuf,
        img_id: String,
        image: PathBuf,
    },
    /// Прочитать вариант изображения (по умолчанию original) в файл
    Read {
        path: PathBuf,
        img_id: String,
        res: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Delete {
        path: PathBuf,
        img_id: String,
    },
    /// Заголовок + все слоты, включая удалённые
    Dump {
        path: PathBuf,
    },
}

fn pair(v: &[u16], what: &str) -> Result<(u16, u16)> {
    match v {
        [w, h] => Ok((*w, *h)),
        _ => bail!("--{} expects exactly two values (W H)", what),
    }
}

fn open(path: &Path, mode: OpenMode) -> Result<ImgfsFile> {
    ImgfsFile::open(path, mode).with_context(|| format!("open imgFS {}", path.display()))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create {
            path,
            max_files,
            thumb_res,
            small_res,
            name,
        } => {
            let mut opts = CreateOptions::default();
            if let Some(n) = max_files {
                opts = opts.with_max_files(n);
            }
            if let Some(v) = thumb_res {
                let (w, h) = pair(&v, "thumb-res")?;
                opts = opts.with_thumb_res(w, h);
            }
            if let Some(v) = small_res {
                let (w, h) = pair(&v, "small-res")?;
                opts = opts.with_small_res(w, h);
            }
            if let Some(n) = name {
                opts = opts.with_name(n);
            }
            let mut store = ImgfsFile::create(&path, &opts)
                .with_context(|| format!("create imgFS {}", path.display()))?;
            println!(
                "Created imgFS at {} ({} slots, thumb {}x{}, small {}x{})",
                path.display(),
                opts.max_files,
                opts.thumb_res.0,
                opts.thumb_res.1,
                opts.small_res.0,
                opts.small_res.1
            );
            store.close();
        }
        Cmd::List { path, json } => {
            let mut store = open(&path, OpenMode::ReadOnly)?;
            let mode = if json { ListMode::Json } else { ListMode::Stdout };
            let out = store.list(mode)?;
            print!("{}", out);
            if json {
                println!();
            }
            store.close();
        }
        Cmd::Insert { path, img_id, image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("read image {}", image.display()))?;
            let mut store = open(&path, OpenMode::ReadWrite)?;
            let slot = store
                .insert(&bytes, &img_id)
                .with_context(|| format!("insert '{}'", img_id))?;
            println!("Inserted '{}' ({} bytes) into slot {}", img_id, bytes.len(), slot);
            store.close();
        }
        Cmd::Read {
            path,
            img_id,
            res,
            out,
        } => {
            let res = match res.as_deref() {
                Some(name) => name.parse::<Resolution>()?,
                None => Resolution::Orig,
            };
            let mut store = open(&path, OpenMode::ReadOnly)?;
            let bytes = store
                .read(&img_id, res)
                .with_context(|| format!("read '{}' ({})", img_id, res))?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{}_{}.jpg", img_id, res.name())));
            std::fs::write(&out, &bytes)
                .with_context(|| format!("write {}", out.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), out.display());
            store.close();
        }
        Cmd::Delete { path, img_id } => {
            let mut store = open(&path, OpenMode::ReadWrite)?;
            store
                .delete(&img_id)
                .with_context(|| format!("delete '{}'", img_id))?;
            println!("Deleted '{}'", img_id);
            store.close();
        }
        Cmd::Dump { path } => {
            let mut store = open(&path, OpenMode::ReadOnly)?;
            print!("{}", store.dump());
            store.close();
        }
    }
    Ok(())
}
