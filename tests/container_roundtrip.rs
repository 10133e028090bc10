use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use imgfs::consts::{HDR_OFF_NB_FILES, HEADER_SIZE, NON_EMPTY, ORIG_RES, RECORD_SIZE};
use imgfs::imgfs::record_offset;
use imgfs::{CreateOptions, ErrorKind, ImgfsFile, OpenMode, Resolution};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("imgfstest-container-{prefix}-{pid}-{t}-{id}"))
}

fn fake_png(w: u32, h: u32, tag: u8) -> Vec<u8> {
    let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
    v.extend_from_slice(&13u32.to_be_bytes());
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&w.to_be_bytes());
    v.extend_from_slice(&h.to_be_bytes());
    v.extend_from_slice(&[8, 2, 0, 0, 0, tag, tag, tag, tag]);
    v
}

#[test]
fn create_then_open_reads_back_header_and_table() -> Result<()> {
    let root = unique_root("create");
    fs::create_dir_all(&root)?;
    let path = root.join("store.imgfs");

    let opts = CreateOptions::default()
        .with_name("holiday")
        .with_max_files(10)
        .with_thumb_res(64, 48)
        .with_small_res(256, 192);
    let mut store = ImgfsFile::create(&path, &opts)?;
    store.close();

    // header + ровно max_files записей
    let len = fs::metadata(&path)?.len() as usize;
    assert_eq!(len, HEADER_SIZE + 10 * RECORD_SIZE);

    let mut store = ImgfsFile::open(&path, OpenMode::ReadOnly)?;
    assert_eq!(store.header.name_str(), "holiday");
    assert_eq!(store.header.max_files, 10);
    assert_eq!(store.header.nb_files, 0);
    assert_eq!(store.header.resized(Resolution::Thumb), Some((64, 48)));
    assert_eq!(store.header.resized(Resolution::Small), Some((256, 192)));
    assert_eq!(store.metadata.len(), 10);
    assert!(store.metadata.iter().all(|m| !m.is_valid()));
    store.close();

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn open_close_roundtrip_is_bit_identical() -> Result<()> {
    let root = unique_root("bits");
    fs::create_dir_all(&root)?;
    let path = root.join("store.imgfs");

    {
        let mut store = ImgfsFile::create(&path, &CreateOptions::default().with_max_files(4))?;
        store.insert(&fake_png(10, 20, 1), "a")?;
        store.insert(&fake_png(30, 40, 2), "b")?;
        store.delete("a")?;
        store.close();
    }
    let before = fs::read(&path)?;

    for mode in [OpenMode::ReadOnly, OpenMode::ReadWrite] {
        let mut store = ImgfsFile::open(&path, mode)?;
        assert_eq!(store.header.nb_files, 1);
        store.close();
        let after = fs::read(&path)?;
        assert_eq!(before, after, "open/close in {:?} must not change the file", mode);
    }

    // Таблица в памяти совпадает с байтами на диске.
    let store = ImgfsFile::open(&path, OpenMode::ReadOnly)?;
    for (i, m) in store.metadata.iter().enumerate() {
        let off = record_offset(i) as usize;
        assert_eq!(&before[off..off + RECORD_SIZE], &m.encode()[..]);
    }
    assert_eq!(&before[..HEADER_SIZE], &store.header.encode()[..]);

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn close_twice_is_a_noop() -> Result<()> {
    let root = unique_root("close2");
    fs::create_dir_all(&root)?;
    let path = root.join("store.imgfs");

    let mut store = ImgfsFile::create(&path, &CreateOptions::default().with_max_files(2))?;
    assert!(store.is_open());
    store.close();
    assert!(!store.is_open());
    assert!(store.metadata.is_empty());
    store.close();
    assert!(!store.is_open());

    // Операции на закрытом handle: ошибка, не паника.
    let e = store.read("x", Resolution::Orig).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidArgument);

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn open_rejects_missing_truncated_and_inconsistent_files() -> Result<()> {
    let root = unique_root("bad");
    fs::create_dir_all(&root)?;

    // нет файла
    let e = ImgfsFile::open(root.join("nope.imgfs"), OpenMode::ReadOnly).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);

    // таблица обрезана
    let path = root.join("short.imgfs");
    {
        let mut s = ImgfsFile::create(&path, &CreateOptions::default().with_max_files(3))?;
        s.close();
    }
    let full = fs::read(&path)?;
    fs::write(&path, &full[..HEADER_SIZE + RECORD_SIZE])?;
    let e = ImgfsFile::open(&path, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);

    // nb_files > max_files
    let mut bad = full.clone();
    bad[HDR_OFF_NB_FILES..HDR_OFF_NB_FILES + 4].copy_from_slice(&99u32.to_le_bytes());
    fs::write(&path, &bad)?;
    let e = ImgfsFile::open(&path, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);

    // пустой путь
    let e = ImgfsFile::open("", OpenMode::ReadOnly).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidArgument);

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn open_mode_strings() -> Result<()> {
    assert_eq!("rb".parse::<OpenMode>()?, OpenMode::ReadOnly);
    assert_eq!("rb+".parse::<OpenMode>()?, OpenMode::ReadWrite);
    assert_eq!("r+".parse::<OpenMode>()?, OpenMode::ReadWrite);
    assert!("w".parse::<OpenMode>().is_err());
    Ok(())
}

#[test]
fn in_place_header_and_record_rewrites_survive_reopen() -> Result<()> {
    let root = unique_root("rewrite");
    fs::create_dir_all(&root)?;
    let path = root.join("store.imgfs");

    let mut store = ImgfsFile::create(&path, &CreateOptions::default().with_max_files(3))?;
    store.header.version = 42;
    store.header.unused_64 = 0x0102_0304_0506_0708;
    store.write_header()?;

    store.metadata[1].set_img_id("manual")?;
    store.metadata[1].is_valid = NON_EMPTY;
    store.metadata[1].offset[ORIG_RES] = 4096;
    store.metadata[1].size[ORIG_RES] = 17;
    store.metadata[1].unused_16 = 9;
    store.write_record(1)?;

    let e = store.write_record(3).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidArgument);

    let header = store.header.clone();
    let rec = store.metadata[1].clone();
    store.close();

    let mut back = ImgfsFile::open(&path, OpenMode::ReadOnly)?;
    assert_eq!(back.header, header);
    assert_eq!(back.metadata[1], rec);
    assert_eq!(back.find("manual"), Some(1));
    // соседние слоты не тронуты
    assert!(!back.metadata[0].is_valid());
    assert!(!back.metadata[2].is_valid());

    // на read-only handle перезапись запрещена
    assert_eq!(back.write_header().unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(back.write_record(1).unwrap_err().kind(), ErrorKind::InvalidArgument);
    back.close();

    fs::remove_dir_all(&root)?;
    Ok(())
}
