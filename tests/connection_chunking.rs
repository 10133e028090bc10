use std::io::{self, Read, Write};
use std::sync::Mutex;

use anyhow::Result;

use imgfs::{
    handle_connection, http_reply, ErrorKind, HttpMessage, HttpParser, ImgfsError,
};

/// Поток, отдающий каждое сообщение кусками случайной длины.
/// Границы сообщений не пересекаются одним read (клиент ждёт ответа).
struct ChunkedStream {
    messages: Vec<Vec<u8>>,
    msg: usize,
    pos: usize,
    rng: oorandom::Rand32,
    max_chunk: u32,
    reads: usize,
    out: Vec<u8>,
}

impl ChunkedStream {
    fn new(messages: Vec<Vec<u8>>, seed: u64, max_chunk: u32) -> Self {
        Self {
            messages,
            msg: 0,
            pos: 0,
            rng: oorandom::Rand32::new(seed),
            max_chunk,
            reads: 0,
            out: Vec::new(),
        }
    }
}

impl Read for ChunkedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        while self.msg < self.messages.len() && self.pos == self.messages[self.msg].len() {
            self.msg += 1;
            self.pos = 0;
        }
        if self.msg == self.messages.len() {
            return Ok(0);
        }
        let cur = &self.messages[self.msg];
        let want = self.rng.rand_range(1..self.max_chunk + 1) as usize;
        let n = want.min(buf.len()).min(cur.len() - self.pos);
        buf[..n].copy_from_slice(&cur[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for ChunkedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn post(uri: &str, body: &[u8]) -> Vec<u8> {
    let mut v = format!(
        "POST {} HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n",
        uri,
        body.len()
    )
    .into_bytes();
    v.extend_from_slice(body);
    v
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// Диспетчер-эхо: запоминает сообщения, отвечает телом.
struct Recorder {
    seen: Mutex<Vec<HttpMessage>>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    fn dispatch(&self, msg: &HttpMessage, conn: &mut dyn Write) -> imgfs::Result<()> {
        self.seen
            .lock()
            .map_err(|_| ImgfsError::Dispatch("poisoned".into()))?
            .push(msg.clone());
        http_reply(conn, "200 OK", "", Some(&msg.body))
    }
}

#[test]
fn random_chunking_reassembles_each_message_once() -> Result<()> {
    for seed in 1..=20u64 {
        let bodies: Vec<Vec<u8>> = (0..5).map(|i| pattern(50 + i * 37, i as u8)).collect();
        let msgs: Vec<Vec<u8>> = bodies
            .iter()
            .enumerate()
            .map(|(i, b)| post(&format!("/m{}", i), b))
            .collect();

        let rec = Recorder::new();
        let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
        let mut s = ChunkedStream::new(msgs, seed, 17);

        let served = handle_connection(&mut s, &HttpParser, &d, 8192)?;
        assert_eq!(served, 5, "seed {seed}");

        let seen = rec.seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(seen.len(), 5);
        for (i, m) in seen.iter().enumerate() {
            assert_eq!(m.uri, format!("/m{}", i));
            assert_eq!(m.body, bodies[i], "seed {seed}, message {i}");
        }
        assert!(s.reads > 5, "chunked delivery needs several reads");
    }
    Ok(())
}

#[test]
fn body_larger_than_buffer_grows_once_per_message() -> Result<()> {
    // Заголовок помещается в 64 байта, тело: нет.
    let cap = 64;
    let b1 = pattern(500, 1);
    let b2 = pattern(1000, 2);
    let msgs = vec![post("/a", &b1), post("/b", &b2)];
    assert!(msgs[0].len() - b1.len() < cap);
    assert!(msgs[1].len() - b2.len() < cap);

    for seed in 1..=10u64 {
        let rec = Recorder::new();
        let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
        let mut s = ChunkedStream::new(msgs.clone(), seed, 97);

        let served = handle_connection(&mut s, &HttpParser, &d, cap)?;
        assert_eq!(served, 2);
        let seen = rec.seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(seen[0].body, b1);
        assert_eq!(seen[1].body, b2);
    }
    Ok(())
}

#[test]
fn immediate_close_is_io_error() {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    let mut s = ChunkedStream::new(Vec::new(), 1, 8);

    let e = handle_connection(&mut s, &HttpParser, &d, 1024).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);
    assert!(matches!(e, ImgfsError::ConnectionClosed));
}

#[test]
fn close_mid_message_is_io_error() {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    let mut full = post("/x", b"0123456789");
    full.truncate(full.len() - 3);
    let mut s = ChunkedStream::new(vec![full], 3, 8);

    let e = handle_connection(&mut s, &HttpParser, &d, 1024).unwrap_err();
    assert!(matches!(e, ImgfsError::ConnectionClosed));
    assert!(s.out.is_empty());
}

#[test]
fn malformed_request_closes_without_reply() {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    let bad = b"GARBAGE\r\nno colon here\r\n\r\n".to_vec();
    let mut s = ChunkedStream::new(vec![bad], 5, 4);

    let e = handle_connection(&mut s, &HttpParser, &d, 1024).unwrap_err();
    assert!(matches!(e, ImgfsError::Malformed(_)));
    assert_eq!(e.kind(), ErrorKind::Io);
    assert!(s.out.is_empty());
}

#[test]
fn oversized_header_exhausts_buffer() {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    req.extend_from_slice(format!("X-Long: {}\r\n\r\n", "a".repeat(200)).as_bytes());
    let mut s = ChunkedStream::new(vec![req], 9, 32);

    let e = handle_connection(&mut s, &HttpParser, &d, 64).unwrap_err();
    assert!(matches!(e, ImgfsError::CapacityExhausted(64)));
    assert!(s.out.is_empty());
}

#[test]
fn dispatch_failure_ends_connection() {
    let failing = |_: &HttpMessage, _: &mut dyn Write| -> imgfs::Result<()> {
        Err(ImgfsError::InvalidArgument("boom".into()))
    };
    let mut s = ChunkedStream::new(vec![post("/f", b"x"), post("/g", b"y")], 2, 8);

    let e = handle_connection(&mut s, &HttpParser, &failing, 1024).unwrap_err();
    assert!(matches!(e, ImgfsError::Dispatch(_)));
}

#[test]
fn replies_are_written_back_in_order() -> Result<()> {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    let mut s = ChunkedStream::new(vec![post("/1", b"one"), post("/2", b"two")], 11, 6);

    handle_connection(&mut s, &HttpParser, &d, 256)?;
    let expected = [
        b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\none".as_slice(),
        b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\ntwo".as_slice(),
    ]
    .concat();
    assert_eq!(s.out, expected);
    Ok(())
}

#[test]
fn huge_declared_body_then_close_ends_connection() {
    let rec = Recorder::new();
    let d = |m: &HttpMessage, c: &mut dyn Write| rec.dispatch(m, c);
    // 1.5 ГБ заявлено, пришло только начало тела.
    let mut req = b"POST /x HTTP/1.1\r\nContent-Length: 1500000000\r\n\r\n".to_vec();
    req.extend_from_slice(&[0u8; 300]);
    let mut s = ChunkedStream::new(vec![req], 4, 64);

    let e = handle_connection(&mut s, &HttpParser, &d, 8192).unwrap_err();
    assert!(matches!(e, ImgfsError::ConnectionClosed));
    assert!(s.out.is_empty());
}
