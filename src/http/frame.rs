//! Frame accumulator: per-connection receive buffer with at-most-once growth.
//!
//! Состояния:
//!   Accumulating { extended: false }
//!     ──(incomplete, тело не влезает)──▶ AwaitingGrowth
//!   AwaitingGrowth ──grow()──▶ Accumulating { extended: true }
//!   Accumulating ──(complete)──▶ Complete ──reset()──▶ Accumulating { extended: false }
//!
//! Рост разрешён один раз на сообщение, только после того как парсер сообщил
//! длину тела, и только если тело не помещается в оставшуюся ёмкость.
//! Новая ёмкость = initial_capacity + content_len; прочитанные байты сохраняются.
//! Рост только резервирует память: байты буфера заводятся окнами не больше
//! initial_capacity по мере чтения, поэтому заявленная длина тела сама по себе
//! ничего не занимает.

use log::debug;

use crate::consts::HTTP_HDR_END_DELIM;
use crate::error::{ImgfsError, Result};
use crate::metrics;
use crate::util::find_subslice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Accumulating { extended: bool },
    AwaitingGrowth,
    Complete,
}

#[derive(Debug)]
pub struct FrameAccumulator {
    /// Заведённые байты (len() <= capacity); валидны только первые `filled`.
    buf: Vec<u8>,
    capacity: usize,
    filled: usize,
    initial_capacity: usize,
    content_len: usize,
    state: FrameState,
}

impl FrameAccumulator {
    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        if initial_capacity == 0 {
            return Err(ImgfsError::invalid("frame buffer capacity must be > 0"));
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(initial_capacity)?;
        buf.resize(initial_capacity, 0);
        Ok(Self {
            buf,
            capacity: initial_capacity,
            filled: 0,
            initial_capacity,
            content_len: 0,
            state: FrameState::Accumulating { extended: false },
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn content_len(&self) -> usize {
        self.content_len
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.state, FrameState::Accumulating { extended: true })
    }

    /// Valid bytes received so far.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Next read window: at most `initial_capacity` bytes, never past capacity.
    /// Память уже зарезервирована при росте, resize здесь не аллоцирует.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let window = (self.capacity - self.filled).min(self.initial_capacity);
        let end = self.filled + window;
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        &mut self.buf[self.filled..end]
    }

    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.buf.len());
        self.filled = (self.filled + n).min(self.buf.len());
    }

    pub fn is_exhausted(&self) -> bool {
        self.filled >= self.capacity
    }

    /// Найден ли разделитель конца заголовка.
    pub fn header_complete(&self) -> bool {
        find_subslice(self.filled(), HTTP_HDR_END_DELIM.as_bytes()).is_some()
    }

    /// Guard for the growth transition.
    pub fn needs_growth(&self, content_len: usize) -> bool {
        self.state == (FrameState::Accumulating { extended: false })
            && content_len > 0
            && content_len > self.capacity - self.filled
    }

    /// Парсер сказал "incomplete". При необходимости: единственный рост буфера.
    /// Возвращает true, если буфер был увеличен.
    pub fn on_incomplete(&mut self, content_len: usize) -> Result<bool> {
        if content_len > 0 {
            self.content_len = content_len;
        }
        if !self.needs_growth(content_len) {
            return Ok(false);
        }
        self.state = FrameState::AwaitingGrowth;
        self.grow()?;
        Ok(true)
    }

    fn grow(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, FrameState::AwaitingGrowth);
        let target = self
            .initial_capacity
            .checked_add(self.content_len)
            .ok_or_else(|| {
                ImgfsError::OutOfMemory(format!("frame of {} body bytes", self.content_len))
            })?;
        let additional = target.saturating_sub(self.buf.len());
        self.buf.try_reserve_exact(additional)?;
        self.capacity = target;
        self.state = FrameState::Accumulating { extended: true };
        metrics::record_buffer_growth();
        debug!(
            "frame: grown to {} bytes (content_len={}, held={})",
            target, self.content_len, self.filled
        );
        Ok(())
    }

    pub fn mark_complete(&mut self) {
        self.state = FrameState::Complete;
    }

    /// Готовность к следующему сообщению на том же соединении.
    pub fn reset(&mut self) {
        self.filled = 0;
        self.content_len = 0;
        self.state = FrameState::Accumulating { extended: false };
        self.capacity = self.initial_capacity;
        self.buf.truncate(self.initial_capacity);
        self.buf.shrink_to(self.initial_capacity);
        self.buf.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(acc: &mut FrameAccumulator, data: &[u8]) {
        let spare = acc.spare_mut();
        spare[..data.len()].copy_from_slice(data);
        acc.advance(data.len());
    }

    #[test]
    fn growth_happens_at_most_once_and_keeps_bytes() {
        let mut acc = FrameAccumulator::with_capacity(64).unwrap();
        let head = b"POST /x HTTP/1.1\r\nContent-Length: 200\r\n\r\n";
        push(&mut acc, head);
        assert!(acc.header_complete());

        assert!(acc.needs_growth(200));
        assert!(acc.on_incomplete(200).unwrap());
        assert_eq!(acc.capacity(), 64 + 200);
        assert!(acc.is_extended());
        assert_eq!(acc.filled(), &head[..]);

        // повторный incomplete: роста нет
        push(&mut acc, &[7u8; 10]);
        assert!(!acc.needs_growth(200));
        assert!(!acc.on_incomplete(200).unwrap());
        assert_eq!(acc.capacity(), 64 + 200);
        assert_eq!(&acc.filled()[..head.len()], &head[..]);
    }

    #[test]
    fn no_growth_without_body_length_or_when_it_fits() {
        let mut acc = FrameAccumulator::with_capacity(128).unwrap();
        push(&mut acc, b"GET / HTTP/1.1\r\n");
        assert!(!acc.on_incomplete(0).unwrap());
        assert_eq!(acc.capacity(), 128);
        // тело 10 байт влезает в оставшиеся 112
        assert!(!acc.on_incomplete(10).unwrap());
        assert_eq!(acc.capacity(), 128);
        assert_eq!(acc.state(), FrameState::Accumulating { extended: false });
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut acc = FrameAccumulator::with_capacity(16).unwrap();
        push(&mut acc, b"0123456789");
        acc.on_incomplete(100).unwrap();
        assert_eq!(acc.capacity(), 116);
        acc.mark_complete();
        assert_eq!(acc.state(), FrameState::Complete);

        acc.reset();
        assert_eq!(acc.len(), 0);
        assert_eq!(acc.content_len(), 0);
        assert_eq!(acc.capacity(), 16);
        assert_eq!(acc.state(), FrameState::Accumulating { extended: false });
        assert!(acc.spare_mut().iter().all(|&b| b == 0));
    }

    #[test]
    fn exhaustion_and_zero_capacity() {
        let mut acc = FrameAccumulator::with_capacity(4).unwrap();
        push(&mut acc, b"GET ");
        assert!(acc.is_exhausted());
        assert!(acc.spare_mut().is_empty());
        assert!(FrameAccumulator::with_capacity(0).is_err());
    }

    #[test]
    fn growth_reserves_without_committing_the_body() {
        let initial = 8192;
        let declared = 256 * 1024 * 1024;
        let mut acc = FrameAccumulator::with_capacity(initial).unwrap();
        let head = b"POST /x HTTP/1.1\r\nContent-Length: 268435456\r\n\r\n";
        push(&mut acc, head);

        assert!(acc.on_incomplete(declared).unwrap());
        assert_eq!(acc.capacity(), initial + declared);
        // заведено не больше начального буфера
        assert_eq!(acc.buf.len(), initial);

        // каждое окно чтения ограничено initial_capacity
        assert_eq!(acc.spare_mut().len(), initial);
        push(&mut acc, &[1u8; 100]);
        assert_eq!(acc.len(), head.len() + 100);
        assert_eq!(acc.spare_mut().len(), initial);
        assert!(acc.buf.len() <= acc.len() + initial);
        assert_eq!(&acc.filled()[..head.len()], &head[..]);

        acc.reset();
        assert_eq!(acc.capacity(), initial);
        assert_eq!(acc.buf.len(), initial);
    }

    #[test]
    fn window_stops_at_capacity() {
        let mut acc = FrameAccumulator::with_capacity(16).unwrap();
        push(&mut acc, b"0123456789");
        assert!(acc.on_incomplete(20).unwrap());
        assert_eq!(acc.capacity(), 36);
        push(&mut acc, &[b'x'; 16]);
        assert_eq!(acc.spare_mut().len(), 10);
        push(&mut acc, &[b'y'; 10]);
        assert!(acc.is_exhausted());
        assert!(acc.spare_mut().is_empty());
    }

    #[test]
    fn absurd_body_length_is_out_of_memory() {
        let mut acc = FrameAccumulator::with_capacity(8).unwrap();
        let err = acc.on_incomplete(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::OutOfMemory);
    }
}
