use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;

/// Errors from the single-slot handoff cell.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// A transfer is already holding the slot.
    #[error("buffer already claimed")]
    AlreadyClaimed,

    /// `release` called while the slot is free. Signals a coordinator
    /// bug, not a caller error.
    #[error("buffer not claimed")]
    NotClaimed,

    #[error("empty chunk")]
    EmptyChunk,
}

/// Single-slot producer/consumer handoff cell.
///
/// Ownership is an atomic claim token, so the producer path never blocks
/// on the worker's activity. The chunk is copied once at claim time;
/// [`view`](Self::view) hands out cheap `Bytes` handles afterwards.
///
/// At most one claim is outstanding at any time: a second `try_claim`
/// while the slot is held fails rather than queueing or overwriting, and
/// claim/release strictly alternate.
pub struct TransferBuffer {
    claimed: AtomicBool,
    slot: Mutex<Bytes>,
}

impl TransferBuffer {
    pub fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            slot: Mutex::new(Bytes::new()),
        }
    }

    /// Claims the slot and copies `data` into it.
    pub fn try_claim(&self, data: &[u8]) -> Result<(), BufferError> {
        if data.is_empty() {
            return Err(BufferError::EmptyChunk);
        }
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BufferError::AlreadyClaimed);
        }
        *self.slot.lock().unwrap() = Bytes::copy_from_slice(data);
        Ok(())
    }

    /// Frees the slot once the transfer that consumed it has finished.
    pub fn release(&self) -> Result<(), BufferError> {
        if self
            .claimed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BufferError::NotClaimed);
        }
        Ok(())
    }

    /// Returns the claimed chunk, or `None` while the slot is free.
    pub fn view(&self) -> Option<Bytes> {
        if !self.claimed.load(Ordering::Acquire) {
            return None;
        }
        Some(self.slot.lock().unwrap().clone())
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl Default for TransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_free() {
        let buffer = TransferBuffer::new();
        assert!(!buffer.is_claimed());
        assert!(buffer.view().is_none());
    }

    #[test]
    fn claim_copies_data() {
        let buffer = TransferBuffer::new();
        let mut data = vec![1u8, 2, 3, 4];
        buffer.try_claim(&data).unwrap();
        // Mutating the caller's copy must not affect the slot.
        data[0] = 99;
        assert_eq!(buffer.view().unwrap().as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn empty_chunk_rejected() {
        let buffer = TransferBuffer::new();
        assert!(matches!(
            buffer.try_claim(&[]),
            Err(BufferError::EmptyChunk)
        ));
        assert!(!buffer.is_claimed());
    }

    #[test]
    fn second_claim_rejected() {
        let buffer = TransferBuffer::new();
        buffer.try_claim(b"first").unwrap();
        assert!(matches!(
            buffer.try_claim(b"second"),
            Err(BufferError::AlreadyClaimed)
        ));
        // In-flight contents untouched.
        assert_eq!(buffer.view().unwrap().as_ref(), b"first");
    }

    #[test]
    fn release_frees_for_next_claim() {
        let buffer = TransferBuffer::new();
        buffer.try_claim(b"first").unwrap();
        buffer.release().unwrap();
        buffer.try_claim(b"second").unwrap();
        assert_eq!(buffer.view().unwrap().as_ref(), b"second");
    }

    #[test]
    fn release_while_free_is_an_error() {
        let buffer = TransferBuffer::new();
        assert!(matches!(buffer.release(), Err(BufferError::NotClaimed)));
        buffer.try_claim(b"x").unwrap();
        buffer.release().unwrap();
        assert!(matches!(buffer.release(), Err(BufferError::NotClaimed)));
    }

    #[test]
    fn claim_release_alternate_strictly() {
        let buffer = TransferBuffer::new();
        for round in 0..10 {
            let data = vec![round as u8; 8];
            buffer.try_claim(&data).unwrap();
            assert!(buffer.try_claim(&data).is_err());
            buffer.release().unwrap();
        }
    }

    #[test]
    fn concurrent_claims_grant_exactly_one() {
        use std::sync::Arc;
        use std::thread;

        let buffer = Arc::new(TransferBuffer::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let b = Arc::clone(&buffer);
                thread::spawn(move || b.try_claim(b"race").is_ok())
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|granted| *granted)
            .count();
        assert_eq!(granted, 1);
        assert!(buffer.is_claimed());
    }
}
