use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Arc<[u8]>,
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, sequence: u64) -> Self {
        Self {
            bytes: Arc::from(bytes),
            sequence,
            captured_at: Utc::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        png_dimensions(&self.bytes)
    }
}

pub fn validate_png(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < PNG_SIGNATURE.len() {
        return Err("Screen capture is empty".to_string());
    }
    if !bytes.starts_with(PNG_SIGNATURE) {
        return Err("Screen capture is not a PNG".to_string());
    }
    Ok(())
}

/// Width and height from the IHDR chunk, which must directly follow the signature.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    validate_png(bytes).ok()?;
    let ihdr = bytes.get(8..24)?;
    if &ihdr[4..8] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(ihdr[8..12].try_into().ok()?);
    let height = u32::from_be_bytes(ihdr[12..16].try_into().ok()?);
    Some((width, height))
}

#[derive(Debug)]
pub enum SlotWait {
    Frame(Frame),
    TimedOut,
    Closed,
}

#[derive(Debug, Default)]
struct SlotState {
    frame: Option<Frame>,
    closed: bool,
    superseded: u64,
}

/// Single-slot handoff between the capture thread and a display consumer.
/// Publishing never blocks; an undisplayed frame is replaced by the newer one.
#[derive(Debug, Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    cv: Condvar,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = state.frame.replace(frame).is_some();
        if replaced {
            state.superseded += 1;
        }
        self.cv.notify_one();
        replaced
    }

    pub fn take(&self) -> Option<Frame> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frame
            .take()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> SlotWait {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut state, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |state| {
                state.frame.is_none() && !state.closed
            })
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(frame) = state.frame.take() {
            return SlotWait::Frame(frame);
        }
        if state.closed {
            SlotWait::Closed
        } else {
            SlotWait::TimedOut
        }
    }

    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.cv.notify_all();
    }

    pub fn superseded(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .superseded
    }
}

#[cfg(test)]
pub(crate) fn fake_png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn validate_png_rejects_empty_and_foreign_data() {
        assert!(validate_png(&[]).expect_err("empty").contains("empty"));
        assert!(validate_png(b"not a png at all")
            .expect_err("non-png")
            .contains("PNG"));
        assert!(validate_png(&fake_png(1, 1)).is_ok());
    }

    #[test]
    fn reads_dimensions_from_ihdr() {
        let frame = Frame::new(fake_png(1080, 2400), 1);
        assert_eq!(frame.dimensions(), Some((1080, 2400)));
        assert_eq!(png_dimensions(&fake_png(1080, 2400)[..20]), None);
    }

    #[test]
    fn publish_replaces_undisplayed_frame() {
        let slot = FrameSlot::new();
        assert!(!slot.publish(Frame::new(fake_png(1, 1), 1)));
        assert!(slot.publish(Frame::new(fake_png(1, 1), 2)));
        assert_eq!(slot.superseded(), 1);

        let latest = slot.take().expect("frame");
        assert_eq!(latest.sequence, 2);
        assert!(slot.take().is_none());
    }

    #[test]
    fn wait_timeout_wakes_on_publish() {
        let slot = Arc::new(FrameSlot::new());
        let publisher = Arc::clone(&slot);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            publisher.publish(Frame::new(fake_png(2, 2), 7));
        });

        match slot.wait_timeout(Duration::from_secs(5)) {
            SlotWait::Frame(frame) => assert_eq!(frame.sequence, 7),
            other => panic!("expected frame, got {other:?}"),
        }
        handle.join().expect("join");
    }

    #[test]
    fn close_drains_pending_frame_first() {
        let slot = FrameSlot::new();
        slot.publish(Frame::new(fake_png(1, 1), 1));
        slot.close();
        assert!(matches!(
            slot.wait_timeout(Duration::from_millis(10)),
            SlotWait::Frame(_)
        ));
        assert!(matches!(
            slot.wait_timeout(Duration::from_millis(10)),
            SlotWait::Closed
        ));
    }

    #[test]
    fn wait_times_out_without_frames() {
        let slot = FrameSlot::new();
        assert!(matches!(
            slot.wait_timeout(Duration::from_millis(10)),
            SlotWait::TimedOut
        ));
    }
}
