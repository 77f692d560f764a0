//! Mock CAN interface for testing.
//!
//! Supports scripted receive queues (frames or faults), optional acceptance
//! filters, and frame recording. All tests use this instead of real CAN
//! hardware so the suite runs in CI on any platform.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{CanError, CanResult};
use crate::interface::CanInterface;
use crate::types::{CanFilter, CanFrame, passes_filters};

/// Mock CAN interface with scripted receive results and frame recording.
pub struct MockCanInterface {
    /// Results returned by `recv_frame` (FIFO order).
    incoming: Mutex<VecDeque<CanResult<CanFrame>>>,
    /// All frames passed to `send_frame` (for test assertions).
    sent_frames: Mutex<Vec<CanFrame>>,
    /// Acceptance filters applied on receive (empty accepts everything).
    filters: Vec<CanFilter>,
}

impl MockCanInterface {
    /// Create a new mock with nothing queued.
    pub fn new() -> Self {
        Self::with_frames(Vec::new())
    }

    /// Create a mock pre-loaded with frames.
    pub fn with_frames(frames: Vec<CanFrame>) -> Self {
        Self {
            incoming: Mutex::new(frames.into_iter().map(Ok).collect()),
            sent_frames: Mutex::new(Vec::new()),
            filters: Vec::new(),
        }
    }

    /// Drop received frames that fail these filters, like a kernel filter would.
    pub fn filtered(mut self, filters: &[CanFilter]) -> Self {
        self.filters = filters.to_vec();
        self
    }

    /// Queue an additional frame.
    pub fn queue_frame(&self, frame: CanFrame) {
        self.incoming.lock().unwrap().push_back(Ok(frame));
    }

    /// Queue a receive error (e.g. a bus fault).
    pub fn queue_error(&self, error: CanError) {
        self.incoming.lock().unwrap().push_back(Err(error));
    }

    /// Number of queued receive results.
    pub fn pending(&self) -> usize {
        self.incoming.lock().unwrap().len()
    }

    /// Get copies of all frames that were sent.
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        self.sent_frames.lock().unwrap().clone()
    }

    fn next_incoming(&self) -> Option<CanResult<CanFrame>> {
        let mut incoming = self.incoming.lock().unwrap();
        while let Some(next) = incoming.pop_front() {
            match next {
                Ok(frame) if !passes_filters(&self.filters, frame.id) => continue,
                other => return Some(other),
            }
        }
        None
    }
}

impl Default for MockCanInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CanInterface for MockCanInterface {
    async fn send_frame(&self, frame: &CanFrame) -> CanResult<()> {
        self.sent_frames.lock().unwrap().push(frame.clone());
        Ok(())
    }

    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
        match self.next_incoming() {
            Some(result) => result,
            None => {
                // An idle bus waits out the timeout before reporting it.
                tokio::time::sleep(timeout).await;
                Err(CanError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ENGINE_SPEED_ID, J1939_FILTERS, VEHICLE_DISTANCE_ID};

    #[tokio::test]
    async fn records_sent_frames() {
        let mock = MockCanInterface::new();
        let frame = CanFrame::new(ENGINE_SPEED_ID, vec![0xFF, 0xFF, 0xFF, 0x06, 0x40]);
        mock.send_frame(&frame).await.unwrap();

        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, ENGINE_SPEED_ID);
    }

    #[tokio::test]
    async fn returns_queued_frames_in_order() {
        let first = CanFrame::new(ENGINE_SPEED_ID, vec![0, 0, 0, 0x1B, 0x58]);
        let second = CanFrame::new(VEHICLE_DISTANCE_ID, vec![0x64, 0, 0, 0]);
        let mock = MockCanInterface::with_frames(vec![first.clone(), second.clone()]);

        let timeout = Duration::from_millis(100);
        assert_eq!(mock.recv_frame(timeout).await.unwrap(), first);
        assert_eq!(mock.recv_frame(timeout).await.unwrap(), second);
        assert_eq!(mock.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_when_empty() {
        let mock = MockCanInterface::new();
        let result = mock.recv_frame(Duration::from_millis(1000)).await;
        assert!(matches!(result, Err(CanError::Timeout { timeout_ms: 1000 })));
    }

    #[tokio::test]
    async fn queued_error_is_returned() {
        let mock = MockCanInterface::new();
        mock.queue_error(CanError::SourceUnavailable("bus-off".into()));
        let result = mock.recv_frame(Duration::from_millis(100)).await;
        assert!(matches!(result, Err(CanError::SourceUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn filters_drop_untracked_frames() {
        let mock = MockCanInterface::with_frames(vec![
            CanFrame::new(0x18FE_EE00, vec![0; 8]),
            CanFrame::new(0x123, vec![0x11, 0x22]),
            CanFrame::new(0x0CF0_0417, vec![0, 0, 0, 0x06, 0x40]),
        ])
        .filtered(&J1939_FILTERS);

        let timeout = Duration::from_millis(100);
        let frame = mock.recv_frame(timeout).await.unwrap();
        assert_eq!(frame.id, 0x0CF0_0417);
        assert!(matches!(
            mock.recv_frame(timeout).await,
            Err(CanError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn queue_after_construction() {
        let mock = MockCanInterface::new();
        let frame = CanFrame::new(VEHICLE_DISTANCE_ID, vec![0x64, 0, 0, 0]);
        mock.queue_frame(frame.clone());

        let received = mock.recv_frame(Duration::from_millis(100)).await.unwrap();
        assert_eq!(received, frame);
    }
}
