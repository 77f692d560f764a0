//! CAN bus interface abstraction.
//!
//! `CanInterface` trait with `send_frame`/`recv_frame`. Two impls:
//! - `SocketCanInterface`: Linux-only, wraps `socketcan::CanSocket`
//! - `MockCanInterface`: all platforms, scripted frames (in `mock.rs`)
//!
//! Receives are bounded: a source returns `CanError::Timeout` when nothing
//! arrives in time and `CanError::SourceUnavailable` on bus faults.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CanResult;
use crate::types::CanFrame;

/// Trait for CAN bus frame sources and sinks.
#[async_trait]
pub trait CanInterface: Send + Sync {
    /// Send a CAN frame.
    async fn send_frame(&self, frame: &CanFrame) -> CanResult<()>;

    /// Receive a CAN frame, blocking up to `timeout`.
    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame>;
}

// ── SocketCAN (Linux-only) ──────────────────────────────────────

#[cfg(target_os = "linux")]
pub use self::socket::SocketCanInterface;

#[cfg(target_os = "linux")]
mod socket {
    use std::io::ErrorKind;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use socketcan::{EmbeddedFrame, ExtendedId, Frame, Socket, SocketOptions};

    use super::CanInterface;
    use crate::error::{CanError, CanResult};
    use crate::types::{CanFilter, CanFrame};

    /// Shortest read timeout handed to the kernel; zero would block forever.
    const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

    /// SocketCAN interface for Linux hosts.
    pub struct SocketCanInterface {
        interface_name: String,
        socket: Arc<socketcan::CanSocket>,
    }

    impl SocketCanInterface {
        /// Open `interface_name` and install acceptance filters.
        pub fn open(interface_name: &str, filters: &[CanFilter]) -> CanResult<Self> {
            let socket = socketcan::CanSocket::open(interface_name)
                .map_err(|e| CanError::SourceUnavailable(format!("{interface_name}: {e}")))?;

            if !filters.is_empty() {
                let filters: Vec<socketcan::CanFilter> = filters
                    .iter()
                    .map(|f| socketcan::CanFilter::new(f.id, f.mask))
                    .collect();
                socket.set_filters(&filters).map_err(|e| {
                    CanError::SourceUnavailable(format!("{interface_name}: set filters: {e}"))
                })?;
            }

            tracing::info!(
                interface = interface_name,
                filters = filters.len(),
                "SocketCAN interface opened"
            );

            Ok(Self {
                interface_name: interface_name.to_string(),
                socket: Arc::new(socket),
            })
        }

        pub fn interface_name(&self) -> &str {
            &self.interface_name
        }
    }

    #[async_trait]
    impl CanInterface for SocketCanInterface {
        async fn send_frame(&self, frame: &CanFrame) -> CanResult<()> {
            let id = ExtendedId::new(frame.id)
                .ok_or_else(|| CanError::Encode(format!("invalid 29-bit ID 0x{:X}", frame.id)))?;
            let raw = socketcan::CanFrame::new(id, &frame.data).ok_or_else(|| {
                CanError::Encode(format!("payload of {} bytes exceeds 8", frame.data.len()))
            })?;

            let socket = Arc::clone(&self.socket);
            tokio::task::spawn_blocking(move || socket.write_frame(&raw))
                .await
                .map_err(|e| CanError::SourceUnavailable(format!("send task: {e}")))?
                .map_err(|e| CanError::SourceUnavailable(format!("{}: {e}", self.interface_name)))
        }

        async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
            let socket = Arc::clone(&self.socket);
            let wait = timeout.max(MIN_READ_TIMEOUT);

            let read = tokio::task::spawn_blocking(move || {
                socket.set_read_timeout(wait)?;
                socket.read_frame()
            })
            .await
            .map_err(|e| CanError::SourceUnavailable(format!("receive task: {e}")))?;

            match read {
                Ok(raw) => Ok(CanFrame::new(raw.raw_id(), raw.data().to_vec())),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    Err(CanError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }
                Err(e) => Err(CanError::SourceUnavailable(format!(
                    "{}: {e}",
                    self.interface_name
                ))),
            }
        }
    }
}
