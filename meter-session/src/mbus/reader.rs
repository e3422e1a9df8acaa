//! Frame synchronization over the raw byte stream

use crate::error::MeterResult;
use crate::mbus::frame::{FrameLayout, RawFrame};
use bytes::BytesMut;
use log::debug;
use meter_transport::StreamAccessor;

/// Pulls frame pairs out of a transport
///
/// The reader keeps no state between calls besides the transport itself,
/// so a rejected frame never poisons the next one.
#[derive(Debug)]
pub struct FrameReader<S> {
    transport: S,
    layout: FrameLayout,
}

impl<S: StreamAccessor> FrameReader<S> {
    /// Create a reader over an already open transport
    pub fn new(transport: S, layout: FrameLayout) -> Self {
        Self { transport, layout }
    }

    /// Frame layout this reader validates against
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &S {
        &self.transport
    }

    /// Read one frame pair
    ///
    /// # Returns
    ///
    /// * `Ok(None)` if nothing arrived within the read timeout
    /// * `Ok(Some(frame))` for a complete, marker-checked frame
    ///
    /// # Errors
    ///
    /// * `MeterError::Sync` if the bytes do not form a frame pair
    /// * `MeterError::Io` if the transport fails
    pub async fn read_frame(&mut self) -> MeterResult<Option<RawFrame>> {
        let mut data = BytesMut::zeroed(self.layout.length);
        let n = self.transport.read_up_to(&mut data).await?;
        if n == 0 {
            return Ok(None);
        }
        data.truncate(n);

        if self.layout.looks_like_partial(&data) {
            let missing = self.layout.length - n;
            debug!("Short read of {} bytes, trying to complete {} missing", n, missing);

            let mut rest = BytesMut::zeroed(missing);
            let got = self.transport.read_up_to(&mut rest).await?;
            if got == missing {
                data.extend_from_slice(&rest);
            } else {
                debug!("Completion read returned {} of {} bytes", got, missing);
            }
        }

        RawFrame::new(&self.layout, data.freeze()).map(Some)
    }

    /// Release the transport
    pub async fn close(&mut self) -> MeterResult<()> {
        self.transport.close().await
    }
}
