//! The readout loop: frame → plaintext → registers → reading → sink

use crate::reliability::{ErrorBreaker, LoopState, StopReason};
use crate::sink::ReadingSink;
use chrono::Local;
use log::{debug, error, info, warn};
use meter_application::{Reading, ReadingAssembler, StructureDecoder, capture_time};
use meter_asn1::{AxdrPduDecoder, PduDecoder};
use meter_core::MeterResult;
use meter_security::{BlockCipherKey, CipherUnpacker};
use meter_session::{FrameLayout, FrameReader};
use meter_transport::StreamAccessor;
use tokio_util::sync::CancellationToken;

/// Drives one frame at a time through the pipeline until shutdown or
/// until the error breaker trips
#[derive(Debug)]
pub struct ReadoutLoop<S, D = AxdrPduDecoder> {
    reader: FrameReader<S>,
    unpacker: CipherUnpacker,
    decoder: StructureDecoder<D>,
    assembler: ReadingAssembler,
    breaker: ErrorBreaker,
    state: LoopState,
}

impl<S: StreamAccessor> ReadoutLoop<S, AxdrPduDecoder> {
    /// Create a loop over an open transport
    pub fn new(transport: S, layout: FrameLayout, key: &BlockCipherKey) -> Self {
        Self::with_decoder(transport, layout, key, AxdrPduDecoder)
    }
}

impl<S: StreamAccessor, D: PduDecoder> ReadoutLoop<S, D> {
    pub fn with_decoder(transport: S, layout: FrameLayout, key: &BlockCipherKey, decoder: D) -> Self {
        Self {
            reader: FrameReader::new(transport, layout),
            unpacker: CipherUnpacker::new(key),
            decoder: StructureDecoder::with_decoder(decoder),
            assembler: ReadingAssembler::new(),
            breaker: ErrorBreaker::default(),
            state: LoopState::Running,
        }
    }

    /// Replace the error breaker, e.g. to change its limits
    pub fn with_breaker(mut self, breaker: ErrorBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn breaker(&self) -> &ErrorBreaker {
        &self.breaker
    }

    pub fn transport(&self) -> &S {
        self.reader.transport()
    }

    /// Process one frame
    ///
    /// # Returns
    ///
    /// `Ok(None)` if no data arrived within the read timeout
    pub async fn run_cycle(&mut self) -> MeterResult<Option<Reading>> {
        let Some(frame) = self.reader.read_frame().await? else {
            debug!("No data received");
            return Ok(None);
        };

        let pdu = self.unpacker.open(&frame)?;
        let entries = self.decoder.decode(pdu.as_bytes())?;
        let reading = self.assembler.assemble(&entries, capture_time(Local::now()))?;
        Ok(Some(reading))
    }

    /// Run until `shutdown` is cancelled or the breaker trips
    ///
    /// Cancellation is checked between cycles, so a cycle in progress always
    /// completes. The transport is closed before returning.
    pub async fn run(&mut self, shutdown: &CancellationToken, sink: &mut impl ReadingSink) -> StopReason {
        info!("Readout started");

        let reason = loop {
            if shutdown.is_cancelled() {
                self.state = LoopState::ShuttingDown;
                info!("Shutdown requested");
                break StopReason::Shutdown;
            }

            let result = match self.run_cycle().await {
                Ok(Some(reading)) => sink.emit(&reading),
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {}
                Err(e) if !e.is_counted() => warn!("{}", e),
                Err(e) => {
                    error!("{}", e);
                    if self.breaker.record() {
                        error!(
                            "More than {} errors within {} s, giving up",
                            self.breaker.count() - 1,
                            self.breaker.window().as_secs()
                        );
                        break StopReason::BreakerTripped;
                    }
                }
            }
        };

        if let Err(e) = self.reader.close().await {
            warn!("Failed to close transport: {}", e);
        }
        self.state = LoopState::Stopped;
        info!("Readout stopped");
        reason
    }
}
