//! Full pipeline from raw serial bytes to reports

use async_trait::async_trait;
use meter_application::test_utils::SampleReadout;
use meter_application::{Field, Reading};
use meter_client::{ErrorBreaker, LoopState, ReadoutLoop, ReportSink, StopReason};
use meter_core::MeterResult;
use meter_security::{BlockCipherKey, FrameCounter, FrameSealer, SystemTitle};
use meter_session::FrameLayout;
use meter_transport::StreamAccessor;
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const KEY: &str = "5AD84121D9D20B364B7A11F3C1B5827F";
const TITLE: [u8; 8] = [0x4B, 0x46, 0x4D, 0x67, 0x20, 0x00, 0x31, 0x42];

/// Serial line replaying scripted chunks, one per read; requests shutdown
/// once the script runs dry
#[derive(Debug)]
struct ReplayLine {
    chunks: VecDeque<Vec<u8>>,
    shutdown: CancellationToken,
    reads: usize,
    closed: bool,
}

impl ReplayLine {
    fn new(chunks: Vec<Vec<u8>>, shutdown: &CancellationToken) -> Self {
        Self {
            chunks: chunks.into(),
            shutdown: shutdown.clone(),
            reads: 0,
            closed: false,
        }
    }
}

#[async_trait]
impl StreamAccessor for ReplayLine {
    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(3))
    }

    async fn set_timeout(&mut self, _timeout: Option<Duration>) -> MeterResult<()> {
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> MeterResult<usize> {
        self.read_up_to(buf).await
    }

    async fn read_up_to(&mut self, buf: &mut [u8]) -> MeterResult<usize> {
        self.reads += 1;
        let Some(chunk) = self.chunks.pop_front() else {
            self.shutdown.cancel();
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> MeterResult<()> {
        self.closed = true;
        Ok(())
    }
}

fn key() -> BlockCipherKey {
    BlockCipherKey::from_hex(KEY).unwrap()
}

fn seal(readout: &SampleReadout, counter: u32) -> Vec<u8> {
    FrameSealer::new(&key(), SystemTitle::new(TITLE))
        .seal_to_length(&readout.to_pdu(), FrameCounter::new(counter), 376)
        .unwrap()
}

fn tampered(counter: u32) -> Vec<u8> {
    let mut frame = seal(&SampleReadout::default(), counter);
    frame[100] ^= 0x04;
    frame
}

#[tokio::test]
async fn test_valid_frames_are_reported() {
    let shutdown = CancellationToken::new();
    let first = seal(&SampleReadout::default(), 1);
    let second = seal(&SampleReadout::default().with_value(Field::RealPowerOut, 1_200), 2);
    let line = ReplayLine::new(vec![first[..120].to_vec(), first[120..].to_vec(), second], &shutdown);

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key());
    let mut sink = ReportSink::new(Vec::<u8>::new());
    let reason = readout.run(&shutdown, &mut sink).await;

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(readout.state(), LoopState::Stopped);
    assert!(readout.transport().closed);

    let report = String::from_utf8(sink.into_inner()).unwrap();
    let blocks: Vec<&str> = report.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].contains("VoltageL1:         231.9 V"));
    assert!(blocks[0].contains("RealPower:         830 W"));
    assert!(blocks[1].contains("RealPower:         -370 W"));
    assert!(blocks[1].contains("ReactiveEnergyOut: 456.789 kvar"));
}

#[tokio::test]
async fn test_boundary_values_pass_the_pipeline() {
    let shutdown = CancellationToken::new();
    let extremes = Field::ALL
        .into_iter()
        .fold(SampleReadout::default(), |readout, field| {
            let raw = match field {
                Field::RealPowerIn | Field::RealPowerOut => 0,
                Field::RealEnergyIn
                | Field::RealEnergyOut
                | Field::ReactiveEnergyIn
                | Field::ReactiveEnergyOut => u32::MAX,
                _ => u32::from(u16::MAX),
            };
            readout.with_value(field, raw)
        });
    let line = ReplayLine::new(vec![seal(&extremes, 7)], &shutdown);

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key());
    let mut readings: Vec<Reading> = Vec::new();
    let reason = readout.run(&shutdown, &mut readings).await;

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(readout.breaker().count(), 0);
    assert_eq!(readings.len(), 1);

    let reading = &readings[0];
    for field in Field::ALL {
        let value = reading.value(field);
        assert!(value >= 0.0, "{} below range: {}", field, value);
        assert!(value <= f64::from(u32::MAX) / f64::from(field.divisor()), "{} above range", field);
    }
    assert_eq!(reading.value(Field::VoltageL3), 6553.5);
    assert_eq!(reading.value(Field::CurrentL2), 655.35);
    assert_eq!(reading.value(Field::ReactiveEnergyOut), 4_294_967.295);
    assert_eq!(reading.net_real_power(), 0);

    let report = reading.to_string();
    assert!(report.contains("RealPower:         0 W"));
    assert!(report.contains("RealEnergyIn:      4294967.295 kWh"));
}

#[tokio::test]
async fn test_noise_and_faults_are_survived() {
    let shutdown = CancellationToken::new();
    let mut noise = seal(&SampleReadout::default(), 1);
    noise[0] = 0x00;
    let line = ReplayLine::new(
        vec![
            noise,
            tampered(2),
            seal(&SampleReadout::default().without(Field::VoltageL3), 3),
            seal(&SampleReadout::default(), 4),
        ],
        &shutdown,
    );

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key());
    let mut readings: Vec<Reading> = Vec::new();
    let reason = readout.run(&shutdown, &mut readings).await;

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value(Field::CurrentL1), 1.25);
    // sync loss is not counted, authentication and incomplete readouts are
    assert_eq!(readout.breaker().count(), 2);
}

#[tokio::test]
async fn test_repeated_faults_trip_the_breaker() {
    let shutdown = CancellationToken::new();
    let frames = (1..=8).map(tampered).collect();
    let line = ReplayLine::new(frames, &shutdown);

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key());
    let mut readings: Vec<Reading> = Vec::new();
    let reason = readout.run(&shutdown, &mut readings).await;

    assert_eq!(reason, StopReason::BreakerTripped);
    assert_eq!(readout.state(), LoopState::Stopped);
    assert!(readings.is_empty());
    assert!(!shutdown.is_cancelled());
    assert_eq!(readout.transport().reads, 6);
    assert!(readout.transport().closed);
}

#[tokio::test]
async fn test_breaker_limits_are_configurable() {
    let shutdown = CancellationToken::new();
    let line = ReplayLine::new(vec![tampered(1), tampered(2)], &shutdown);

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key())
        .with_breaker(ErrorBreaker::new(Duration::from_secs(300), 1));
    let reason = readout.run(&shutdown, &mut Vec::<Reading>::new()).await;

    assert_eq!(reason, StopReason::BreakerTripped);
    assert_eq!(readout.transport().reads, 2);
}

#[tokio::test]
async fn test_cancelled_before_start_reads_nothing() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let line = ReplayLine::new(vec![seal(&SampleReadout::default(), 1)], &shutdown);

    let mut readout = ReadoutLoop::new(line, FrameLayout::default(), &key());
    let reason = readout.run(&shutdown, &mut Vec::<Reading>::new()).await;

    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(readout.transport().reads, 0);
    assert!(readout.transport().closed);
}
