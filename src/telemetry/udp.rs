use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::config::TelemetryConfig;
use crate::error::{BridgeError, Result};

use super::{AttitudeFrame, PositionFrame, Sentence, TelemetryFrame, TelemetrySource, parse_sentence};

/// How long a blocked `recv_from` waits before rechecking the stop flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// Telemetry sentences are short text lines; this is generous.
const RECV_BUFFER_SIZE: usize = 1024;

/// Listens for simulator broadcasts on UDP and hands the freshest frame
/// to the polling loop.
///
/// A background thread parses datagrams into a bounded channel; the
/// consumer drains it once per cycle. The last known position is cached
/// so a cycle between broadcasts still sees data, but a position older
/// than the freshness window means the simulator is gone and
/// [`latest_frame`](TelemetrySource::latest_frame) reports `None`.
pub struct UdpTelemetrySource {
    rx: Receiver<Sentence>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
    freshness: Duration,
    last_position: Option<(PositionFrame, Instant)>,
    last_attitude: Option<AttitudeFrame>,
}

impl UdpTelemetrySource {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let socket = UdpSocket::bind((config.bind_address.as_str(), config.port)).map_err(|e| {
            BridgeError::TelemetrySocket(format!(
                "bind {}:{}: {}",
                config.bind_address, config.port, e
            ))
        })?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| BridgeError::TelemetrySocket(format!("{}", e)))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| BridgeError::TelemetrySocket(format!("{}", e)))?;

        log::info!("Listening for telemetry on {}", local_addr);

        let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; RECV_BUFFER_SIZE];
            while !thread_stop.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((len, _)) => {
                        if let Some(sentence) = parse_sentence(&buf[..len]) {
                            if tx.try_send(sentence).is_err() {
                                log::trace!("Telemetry channel full, dropping sentence");
                            }
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                        ) => {}
                    Err(e) => {
                        log::warn!("Telemetry receive error: {}", e);
                    }
                }
            }
        });

        Ok(Self {
            rx,
            stop,
            handle: Some(handle),
            local_addr,
            freshness: config.freshness,
            last_position: None,
            last_attitude: None,
        })
    }

    /// Address the listener actually bound; useful when the configured
    /// port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl TelemetrySource for UdpTelemetrySource {
    fn latest_frame(&mut self) -> Option<TelemetryFrame> {
        let now = Instant::now();
        for sentence in self.rx.try_iter() {
            match sentence {
                Sentence::Position(frame) => self.last_position = Some((frame, now)),
                Sentence::Attitude(frame) => self.last_attitude = Some(frame),
            }
        }

        match self.last_position {
            Some((position, at)) if now.duration_since(at) <= self.freshness => {
                Some(TelemetryFrame {
                    position: Some(position),
                    attitude: self.last_attitude,
                })
            }
            _ => None,
        }
    }
}

impl Drop for UdpTelemetrySource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
