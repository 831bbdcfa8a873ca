//! The synchronization core: shared model state, the per-cycle bridge
//! logic, and the background loop that drives it.
//!
//! One mutex guards everything the loop and a foreground display both
//! touch. Contention is negligible at the 750 ms cadence, so readers
//! simply tolerate a slightly stale view.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::{BridgeConfig, SimConfig, TimingConfig};
use crate::error::Result;
use crate::simapi::{Command, SimApiFiles, build_snapshot};
use crate::state::{AircraftStateManager, RadioManager, TransponderManager, TransponderMode};
use crate::telemetry::TelemetrySource;

/// How many applied commands the change log remembers.
const CHANGE_LOG_CAPACITY: usize = 32;

/// Rolling log of commands the service has issued, oldest first.
///
/// The foreground display shows these as "pending changes" the way a
/// pilot would read back instructions; old entries fall off the front.
pub struct ChangeLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ChangeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, description: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(description);
    }

    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(CHANGE_LOG_CAPACITY)
    }
}

/// Cancelable deadline for the transponder IDENT auto-clear.
///
/// IDENT lights for a fixed dwell and then clears itself; any mode
/// change or manual toggle-off cancels the pending deadline so a stale
/// expiry can never resurrect or re-clear the flag.
pub struct IdentTimer {
    deadline: Option<Instant>,
    dwell: Duration,
}

impl IdentTimer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            deadline: None,
            dwell,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.dwell);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline has passed.
    pub fn fired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Everything behind the shared-state mutex: the three managers, the
/// change log, and the IDENT deadline.
///
/// A foreground display issues the same mutation calls the service
/// command path does, so both go through identical validation.
pub struct Managers {
    pub aircraft: AircraftStateManager,
    pub radio: RadioManager,
    pub transponder: TransponderManager,
    pub changes: ChangeLog,
    ident_timer: IdentTimer,
}

impl Managers {
    pub fn new(ident_dwell: Duration) -> Self {
        Self {
            aircraft: AircraftStateManager::new(),
            radio: RadioManager::default(),
            transponder: TransponderManager::default(),
            changes: ChangeLog::default(),
            ident_timer: IdentTimer::new(ident_dwell),
        }
    }

    /// Toggle IDENT, arming the auto-clear deadline when it turns on and
    /// canceling it when it turns off.
    pub fn toggle_ident(&mut self) -> bool {
        let ident = self.transponder.toggle_ident();
        if ident {
            self.ident_timer.arm(Instant::now());
        } else {
            self.ident_timer.cancel();
        }
        ident
    }

    /// Set the transponder mode. The mode change clears IDENT, so the
    /// pending auto-clear deadline is canceled with it.
    pub fn set_transponder_mode(&mut self, mode: TransponderMode) {
        self.transponder.set_mode(mode);
        self.ident_timer.cancel();
    }

    /// Clear IDENT if its dwell deadline has passed. Returns whether the
    /// flag changed.
    pub fn expire_ident(&mut self, now: Instant) -> bool {
        if self.ident_timer.fired(now) && self.transponder.ident() {
            self.transponder.clear_ident();
            return true;
        }
        false
    }

    /// Apply one service command to the owning manager and record it.
    pub fn apply_command(&mut self, command: &Command) {
        match *command {
            Command::SetActiveFrequency { radio, mhz } => {
                self.radio.set_active_frequency(radio, mhz);
            }
            Command::SetStandbyFrequency { radio, mhz } => {
                self.radio.set_standby_frequency(radio, mhz);
            }
            Command::SwapFrequencies { radio } => {
                self.radio.swap_frequencies(radio);
            }
            Command::SetTransponderCode { code } => {
                self.transponder.set_code(code);
            }
            Command::SetVolume { .. } => {
                // Acknowledged only; the bridge has no audio path.
            }
        }

        log::info!("{}", command);
        self.changes.record(command.to_string());
    }
}

/// Lock the shared managers, recovering the data from a poisoned mutex.
pub fn lock_state(shared: &Mutex<Managers>) -> MutexGuard<'_, Managers> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// What one polling cycle observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOutcome {
    /// Whether the telemetry source had fresh simulator data.
    pub telemetry_fresh: bool,
    /// The command applied this cycle, if the service sent one.
    pub command: Option<Command>,
}

/// One simulator-to-service bridge: a telemetry source on one side, the
/// SimAPI file pair on the other, and the shared model in between.
pub struct Bridge {
    shared: Arc<Mutex<Managers>>,
    source: Box<dyn TelemetrySource>,
    files: SimApiFiles,
    sim: SimConfig,
}

impl Bridge {
    pub fn new(config: &BridgeConfig, source: Box<dyn TelemetrySource>) -> Result<Self> {
        let files = SimApiFiles::new(&config.files)?;
        let shared = Arc::new(Mutex::new(Managers::new(config.timing.ident_dwell)));
        Ok(Self {
            shared,
            source,
            files,
            sim: config.sim.clone(),
        })
    }

    /// Handle to the shared model for a foreground display.
    pub fn shared(&self) -> Arc<Mutex<Managers>> {
        Arc::clone(&self.shared)
    }

    pub fn files(&self) -> &SimApiFiles {
        &self.files
    }

    /// Run one synchronization cycle:
    ///
    /// 1. poll telemetry (absence is not an error),
    /// 2. fold a position sample into the aircraft state if one arrived,
    /// 3. build and write the snapshot unconditionally,
    /// 4. drain at most one command from the service and apply it.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let frame = self.source.latest_frame();
        let telemetry_fresh = frame.is_some();

        let envelope = {
            let mut managers = lock_state(&self.shared);

            if let Some(frame) = &frame {
                if let Some(position) = frame.position {
                    managers
                        .aircraft
                        .update_from_telemetry(&position, frame.attitude.as_ref());
                }
            }

            managers.expire_ident(Instant::now());

            build_snapshot(
                &self.sim,
                managers.aircraft.state(),
                managers.radio.export(),
                managers.transponder.export(),
            )
        };
        // File I/O happens outside the lock; the snapshot is already built.
        self.files.write_snapshot(&envelope)?;

        let command = self.files.drain_command()?;
        if let Some(command) = &command {
            lock_state(&self.shared).apply_command(command);
        }

        Ok(CycleOutcome {
            telemetry_fresh,
            command,
        })
    }
}

/// Background thread that drives a [`Bridge`] on the polling cadence.
///
/// A failed cycle is logged and followed by a longer backoff sleep; the
/// loop itself never terminates on a bad iteration. Stopping is
/// cooperative and observed at the next iteration boundary.
pub struct SyncLoop {
    stop: Arc<AtomicBool>,
    telemetry_live: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncLoop {
    /// Take ownership of the bridge and start cycling.
    pub fn spawn(mut bridge: Bridge, timing: TimingConfig) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let telemetry_live = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_live = Arc::clone(&telemetry_live);

        let handle = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::Relaxed) {
                let sleep = match bridge.run_cycle() {
                    Ok(outcome) => {
                        thread_live.store(outcome.telemetry_fresh, Ordering::Relaxed);
                        timing.poll_interval
                    }
                    Err(e) => {
                        log::error!("Sync cycle failed: {}", e);
                        timing.error_backoff
                    }
                };
                std::thread::sleep(sleep);
            }
        });

        Self {
            stop,
            telemetry_live,
            handle: Some(handle),
        }
    }

    /// Whether the most recent cycle saw fresh telemetry.
    pub fn telemetry_live(&self) -> bool {
        self.telemetry_live.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop and wait for the current cycle to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyncLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ComRadio;

    #[test]
    fn test_change_log_evicts_oldest() {
        let mut log = ChangeLog::new(3);
        assert!(log.is_empty());

        for i in 0..5 {
            log.record(format!("change {i}"));
        }

        assert_eq!(log.len(), 3);
        let entries: Vec<&str> = log.recent().collect();
        assert_eq!(entries, ["change 2", "change 3", "change 4"]);
        assert_eq!(log.latest(), Some("change 4"));
    }

    #[test]
    fn test_ident_timer_fires_once() {
        let mut timer = IdentTimer::new(Duration::from_millis(10));
        let t0 = Instant::now();

        assert!(!timer.fired(t0), "unarmed timer never fires");

        timer.arm(t0);
        assert!(timer.is_armed());
        assert!(!timer.fired(t0 + Duration::from_millis(5)));
        assert!(timer.fired(t0 + Duration::from_millis(10)));
        assert!(
            !timer.fired(t0 + Duration::from_millis(20)),
            "a fired deadline is spent"
        );
    }

    #[test]
    fn test_ident_timer_cancel() {
        let mut timer = IdentTimer::new(Duration::from_millis(10));
        let t0 = Instant::now();

        timer.arm(t0);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fired(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_ident_expires_after_dwell() {
        let mut managers = Managers::new(Duration::from_millis(10));

        assert!(managers.toggle_ident());
        assert!(managers.transponder.ident());

        assert!(!managers.expire_ident(Instant::now()));
        assert!(managers.transponder.ident(), "dwell has not elapsed yet");

        let later = Instant::now() + Duration::from_millis(20);
        assert!(managers.expire_ident(later));
        assert!(!managers.transponder.ident());
    }

    #[test]
    fn test_mode_change_cancels_ident_expiry() {
        let mut managers = Managers::new(Duration::from_millis(10));

        managers.toggle_ident();
        managers.set_transponder_mode(TransponderMode::Alt);
        assert!(!managers.transponder.ident(), "mode change clears IDENT");

        let later = Instant::now() + Duration::from_secs(1);
        assert!(
            !managers.expire_ident(later),
            "canceled deadline must not fire"
        );
    }

    #[test]
    fn test_toggle_off_cancels_deadline() {
        let mut managers = Managers::new(Duration::from_millis(10));

        assert!(managers.toggle_ident());
        assert!(!managers.toggle_ident());

        let later = Instant::now() + Duration::from_secs(1);
        assert!(!managers.expire_ident(later));
    }

    #[test]
    fn test_apply_command_routes_to_managers() {
        let mut managers = Managers::new(Duration::from_secs(18));

        managers.apply_command(&Command::SetActiveFrequency {
            radio: ComRadio::Com1,
            mhz: 127.95,
        });
        assert_eq!(managers.radio.active_frequency(ComRadio::Com1), 127.95);

        managers.apply_command(&Command::SetTransponderCode { code: 7700 });
        assert_eq!(managers.transponder.code(), 7700);

        managers.apply_command(&Command::SwapFrequencies {
            radio: ComRadio::Com1,
        });
        assert_eq!(managers.radio.standby_frequency(ComRadio::Com1), 127.95);

        let entries: Vec<&str> = managers.changes.recent().collect();
        assert_eq!(
            entries,
            [
                "Set COM1 active frequency to 127.950 MHz",
                "Set transponder code to 7700",
                "Swap COM1 active and standby frequencies"
            ]
        );
    }

    #[test]
    fn test_volume_commands_only_recorded() {
        let mut managers = Managers::new(Duration::from_secs(18));
        let radio_before = managers.radio.export();
        let transponder_before = managers.transponder.export();

        managers.apply_command(&Command::SetVolume {
            target: crate::simapi::VolumeTarget::Com2,
            percent: 40,
        });

        assert_eq!(managers.radio.export(), radio_before);
        assert_eq!(managers.transponder.export(), transponder_before);
        assert_eq!(managers.changes.latest(), Some("Set COM2 volume to 40%"));
    }
}
