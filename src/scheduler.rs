//! Fixed-period driver for [`ReceiverSession::tick`].
//!
//! One tick every `period` (100 ms by default), on the calling thread. User
//! controls arrive on a channel and are applied between ticks; the loop ends
//! on [`Control::Quit`] or when every control sender is dropped.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, select, tick};

use crate::display::MeterDisplay;
use crate::receiver::ReceiverSession;

/// A user action on the receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Tune(f64),
    StepUp,
    StepDown,
    StartScan,
    StopScan,
    /// Start (or retry) audio
    Start,
    /// Stop audio, keep ticking
    Stop,
    Quit,
}

impl Control {
    /// Parse one console command line
    ///
    /// `+`/`-` step, `s` scans, `x` stops the scan, `on`/`off` start and
    /// stop audio, `q` quits and a bare number tunes to that many kHz.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "+" | "u" => Some(Self::StepUp),
            "-" | "d" => Some(Self::StepDown),
            "s" | "scan" => Some(Self::StartScan),
            "x" => Some(Self::StopScan),
            "on" => Some(Self::Start),
            "off" => Some(Self::Stop),
            "q" | "quit" => Some(Self::Quit),
            other => other
                .trim_end_matches("khz")
                .trim()
                .parse()
                .ok()
                .map(Self::Tune),
        }
    }

    /// Apply to `session`; returns false for [`Control::Quit`]
    pub fn apply(self, session: &mut ReceiverSession) -> bool {
        match self {
            Self::Tune(khz) => session.dial_mut().set(khz),
            Self::StepUp => session.dial_mut().step_up(),
            Self::StepDown => session.dial_mut().step_down(),
            Self::StartScan => session.start_scan(),
            Self::StopScan => session.stop_scan(),
            Self::Start => {
                session.start();
            }
            Self::Stop => session.stop(),
            Self::Quit => return false,
        }
        true
    }
}

/// Drives a session until told to stop
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run ticks until a quit control arrives or `controls` disconnects
    ///
    /// Returns the number of ticks performed. Elapsed time passed to each
    /// tick is measured, not assumed, so a late tick fades a little further.
    pub fn run(
        &self,
        session: &mut ReceiverSession,
        display: &mut dyn MeterDisplay,
        controls: &Receiver<Control>,
    ) -> u64 {
        let ticker = tick(self.period);
        let mut last = Instant::now();
        let mut count = 0u64;

        log::info!("Scheduler running every {:?}", self.period);

        loop {
            select! {
                recv(ticker) -> msg => {
                    let Ok(now) = msg else { break };
                    let elapsed = now.saturating_duration_since(last);
                    last = now;
                    session.tick(elapsed, display);
                    count += 1;
                }
                recv(controls) -> msg => {
                    let Ok(control) = msg else { break };
                    log::debug!("Control: {:?}", control);
                    if !control.apply(session) {
                        break;
                    }
                }
            }
        }

        log::info!("Scheduler stopped after {} ticks", count);
        count
    }
}

/// Deterministic stepping for offline rendering: every tick is exactly one
/// period apart
pub struct ManualStepper {
    period: Duration,
    elapsed_total: Duration,
    ticks: u64,
}

impl ManualStepper {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed_total: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn step(
        &mut self,
        session: &mut ReceiverSession,
        display: &mut dyn MeterDisplay,
    ) -> crate::display::MeterReading {
        self.ticks += 1;
        self.elapsed_total += self.period;
        session.tick(self.period, display)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since the first step
    pub fn elapsed(&self) -> Duration {
        self.elapsed_total
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
