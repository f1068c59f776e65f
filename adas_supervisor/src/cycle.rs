//! Tick pacing and RT process setup.
//!
//! The supervisor is paced by the blocking CAN read, so the ratekeeper only
//! accounts for lag rather than sleeping; `keep_time` exists for rigs that
//! run without a bus. RT setup follows the standard sequence: lock pages,
//! prefault the stack, pin the core, raise the scheduler class.
//!
//! Without the `rt` feature all RT system calls are no-ops (simulation and
//! test builds).

use std::time::{Duration, Instant};

use tracing::warn;

/// Lag threshold at which the ratekeeper reports the loop as lagging [s].
const LAG_REPORT_THRESHOLD: f64 = 0.1;

/// Fixed-rate bookkeeping for the control loop.
#[derive(Debug)]
pub struct Ratekeeper {
    interval: f64,
    next_frame_time: Instant,
    frame: u64,
    remaining: f64,
}

impl Ratekeeper {
    pub fn new(rate_hz: f64) -> Self {
        let interval = 1.0 / rate_hz;
        Self {
            interval,
            next_frame_time: Instant::now() + Duration::from_secs_f64(interval),
            frame: 0,
            remaining: 0.0,
        }
    }

    /// Ticks completed.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Slack left in the last interval [s]; negative when overrunning.
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Account for the tick that just finished. Returns true when the loop
    /// lags by more than the report threshold.
    pub fn monitor_time(&mut self) -> bool {
        let now = Instant::now();
        let remaining = if now >= self.next_frame_time {
            -(now - self.next_frame_time).as_secs_f64()
        } else {
            (self.next_frame_time - now).as_secs_f64()
        };
        self.next_frame_time += Duration::from_secs_f64(self.interval);
        self.frame += 1;
        self.remaining = remaining;

        let lagging = remaining < -LAG_REPORT_THRESHOLD;
        if lagging {
            warn!(
                lag_ms = -remaining * 1000.0,
                frame = self.frame,
                "control loop lagging"
            );
        }
        lagging
    }

    /// `monitor_time` plus a sleep over the positive slack (busless rigs).
    pub fn keep_time(&mut self) -> bool {
        let lagged = self.monitor_time();
        if self.remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(self.remaining));
        }
        lagged
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// RT setup failure.
#[derive(Debug, thiserror::Error)]
#[error("RT setup: {0}")]
pub struct RtSetupError(String);

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RtSetupError> {
    use nix::sys::mman::{MlockAllFlags, mlockall};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| RtSetupError(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RtSetupError> {
    Ok(())
}

/// Prefault stack pages so the loop never page-faults.
fn prefault_stack() {
    let mut buf = [0u8; 512 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to one core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RtSetupError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RtSetupError(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RtSetupError(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RtSetupError> {
    Ok(())
}

/// Raise to SCHED_FIFO at the given priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RtSetupError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtSetupError(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RtSetupError> {
    Ok(())
}

/// Full RT setup sequence; call once before entering the loop.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RtSetupError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}
