//! Watchdog - progress ticker and hard timeout around one blocking call
//!
//! Scoped guard for the live-fetch fallback. While the guarded call runs, a
//! background ticker renders a rotating indicator to a dedicated stream and
//! counts down a timeout budget. When the budget runs out the watchdog
//! fires its termination hook, which defaults to signalling the whole
//! process group: a completion stuck past its deadline has no graceful
//! unwind, only the hard stop. The hook is injectable so tests can observe
//! the firing.
//!
//! State moves one way, Running -> Done. The done flag, the tick counter
//! and every write to the output stream share one mutex, so tick rendering
//! and the final erase never interleave.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Rotating indicator characters.
const SPIN_MARKS: [char; 4] = ['|', '/', '-', '\\'];

/// Lead sleep before the first tick.
const LEAD_SLEEP: Duration = Duration::from_millis(200);

/// Interval between ticks.
const TICK_SLEEP: Duration = Duration::from_millis(100);

/// Default budget for a guarded call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Fired when the budget is exhausted. The default hook terminates the
/// process group and never returns control to the guarded call.
pub type TerminationHook = Box<dyn FnOnce() + Send>;

struct Shared {
    ticks: u64,
    done: bool,
    out: Box<dyn Write + Send>,
}

impl Shared {
    /// Render one indicator character, skipping the write once done.
    /// Returns the done flag so the ticker can stop without a second lock.
    fn tick(&mut self) -> bool {
        if !self.done {
            self.ticks += 1;
            let mark = SPIN_MARKS[self.ticks as usize % SPIN_MARKS.len()];
            let _ = write!(self.out, "{mark}\u{8}");
            let _ = self.out.flush();
        }
        self.done
    }
}

/// Guard around exactly one blocking operation.
pub struct Watchdog {
    shared: Arc<Mutex<Shared>>,
    ticker: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Start a watchdog with the default process-group termination hook.
    /// `autotick: false` disables the ticker thread entirely, and with it
    /// both rendering and timeout enforcement.
    pub fn new(out: Box<dyn Write + Send>, timeout: Duration, autotick: bool) -> Self {
        Self::with_hook(out, timeout, autotick, Box::new(terminate_process_group))
    }

    /// Start with an explicit termination hook.
    pub fn with_hook(
        out: Box<dyn Write + Send>,
        timeout: Duration,
        autotick: bool,
        hook: TerminationHook,
    ) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            ticks: 0,
            done: false,
            out,
        }));
        let ticker = autotick.then(|| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || run_ticker(shared, timeout, hook))
        });
        Self { shared, ticker }
    }

    /// Release the guard: erase the indicator, mark done and wait for the
    /// ticker to exit. Also runs on drop, so a panicking guarded call still
    /// stops the ticker.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        {
            let mut shared = self.shared.lock().unwrap();
            if !shared.done {
                let _ = write!(shared.out, " \u{8}");
                let _ = shared.out.flush();
                shared.done = true;
            }
        }
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.release();
    }
}

fn run_ticker(shared: Arc<Mutex<Shared>>, timeout: Duration, hook: TerminationHook) {
    let mut budget_ms = timeout.as_millis() as i64;
    thread::sleep(LEAD_SLEEP);
    budget_ms -= LEAD_SLEEP.as_millis() as i64;
    loop {
        if budget_ms < 0 {
            {
                let mut shared = shared.lock().unwrap();
                let _ = write!(shared.out, "?\u{8}");
                let _ = shared.out.flush();
            }
            hook();
            return;
        }
        thread::sleep(TICK_SLEEP);
        budget_ms -= TICK_SLEEP.as_millis() as i64;
        if shared.lock().unwrap().tick() {
            return;
        }
    }
}

/// Terminate the whole process group. The guarded call cannot be unwound
/// from outside, so the shell gets its prompt back via SIGTERM.
#[cfg(unix)]
fn terminate_process_group() {
    // SAFETY: plain signal send, no memory is touched.
    unsafe {
        libc::kill(0, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate_process_group() {
    std::process::exit(1);
}

/// Stream for tick rendering: inherited fd 9 when the completion protocol
/// wired one up, stderr otherwise. Ticks never go to stdout, which carries
/// the candidate answer stream.
#[cfg(unix)]
pub fn ticker_stream() -> Box<dyn Write + Send> {
    use std::os::unix::io::FromRawFd;

    const TICKER_FD: libc::c_int = 9;
    // SAFETY: ownership of fd 9 is only taken after fcntl confirms it is
    // open; nothing else in this process uses that descriptor.
    unsafe {
        if libc::fcntl(TICKER_FD, libc::F_GETFD) != -1 {
            return Box::new(std::fs::File::from_raw_fd(TICKER_FD));
        }
    }
    Box::new(std::io::stderr())
}

#[cfg(not(unix))]
pub fn ticker_stream() -> Box<dyn Write + Send> {
    Box::new(std::io::stderr())
}
