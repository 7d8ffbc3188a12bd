//! Interrupt handling.
//!
//! `main` installs the OS handlers once and hands the resulting [`Shutdown`]
//! to the dispatcher. Long-running loops poll it between units of work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Route SIGINT/SIGTERM (Ctrl-C on Windows) into `shutdown`.
///
/// The first signal only sets the flag so the current job can finish and no
/// half-written artifact is left behind. A second signal exits immediately.
pub fn install_signal_handlers(shutdown: &Shutdown) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            for sig in signals.forever() {
                if shutdown.is_requested() {
                    eprintln!("Interrupted again, exiting");
                    std::process::exit(128 + sig);
                }
                info!("Received signal {}, finishing current job before stopping...", sig);
                shutdown.request();
            }
        });
    }

    #[cfg(windows)]
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            if shutdown.is_requested() {
                eprintln!("Interrupted again, exiting");
                std::process::exit(130);
            }
            info!("Received Ctrl+C, finishing current job before stopping...");
            shutdown.request();
        })?;
    }

    Ok(())
}
