//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or, on Unix, SIGTERM
//! - Report which one arrived so the caller can begin a graceful stop

use std::io;

use tokio::signal;

/// Termination signal that ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

/// Wait until the process is asked to terminate.
pub async fn wait_for_termination() -> io::Result<TerminationSignal> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result.map(|_| TerminationSignal::Interrupt),
            _ = terminate.recv() => Ok(TerminationSignal::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        Ok(TerminationSignal::Interrupt)
    }
}
