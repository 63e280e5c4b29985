use crate::error::AppError;
use std::io::Write;
use tracing::debug;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "MINDER_DISABLE_NOTIFICATIONS";

/// Delivery channel used by the reminder scheduler.
pub trait Notifier {
    /// Whether the desktop channel may be used right now.
    fn is_authorized(&self) -> bool;

    fn deliver(&self, title: &str, body: &str) -> Result<(), AppError>;

    /// Synchronous fallback used when the channel is not authorized.
    fn fallback_deliver(&self, message: &str) -> Result<(), AppError> {
        print_alert(message)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn is_authorized(&self) -> bool {
        (**self).is_authorized()
    }

    fn deliver(&self, title: &str, body: &str) -> Result<(), AppError> {
        (**self).deliver(title, body)
    }

    fn fallback_deliver(&self, message: &str) -> Result<(), AppError> {
        (**self).fallback_deliver(message)
    }
}

/// Never authorized; every reminder ends up on stdout through the fallback.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn is_authorized(&self) -> bool {
        false
    }

    fn deliver(&self, title: &str, body: &str) -> Result<(), AppError> {
        print_alert(&format!("{title}: {body}"))
    }
}

fn print_alert(message: &str) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "\x07{message}")?;
    handle.flush()?;
    Ok(())
}

pub fn notifier_from_env() -> Box<dyn Notifier> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        debug!("desktop notifications disabled by {DISABLE_ENV_VAR}");
        return Box::new(TerminalNotifier);
    }

    match platform_notifier() {
        Ok(notifier) => notifier,
        Err(err) => {
            debug!(error = %err, "falling back to terminal reminders");
            Box::new(TerminalNotifier)
        }
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
