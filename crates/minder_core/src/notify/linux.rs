use crate::error::AppError;
use crate::notify::Notifier;
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    /// Authorized when a notification server answers on the session bus.
    fn is_authorized(&self) -> bool {
        notify_rust::get_server_information().is_ok()
    }

    fn deliver(&self, title: &str, body: &str) -> Result<(), AppError> {
        Notification::new()
            .appname("minder")
            .summary(title)
            .body(body)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
