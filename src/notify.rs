use std::io::{self, Write};

use notify_rust::Notification;
use tracing::error;

use crate::error::NotifyError;

const APP_NAME: &str = "pomo";

/// Best-effort delivery of "time is up" signals. Failures are logged by the
/// caller and otherwise ignored.
pub trait Notifier {
    fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError>;

    /// Audible cue. Defaults to nothing.
    fn beep(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _summary: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Desktop notifications plus the terminal bell.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
        Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .show()?;
        Ok(())
    }

    fn beep(&self) -> Result<(), NotifyError> {
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

/// Picks the notifier for this run. `POMO_DISABLE_NOTIFICATIONS` turns them off.
pub fn notifier_from_env() -> Box<dyn Notifier> {
    if std::env::var_os("POMO_DISABLE_NOTIFICATIONS").is_some() {
        return Box::new(NoopNotifier);
    }
    Box::new(DesktopNotifier)
}

/// Beeps and notifies, logging instead of failing.
pub fn alert(notifier: &dyn Notifier, body: &str) {
    if let Err(err) = notifier.beep() {
        error!(%err, "sending beep on timer expiration");
    }
    if let Err(err) = notifier.notify(APP_NAME, body) {
        error!(%err, "sending notification");
    }
}
