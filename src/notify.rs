use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-facing message surfaced by the embedding UI as a toast.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// Effects this layer asks the embedding UI to perform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiEvent {
    Notice(Notice),
    /// Navigate to the login page. Emitted at most once per expired session.
    RedirectToLogin,
}

/// Sending half of the UI event channel. Cheap to clone; sends never block and
/// are dropped silently once the receiving UI is gone.
#[derive(Clone, Debug)]
pub struct Notifier {
    events: mpsc::UnboundedSender<UiEvent>,
}

impl Notifier {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notice(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.notice(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notice(Severity::Error, message);
    }

    pub fn notice(&self, severity: Severity, message: impl Into<String>) {
        let _ = self.events.send(UiEvent::Notice(Notice {
            severity,
            message: message.into(),
        }));
    }

    pub fn redirect_to_login(&self) {
        let _ = self.events.send(UiEvent::RedirectToLogin);
    }
}
