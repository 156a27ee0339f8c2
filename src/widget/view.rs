/// The UI elements the recording controller drives
///
/// Every method is called from the controller synchronously, never while an
/// await is pending, so implementations must not block for long. `notify` is
/// the one blocking-style call: it stands in for a modal alert.
pub trait WidgetView: Send + Sync {
    /// Enable or disable the start control
    fn set_start_enabled(&self, enabled: bool);

    /// Enable or disable the stop control
    fn set_stop_enabled(&self, enabled: bool);

    /// Replace the elapsed-time text
    fn set_timer_text(&self, text: &str);

    /// Tell the user something went wrong
    fn notify(&self, message: &str);

    /// Re-render the widget from server state after a successful upload
    fn reload(&self);
}

/// Enabled state of the two controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosture {
    /// Start enabled, stop disabled
    Idle,
    /// Start disabled, stop enabled
    Recording,
}

impl ControlPosture {
    pub fn start_enabled(self) -> bool {
        matches!(self, ControlPosture::Idle)
    }

    pub fn stop_enabled(self) -> bool {
        matches!(self, ControlPosture::Recording)
    }

    /// Push this posture to a view
    pub fn apply(self, view: &dyn WidgetView) {
        view.set_start_enabled(self.start_enabled());
        view.set_stop_enabled(self.stop_enabled());
    }
}
