use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use super::view::WidgetView;

/// Renders the widget in a terminal
///
/// The timer is redrawn in place; notifications go to stderr.
pub struct TerminalView {
    start_enabled: AtomicBool,
    stop_enabled: AtomicBool,
    uploads: AtomicUsize,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            start_enabled: AtomicBool::new(true),
            stop_enabled: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn start_enabled(&self) -> bool {
        self.start_enabled.load(Ordering::SeqCst)
    }

    pub fn stop_enabled(&self) -> bool {
        self.stop_enabled.load(Ordering::SeqCst)
    }

    /// Number of recordings uploaded since launch
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Text listing the commands currently available
    pub fn prompt(&self) -> String {
        let mut commands = Vec::new();
        if self.start_enabled() {
            commands.push("[r]ecord");
        }
        if self.stop_enabled() {
            commands.push("[s]top");
        }
        commands.push("[q]uit");
        commands.join("  ")
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetView for TerminalView {
    fn set_start_enabled(&self, enabled: bool) {
        debug!("start control enabled={}", enabled);
        self.start_enabled.store(enabled, Ordering::SeqCst);
    }

    fn set_stop_enabled(&self, enabled: bool) {
        debug!("stop control enabled={}", enabled);
        self.stop_enabled.store(enabled, Ordering::SeqCst);
    }

    fn set_timer_text(&self, text: &str) {
        print!("\r⏺ {:<8}", text);
        std::io::stdout().flush().ok();
    }

    fn notify(&self, message: &str) {
        println!();
        warn!("{}", message);
        eprintln!("! {}", message);
    }

    fn reload(&self) {
        let count = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        println!();
        info!("Recording uploaded ({} this run)", count);
        println!("{}", self.prompt());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_follows_control_state() {
        let view = TerminalView::new();
        assert_eq!(view.prompt(), "[r]ecord  [q]uit");

        view.set_start_enabled(false);
        view.set_stop_enabled(true);
        assert_eq!(view.prompt(), "[s]top  [q]uit");
    }

    #[test]
    fn reload_counts_uploads() {
        let view = TerminalView::new();
        view.reload();
        view.reload();
        assert_eq!(view.uploads(), 2);
    }
}
