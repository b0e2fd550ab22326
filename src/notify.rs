use tracing::info;

/// Delivers congratulatory signals. Called only when a statistics update
/// reports a new top WPM or a milestone count.
pub trait Notifier: Send + Sync {
    fn notify_new_top_wpm(&self, user_id: &str, wpm: f64);
    fn notify_milestone(&self, user_id: &str, count: u32);
}

/// Writes signals to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_new_top_wpm(&self, user_id: &str, wpm: f64) {
        info!(user_id, wpm, "new top WPM");
    }

    fn notify_milestone(&self, user_id: &str, count: u32) {
        info!(user_id, count, "test milestone reached");
    }
}
