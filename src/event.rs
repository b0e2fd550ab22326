use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub enum AppEvent {
    Line(String),
    Tick,
    InputClosed,
}

/// Merges typed lines and timer ticks into one stream.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    ticking: Arc<AtomicBool>,
}

impl EventHandler {
    pub fn new<R: BufRead + Send + 'static>(input: R, tick_rate: Option<Duration>) -> Self {
        let (tx, rx) = mpsc::channel();
        let ticking = Arc::new(AtomicBool::new(tick_rate.is_some()));

        let line_tx = tx.clone();
        thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if line_tx.send(AppEvent::Line(line)).is_err() {
                    return;
                }
            }
            let _ = line_tx.send(AppEvent::InputClosed);
        });

        if let Some(rate) = tick_rate {
            let ticking = Arc::clone(&ticking);
            thread::spawn(move || {
                loop {
                    thread::sleep(rate);
                    if !ticking.load(Ordering::Relaxed) || tx.send(AppEvent::Tick).is_err() {
                        return;
                    }
                }
            });
        }

        Self { rx, ticking }
    }

    /// Cancel the timer; ticks already queued are still delivered.
    pub fn stop_ticks(&self) {
        self.ticking.store(false, Ordering::Relaxed);
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_then_closed() {
        let events = EventHandler::new(Cursor::new("one two\nthree\n"), None);
        assert!(matches!(events.next().unwrap(), AppEvent::Line(l) if l == "one two"));
        assert!(matches!(events.next().unwrap(), AppEvent::Line(l) if l == "three"));
        assert!(matches!(events.next().unwrap(), AppEvent::InputClosed));
    }

    #[test]
    fn ticks_arrive_until_stopped() {
        let events = EventHandler::new(Cursor::new(""), Some(Duration::from_millis(5)));
        let mut saw_tick = false;
        for _ in 0..2 {
            if matches!(events.next().unwrap(), AppEvent::Tick) {
                saw_tick = true;
                break;
            }
        }
        assert!(saw_tick);
        events.stop_ticks();
    }
}
