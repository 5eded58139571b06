use std::io::Write;
use std::sync::{Mutex, PoisonError};

use super::Notifier;
use crate::error::NotifyError;
use crate::events::Notice;

/// ASCII BEL; terminals turn it into their alert sound.
const BELL: &str = "\x07";

/// Prints notices as single lines, ringing the terminal bell for overdue
/// reminders when `sound` is enabled.
pub struct TerminalNotifier {
    out: Mutex<Box<dyn Write + Send>>,
    sound: bool,
}

impl TerminalNotifier {
    /// Notifier writing to stderr.
    pub fn stderr(sound: bool) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), sound)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, sound: bool) -> Self {
        Self {
            out: Mutex::new(out),
            sound,
        }
    }

    fn render(&self, notice: &Notice) -> String {
        let bell = if self.sound && notice.kind.wants_sound() {
            BELL
        } else {
            ""
        };
        format!(
            "{bell}[{}] {}",
            notice.at.format("%Y-%m-%d %H:%M"),
            notice.message()
        )
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        let line = self.render(notice);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")
            .and_then(|_| out.flush())
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoticeKind;
    use crate::goal::GoalId;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn notice(kind: NoticeKind) -> Notice {
        Notice {
            goal_id: GoalId::from("g1"),
            label: "Drink water".into(),
            kind,
            at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn overdue_rings_bell_when_sound_enabled() {
        let buf = SharedBuf::default();
        let notifier = TerminalNotifier::with_writer(Box::new(buf.clone()), true);
        notifier.notify(&notice(NoticeKind::Overdue)).unwrap();
        notifier.notify(&notice(NoticeKind::Completed)).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "\x07[2025-03-01 08:30] Reminder: \"Drink water\" is due");
        assert_eq!(lines[1], "[2025-03-01 08:30] Nice work! \"Drink water\" marked done");
    }

    #[test]
    fn silent_mode_skips_bell() {
        let buf = SharedBuf::default();
        let notifier = TerminalNotifier::with_writer(Box::new(buf.clone()), false);
        notifier.notify(&notice(NoticeKind::Overdue)).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(!text.contains(BELL));
    }
}
