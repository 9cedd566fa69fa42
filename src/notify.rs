use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::NotifyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Короткое уведомление. `blocking` - требует подтверждения и не исчезает само.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    pub blocking: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Toast {
    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Очередь уведомлений с автоудалением по истечении срока.
#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    max_toasts: usize,
    queue: Mutex<VecDeque<Toast>>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            ttl: i64::try_from(config.toast_duration_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
            max_toasts: config.max_toasts.max(1),
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.push_at(ToastLevel::Success, message.into(), false, Utc::now())
    }

    pub fn info(&self, message: impl Into<String>) -> Toast {
        self.push_at(ToastLevel::Info, message.into(), false, Utc::now())
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.push_at(ToastLevel::Error, message.into(), false, Utc::now())
    }

    /// Блокирующее подтверждение (например, печать без отдельного окна).
    pub fn confirm(&self, message: impl Into<String>) -> Toast {
        self.push_at(ToastLevel::Info, message.into(), true, Utc::now())
    }

    pub fn push_at(
        &self,
        level: ToastLevel,
        message: String,
        blocking: bool,
        now: DateTime<Utc>,
    ) -> Toast {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            message,
            blocking,
            created_at: now,
            // Срок за пределами календаря chrono - уведомление без истечения
            expires_at: if blocking {
                None
            } else {
                now.checked_add_signed(self.ttl)
            },
        };

        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.retain(|t| t.is_active(now));
        queue.push_back(toast.clone());
        // Лишние самые старые автоуведомления вытесняются
        while queue.iter().filter(|t| !t.blocking).count() > self.max_toasts {
            match queue.iter().position(|t| !t.blocking) {
                Some(idx) => {
                    queue.remove(idx);
                }
                None => break,
            }
        }
        toast
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.retain(|t| t.is_active(now));
        queue.iter().cloned().collect()
    }

    /// Закрывает уведомление (для блокирующих - это подтверждение).
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let before = queue.len();
        queue.retain(|t| t.id != id);
        queue.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(ms: u64, max: usize) -> Notifier {
        Notifier::new(&NotifyConfig {
            toast_duration_ms: ms,
            max_toasts: max,
        })
    }

    #[test]
    fn toasts_expire_after_configured_duration() {
        let n = notifier(5000, 5);
        let now = Utc::now();
        n.push_at(ToastLevel::Success, "Ticket downloaded".into(), false, now);

        assert_eq!(n.active_at(now + Duration::milliseconds(4999)).len(), 1);
        assert!(n.active_at(now + Duration::milliseconds(5000)).is_empty());
    }

    #[test]
    fn huge_duration_does_not_overflow() {
        for ms in [u64::MAX, i64::MAX as u64, i64::MAX as u64 + 1] {
            let n = notifier(ms, 5);
            let toast = n.info("Print dialog opened");

            assert!(!toast.blocking);
            assert!(toast.expires_at.map_or(true, |at| at > toast.created_at));
            assert_eq!(n.active_at(Utc::now() + Duration::days(365)).len(), 1);
        }
    }

    #[test]
    fn blocking_confirmation_stays_until_dismissed() {
        let n = notifier(1000, 5);
        let toast = n.confirm("Popup blocked, printing this page instead");

        assert!(toast.blocking);
        assert_eq!(toast.expires_at, None);
        assert_eq!(n.active_at(Utc::now() + Duration::hours(1)).len(), 1);
        assert!(n.dismiss(toast.id));
        assert!(n.active().is_empty());
    }

    #[test]
    fn oldest_toasts_are_evicted() {
        let n = notifier(5000, 2);
        n.info("one");
        n.info("two");
        n.error("three");

        let messages: Vec<_> = n.active().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, ["two", "three"]);
    }
}
