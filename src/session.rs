//! Хранилище сессии: записи бронирований живут только до конца сессии.
//!
//! Ключ `booking_<booking_id>`, значение - JSON записи. По умолчанию память
//! процесса; при заданном REDIS_URL - Redis с TTL длиной в сессию.

use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SessionError;
use crate::models::BookingRecord;
use crate::redis_client::RedisClient;

pub fn session_key(booking_id: &str) -> String {
    format!("booking_{}", booking_id)
}

pub enum SessionStore {
    Memory(MemorySessionStore),
    Redis(RedisSessionStore),
}

impl SessionStore {
    pub fn memory() -> Self {
        SessionStore::Memory(MemorySessionStore::default())
    }

    pub fn redis(redis: RedisClient, ttl_seconds: u64) -> Self {
        SessionStore::Redis(RedisSessionStore { redis, ttl_seconds })
    }

    pub async fn save(&self, record: &BookingRecord) -> Result<(), SessionError> {
        let key = session_key(&record.booking_id);
        let data = serde_json::to_string(record)?;
        match self {
            SessionStore::Memory(store) => store.put(key, data).await,
            SessionStore::Redis(store) => store.put(key, data).await?,
        }
        debug!("Booking {} saved to session", record.booking_id);
        Ok(())
    }

    pub async fn load(&self, booking_id: &str) -> Result<Option<BookingRecord>, SessionError> {
        let key = session_key(booking_id);
        let data = match self {
            SessionStore::Memory(store) => store.get(&key).await,
            SessionStore::Redis(store) => store.get(&key).await?,
        };
        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    async fn put(&self, key: String, data: String) {
        self.entries.write().await.insert(key, data);
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

pub struct RedisSessionStore {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    async fn put(&self, key: String, data: String) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, data, self.ttl_seconds).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fare, Passenger, Trip};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record() -> BookingRecord {
        let depart = NaiveDate::from_ymd_opt(2026, 11, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        BookingRecord {
            booking_id: "HT-20261102-111222".to_string(),
            passenger: Passenger {
                name: "Ravi Kumar".to_string(),
                phone: "99887 76655".to_string(),
                email: "ravi@example.com".to_string(),
            },
            trip: Trip {
                category: "Flight".to_string(),
                provider: "IndiGo".to_string(),
                class: "First Class".to_string(),
                origin: "Delhi".to_string(),
                destination: "Mumbai".to_string(),
                depart,
                arrive: Some(depart + chrono::Duration::minutes(135)),
                duration: Some("2h 15m".to_string()),
                distance_km: Some(1410),
            },
            fare: Fare::from_price(70000, 0.05),
            notes: Some("Aisle seat".to_string()),
            map_link: Some("https://www.google.com/maps/dir/?api=1".to_string()),
            verification_payload: "Booking:HT-20261102-111222".to_string(),
            logo: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap().fixed_offset(),
        }
    }

    #[test]
    fn key_is_prefixed() {
        assert_eq!(session_key("HT-1"), "booking_HT-1");
    }

    #[tokio::test]
    async fn record_round_trips_through_memory_store() {
        let store = SessionStore::memory();
        let original = record();

        store.save(&original).await.unwrap();
        let loaded = store.load(&original.booking_id).await.unwrap();

        assert_eq!(loaded, Some(original));
        assert_eq!(store.load("HT-missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_serde_error() {
        let inner = MemorySessionStore::default();
        inner.put(session_key("HT-bad"), "{not json".to_string()).await;
        let store = SessionStore::Memory(inner);

        assert!(matches!(store.load("HT-bad").await, Err(SessionError::Serde(_))));
    }
}
