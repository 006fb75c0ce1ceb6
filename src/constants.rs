use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Seconds a computed health report is served from cache.
pub const HEALTH_CACHE_SECONDS: i64 = 5;

/// Upper bound on a whole multipart body, across all parts.
pub const MULTIPART_TOTAL_LIMIT: usize = 64 * 1024 * 1024;

/// Seconds browsers may cache a file served from storage.
pub const STORAGE_CACHE_MAX_AGE: u32 = 86_400;
