/// Monotonic nanosecond clock used to stamp and check record expiry.
///
/// Expiry stamps are stored as raw `u64` nanoseconds inside arena records,
/// so the clock must be monotonic and never return 0 (0 means "no expiry").
use std::time::Duration;

/// Get current monotonic time in nanoseconds.
pub fn now_nanos() -> u64 {
    #[cfg(target_os = "linux")]
    {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        ((ts.tv_sec as u64) * 1_000_000_000 + (ts.tv_nsec as u64)).max(1)
    }

    #[cfg(not(target_os = "linux"))]
    {
        use std::time::Instant;
        // Offset by one so the first reading is never the 0 sentinel
        static BASE: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let base = BASE.get_or_init(Instant::now);
        base.elapsed().as_nanos() as u64 + 1
    }
}

/// Absolute expiry stamp for a record written at `now` with `ttl`.
///
/// Returns 0 (never expires) when `ttl` is `None`.
#[inline]
pub fn expires_at(now: u64, ttl: Option<Duration>) -> u64 {
    match ttl {
        Some(ttl) => {
            let nanos = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
            now.saturating_add(nanos).max(1)
        }
        None => 0,
    }
}

/// True if a record stamped with `expires_at` is dead at `now`.
#[inline]
pub fn is_expired(expires_at: u64, now: u64) -> bool {
    expires_at != 0 && now >= expires_at
}

/// Time left before `expires_at`, or `None` for records that never expire.
#[inline]
pub fn remaining(expires_at: u64, now: u64) -> Option<Duration> {
    if expires_at == 0 {
        None
    } else {
        Some(Duration::from_nanos(expires_at.saturating_sub(now)))
    }
}
