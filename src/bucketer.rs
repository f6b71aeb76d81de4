//! Deterministic percentage bucketing.

/// Maps a (flag key, subject id) pair to a bucket in `0..100`.
///
/// Implementations must be pure: the same inputs always give the same bucket, in any process.
pub trait Bucketer {
    fn bucket(&self, flag_key: &str, subject_id: &str) -> u8;

    /// Returns `true` if the subject falls inside a rollout of `percentage` percent.
    fn is_in_rollout(&self, flag_key: &str, subject_id: &str, percentage: u8) -> bool {
        self.bucket(flag_key, subject_id) < percentage
    }
}

/// The default bucketer: a base-31 rolling hash over `flag_key` followed by `subject_id`.
///
/// Not cryptographically secure. Arithmetic wraps at 64 bits so buckets stay identical across
/// platforms and releases.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHashBucketer;

impl RollingHashBucketer {
    const MULTIPLIER: i64 = 31;

    fn hash(flag_key: &str, subject_id: &str) -> i64 {
        flag_key.chars().chain(subject_id.chars()).fold(0i64, |h, c| {
            h.wrapping_mul(Self::MULTIPLIER)
                .wrapping_add(i64::from(u32::from(c)))
        })
    }
}

impl Bucketer for RollingHashBucketer {
    fn bucket(&self, flag_key: &str, subject_id: &str) -> u8 {
        // unsigned_abs keeps i64::MIN in range
        (Self::hash(flag_key, subject_id).unsigned_abs() % 100) as u8
    }
}

#[cfg(test)]
pub struct FixedBucketer(pub std::collections::HashMap<String, u8>);

#[cfg(test)]
impl Bucketer for FixedBucketer {
    fn bucket(&self, _flag_key: &str, subject_id: &str) -> u8 {
        self.0.get(subject_id).copied().unwrap_or(0)
    }
}
