use thiserror::Error;
use time::Duration;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    #[must_use]
    pub fn new_unchecked(duration: Duration) -> Self {
        Self::new(duration).expect("Duration was not positive.")
    }

    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The duration is not positive: {0}")]
pub struct NonPositiveDurationError(Duration);

impl TryFrom<Duration> for PositiveDuration {
    type Error = NonPositiveDurationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveDurationError(value))
    }
}

/// 1-based feed page. Out-of-range requests (zero, negative) normalize to
/// the first page, as the feed treats them as "from the top".
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub struct PageNumber(u64);

impl PageNumber {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(page: i64) -> Self {
        if page > 1 {
            Self(page.cast_unsigned())
        } else {
            Self::FIRST
        }
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn offset(self, per_page: u64) -> u64 {
        (self.0 - 1) * per_page
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_pages_normalize_to_first() {
        assert_eq!(PageNumber::new(-3), PageNumber::FIRST);
        assert_eq!(PageNumber::new(0), PageNumber::FIRST);
        assert_eq!(PageNumber::new(1), PageNumber::FIRST);
    }

    #[test]
    fn offsets_step_by_page_size() {
        assert_eq!(PageNumber::new(1).offset(10), 0);
        assert_eq!(PageNumber::new(2).offset(10), 10);
        assert_eq!(PageNumber::new(5).offset(10), 40);
    }

    #[test]
    fn positive_duration_rejects_non_positive() {
        assert!(PositiveDuration::new(Duration::ZERO).is_none());
        assert!(PositiveDuration::new(Duration::seconds(-1)).is_none());
        assert!(PositiveDuration::new(Duration::seconds(1)).is_some());
    }
}
