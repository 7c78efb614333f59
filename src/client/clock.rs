use chrono::{DateTime, Utc};

/// Source of the current time for cooldown bookkeeping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Clock that only moves when told to
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Utc::now()),
            }
        }

        pub fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now = *now + Duration::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}
