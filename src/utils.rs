use chrono::{NaiveDateTime, SubsecRound, Utc};

/// Current UTC time at millisecond precision, as stored in the database.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(3)
}
