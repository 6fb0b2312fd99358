use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of `canonical_timezone`, e.g. "Asia/Jakarta".
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone name is not known.
pub fn get_local_offset(canonical_timezone: &str) -> Result<UtcOffset, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::Error;

    use super::get_local_offset;

    #[test]
    fn jakarta_is_utc_plus_seven() {
        let offset = get_local_offset("Asia/Jakarta").unwrap();

        assert_eq!(offset, UtcOffset::from_hms(7, 0, 0).unwrap());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let result = get_local_offset("Atlantis/Capital");

        assert_eq!(
            result,
            Err(Error::InvalidTimezoneError("Atlantis/Capital".to_owned()))
        );
    }
}
