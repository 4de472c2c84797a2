//! Date and time values for the TOML format, based on RFC 3339.

#[cfg(test)]
#[path = "./time_tests.rs"]
mod tests;

use std::fmt;

/// A TOML local date (`1979-05-27`).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A TOML local time (`07:32:00.999999`).
///
/// Fractional seconds are kept to microsecond precision; further digits in
/// the source are consumed but discarded.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

/// UTC offset of an [`OffsetDateTime`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeOffset {
    /// A suffix which, when applied to a time, denotes a UTC offset of 00:00;
    /// often spoken "Zulu" from the ICAO phonetic alphabet representation of
    /// the letter "Z". RFC 3339 section 2.
    Z,
    /// Offset between local time and UTC. `+00:00` is kept distinct from `Z`.
    Custom { minutes: i16 },
}

/// A TOML local date-time (`1979-05-27T07:32:00`).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct LocalDateTime {
    pub date: Date,
    pub time: Time,
}

/// A TOML offset date-time (`1979-05-27T07:32:00-05:00`).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct OffsetDateTime {
    pub date: Date,
    pub time: Time,
    pub offset: TimeOffset,
}

/// One of the four TOML date/time kinds, as classified by [`munch`].
#[derive(Copy, Clone, PartialEq)]
pub(crate) enum Temporal {
    OffsetDateTime(OffsetDateTime),
    LocalDateTime(LocalDateTime),
    LocalDate(Date),
    LocalTime(Time),
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    const DAYS: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[month as usize]
    }
}

/// Quick shape test for the head of a date/time token: `HH:` or `YYYY-MM-`.
///
/// A head that matches this shape but fails [`munch`] is an impossible
/// date/time, not a malformed number.
pub(crate) fn looks_temporal(input: &[u8]) -> bool {
    matches!(
        input,
        [_, _, b':', _, _, ..] | [_, _, _, _, b'-', _, _, b'-', ..]
    )
}

/// Recognizes one date/time value at the start of `input`, returning how
/// many bytes were consumed and the classified value.
///
/// Trailing data is permitted; the caller decides whether what follows is
/// legal. Returns `None` when any field is structurally or calendrically
/// invalid (wrong digit count, month 13, Feb 29 off-leap, hour 24, ...).
pub(crate) fn munch(input: &[u8]) -> Option<(usize, Temporal)> {
    enum State {
        Year,
        Month,
        Day,
        Hour,
        Minute,
        Second,
        Frac,
        OffHour,
        OffMin,
    }
    let mut state = match input {
        [_, _, b':', _, _, ..] => State::Hour,
        [_, _, _, _, b'-', _, _, b'-', ..] => State::Year,
        _ => return None,
    };

    let mut year = 0u16;
    let mut month = 0u8;
    let mut date: Option<Date> = None;
    let mut hour = 0u8;
    let mut minute = 0u8;
    let mut second = 0u8;
    let mut microsecond = 0u32;
    let mut has_time = false;
    let mut offset: Option<TimeOffset> = None;

    let mut current = 0u32;
    let mut len = 0u32;
    let mut off_sign: i16 = 1;
    let mut off_hour = 0u8;
    let mut i = 0usize;
    let mut valid = false;

    'outer: loop {
        // Position past the end reads as a 0 sentinel, which no state
        // accepts as a separator.
        let byte = input.get(i).copied().unwrap_or(0);
        if byte.is_ascii_digit() {
            len += 1;
            if len <= 6 {
                current = current * 10 + (byte - b'0') as u32;
            }
            i += 1;
            continue;
        }
        'next: {
            match state {
                State::Year => {
                    if len != 4 || byte != b'-' {
                        break 'outer;
                    }
                    year = current as u16;
                    state = State::Month;
                    break 'next;
                }
                State::Month => {
                    let m = current as u8;
                    if len != 2 || byte != b'-' || m < 1 || m > 12 {
                        break 'outer;
                    }
                    month = m;
                    state = State::Day;
                    break 'next;
                }
                State::Day => {
                    let d = current as u8;
                    if len != 2 || d < 1 || d > days_in_month(year, month) {
                        break 'outer;
                    }
                    date = Some(Date { year, month, day: d });
                    if byte == b'T' || byte == b't' {
                        state = State::Hour;
                        break 'next;
                    }
                    if byte == b' ' && input.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
                        state = State::Hour;
                        break 'next;
                    }
                    valid = true;
                    break 'outer;
                }
                State::Hour => {
                    if len != 2 || byte != b':' || current > 23 {
                        break 'outer;
                    }
                    hour = current as u8;
                    state = State::Minute;
                    break 'next;
                }
                State::Minute => {
                    // Seconds are mandatory, so only a colon may follow.
                    if len != 2 || current > 59 || byte != b':' {
                        break 'outer;
                    }
                    minute = current as u8;
                    state = State::Second;
                    break 'next;
                }
                State::Second => {
                    // 60 admits leap seconds.
                    if len != 2 || current > 60 {
                        break 'outer;
                    }
                    second = current as u8;
                    has_time = true;
                    if byte == b'.' {
                        state = State::Frac;
                        break 'next;
                    }
                    // fall through to the offset check
                }
                State::Frac => {
                    if len == 0 {
                        break 'outer;
                    }
                    let digits = if len > 6 { 6 } else { len };
                    let mut micros = current;
                    for _ in digits..6 {
                        micros *= 10;
                    }
                    microsecond = micros;
                    // fall through to the offset check
                }
                State::OffHour => {
                    if len != 2 || byte != b':' || current > 23 {
                        break 'outer;
                    }
                    off_hour = current as u8;
                    state = State::OffMin;
                    break 'next;
                }
                State::OffMin => {
                    if len != 2 || current > 59 {
                        break 'outer;
                    }
                    offset = Some(TimeOffset::Custom {
                        minutes: off_sign * (off_hour as i16 * 60 + current as i16),
                    });
                    valid = true;
                    break 'outer;
                }
            }
            match byte {
                b'Z' | b'z' => {
                    offset = Some(TimeOffset::Z);
                    i += 1;
                    valid = true;
                    break 'outer;
                }
                b'+' => {
                    off_sign = 1;
                    state = State::OffHour;
                }
                b'-' => {
                    off_sign = -1;
                    state = State::OffHour;
                }
                _ => {
                    valid = true;
                    break 'outer;
                }
            }
        }
        i += 1;
        current = 0;
        len = 0;
    }
    if !valid {
        return None;
    }
    let time = Time {
        hour,
        minute,
        second,
        microsecond,
    };
    let temporal = match (date, has_time, offset) {
        (Some(date), true, Some(offset)) => {
            Temporal::OffsetDateTime(OffsetDateTime { date, time, offset })
        }
        (Some(date), true, None) => Temporal::LocalDateTime(LocalDateTime { date, time }),
        (Some(date), false, None) => Temporal::LocalDate(date),
        (None, true, None) => Temporal::LocalTime(time),
        // An offset is only meaningful after a full date-time.
        _ => return None,
    };
    Some((i, temporal))
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.microsecond != 0 {
            write!(f, ".{:06}", self.microsecond)?;
        }
        Ok(())
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOffset::Z => f.write_str("Z"),
            TimeOffset::Custom { minutes } => {
                let (sign, abs) = if *minutes < 0 {
                    ('-', (-*minutes) as u16)
                } else {
                    ('+', *minutes as u16)
                };
                write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
        }
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

impl fmt::Display for OffsetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}{}", self.date, self.time, self.offset)
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for OffsetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
