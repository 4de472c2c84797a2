use super::*;

fn parse_ok(input: &str) -> (usize, Temporal) {
    munch(input.as_bytes()).unwrap_or_else(|| panic!("munch failed for {input:?}"))
}

#[track_caller]
fn expect_err(input: &str) {
    assert!(
        munch(input.as_bytes()).is_none(),
        "expected failure for {input:?}"
    );
}

fn display(temporal: &Temporal) -> String {
    match temporal {
        Temporal::OffsetDateTime(v) => v.to_string(),
        Temporal::LocalDateTime(v) => v.to_string(),
        Temporal::LocalDate(v) => v.to_string(),
        Temporal::LocalTime(v) => v.to_string(),
    }
}

#[track_caller]
fn roundtrip(input: &str) {
    let (consumed, value) = parse_ok(input);
    assert_eq!(consumed, input.len(), "consumed wrong amount for {input:?}");
    assert_eq!(display(&value), input, "roundtrip mismatch for {input:?}");
}

#[track_caller]
fn roundtrip_lossy(input: &str, expected: &str) {
    let (consumed, value) = parse_ok(input);
    assert_eq!(consumed, input.len(), "consumed wrong amount for {input:?}");
    assert_eq!(display(&value), expected, "roundtrip mismatch for {input:?}");
}

// ── exact roundtrip ─────────────────────────────────────────────

#[test]
fn perfect_roundtrip_examples() {
    let inputs = &[
        "1979-05-27T07:32:00Z",
        "1979-05-27T00:32:00-23:00",
        "2000-12-17T00:32:00.500000-07:00",
        "1979-05-27T00:32:00.999999+21:20",
        "1979-05-27T07:32:00",
        "1979-05-27",
        "07:32:00",
        "00:32:00.999999",
        "00:32:00.500000",
    ];
    for input in inputs {
        roundtrip(input);
    }
}

#[test]
fn lossy_roundtrip() {
    // Spaces aren't preserved; we always separate with 'T'
    roundtrip_lossy("1979-05-27 07:32:00Z", "1979-05-27T07:32:00Z");
    roundtrip_lossy("2000-01-01 00:00:00", "2000-01-01T00:00:00");
    roundtrip_lossy("1999-12-31 23:59:59.900000", "1999-12-31T23:59:59.900000");

    // Lowercase t/z are accepted
    roundtrip_lossy("1987-07-05t17:45:00z", "1987-07-05T17:45:00Z");
    roundtrip_lossy("1987-07-05t17:45:00", "1987-07-05T17:45:00");

    // Short fractions display at full microsecond width
    roundtrip_lossy("07:32:00.5", "07:32:00.500000");
    roundtrip_lossy("07:32:00.123", "07:32:00.123000");

    // +00:00 stays distinct from Z
    roundtrip("2023-01-01T00:00:00+00:00");
}

// ── seconds are mandatory ───────────────────────────────────────

#[test]
fn seconds_are_required() {
    expect_err("07:32");
    expect_err("23:59");
    expect_err("1979-05-27T07:32");
    expect_err("1979-05-27T07:32Z");
    expect_err("1979-05-27T07:32-07:00");
    expect_err("1979-05-27 07:32");
}

// ── EOF / too-short inputs ──────────────────────────────────────

#[test]
fn eof_on_short_inputs() {
    expect_err("");
    expect_err("1");
    expect_err("12");
    expect_err("12:");
    expect_err("1979");
}

// ── date-only parsing ───────────────────────────────────────────

#[test]
fn date_only_basic() {
    roundtrip("2000-01-01");
    roundtrip("9999-12-31");
    roundtrip("0000-01-01");
    roundtrip("0001-06-15");
}

#[test]
fn date_leap_year_feb29() {
    roundtrip("2000-02-29"); // divisible by 400
    roundtrip("2024-02-29"); // divisible by 4, not 100
    roundtrip("1600-02-29");
}

#[test]
fn date_non_leap_year_feb29() {
    expect_err("2023-02-29");
    expect_err("1900-02-29"); // divisible by 100 not 400
    expect_err("2100-02-29");
}

#[test]
fn date_field_ranges() {
    expect_err("2023-00-01");
    expect_err("2023-13-01");
    expect_err("2023-01-00");
    expect_err("2023-01-32");
    expect_err("2023-04-31");
    expect_err("2023-02-30");
}

#[test]
fn date_invalid_separators() {
    expect_err("2023/01/01");
    expect_err("2023-01/01");
    expect_err("20230101");
}

#[test]
fn date_wrong_digit_counts() {
    expect_err("202-01-01");
    expect_err("2023-1-01");
    expect_err("2023-01-1");
}

#[test]
fn last_day_of_every_month() {
    let non_leap = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    for (m, &day) in non_leap.iter().enumerate() {
        let month = m + 1;
        roundtrip(&format!("2023-{month:02}-{day:02}"));
        expect_err(&format!("2023-{month:02}-{:02}", day + 1));
    }
    let leap = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    for (m, &day) in leap.iter().enumerate() {
        let month = m + 1;
        roundtrip(&format!("2024-{month:02}-{day:02}"));
        expect_err(&format!("2024-{month:02}-{:02}", day + 1));
    }
}

// ── time-only parsing ───────────────────────────────────────────

#[test]
fn time_only_basic() {
    roundtrip("00:00:00");
    roundtrip("23:59:59");
    roundtrip("12:30:45");
}

#[test]
fn time_field_ranges() {
    expect_err("24:00:00");
    expect_err("99:00:00");
    expect_err("00:60:00");
    expect_err("00:00:61");
    // leap second
    roundtrip("23:59:60");
}

#[test]
fn time_only_rejects_offset() {
    expect_err("07:32:00Z");
    expect_err("07:32:00+00:00");
    expect_err("07:32:00-05:00");
    expect_err("12:00:00.5Z");
}

#[test]
fn time_empty_frac() {
    expect_err("12:30:45.");
}

// ── fractional second handling ──────────────────────────────────

#[test]
fn frac_truncates_to_microseconds() {
    let (consumed, value) = parse_ok("12:30:45.1234567891");
    assert_eq!(consumed, "12:30:45.1234567891".len());
    let Temporal::LocalTime(time) = value else {
        panic!("expected a local time");
    };
    assert_eq!(time.microsecond, 123_456);
}

#[test]
fn frac_scaling() {
    let cases: &[(&str, u32)] = &[
        ("12:30:45.1", 100_000),
        ("12:30:45.12", 120_000),
        ("12:30:45.123", 123_000),
        ("12:30:45.123456", 123_456),
        ("12:30:45.000001", 1),
        ("12:30:45.999999", 999_999),
        ("12:30:45.0000001", 0),
    ];
    for (input, micros) in cases {
        let (consumed, value) = parse_ok(input);
        assert_eq!(consumed, input.len());
        let Temporal::LocalTime(time) = value else {
            panic!("expected a local time for {input:?}");
        };
        assert_eq!(time.microsecond, *micros, "for {input:?}");
    }
}

// ── offsets ─────────────────────────────────────────────────────

#[test]
fn offset_fields() {
    let (_, value) = parse_ok("2023-06-15T12:30:00Z");
    let Temporal::OffsetDateTime(odt) = value else {
        panic!("expected an offset date-time");
    };
    assert_eq!(odt.offset, TimeOffset::Z);

    let (_, value) = parse_ok("2023-06-15T12:30:00+05:30");
    let Temporal::OffsetDateTime(odt) = value else {
        panic!("expected an offset date-time");
    };
    assert_eq!(odt.offset, TimeOffset::Custom { minutes: 330 });

    let (_, value) = parse_ok("2023-06-15T12:30:00-01:15");
    let Temporal::OffsetDateTime(odt) = value else {
        panic!("expected an offset date-time");
    };
    assert_eq!(odt.offset, TimeOffset::Custom { minutes: -75 });
}

#[test]
fn offset_boundaries() {
    roundtrip("2023-01-01T00:00:00+23:59");
    roundtrip("2023-01-01T00:00:00-23:59");
    expect_err("2023-06-15T12:30:00+24:00");
    expect_err("2023-06-15T12:30:00+00:60");
    expect_err("2023-06-15T12:30:00-99:00");
}

#[test]
fn truncated_offset() {
    expect_err("2023-06-15T12:30:00+");
    expect_err("2023-06-15T12:30:00+0");
    expect_err("2023-06-15T12:30:00+05");
    expect_err("2023-06-15T12:30:00+05:");
    expect_err("2023-06-15T12:30:00+05:3");
}

// ── consumed byte count / trailing data ─────────────────────────

#[test]
fn trailing_data() {
    let (consumed, _) = parse_ok("2023-06-15hello");
    assert_eq!(consumed, 10);
    let (consumed, _) = parse_ok("12:30:45world");
    assert_eq!(consumed, 8);
    let (consumed, _) = parse_ok("2023-06-15T12:30:45stuff");
    assert_eq!(consumed, 19);
    let (consumed, _) = parse_ok("2023-06-15T12:30:45.123stuff");
    assert_eq!(consumed, 23);
    let (consumed, _) = parse_ok("2023-06-15T12:30:45Zstuff");
    assert_eq!(consumed, 20);
    let (consumed, _) = parse_ok("2023-06-15T12:30:45+05:30,next");
    assert_eq!(consumed, 25);
}

// ── invalid structures ──────────────────────────────────────────

#[test]
fn garbage_input() {
    expect_err("hello");
    expect_err("ABCDE");
    expect_err("--:--");
}

#[test]
fn truncated_date() {
    expect_err("2023-");
    expect_err("2023-06");
    expect_err("2023-06-");
}

#[test]
fn truncated_time_after_date() {
    expect_err("2023-06-15T");
    expect_err("2023-06-15T1");
    expect_err("2023-06-15T12");
    expect_err("2023-06-15T12:");
    expect_err("2023-06-15T12:3");
    expect_err("2023-06-15T12:30:");
    expect_err("2023-06-15T12:30:4");
}

#[test]
fn letters_in_digit_fields() {
    expect_err("XXXX-01-01");
    expect_err("2023-XX-01");
    expect_err("2023-01-XX");
    expect_err("XX:00:00");
}

// ── boundary values ─────────────────────────────────────────────

#[test]
fn year_boundaries() {
    roundtrip("0000-01-01");
    roundtrip("9999-12-31");
    roundtrip("9999-12-31T23:59:59.999999+23:59");
}

// ── randomized roundtrip ────────────────────────────────────────

#[test]
fn randomized_roundtrip_date_only() {
    let mut rng = oorandom::Rand32::new(1);
    for _ in 0..5000 {
        let year = (rng.rand_u32() % 10000) as u16;
        let month = (rng.rand_u32() % 12) as u8 + 1;
        let max_day = days_in_month(year, month);
        let day = (rng.rand_u32() % max_day as u32) as u8 + 1;
        roundtrip(&format!("{year:04}-{month:02}-{day:02}"));
    }
}

#[test]
fn randomized_roundtrip_full_datetime() {
    let mut rng = oorandom::Rand32::new(3);
    for _ in 0..10000 {
        let year = (rng.rand_u32() % 10000) as u16;
        let month = (rng.rand_u32() % 12) as u8 + 1;
        let max_day = days_in_month(year, month);
        let day = (rng.rand_u32() % max_day as u32) as u8 + 1;
        let hour = (rng.rand_u32() % 24) as u8;
        let minute = (rng.rand_u32() % 60) as u8;
        let second = (rng.rand_u32() % 60) as u8;

        let mut s = format!(
            "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
        );
        let mut expected = s.clone();

        // Fractions with 1-9 digits; the value keeps the first six.
        let nd = rng.rand_u32() % 10;
        if nd > 0 {
            let max_val = 10u32.pow(nd.min(9));
            let frac = rng.rand_u32() % max_val;
            let frac_str = format!("{frac:0>width$}", width = nd as usize);
            s.push('.');
            s.push_str(&frac_str);
            let kept: String = frac_str.chars().take(6).collect();
            let mut micros: u32 = kept.parse().unwrap();
            for _ in kept.len()..6 {
                micros *= 10;
            }
            if micros != 0 {
                expected.push_str(&format!(".{micros:06}"));
            }
        }

        // Random offset: none, Z, or +/-HH:MM
        match rng.rand_u32() % 4 {
            0 => {}
            1 => {
                s.push('Z');
                expected.push('Z');
            }
            _ => {
                let sign = if rng.rand_u32() % 2 == 0 { '+' } else { '-' };
                let oh = (rng.rand_u32() % 24) as u8;
                let om = (rng.rand_u32() % 60) as u8;
                let off = format!("{sign}{oh:02}:{om:02}");
                s.push_str(&off);
                expected.push_str(&off);
            }
        }

        roundtrip_lossy(&s, &expected);
    }
}

#[test]
fn randomized_reject_invalid() {
    // Random byte sequences should never panic; almost all fail.
    let mut rng = oorandom::Rand32::new(5);
    for _ in 0..10000 {
        let len = 5 + (rng.rand_u32() % 26) as usize;
        let bytes: Vec<u8> = (0..len).map(|_| (rng.rand_u32() % 256) as u8).collect();
        let _ = munch(&bytes);
    }
}

#[test]
fn randomized_mutate_valid_input() {
    let mut rng = oorandom::Rand32::new(6);
    let valid = b"2023-06-15T12:30:45.123+05:30";
    for _ in 0..5000 {
        let mut mutated = *valid;
        let pos = rng.rand_u32() as usize % mutated.len();
        mutated[pos] = (rng.rand_u32() % 256) as u8;
        let _ = munch(&mutated);
    }
}

// ── leap year correctness ───────────────────────────────────────

#[test]
fn leap_year_known_values() {
    for y in [0, 4, 400, 800, 1600, 2000, 2400, 2024, 1996] {
        assert!(is_leap_year(y), "{y} should be a leap year");
    }
    for y in [1, 100, 200, 300, 500, 1900, 2100, 2023, 2025] {
        assert!(!is_leap_year(y), "{y} should not be a leap year");
    }
}
