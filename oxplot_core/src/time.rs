// Copyright 2025 the Oxplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Calendar-aware instants and the unit/format tables behind time axes.
//!
//! Time axes use "seconds since the Unix epoch" as their numeric coordinate.
//! [`Instant`] is the exact form of that coordinate: whole seconds plus a
//! normalized microsecond remainder, convertible to and from `f64` seconds
//! with microsecond-bounded loss for spans up to decades. All calendar
//! decomposition is UTC (civil, not local).
//!
//! Month and year arithmetic is calendar-aware on purpose: a month step
//! advances by the actual length of the months involved (28–31 days, with
//! day-of-month clamped into short months), and a year step advances by 365
//! or 366 days depending on each individual year crossed. Equal step counts
//! from different start points therefore cover different spans; callers must
//! not "normalize" this away.

extern crate alloc;

use alloc::format;
use alloc::string::String;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use chrono::{DateTime, Datelike, Months, NaiveDate, Timelike, Utc};

/// Lowest timestamp (seconds) a time axis will show: the Unix epoch.
pub const MIN_TIME_S: f64 = 0.0;

/// Highest timestamp (seconds) a time axis will show: Jan 1, 3000.
pub const MAX_TIME_S: f64 = 32_503_680_000.0;

const MICROS_PER_SEC: i64 = 1_000_000;

/// The granularity ladder used to pick tick units for a time axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeUnit {
    /// One microsecond.
    Microsecond,
    /// One millisecond.
    Millisecond,
    /// One second.
    Second,
    /// One minute.
    Minute,
    /// One hour.
    Hour,
    /// One day.
    Day,
    /// One month (nominal span; real steps are calendar-aware).
    Month,
    /// One year (nominal span; real steps are calendar-aware).
    Year,
}

impl TimeUnit {
    /// Number of units in the ladder.
    pub const COUNT: usize = 8;

    const ALL: [Self; Self::COUNT] = [
        Self::Microsecond,
        Self::Millisecond,
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Month,
        Self::Year,
    ];

    /// Nominal span of one unit in seconds (months/years use the mean Gregorian length).
    pub fn span_seconds(self) -> f64 {
        match self {
            Self::Microsecond => 1.0e-6,
            Self::Millisecond => 1.0e-3,
            Self::Second => 1.0,
            Self::Minute => 60.0,
            Self::Hour => 3_600.0,
            Self::Day => 86_400.0,
            Self::Month => 2_629_800.0,
            Self::Year => 31_557_600.0,
        }
    }

    /// The next coarser unit, saturating at [`TimeUnit::Year`].
    pub fn coarser(self) -> Self {
        let i = self as usize;
        Self::ALL[(i + 1).min(Self::COUNT - 1)]
    }

    /// Picks the unit whose nominal label granularity suits a span of
    /// `span_seconds` seconds.
    pub fn for_span(span_seconds: f64) -> Self {
        const CUTOFFS: [f64; TimeUnit::COUNT] = [
            0.001,
            1.0,
            60.0,
            3_600.0,
            86_400.0,
            2_629_800.0,
            31_557_600.0,
            f64::MAX,
        ];
        for (i, cutoff) in CUTOFFS.iter().enumerate() {
            if span_seconds <= *cutoff {
                return Self::ALL[i];
            }
        }
        Self::Year
    }

    /// Returns the largest tick step (in this unit) that produces at most
    /// `max_divs` divisions, from the per-unit division tables.
    ///
    /// Returns 0 for [`TimeUnit::Year`]; year axes use the linear nice-number
    /// path instead of fixed step tables.
    pub fn step_for_divs(self, max_divs: i32) -> i32 {
        match self {
            Self::Microsecond | Self::Millisecond => {
                const STEP: [i32; 11] = [500, 250, 200, 100, 50, 25, 20, 10, 5, 2, 1];
                const DIVS: [i32; 11] = [2, 4, 5, 10, 20, 40, 50, 100, 200, 500, 1000];
                lower_bound_step(max_divs, &DIVS, &STEP)
            }
            Self::Second | Self::Minute => {
                const STEP: [i32; 5] = [30, 15, 10, 5, 1];
                const DIVS: [i32; 5] = [2, 4, 6, 12, 60];
                lower_bound_step(max_divs, &DIVS, &STEP)
            }
            Self::Hour => {
                const STEP: [i32; 5] = [12, 6, 3, 2, 1];
                const DIVS: [i32; 5] = [2, 4, 8, 12, 24];
                lower_bound_step(max_divs, &DIVS, &STEP)
            }
            Self::Day => {
                const STEP: [i32; 4] = [14, 7, 2, 1];
                const DIVS: [i32; 4] = [2, 4, 14, 28];
                lower_bound_step(max_divs, &DIVS, &STEP)
            }
            Self::Month => {
                const STEP: [i32; 4] = [6, 3, 2, 1];
                const DIVS: [i32; 4] = [2, 4, 6, 12];
                lower_bound_step(max_divs, &DIVS, &STEP)
            }
            Self::Year => 0,
        }
    }
}

fn lower_bound_step(max_divs: i32, divs: &[i32], steps: &[i32]) -> i32 {
    if max_divs < divs[0] {
        return 0;
    }
    for i in 1..divs.len() {
        if max_divs < divs[i] {
            return steps[i - 1];
        }
    }
    steps[steps.len() - 1]
}

/// Tick label formats for time axes, from sub-second fractions up to years.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFmt {
    /// `.428 552` (millisecond + microsecond remainder)
    Us,
    /// `:29.428 552`
    SUs,
    /// `:29.428`
    SMs,
    /// `:29`
    S,
    /// `7:21:29pm`
    HrMinS,
    /// `7:21pm`
    HrMin,
    /// `7pm`
    Hr,
    /// `10/3`
    DayMo,
    /// `10/3 7pm`
    DayMoHr,
    /// `10/3 7:21pm`
    DayMoHrMin,
    /// `10/3/91`
    DayMoYr,
    /// `10/3/91 7:21pm`
    DayMoYrHrMin,
    /// `10/3/91 7:21:29pm`
    DayMoYrHrMinS,
    /// `Oct 1991`
    MoYr,
    /// `Oct`
    Mo,
    /// `1991`
    Yr,
}

impl TimeFmt {
    /// The fine (level-0) label format for a given fine unit.
    pub fn level0(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Microsecond => Self::Us,
            TimeUnit::Millisecond => Self::SMs,
            TimeUnit::Second => Self::S,
            TimeUnit::Minute => Self::HrMin,
            TimeUnit::Hour => Self::Hr,
            TimeUnit::Day => Self::DayMo,
            TimeUnit::Month => Self::Mo,
            TimeUnit::Year => Self::Yr,
        }
    }

    /// The coarse (level-1) label format for a given coarse unit.
    pub fn level1(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Microsecond => Self::HrMin,
            TimeUnit::Millisecond => Self::HrMinS,
            TimeUnit::Second | TimeUnit::Minute | TimeUnit::Hour => Self::HrMin,
            TimeUnit::Day | TimeUnit::Month => Self::DayMoYr,
            TimeUnit::Year => Self::Yr,
        }
    }

    /// The verbose variant of [`TimeFmt::level1`] used for the first coarse
    /// label in view, which has no neighbor to share context with.
    pub fn level1_first(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Microsecond | TimeUnit::Millisecond => Self::DayMoYrHrMinS,
            TimeUnit::Second | TimeUnit::Minute | TimeUnit::Hour => Self::DayMoYrHrMin,
            TimeUnit::Day | TimeUnit::Month => Self::DayMoYr,
            TimeUnit::Year => Self::Yr,
        }
    }

    /// The format used for the hover readout of a pointer position, by the
    /// fine unit currently shown.
    pub fn cursor(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Microsecond => Self::Us,
            TimeUnit::Millisecond => Self::SUs,
            TimeUnit::Second => Self::SMs,
            TimeUnit::Minute => Self::HrMinS,
            TimeUnit::Hour => Self::HrMin,
            TimeUnit::Day => Self::DayMoHr,
            TimeUnit::Month => Self::DayMoYr,
            TimeUnit::Year => Self::MoYr,
        }
    }

    /// A template string of nominally widest glyphs for this format, used to
    /// budget label density before any label is rendered.
    pub fn widest_template(self) -> &'static str {
        match self {
            Self::Us => ".888 888",
            Self::SUs => ":88.888 888",
            Self::SMs => ":88.888",
            Self::S => ":88",
            Self::HrMinS => "88:88:88pm",
            Self::HrMin => "88:88pm",
            Self::Hr => "88pm",
            Self::DayMo => "88/88",
            Self::DayMoHr => "88/88 88pm",
            Self::DayMoHrMin => "88/88 88:88pm",
            Self::DayMoYr => "88/88/88",
            Self::DayMoYrHrMin => "88/88/88 88:88pm",
            Self::DayMoYrHrMinS => "88/88/88 88:88:88pm",
            Self::MoYr => "MMM 8888",
            Self::Mo => "MMM",
            Self::Yr => "8888",
        }
    }
}

/// A timestamp with microsecond resolution: whole seconds since the Unix
/// epoch plus a microsecond remainder normalized into `[0, 1_000_000)`.
///
/// The derived ordering is total and agrees with the combined value because
/// construction always re-normalizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant {
    secs: i64,
    micros: i32,
}

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Instant {
    /// Creates an instant from seconds and (possibly out-of-range or
    /// negative) microseconds, folding the carry into the seconds.
    pub fn new(secs: i64, micros: i64) -> Self {
        let carry = micros.div_euclid(MICROS_PER_SEC);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "rem_euclid keeps the remainder inside [0, 1e6)"
        )]
        let micros = micros.rem_euclid(MICROS_PER_SEC) as i32;
        Self {
            secs: secs + carry,
            micros,
        }
    }

    /// Whole seconds since the Unix epoch.
    pub fn secs(self) -> i64 {
        self.secs
    }

    /// Microsecond remainder, always in `[0, 1_000_000)`.
    pub fn micros(self) -> i32 {
        self.micros
    }

    /// Converts from the `f64` seconds-since-epoch axis coordinate.
    pub fn from_f64(t: f64) -> Self {
        let t = t.clamp(-9.0e15, 9.0e15);
        let whole = t.floor();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "clamped well inside the i64 range"
        )]
        let secs = whole as i64;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "fraction of a second in microseconds"
        )]
        let micros = ((t - whole) * 1.0e6).round() as i64;
        Self::new(secs, micros)
    }

    /// Converts to the `f64` seconds-since-epoch axis coordinate.
    pub fn to_f64(self) -> f64 {
        self.secs as f64 + f64::from(self.micros) * 1.0e-6
    }

    /// Signed distance to an earlier instant, in microseconds.
    fn micros_since(self, earlier: Self) -> i64 {
        (self.secs - earlier.secs) * MICROS_PER_SEC + i64::from(self.micros - earlier.micros)
    }

    fn datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn from_date(date: NaiveDate) -> Self {
        let secs = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        Self { secs, micros: 0 }
    }

    /// The calendar year (UTC) this instant falls in.
    pub fn year(self) -> i32 {
        self.datetime().year()
    }

    /// Midnight, Jan 1 (UTC) of the given year.
    pub fn from_year(year: i32) -> Self {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .map(Self::from_date)
            .unwrap_or_default()
    }

    /// Advances by `count` units.
    ///
    /// Fixed-width units accept any sign. Month steps are calendar month
    /// addition with day-of-month clamped into short months (Jan 31 + 1 month
    /// is the last day of February); year steps advance by the true length of
    /// each year crossed (365 or 366 days). `count` must be non-negative for
    /// month and year steps.
    pub fn add(self, unit: TimeUnit, count: i32) -> Self {
        let count64 = i64::from(count);
        match unit {
            TimeUnit::Microsecond => Self::new(self.secs, i64::from(self.micros) + count64),
            TimeUnit::Millisecond => {
                Self::new(self.secs, i64::from(self.micros) + count64 * 1_000)
            }
            TimeUnit::Second => Self::new(self.secs + count64, i64::from(self.micros)),
            TimeUnit::Minute => Self::new(self.secs + count64 * 60, i64::from(self.micros)),
            TimeUnit::Hour => Self::new(self.secs + count64 * 3_600, i64::from(self.micros)),
            TimeUnit::Day => Self::new(self.secs + count64 * 86_400, i64::from(self.micros)),
            TimeUnit::Month => {
                debug_assert!(count >= 0, "month steps must be non-negative");
                if count <= 0 {
                    return self;
                }
                let dt = self.datetime();
                #[allow(
                    clippy::cast_sign_loss,
                    reason = "count checked non-negative above"
                )]
                let stepped = dt
                    .checked_add_months(Months::new(count as u32))
                    .unwrap_or(dt);
                Self::new(stepped.timestamp(), i64::from(self.micros))
            }
            TimeUnit::Year => {
                debug_assert!(count >= 0, "year steps must be non-negative");
                let mut out = self;
                for _ in 0..count.max(0) {
                    let days = if is_leap_year(out.year()) { 366 } else { 365 };
                    out.secs += days * 86_400;
                }
                out
            }
        }
    }

    /// Rounds down to the start of the enclosing `unit` (UTC).
    pub fn floor(self, unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Microsecond => self,
            TimeUnit::Millisecond => Self {
                secs: self.secs,
                micros: (self.micros / 1_000) * 1_000,
            },
            TimeUnit::Second => Self {
                secs: self.secs,
                micros: 0,
            },
            TimeUnit::Minute => Self {
                secs: self.secs - self.secs.rem_euclid(60),
                micros: 0,
            },
            TimeUnit::Hour => Self {
                secs: self.secs - self.secs.rem_euclid(3_600),
                micros: 0,
            },
            TimeUnit::Day => Self {
                secs: self.secs - self.secs.rem_euclid(86_400),
                micros: 0,
            },
            TimeUnit::Month => {
                let dt = self.datetime();
                NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
                    .map(Self::from_date)
                    .unwrap_or(self)
            }
            TimeUnit::Year => Self::from_year(self.year()),
        }
    }

    /// Rounds up to the start of the next `unit` boundary (UTC). Instants
    /// already on a boundary still advance by one unit.
    pub fn ceil(self, unit: TimeUnit) -> Self {
        self.floor(unit).add(unit, 1)
    }

    /// Rounds to the nearer of the enclosing unit boundaries.
    pub fn round(self, unit: TimeUnit) -> Self {
        let t1 = self.floor(unit);
        let t2 = t1.add(unit, 1);
        if self.micros_since(t1) < t2.micros_since(self) {
            t1
        } else {
            t2
        }
    }

    /// Renders this instant with the given label format (UTC, 12-hour clock).
    pub fn format(self, fmt: TimeFmt) -> String {
        let dt = self.datetime();
        let us = self.micros % 1_000;
        let ms = self.micros / 1_000;
        let sec = dt.second();
        let min = dt.minute();
        let hour24 = dt.hour();
        let ap = if hour24 < 12 { "am" } else { "pm" };
        let hr = if hour24 == 0 || hour24 == 12 {
            12
        } else {
            hour24 % 12
        };
        let day = dt.day();
        let mon = dt.month();
        let year = dt.year();
        let yr = year.rem_euclid(100);
        let mname = MONTH_NAMES[(mon as usize) - 1];

        match fmt {
            TimeFmt::Us => format!(".{ms:03} {us:03}"),
            TimeFmt::SUs => format!(":{sec:02}.{ms:03} {us:03}"),
            TimeFmt::SMs => format!(":{sec:02}.{ms:03}"),
            TimeFmt::S => format!(":{sec:02}"),
            TimeFmt::HrMinS => format!("{hr}:{min:02}:{sec:02}{ap}"),
            TimeFmt::HrMin => format!("{hr}:{min:02}{ap}"),
            TimeFmt::Hr => format!("{hr}{ap}"),
            TimeFmt::DayMo => format!("{mon}/{day}"),
            TimeFmt::DayMoHr => format!("{mon}/{day} {hr}{ap}"),
            TimeFmt::DayMoHrMin => format!("{mon}/{day} {hr}:{min:02}{ap}"),
            TimeFmt::DayMoYr => format!("{mon}/{day}/{yr:02}"),
            TimeFmt::DayMoYrHrMin => format!("{mon}/{day}/{yr:02} {hr}:{min:02}{ap}"),
            TimeFmt::DayMoYrHrMinS => {
                format!("{mon}/{day}/{yr:02} {hr}:{min:02}:{sec:02}{ap}")
            }
            TimeFmt::MoYr => format!("{mname} {year}"),
            TimeFmt::Mo => String::from(mname),
            TimeFmt::Yr => format!("{year}"),
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> Instant {
        Instant::from_date(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    #[test]
    fn micros_normalize_in_both_directions() {
        let t = Instant::new(10, 2_500_000);
        assert_eq!((t.secs(), t.micros()), (12, 500_000));
        let t = Instant::new(10, -1);
        assert_eq!((t.secs(), t.micros()), (9, 999_999));
    }

    #[test]
    fn f64_round_trip_is_microsecond_exact_for_decades() {
        // ~2021, with a microsecond remainder
        let t = Instant::new(1_609_459_200, 123_456);
        let back = Instant::from_f64(t.to_f64());
        assert!((back.micros_since(t)).abs() <= 1);
    }

    #[test]
    fn month_add_lands_in_february_with_true_day_count() {
        let jan31 = ymd(2024, 1, 31);
        let stepped = jan31.add(TimeUnit::Month, 1);
        let dt = stepped.datetime();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 29));

        // non-leap year clamps to the 28th
        let stepped = ymd(2023, 1, 31).add(TimeUnit::Month, 1);
        let dt = stepped.datetime();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 2, 28));

        // a first-of-month start advances by the full month
        let stepped = ymd(2024, 1, 1).add(TimeUnit::Month, 1);
        let dt = stepped.datetime();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 1));
    }

    #[test]
    fn year_add_is_leap_sensitive() {
        let leap = ymd(2024, 1, 1).add(TimeUnit::Year, 1);
        let plain = ymd(2023, 1, 1).add(TimeUnit::Year, 1);
        let leap_days = (leap.secs() - ymd(2024, 1, 1).secs()) / 86_400;
        let plain_days = (plain.secs() - ymd(2023, 1, 1).secs()) / 86_400;
        assert_eq!(leap_days, 366);
        assert_eq!(plain_days, 365);
        assert_eq!(leap.year(), 2025);
        assert_eq!(plain.year(), 2024);
    }

    #[test]
    fn floor_hits_unit_starts() {
        let t = Instant::new(1_609_459_200 + 3 * 3_600 + 42 * 60 + 7, 123);
        assert_eq!(
            t.floor(TimeUnit::Minute).secs(),
            1_609_459_200 + 3 * 3_600 + 42 * 60
        );
        assert_eq!(t.floor(TimeUnit::Hour).secs(), 1_609_459_200 + 3 * 3_600);
        assert_eq!(t.floor(TimeUnit::Day).secs(), 1_609_459_200);
        let m = t.floor(TimeUnit::Month).datetime();
        assert_eq!((m.month(), m.day()), (1, 1));
        assert_eq!(t.floor(TimeUnit::Year).year(), 2021);
    }

    #[test]
    fn ceil_always_advances() {
        let aligned = Instant::new(60, 0);
        assert_eq!(aligned.ceil(TimeUnit::Minute).secs(), 120);
    }

    #[test]
    fn round_picks_nearer_boundary() {
        let t = Instant::new(89, 0);
        assert_eq!(t.round(TimeUnit::Minute).secs(), 60);
        let t = Instant::new(91, 0);
        assert_eq!(t.round(TimeUnit::Minute).secs(), 120);
    }

    #[test]
    fn unit_for_span_buckets() {
        assert_eq!(TimeUnit::for_span(0.5), TimeUnit::Millisecond);
        assert_eq!(TimeUnit::for_span(30.0), TimeUnit::Second);
        assert_eq!(TimeUnit::for_span(1_800.0), TimeUnit::Minute);
        assert_eq!(TimeUnit::for_span(40_000.0), TimeUnit::Hour);
        assert_eq!(TimeUnit::for_span(1.0e9), TimeUnit::Year);
    }

    #[test]
    fn hour_steps_follow_division_table() {
        assert_eq!(TimeUnit::Hour.step_for_divs(1), 0);
        assert_eq!(TimeUnit::Hour.step_for_divs(2), 12);
        assert_eq!(TimeUnit::Hour.step_for_divs(5), 6);
        assert_eq!(TimeUnit::Hour.step_for_divs(12), 2);
        assert_eq!(TimeUnit::Hour.step_for_divs(100), 1);
    }

    #[test]
    fn formats_use_twelve_hour_clock() {
        // 2021-01-01 19:21:29 UTC
        let t = Instant::new(1_609_528_889, 0);
        assert_eq!(t.format(TimeFmt::HrMinS), "7:21:29pm");
        assert_eq!(t.format(TimeFmt::HrMin), "7:21pm");
        assert_eq!(t.format(TimeFmt::DayMo), "1/1");
        assert_eq!(t.format(TimeFmt::DayMoYr), "1/1/21");
        assert_eq!(t.format(TimeFmt::MoYr), "Jan 2021");
        assert_eq!(t.format(TimeFmt::Yr), "2021");
        // midnight renders as 12am
        let t = Instant::new(1_609_459_200, 0);
        assert_eq!(t.format(TimeFmt::Hr), "12am");
    }
}
