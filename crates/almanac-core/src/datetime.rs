use std::sync::OnceLock;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::{
  CalendarError,
  Result
};

pub const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";

/// The boundary of a range being
/// dragged during a resize gesture.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
  Left,
  Right
}

/// Inclusive whole-day range.
/// Constructors keep `start <= end`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
pub struct DateRange {
  #[serde(with = "iso_date_serde")]
  pub start: NaiveDate,
  #[serde(with = "iso_date_serde")]
  pub end:   NaiveDate
}

impl DateRange {
  #[must_use]
  pub fn new(
    a: NaiveDate,
    b: NaiveDate
  ) -> Self {
    let (start, end) = clamp(a, b);
    Self {
      start,
      end
    }
  }

  #[must_use]
  pub fn single(
    day: NaiveDate
  ) -> Self {
    Self {
      start: day,
      end:   day
    }
  }

  #[must_use]
  pub fn duration_days(&self) -> i64 {
    duration_days(self.start, self.end)
  }

  #[must_use]
  pub fn contains(
    &self,
    day: NaiveDate
  ) -> bool {
    is_within_range(day, *self)
  }
}

impl std::fmt::Display for DateRange {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    write!(
      f,
      "{}..{}",
      format_iso(self.start),
      format_iso(self.end)
    )
  }
}

#[must_use]
pub fn format_iso(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

fn iso_date_regex()
-> &'static std::result::Result<
  Regex,
  regex::Error
> {
  static ISO_RE: OnceLock<
    std::result::Result<
      Regex,
      regex::Error
    >
  > = OnceLock::new();
  ISO_RE.get_or_init(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$")
  })
}

pub fn parse_iso(
  raw: &str
) -> Result<NaiveDate> {
  let token = raw.trim();
  let iso_re = iso_date_regex()
    .as_ref()
    .map_err(|e| {
      CalendarError::validation(
        format!(
          "internal regex compile \
           failure: {e}"
        )
      )
    })?;
  if !iso_re.is_match(token) {
    return Err(
      CalendarError::validation(
        format!(
          "expected YYYY-MM-DD, got: \
           {raw}"
        )
      )
    );
  }

  NaiveDate::parse_from_str(
    token,
    ISO_DATE_FORMAT
  )
  .map_err(|e| {
    CalendarError::validation(format!(
      "invalid calendar date {raw}: \
       {e}"
    ))
  })
}

/// Days shown for the month of
/// `anchor`: whole weeks from the week
/// holding the 1st through the week
/// holding the last day.
#[must_use]
pub fn month_grid(
  anchor: NaiveDate,
  week_start: Weekday
) -> Vec<NaiveDate> {
  let first = first_day_of_month(
    anchor.year(),
    anchor.month()
  );
  let last = last_day_of_month(
    anchor.year(),
    anchor.month()
  );
  let grid_start =
    start_of_week(first, week_start);
  let grid_end = add_days(
    start_of_week(last, week_start),
    6
  );

  grid_start
    .iter_days()
    .take_while(|day| *day <= grid_end)
    .collect()
}

#[must_use]
pub fn is_within_range(
  date: NaiveDate,
  range: DateRange
) -> bool {
  date >= range.start
    && date <= range.end
}

pub fn is_within_iso_range(
  date: NaiveDate,
  start_iso: &str,
  end_iso: &str
) -> Result<bool> {
  let start = parse_iso(start_iso)?;
  let end = parse_iso(end_iso)?;
  Ok(date >= start && date <= end)
}

#[must_use]
pub fn clamp(
  a: NaiveDate,
  b: NaiveDate
) -> (NaiveDate, NaiveDate) {
  if a > b { (b, a) } else { (a, b) }
}

#[must_use]
pub fn duration_days(
  start: NaiveDate,
  end: NaiveDate
) -> i64 {
  end
    .signed_duration_since(start)
    .num_days()
    .abs()
    + 1
}

pub fn duration_days_iso(
  start_iso: &str,
  end_iso: &str
) -> Result<i64> {
  Ok(duration_days(
    parse_iso(start_iso)?,
    parse_iso(end_iso)?
  ))
}

#[must_use]
pub fn move_keeping_length(
  new_start: NaiveDate,
  current: DateRange
) -> DateRange {
  let len = current.duration_days();
  DateRange {
    start: new_start,
    end:   add_days(new_start, len - 1)
  }
}

/// Replaces one boundary with `drop`.
/// Crossing the opposite boundary flips
/// the range rather than failing.
#[must_use]
pub fn set_edge(
  edge: Edge,
  drop: NaiveDate,
  current: DateRange
) -> DateRange {
  match edge {
    | Edge::Left => {
      DateRange::new(drop, current.end)
    }
    | Edge::Right => {
      DateRange::new(
        current.start,
        drop
      )
    }
  }
}

#[must_use]
pub fn case_insensitive_contains(
  haystack: &str,
  needle: &str
) -> bool {
  if needle.is_empty() {
    return true;
  }
  haystack
    .to_lowercase()
    .contains(&needle.to_lowercase())
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  match NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  ) {
    | Some(next_first) => {
      add_days(next_first, -1)
    }
    | None => NaiveDate::MAX
  }
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

/// Adds whole days, pinning to chrono's
/// representable bounds on overflow.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  match Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    }) {
    | Some(shifted) => shifted,
    | None if days < 0 => NaiveDate::MIN,
    | None => NaiveDate::MAX
  }
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let total = date.year() as i64 * 12
    + (date.month0() as i64)
    + months as i64;
  let Ok(year) =
    i32::try_from(total.div_euclid(12))
  else {
    return date;
  };
  let month =
    total.rem_euclid(12) as u32 + 1;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

#[must_use]
pub fn week_start_from_name(
  raw: &str
) -> Option<Weekday> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | _ => None
  }
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

/// Resolves a day expression relative to
/// `today`: `today`, `tomorrow`,
/// `yesterday`, `+Nd`, `-Nw`, or
/// `YYYY-MM-DD`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_day_expr(
  input: &str,
  today: NaiveDate
) -> Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$"
  )
  .map_err(|e| {
    CalendarError::validation(format!(
      "internal regex compile \
       failure: {e}"
    ))
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let num: i64 = caps["num"]
      .parse()
      .map_err(|_| {
        CalendarError::validation(
          format!(
            "relative offset out of \
             range: {input}"
          )
        )
      })?;
    let days = match &caps["unit"] {
      | "w" => num.saturating_mul(7),
      | _ => num
    };
    return Ok(
      if &caps["sign"] == "-" {
        add_days(today, -days)
      } else {
        add_days(today, days)
      }
    );
  }

  parse_iso(token).map_err(|_| {
    CalendarError::validation(format!(
      "unrecognized day expression: \
       {input} (supported: \
       today/tomorrow/yesterday, \
       +Nd/-Nd, +Nw/-Nw, YYYY-MM-DD)"
    ))
  })
}

pub mod iso_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &super::format_iso(*date)
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_iso(&raw)
      .map_err(serde::de::Error::custom)
  }

  pub mod option {
    use chrono::NaiveDate;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      date: &Option<NaiveDate>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match date {
        | Some(value) => {
          super::serialize(
            value, serializer
          )
        }
        | None => {
          serializer.serialize_none()
        }
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<
      Option<NaiveDate>,
      D::Error
    >
    where
      D: Deserializer<'de>
    {
      let opt =
        Option::<String>::deserialize(
          deserializer
        )?;
      match opt {
        | Some(raw) => {
          crate::datetime::parse_iso(
            &raw
          )
          .map(Some)
          .map_err(
            serde::de::Error::custom
          )
        }
        | None => Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate,
    Weekday
  };

  use super::*;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn iso_round_trip_across_two_centuries()
   {
    let mut cursor = day(1900, 1, 1);
    let last = day(2100, 12, 31);
    while cursor <= last {
      let text = format_iso(cursor);
      assert_eq!(text.len(), 10);
      assert_eq!(
        parse_iso(&text)
          .expect("parse back"),
        cursor
      );
      cursor = add_days(cursor, 1);
    }
  }

  #[test]
  fn parse_iso_rejects_loose_forms() {
    assert!(parse_iso("2024-6-1").is_err());
    assert!(
      parse_iso("2024-02-30").is_err()
    );
    assert!(
      parse_iso("June 10").is_err()
    );
    assert_eq!(
      parse_iso(" 2024-06-10 ")
        .expect("trimmed"),
      day(2024, 6, 10)
    );
  }

  #[test]
  fn iso_regex_is_compiled_once() {
    let first = iso_date_regex();
    parse_iso("2024-06-10")
      .expect("parse");
    assert!(std::ptr::eq(
      first,
      iso_date_regex()
    ));
    assert!(first.is_ok());
  }

  #[test]
  fn month_grid_covers_month_in_whole_weeks()
   {
    for year in 1900..=2100 {
      for month in 1..=12 {
        let anchor = day(year, month, 15);
        for week_start in
          [Weekday::Sun, Weekday::Mon]
        {
          let grid =
            month_grid(anchor, week_start);
          assert_eq!(grid.len() % 7, 0);
          assert_eq!(
            grid[0].weekday(),
            week_start
          );
          for d in 1..=days_in_month(
            year, month
          ) {
            assert!(grid.contains(&day(
              year, month, d
            )));
          }
        }
      }
    }
  }

  #[test]
  fn month_grid_for_june_2024_starts_sunday()
   {
    let grid = month_grid(
      day(2024, 6, 10),
      Weekday::Sun
    );
    assert_eq!(grid.len(), 42);
    assert_eq!(grid[0], day(2024, 5, 26));
    assert_eq!(
      grid[41],
      day(2024, 7, 6)
    );
  }

  #[test]
  fn month_grid_is_four_weeks_when_month_fits()
   {
    let grid = month_grid(
      day(2015, 2, 1),
      Weekday::Sun
    );
    assert_eq!(grid.len(), 28);
    assert_eq!(grid[0], day(2015, 2, 1));
  }

  #[test]
  fn clamp_orders_and_is_idempotent() {
    let a = day(2024, 6, 12);
    let b = day(2024, 6, 10);
    let (x, y) = clamp(a, b);
    assert_eq!((x, y), (b, a));
    assert_eq!(clamp(x, y), (x, y));
    assert_eq!(clamp(a, a), (a, a));
  }

  #[test]
  fn duration_is_inclusive_and_symmetric()
   {
    let s = day(2024, 6, 10);
    let e = day(2024, 6, 12);
    assert_eq!(duration_days(s, e), 3);
    assert_eq!(duration_days(e, s), 3);
    assert_eq!(duration_days(s, s), 1);
    assert_eq!(
      duration_days_iso(
        "2024-02-28",
        "2024-03-01"
      )
      .expect("valid"),
      3
    );
  }

  #[test]
  fn within_range_is_inclusive() {
    let range = DateRange::new(
      day(2024, 6, 10),
      day(2024, 6, 12)
    );
    assert!(range.contains(day(2024, 6, 10)));
    assert!(range.contains(day(2024, 6, 12)));
    assert!(!range.contains(day(2024, 6, 13)));
    assert!(
      is_within_iso_range(
        day(2024, 6, 11),
        "2024-06-10",
        "2024-06-12"
      )
      .expect("valid")
    );
  }

  #[test]
  fn move_keeps_length_across_month_end()
   {
    let current = DateRange::new(
      day(2024, 6, 10),
      day(2024, 6, 12)
    );
    let moved = move_keeping_length(
      day(2024, 6, 29),
      current
    );
    assert_eq!(moved.start, day(2024, 6, 29));
    assert_eq!(moved.end, day(2024, 7, 1));
    assert_eq!(
      moved.duration_days(),
      current.duration_days()
    );
  }

  #[test]
  fn set_edge_inverts_when_crossing() {
    let current = DateRange::new(
      day(2024, 6, 10),
      day(2024, 6, 12)
    );
    let left = set_edge(
      Edge::Left,
      day(2024, 6, 20),
      current
    );
    assert_eq!(left.start, day(2024, 6, 12));
    assert_eq!(left.end, day(2024, 6, 20));

    let right = set_edge(
      Edge::Right,
      day(2024, 6, 1),
      current
    );
    assert_eq!(right.start, day(2024, 6, 1));
    assert_eq!(right.end, day(2024, 6, 10));

    let shrink = set_edge(
      Edge::Right,
      day(2024, 6, 11),
      current
    );
    assert_eq!(shrink.end, day(2024, 6, 11));
  }

  #[test]
  fn contains_ignores_case() {
    assert!(case_insensitive_contains(
      "Design Review",
      "DESIGN"
    ));
    assert!(case_insensitive_contains(
      "Design Review",
      ""
    ));
    assert!(!case_insensitive_contains(
      "Budget", "design"
    ));
  }

  #[test]
  fn shift_months_clamps_day() {
    assert_eq!(
      shift_months(day(2024, 1, 31), 1),
      day(2024, 2, 29)
    );
    assert_eq!(
      shift_months(day(2024, 1, 15), -1),
      day(2023, 12, 15)
    );
    assert_eq!(
      shift_months(day(2024, 11, 30), 14),
      day(2026, 1, 30)
    );
  }

  #[test]
  fn parses_day_expressions() {
    let today = day(2024, 6, 10);
    assert_eq!(
      parse_day_expr("today", today)
        .expect("today"),
      today
    );
    assert_eq!(
      parse_day_expr("tomorrow", today)
        .expect("tomorrow"),
      day(2024, 6, 11)
    );
    assert_eq!(
      parse_day_expr("+3d", today)
        .expect("offset"),
      day(2024, 6, 13)
    );
    assert_eq!(
      parse_day_expr("-2w", today)
        .expect("weeks"),
      day(2024, 5, 27)
    );
    assert_eq!(
      parse_day_expr("2025-01-01", today)
        .expect("iso"),
      day(2025, 1, 1)
    );
    assert!(
      parse_day_expr("someday", today)
        .is_err()
    );
  }
}
