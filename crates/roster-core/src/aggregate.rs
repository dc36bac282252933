//! Monthly signup histogram.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::record::SubscriberRecord;

/// Number of subscribers created in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
  /// `YYYY-MM`, zero padded.
  pub month: String,
  pub count: usize,
}

/// `YYYY-MM` key for `date`.
pub fn month_key(date: NaiveDate) -> String {
  date.format("%Y-%m").to_string()
}

/// Count records per creation month, ascending by month key.
///
/// Always run over the whole record store, never the filtered view. Records
/// without a parseable creation timestamp are left out of the counts.
pub fn aggregate(records: &[SubscriberRecord]) -> Vec<MonthBucket> {
  let mut counts: BTreeMap<String, usize> = BTreeMap::new();
  for record in records {
    match record.created_date() {
      Some(date) => *counts.entry(month_key(date)).or_insert(0) += 1,
      None => debug!(
        id = %record.id,
        created_at = ?record.created_at,
        "excluding subscriber with unparseable creation time from monthly counts"
      ),
    }
  }
  counts
    .into_iter()
    .map(|(month, count)| MonthBucket { month, count })
    .collect()
}

#[cfg(test)]
mod tests {
  use quickcheck_macros::quickcheck;

  use super::*;
  use crate::record::SubscriberId;

  fn created(id: i64, created_at: Option<&str>) -> SubscriberRecord {
    SubscriberRecord {
      id:         SubscriberId::Numeric(id),
      first_name: "F".into(),
      last_name:  "L".into(),
      name:       None,
      email:      "f@l".into(),
      phone:      None,
      created_at: created_at.map(str::to_owned),
    }
  }

  fn bucket(month: &str, count: usize) -> MonthBucket {
    MonthBucket { month: month.into(), count }
  }

  #[test]
  fn empty_store_has_no_buckets() {
    assert!(aggregate(&[]).is_empty());
  }

  #[test]
  fn buckets_are_sorted_by_month() {
    let records = vec![
      created(1, Some("2024-02-02")),
      created(2, Some("2023-12-31T23:59:59")),
      created(3, Some("2024-01-20")),
      created(4, Some("2024-01-05")),
    ];
    assert_eq!(
      aggregate(&records),
      vec![bucket("2023-12", 1), bucket("2024-01", 2), bucket("2024-02", 1)]
    );
  }

  #[test]
  fn unparseable_and_missing_timestamps_are_excluded() {
    let records = vec![
      created(1, Some("2024-01-05")),
      created(2, Some("not a date")),
      created(3, None),
      created(4, Some("2024-01-09T12:00:00Z")),
    ];
    assert_eq!(aggregate(&records), vec![bucket("2024-01", 2)]);
  }

  #[quickcheck]
  fn counts_sum_to_parseable_records(days: Vec<(u16, u8, u8)>, junk: u8) -> bool {
    let mut records: Vec<_> = days
      .iter()
      .enumerate()
      .map(|(i, (y, m, d))| {
        let stamp = format!("{:04}-{:02}-{:02}", 1970 + y % 100, m % 13, d % 32);
        created(i as i64, Some(&stamp))
      })
      .collect();
    for j in 0..junk % 4 {
      records.push(created(10_000 + i64::from(j), Some("garbage")));
    }

    let parseable = records.iter().filter(|r| r.created_date().is_some()).count();
    let buckets = aggregate(&records);
    let sorted = buckets.windows(2).all(|w| w[0].month < w[1].month);
    sorted && buckets.iter().map(|b| b.count).sum::<usize>() == parseable
  }
}
