//! Free-text search over the record store.

use crate::record::SubscriberRecord;

/// Whether `record` matches an already case-folded query. Only first name,
/// last name and email take part; phone and id never match.
pub fn matches(record: &SubscriberRecord, folded_query: &str) -> bool {
  folded_query.is_empty()
    || record.first_name.to_lowercase().contains(folded_query)
    || record.last_name.to_lowercase().contains(folded_query)
    || record.email.to_lowercase().contains(folded_query)
}

/// The order-preserving subsequence of `records` matching `query`. An empty
/// query yields every record.
pub fn derive_filtered_view(
  records: &[SubscriberRecord],
  query: &str,
) -> Vec<SubscriberRecord> {
  if query.is_empty() {
    return records.to_vec();
  }
  let folded = query.to_lowercase();
  records
    .iter()
    .filter(|r| matches(r, &folded))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use quickcheck_macros::quickcheck;

  use super::*;
  use crate::record::SubscriberId;

  fn record(id: i64, first: &str, last: &str, email: &str) -> SubscriberRecord {
    SubscriberRecord {
      id:         SubscriberId::Numeric(id),
      first_name: first.into(),
      last_name:  last.into(),
      name:       None,
      email:      email.into(),
      phone:      Some("555-0199".into()),
      created_at: None,
    }
  }

  fn records(rows: Vec<(String, String, String)>) -> Vec<SubscriberRecord> {
    rows
      .into_iter()
      .enumerate()
      .map(|(i, (f, l, e))| record(i as i64, &f, &l, &e))
      .collect()
  }

  #[test]
  fn case_insensitive_on_each_field() {
    let all = vec![
      record(1, "Ann", "Lee", "a@x.com"),
      record(2, "Bob", "NG", "b@x.com"),
      record(3, "Cid", "Ng", "c@EXAMPLE.org"),
    ];
    let ids = |q: &str| -> Vec<i64> {
      derive_filtered_view(&all, q)
        .iter()
        .map(|r| match r.id {
          SubscriberId::Numeric(n) => n,
          SubscriberId::Text(_) => unreachable!(),
        })
        .collect()
    };

    assert_eq!(ids("ann"), vec![1]);
    assert_eq!(ids("nG"), vec![2, 3]);
    assert_eq!(ids("example"), vec![3]);
    assert_eq!(ids("zzz"), Vec::<i64>::new());
  }

  #[test]
  fn phone_and_id_are_not_searched() {
    let all = vec![record(555, "Ann", "Lee", "a@x.com")];
    assert!(derive_filtered_view(&all, "555").is_empty());
  }

  #[quickcheck]
  fn empty_query_is_identity(rows: Vec<(String, String, String)>) -> bool {
    let all = records(rows);
    derive_filtered_view(&all, "") == all
  }

  #[quickcheck]
  fn filter_is_exact_and_order_preserving(
    rows: Vec<(String, String, String)>,
    query: String,
  ) -> bool {
    let all = records(rows);
    let view = derive_filtered_view(&all, &query);
    let q = query.to_lowercase();
    let hit = |r: &SubscriberRecord| {
      r.first_name.to_lowercase().contains(&q)
        || r.last_name.to_lowercase().contains(&q)
        || r.email.to_lowercase().contains(&q)
    };

    let expected: Vec<_> = all.iter().filter(|r| hit(r)).cloned().collect();
    view == expected && all.iter().filter(|r| !hit(r)).all(|r| !view.contains(r))
  }
}
