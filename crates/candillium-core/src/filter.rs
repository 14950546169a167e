use tracing::trace;

use crate::datetime::interview_sort_key;
use crate::model::Candidate;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum SortDirection {
  /// Oldest interview first.
  #[default]
  Ascending,
  /// Newest interview first.
  Descending
}

impl SortDirection {
  #[must_use]
  pub fn toggled(self) -> Self {
    match self {
      | SortDirection::Ascending => {
        SortDirection::Descending
      }
      | SortDirection::Descending => {
        SortDirection::Ascending
      }
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | SortDirection::Ascending => {
        "Sort by Date (Oldest first)"
      }
      | SortDirection::Descending => {
        "Sort by Date (Newest first)"
      }
    }
  }
}

/// Case-insensitive substring match on
/// the candidate name.
///
/// An empty search matches everything,
/// nameless candidates included; a
/// non-empty search never matches a
/// nameless candidate.
pub fn name_matches(
  candidate: &Candidate,
  folded_search: &str
) -> bool {
  if folded_search.is_empty() {
    return true;
  }

  candidate
    .name
    .as_deref()
    .map(|name| {
      name
        .to_lowercase()
        .contains(folded_search)
    })
    .unwrap_or(false)
}

/// Filter then sort, recomputed on
/// every call. O(n log n) in the
/// collection size; the sort is stable
/// so ties keep fetched order.
#[tracing::instrument(
  level = "trace",
  skip(candidates)
)]
pub fn visible_candidates<'a>(
  candidates: &'a [Candidate],
  search: &str,
  direction: SortDirection
) -> Vec<&'a Candidate> {
  let folded = search.to_lowercase();

  let mut visible: Vec<&Candidate> =
    candidates
      .iter()
      .filter(|candidate| {
        name_matches(
          candidate, &folded
        )
      })
      .collect();

  visible.sort_by(|a, b| {
    let a_key = interview_sort_key(
      a.last_interview.as_deref()
    );
    let b_key = interview_sort_key(
      b.last_interview.as_deref()
    );
    match direction {
      | SortDirection::Ascending => {
        a_key.cmp(&b_key)
      }
      | SortDirection::Descending => {
        b_key.cmp(&a_key)
      }
    }
  });

  trace!(
    total = candidates.len(),
    visible = visible.len(),
    "derived candidate view"
  );
  visible
}

#[cfg(test)]
mod tests {
  use super::{
    SortDirection,
    visible_candidates
  };
  use crate::model::Candidate;

  fn candidate(
    name: Option<&str>,
    last_interview: Option<&str>
  ) -> Candidate {
    Candidate {
      id: name
        .unwrap_or("anon")
        .to_string(),
      name: name.map(str::to_string),
      last_interview: last_interview
        .map(str::to_string),
      recruiter: Some(
        "r@x.io".to_string()
      )
    }
  }

  fn names(
    view: &[&Candidate]
  ) -> Vec<String> {
    view
      .iter()
      .map(|c| {
        c.name
          .clone()
          .unwrap_or_default()
      })
      .collect()
  }

  #[test]
  fn search_is_case_insensitive() {
    let all = vec![
      candidate(
        Some("Alice Johnson"),
        Some("2023-06-15")
      ),
      candidate(
        Some("Bob Smith"),
        Some("2023-06-14")
      ),
      candidate(
        Some("Charlie Brown"),
        Some("2023-06-13")
      ),
    ];

    let view = visible_candidates(
      &all,
      "JOHN",
      SortDirection::Ascending
    );
    assert_eq!(
      names(&view),
      vec!["Alice Johnson"]
    );

    let view = visible_candidates(
      &all,
      "o",
      SortDirection::Descending
    );
    assert_eq!(
      names(&view),
      vec![
        "Alice Johnson",
        "Bob Smith",
        "Charlie Brown"
      ]
    );
  }

  #[test]
  fn ascending_puts_missing_dates_first()
   {
    let all = vec![
      candidate(
        Some("Dated"),
        Some("2023-06-12")
      ),
      candidate(Some("Undated"), None),
      candidate(
        Some("Garbled"),
        Some("soon")
      ),
    ];

    let view = visible_candidates(
      &all,
      "",
      SortDirection::Ascending
    );
    assert_eq!(
      names(&view),
      vec!["Undated", "Garbled", "Dated"]
    );

    let view = visible_candidates(
      &all,
      "",
      SortDirection::Descending
    );
    assert_eq!(
      names(&view)[0],
      "Dated"
    );
  }

  #[test]
  fn nameless_only_visible_without_search()
   {
    let all = vec![
      candidate(None, Some("2023-01-01")),
      candidate(
        Some("Edward Norton"),
        Some("2023-06-11")
      ),
    ];

    assert_eq!(
      visible_candidates(
        &all,
        "",
        SortDirection::Ascending
      )
      .len(),
      2
    );
    assert_eq!(
      visible_candidates(
        &all,
        "e",
        SortDirection::Ascending
      )
      .len(),
      1
    );
  }

  #[test]
  fn toggle_flips_label() {
    let dir = SortDirection::default();
    assert_eq!(
      dir.label(),
      "Sort by Date (Oldest first)"
    );
    assert_eq!(
      dir.toggled().label(),
      "Sort by Date (Newest first)"
    );
    assert_eq!(
      dir.toggled().toggled(),
      dir
    );
  }
}
