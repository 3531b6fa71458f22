//! The list query pipeline: tab, search, categorical filters, sort, paginate.
//!
//! `run_query` is pure. It borrows the collection and returns references into
//! it, so the caller's cache stays the single owner of the records.
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::query::{QueryState, ALL};

/// Value of a categorical field on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetValue<'a> {
    /// Scalar field, matched by equality.
    One(&'a str),
    /// Array field (or a set of derived labels), matched by membership.
    Many(Vec<&'a str>),
}

impl FacetValue<'_> {
    pub fn matches(&self, wanted: &str) -> bool {
        match self {
            FacetValue::One(value) => *value == wanted,
            FacetValue::Many(values) => values.iter().any(|v| *v == wanted),
        }
    }
}

/// A record that can be shown in a list view.
pub trait Listable {
    /// Named tabs this record type recognizes, "all" first.
    const TABS: &'static [&'static str];

    fn id(&self) -> &str;

    /// Primary timestamp; newer sorts first.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Domain priority; higher sorts first, ahead of the timestamp.
    fn priority(&self) -> i64 {
        0
    }

    /// Fields the free-text search looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// `None` when the record has no such field, which fails any active
    /// filter on it.
    fn facet(&self, name: &str) -> Option<FacetValue<'_>>;

    /// Only called for tabs listed in `TABS` other than "all".
    fn in_tab(&self, tab: &str, now: DateTime<Utc>) -> bool;
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage<'a, T> {
    pub items: Vec<&'a T>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

impl<'a, T: Listable> QueryPage<'a, T> {
    /// Ids borrow the collection, so they outlive the page value.
    pub fn ids(&self) -> Vec<&'a str> {
        self.items.iter().map(|&item| item.id()).collect()
    }
}

/// `ceil(total / per_page)`, never less than 1.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(per_page).max(1)
}

/// Index range of `page` (1-based) within `total` items. Pages past the end
/// yield an empty range.
pub fn page_range(total: usize, per_page: usize, page: usize) -> Range<usize> {
    let start = page
        .max(1)
        .saturating_sub(1)
        .saturating_mul(per_page)
        .min(total);
    let end = start.saturating_add(per_page).min(total);
    start..end
}

pub fn run_query<'a, T: Listable>(
    items: &'a [T],
    state: &QueryState,
    now: DateTime<Utc>,
) -> QueryPage<'a, T> {
    let tab = state.active_tab();
    let tab_applies = tab != ALL && T::TABS.contains(&tab);
    let needle = state.search_term().to_lowercase();

    let mut matched: Vec<&T> = items
        .iter()
        .filter(|item| !tab_applies || item.in_tab(tab, now))
        .filter(|item| matches_search(*item, &needle))
        .filter(|item| {
            state
                .filters()
                .all(|(name, wanted)| item.facet(name).is_some_and(|f| f.matches(wanted)))
        })
        .collect();

    matched.sort_by(|a, b| compare(*a, *b));

    let per_page = state.items_per_page().get();
    let total_count = matched.len();
    let range = page_range(total_count, per_page, state.current_page());
    let page_items = matched.drain(range).collect();

    trace!(
        tab,
        search = %needle,
        filters = state.filters().count(),
        total_count,
        page = state.current_page(),
        "list query"
    );

    QueryPage {
        items: page_items,
        total_count,
        total_pages: total_pages(total_count, per_page),
        current_page: state.current_page(),
        items_per_page: per_page,
    }
}

/// Distinct values of a facet across the collection, sorted. Feeds filter
/// menus whose options come from the data (emergency types, services).
pub fn facet_options<T: Listable>(items: &[T], name: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    for item in items {
        match item.facet(name) {
            Some(FacetValue::One(value)) => {
                seen.insert(value);
            }
            Some(FacetValue::Many(values)) => seen.extend(values),
            None => {}
        }
    }
    seen.into_iter()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Priority desc, timestamp desc, id asc. Total, so the order never depends
/// on the input order.
fn compare<T: Listable>(a: &T, b: &T) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| b.timestamp().cmp(&a.timestamp()))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ItemsPerPage;
    use chrono::{Duration, TimeZone};

    struct Row {
        id: String,
        name: String,
        kind: &'static str,
        tags: Vec<&'static str>,
        rank: i64,
        at: DateTime<Utc>,
    }

    impl Listable for Row {
        const TABS: &'static [&'static str] = &["all", "ranked"];

        fn id(&self) -> &str {
            &self.id
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.at
        }

        fn priority(&self) -> i64 {
            self.rank
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![&self.name]
        }

        fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
            match name {
                "kind" => Some(FacetValue::One(self.kind)),
                "tag" => Some(FacetValue::Many(self.tags.clone())),
                _ => None,
            }
        }

        fn in_tab(&self, tab: &str, _now: DateTime<Utc>) -> bool {
            tab == "ranked" && self.rank > 0
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row {
                id: format!("r{i:03}"),
                name: format!("Row {i}"),
                kind: if i % 2 == 0 { "even" } else { "odd" },
                tags: if i % 3 == 0 { vec!["fizz", "x"] } else { vec!["x"] },
                rank: (i % 4) as i64,
                at: base() + Duration::minutes(i as i64),
            })
            .collect()
    }

    fn state_with(per_page: usize, page: usize) -> QueryState {
        let mut state = QueryState::new();
        state.set_items_per_page(ItemsPerPage::try_from(per_page).unwrap());
        state.go_to_page(page, usize::MAX);
        state
    }

    #[test]
    fn paging_metadata_holds_for_all_sizes() {
        for n in [0usize, 1, 4, 5, 9, 10, 11, 25, 49, 101] {
            let data = rows(n);
            for per_page in ItemsPerPage::ALLOWED {
                for page in 1..=25 {
                    let result = run_query(&data, &state_with(per_page, page), base());
                    assert_eq!(result.total_count, n);
                    assert_eq!(result.total_pages, n.div_ceil(per_page).max(1));
                    assert!(result.items.len() <= per_page);

                    let before = (page - 1) * per_page;
                    let expected = n.saturating_sub(before).min(per_page);
                    assert_eq!(result.items.len(), expected, "n={n} per_page={per_page} page={page}");
                }
            }
        }
    }

    #[test]
    fn same_input_same_page() {
        let data = rows(37);
        let mut state = state_with(10, 2);
        state.set_filter("tag", "x");
        let first = run_query(&data, &state, base());
        let second = run_query(&data, &state, base());
        assert_eq!(first.ids(), second.ids());
    }

    #[test]
    fn sort_is_priority_then_newest_then_id() {
        let mut data = rows(8);
        data.push(Row {
            id: "a-twin".to_string(),
            name: "Twin".to_string(),
            kind: "odd",
            tags: vec![],
            rank: 3,
            at: base() + Duration::minutes(7),
        });
        let result = run_query(&data, &state_with(100, 1), base());
        // rank 3: r007 and a-twin share timestamp, id breaks the tie
        assert_eq!(
            result.ids(),
            vec!["a-twin", "r007", "r003", "r006", "r002", "r005", "r001", "r004", "r000"]
        );
    }

    #[test]
    fn order_does_not_depend_on_input_order() {
        let data = rows(20);
        let mut reversed = rows(20);
        reversed.reverse();
        let state = state_with(100, 1);
        assert_eq!(
            run_query(&data, &state, base()).ids(),
            run_query(&reversed, &state, base()).ids()
        );
    }

    #[test]
    fn filters_compose_with_and() {
        let data = rows(12);
        let mut state = state_with(100, 1);
        state.set_filter("kind", "even");
        state.set_filter("tag", "fizz");
        let result = run_query(&data, &state, base());
        let mut ids = result.ids();
        ids.sort();
        assert_eq!(ids, vec!["r000", "r006"]);

        state.set_filter("missing", "anything");
        assert_eq!(run_query(&data, &state, base()).total_count, 0);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let data = rows(12);
        let mut state = state_with(100, 1);
        state.set_search("ROW 1");
        let mut ids = run_query(&data, &state, base()).ids();
        ids.sort();
        assert_eq!(ids, vec!["r001", "r010", "r011"]);
    }

    #[test]
    fn tabs_apply_known_predicates_only() {
        let data = rows(8);
        let mut state = state_with(100, 1);
        state.set_tab("ranked");
        assert_eq!(run_query(&data, &state, base()).total_count, 6);

        state.set_tab("no-such-tab");
        assert_eq!(run_query(&data, &state, base()).total_count, 8);
    }

    #[test]
    fn page_past_end_is_empty() {
        let data = rows(3);
        let result = run_query(&data, &state_with(5, 4), base());
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
        assert_eq!(page_range(3, 5, 0), 0..3);
    }

    #[test]
    fn facet_options_are_sorted_and_distinct() {
        let data = rows(6);
        assert_eq!(facet_options(&data, "tag"), vec!["fizz", "x"]);
        assert_eq!(facet_options(&data, "kind"), vec!["even", "odd"]);
        assert!(facet_options(&data, "missing").is_empty());
    }
}
