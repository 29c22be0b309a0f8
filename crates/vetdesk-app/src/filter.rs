// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCommit<V> {
    value: V,
    due: Instant,
}

/// One-shot deferred commit. Scheduling replaces whatever was pending, so at
/// most one value waits at a time. Time is supplied by the caller, which
/// keeps this independent of any event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer<V> {
    delay: Duration,
    pending: Option<PendingCommit<V>>,
}

impl<V> Debouncer<V> {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: V, now: Instant) {
        self.pending = Some(PendingCommit {
            value,
            due: now + self.delay,
        });
    }

    pub fn cancel(&mut self) -> Option<V> {
        self.pending.take().map(|pending| pending.value)
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Takes the pending value once its delay has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<V> {
        match &self.pending {
            Some(pending) if now >= pending.due => self.cancel(),
            _ => None,
        }
    }
}

/// Rows that can be narrowed by category and free-text search.
pub trait Searchable {
    type Category: PartialEq;

    fn category(&self) -> Self::Category;
    fn search_fields(&self) -> Vec<&str>;
}

/// Category first (exact match), then case-insensitive substring search
/// across every search field. Relative order is preserved.
pub fn apply_filters<'a, T: Searchable>(
    rows: &'a [T],
    query: &str,
    category: Option<&T::Category>,
) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|row| category.is_none_or(|category| row.category() == *category))
        .filter(|row| needle.is_empty() || matches_query(*row, &needle))
        .collect()
}

fn matches_query<T: Searchable>(row: &T, needle: &str) -> bool {
    row.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[derive(Debug, Clone)]
pub struct DebouncedFilter<C> {
    raw_query: String,
    debounced_query: String,
    category: Option<C>,
    debouncer: Debouncer<String>,
}

impl<C> Default for DebouncedFilter<C> {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl<C> DebouncedFilter<C> {
    pub const fn new(delay: Duration) -> Self {
        Self {
            raw_query: String::new(),
            debounced_query: String::new(),
            category: None,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn debounced_query(&self) -> &str {
        &self.debounced_query
    }

    pub fn selected_category(&self) -> Option<&C> {
        self.category.as_ref()
    }

    pub fn set_category(&mut self, category: Option<C>) {
        self.category = category;
    }

    /// Updates the raw query immediately and restarts the quiescence delay.
    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) {
        let query = query.into();
        if query == self.raw_query {
            return;
        }
        self.raw_query = query;
        self.debouncer.schedule(self.raw_query.clone(), now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commits the pending query once it has been quiet for the full delay.
    /// Returns whether the debounced query changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(committed) = self.debouncer.poll(now) else {
            return false;
        };
        debug!(query = %committed, "search query committed");
        if committed == self.debounced_query {
            return false;
        }
        self.debounced_query = committed;
        true
    }

    pub fn filtered_rows<'a, T>(&self, rows: &'a [T]) -> Vec<&'a T>
    where
        T: Searchable<Category = C>,
    {
        apply_filters(rows, &self.debounced_query, self.category.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::{DebouncedFilter, Debouncer, Searchable, apply_filters};
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Cat,
        Dog,
    }

    #[derive(Debug)]
    struct Pet {
        name: &'static str,
        age: &'static str,
        kind: Kind,
    }

    impl Searchable for Pet {
        type Category = Kind;

        fn category(&self) -> Kind {
            self.kind
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name, self.age]
        }
    }

    fn pets() -> Vec<Pet> {
        vec![
            Pet {
                name: "Milo",
                age: "5 years",
                kind: Kind::Cat,
            },
            Pet {
                name: "Rex",
                age: "5 months",
                kind: Kind::Dog,
            },
            Pet {
                name: "Luna",
                age: "2 years",
                kind: Kind::Cat,
            },
            Pet {
                name: "Tom5",
                age: "1 year",
                kind: Kind::Cat,
            },
        ]
    }

    fn names(rows: &[&Pet]) -> Vec<&'static str> {
        rows.iter().map(|pet| pet.name).collect()
    }

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn category_then_query_compose_with_and() {
        let rows = pets();
        let filtered = apply_filters(&rows, "5", Some(&Kind::Cat));
        assert_eq!(names(&filtered), ["Milo", "Tom5"]);
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let rows = pets();
        assert_eq!(names(&apply_filters(&rows, "  LUNA ", None)), ["Luna"]);
        assert_eq!(names(&apply_filters(&rows, "YEAR", None)), ["Milo", "Luna", "Tom5"]);
    }

    #[test]
    fn empty_filters_pass_everything_through_in_order() {
        let rows = pets();
        assert_eq!(
            names(&apply_filters(&rows, "   ", None)),
            ["Milo", "Rex", "Luna", "Tom5"]
        );
    }

    #[test]
    fn debounce_commits_only_the_last_keystroke() {
        let base = Instant::now();
        let mut filter = DebouncedFilter::<Kind>::new(Duration::from_millis(200));

        filter.set_query("a", at(base, 0));
        filter.set_query("al", at(base, 50));
        filter.set_query("ali", at(base, 100));
        assert_eq!(filter.raw_query(), "ali");

        for millis in [150, 200, 250, 299] {
            assert!(!filter.tick(at(base, millis)), "no commit at t={millis}");
            assert_eq!(filter.debounced_query(), "");
        }

        assert!(filter.tick(at(base, 300)));
        assert_eq!(filter.debounced_query(), "ali");
        assert_eq!(filter.next_deadline(), None);
        assert!(!filter.tick(at(base, 600)));
    }

    #[test]
    fn setting_same_query_does_not_restart_delay() {
        let base = Instant::now();
        let mut filter = DebouncedFilter::<Kind>::new(Duration::from_millis(200));
        filter.set_query("rex", at(base, 0));
        filter.set_query("rex", at(base, 150));
        assert_eq!(filter.next_deadline(), Some(at(base, 200)));
        assert!(filter.tick(at(base, 200)));
    }

    #[test]
    fn filtered_rows_use_debounced_query_not_raw() {
        let base = Instant::now();
        let rows = pets();
        let mut filter = DebouncedFilter::new(Duration::from_millis(200));
        filter.set_category(Some(Kind::Cat));
        filter.set_query("luna", at(base, 0));
        assert_eq!(names(&filter.filtered_rows(&rows)), ["Milo", "Luna", "Tom5"]);

        filter.tick(at(base, 200));
        assert_eq!(names(&filter.filtered_rows(&rows)), ["Luna"]);
        assert_eq!(filter.selected_category(), Some(&Kind::Cat));
    }

    #[test]
    fn debouncer_cancel_drops_pending_value() {
        let base = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule(1, base);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(at(base, 50)), None);
    }

    #[test]
    fn debouncer_reschedule_replaces_pending_value() {
        let base = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule("first", base);
        debouncer.schedule("second", at(base, 5));
        assert_eq!(debouncer.poll(at(base, 10)), None);
        assert_eq!(debouncer.poll(at(base, 15)), Some("second"));
        assert!(!debouncer.is_pending());
    }
}
