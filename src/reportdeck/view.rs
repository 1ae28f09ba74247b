//! # Filtering View
//!
//! Pure derivation of what the report list shows from a [`ReportState`].
//! Nothing here mutates state or performs I/O.
//!
//! The list presentation has exactly one of four shapes:
//!
//! - **Loading**: the collection is empty and a request is in flight.
//! - **Initially empty**: no reports at all, nothing loading.
//! - **Search with no results**: a query is active, reports exist, none match.
//! - **Listing**: everything else.

use crate::model::Report;
use crate::store::ReportState;
use std::sync::Arc;

/// Keeps the reports whose name contains the trimmed query, ignoring case.
/// Relative order is preserved.
pub fn filter_reports(reports: &[Report], query: &str) -> Vec<Report> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return reports.to_vec();
    }
    reports
        .iter()
        .filter(|report| report.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub visible: Arc<Vec<Report>>,
    pub total: usize,
    /// The raw query the view was derived with.
    pub query: String,
    pub is_loading: bool,
    pub is_searching: bool,
    pub is_initially_empty: bool,
    pub is_search_with_no_results: bool,
}

impl ReportView {
    /// Derives the view without memoization.
    pub fn derive(state: &ReportState) -> Self {
        FilterMemo::default().view(state)
    }

    fn assemble(state: &ReportState, visible: Arc<Vec<Report>>) -> Self {
        let is_searching = !state.search_query.trim().is_empty();
        let has_reports = !state.reports.is_empty();
        Self {
            total: state.reports.len(),
            query: state.search_query.clone(),
            is_loading: state.is_loading,
            is_searching,
            is_initially_empty: !has_reports && !state.is_loading,
            is_search_with_no_results: is_searching && has_reports && visible.is_empty(),
            visible,
        }
    }

    /// True while the list has nothing to show because a request is running.
    pub fn shows_loading(&self) -> bool {
        self.is_loading && self.total == 0
    }

    /// One-line summary of the list for status areas.
    pub fn status_line(&self) -> String {
        if self.shows_loading() {
            return "Loading reports...".to_string();
        }
        if self.is_initially_empty {
            return "No reports yet. Upload a PDF or CSV to get started.".to_string();
        }
        if self.is_search_with_no_results {
            return format!(
                "No reports match \"{}\". Try a different search term.",
                self.query
            );
        }

        let count = self.visible.len();
        let plural = if count == 1 { "" } else { "s" };
        if self.is_searching {
            format!("{} report{} found matching \"{}\"", count, plural, self.query)
        } else {
            format!("{} report{} found", count, plural)
        }
    }
}

/// Remembers the last filter result and reuses it while neither the report
/// list (by identity) nor the normalized query has changed.
#[derive(Debug, Default)]
pub struct FilterMemo {
    last: Option<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    reports: Arc<Vec<Report>>,
    needle: String,
    visible: Arc<Vec<Report>>,
}

impl FilterMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&mut self, state: &ReportState) -> ReportView {
        let visible = self.visible(state);
        ReportView::assemble(state, visible)
    }

    pub fn visible(&mut self, state: &ReportState) -> Arc<Vec<Report>> {
        let needle = normalize_query(&state.search_query);

        if let Some(entry) = &self.last {
            if Arc::ptr_eq(&entry.reports, &state.reports) && entry.needle == needle {
                return Arc::clone(&entry.visible);
            }
        }

        let visible = if needle.is_empty() {
            Arc::clone(&state.reports)
        } else {
            Arc::new(filter_reports(&state.reports, &needle))
        };
        self.last = Some(MemoEntry {
            reports: Arc::clone(&state.reports),
            needle,
            visible: Arc::clone(&visible),
        });
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportKind;
    use crate::repository::mock::seed_reports;

    fn reports() -> Vec<Report> {
        let mut reports = seed_reports();
        reports.push(Report::new(
            3,
            "THERMAL_scan.csv",
            "0.5MB",
            ReportKind::Thermal,
            "2023-10-03",
        ));
        reports
    }

    fn state(reports: Vec<Report>, query: &str, is_loading: bool) -> ReportState {
        ReportState {
            reports: Arc::new(reports),
            search_query: query.to_string(),
            is_loading,
            ..ReportState::default()
        }
    }

    fn names(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn blank_query_keeps_everything_in_order() {
        let all = reports();
        assert_eq!(filter_reports(&all, ""), all);
        assert_eq!(filter_reports(&all, "   "), all);
    }

    #[test]
    fn matches_substring_case_insensitively_in_order() {
        let all = reports();
        let found = filter_reports(&all, "therm");
        assert_eq!(names(&found), vec!["motor_thermal_B.csv", "THERMAL_scan.csv"]);
    }

    #[test]
    fn query_is_trimmed_before_matching() {
        let all = reports();
        let found = filter_reports(&all, "  Vibration ");
        assert_eq!(names(&found), vec!["vibration_analysis_01.pdf"]);
    }

    #[test]
    fn search_without_matches_sets_only_search_flag() {
        let view = ReportView::derive(&state(reports(), "zzz", false));
        assert!(view.is_search_with_no_results);
        assert!(!view.is_initially_empty);
        assert_eq!(
            view.status_line(),
            "No reports match \"zzz\". Try a different search term."
        );
    }

    #[test]
    fn empty_collection_sets_only_initial_flag() {
        let view = ReportView::derive(&state(Vec::new(), "zzz", false));
        assert!(view.is_initially_empty);
        assert!(!view.is_search_with_no_results);
    }

    #[test]
    fn loading_with_empty_collection_sets_neither_flag() {
        let view = ReportView::derive(&state(Vec::new(), "zzz", true));
        assert!(!view.is_initially_empty);
        assert!(!view.is_search_with_no_results);
        assert!(view.shows_loading());
        assert_eq!(view.status_line(), "Loading reports...");
    }

    #[test]
    fn status_line_counts_matches() {
        let view = ReportView::derive(&state(reports(), "therm", false));
        assert_eq!(view.status_line(), "2 reports found matching \"therm\"");

        let view = ReportView::derive(&state(reports(), "", false));
        assert_eq!(view.status_line(), "3 reports found");
    }

    #[test]
    fn memo_reuses_result_for_same_inputs() {
        let mut memo = FilterMemo::new();
        let current = state(reports(), "therm", false);

        let first = memo.visible(&current);
        let second = memo.visible(&ReportState {
            search_query: " THERM ".to_string(),
            ..current.clone()
        });

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn memo_recomputes_when_reports_change() {
        let mut memo = FilterMemo::new();
        let current = state(reports(), "therm", false);
        let first = memo.visible(&current);

        let mut grown = reports();
        grown.insert(
            0,
            Report::new(4, "thermo.pdf", "1.0MB", ReportKind::Thermal, "2024-01-01"),
        );
        let second = memo.visible(&state(grown, "therm", false));

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn blank_query_shares_the_store_list() {
        let mut memo = FilterMemo::new();
        let current = state(reports(), "", false);
        assert!(Arc::ptr_eq(&memo.visible(&current), &current.reports));
    }
}
