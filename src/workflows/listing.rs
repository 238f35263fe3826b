//! Browsing and searching published reports.
//!
//! The listing fetches every report once per activation, newest first, and
//! filters the in-memory snapshot on each keystroke.

use crate::backend::{BackendOp, BackendRequest, BackendResponse, Purpose, Query, REPORTS_TABLE};
use crate::domain::Report;

/// Message shown when the fetch fails. The collaborator's text is logged
/// instead.
pub const FETCH_FAILED: &str = "No se pudieron cargar las publicaciones";

/// What the listing pane should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
    Loading,
    Failed(String),
    /// Fetched, but nothing matches (or nothing exists).
    Empty,
    Items,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fetch {
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ListingWorkflow {
    reports: Vec<Report>,
    filtered: Vec<usize>,
    query: String,
    selected: usize,
    fetch: Fetch,
}

impl Default for ListingWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingWorkflow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reports: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            selected: 0,
            fetch: Fetch::NotStarted,
        }
    }

    /// Starts a fetch of all reports. `None` if one is already in flight.
    pub fn activate(&mut self) -> Option<BackendRequest> {
        if self.fetch == Fetch::Loading {
            tracing::debug!("listing fetch already in flight");
            return None;
        }
        self.fetch = Fetch::Loading;
        Some(BackendRequest::new(
            Purpose::ListReports,
            BackendOp::Select {
                table: REPORTS_TABLE.to_string(),
                query: Query::all().order_by_desc("published_at"),
            },
        ))
    }

    /// Stores the fetched snapshot. Rows that do not parse are skipped.
    pub fn on_fetched(&mut self, response: BackendResponse) {
        let _span = tracing::debug_span!("listing_on_fetched").entered();

        if self.fetch != Fetch::Loading {
            tracing::debug!("ignoring listing response, no fetch pending");
            return;
        }

        match response.into_rows() {
            Ok(rows) => {
                let total = rows.len();
                let mut reports: Vec<Report> = rows
                    .into_iter()
                    .filter_map(|row| match serde_json::from_value::<Report>(row) {
                        Ok(report) => Some(report),
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping malformed report row");
                            None
                        }
                    })
                    .collect();
                reports.sort_by(|a, b| b.published_at.cmp(&a.published_at));

                tracing::debug!(total, parsed = reports.len(), "reports loaded");
                self.reports = reports;
                self.fetch = Fetch::Loaded;
                self.apply_filter();
            }
            Err(message) => {
                tracing::warn!(error = %message, "report fetch failed");
                self.fetch = Fetch::Failed;
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> ListingState {
        match self.fetch {
            Fetch::NotStarted | Fetch::Loading => ListingState::Loading,
            Fetch::Failed => ListingState::Failed(FETCH_FAILED.to_string()),
            Fetch::Loaded if self.filtered.is_empty() => ListingState::Empty,
            Fetch::Loaded => ListingState::Items,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.apply_filter();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.apply_filter();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.apply_filter();
    }

    /// Reports matching the query, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Report> {
        self.filtered.iter().filter_map(|&idx| self.reports.get(idx))
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.filtered.len()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Report> {
        self.filtered
            .get(self.selected)
            .and_then(|&idx| self.reports.get(idx))
    }

    pub fn move_down(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.filtered.len();
    }

    pub fn move_up(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(self.filtered.len() - 1);
    }

    /// Clears the query and selection when the view is left.
    pub fn teardown(&mut self) {
        self.query.clear();
        self.selected = 0;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let needle = self.query.to_lowercase();
        self.filtered = self
            .reports
            .iter()
            .enumerate()
            .filter(|(_, report)| needle.is_empty() || matches_query(report, &needle))
            .map(|(idx, _)| idx)
            .collect();

        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len().saturating_sub(1);
        }
    }
}

/// Case-insensitive substring match over name, description, type and
/// location. `needle` must already be lowercase.
#[must_use]
pub fn matches_query(report: &Report, needle: &str) -> bool {
    [
        report.name.as_str(),
        report.description.as_str(),
        report.pet_type.as_str(),
        report.pet_type.label(),
        report.location.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOutput;
    use serde_json::json;

    fn row(id: &str, pet: &str, name: &str, location: &str, published_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": pet,
            "name": name,
            "description": format!("{name} se perdió"),
            "photo_url": "https://cdn/x.png",
            "location": location,
            "contact": "+56 9 0000 0000",
            "published_at": published_at,
            "status": "lost"
        })
    }

    fn loaded(rows: Vec<serde_json::Value>) -> ListingWorkflow {
        let mut listing = ListingWorkflow::new();
        listing.activate().unwrap();
        listing.on_fetched(BackendResponse::ok(Purpose::ListReports, BackendOutput::Rows(rows)));
        listing
    }

    #[test]
    fn fetch_orders_newest_first() {
        let mut listing = ListingWorkflow::new();
        let request = listing.activate().unwrap();
        let BackendOp::Select { table, query } = request.op else {
            panic!("expected select");
        };
        assert_eq!(table, REPORTS_TABLE);
        assert_eq!(query.order.map(|o| (o.column, o.descending)), Some(("published_at".into(), true)));
        assert!(listing.activate().is_none());
    }

    #[test]
    fn loading_and_empty_are_distinct() {
        let mut listing = ListingWorkflow::new();
        listing.activate();
        assert_eq!(listing.state(), ListingState::Loading);
        listing.on_fetched(BackendResponse::ok(Purpose::ListReports, BackendOutput::Rows(vec![])));
        assert_eq!(listing.state(), ListingState::Empty);
    }

    #[test]
    fn failure_shows_generic_message() {
        let mut listing = ListingWorkflow::new();
        listing.activate();
        listing.on_fetched(BackendResponse::err(Purpose::ListReports, "permission denied for table reports"));
        assert_eq!(listing.state(), ListingState::Failed(FETCH_FAILED.to_string()));
    }

    #[test]
    fn filter_is_case_insensitive_across_fields() {
        let mut listing = loaded(vec![
            row("1", "dog", "Firulais", "Macul Centro", "2024-05-01T10:00:00Z"),
            row("2", "cat", "Michi", "Ñuñoa", "2024-05-02T10:00:00Z"),
        ]);
        assert_eq!(listing.visible_count(), 2);
        assert_eq!(listing.visible().next().map(|r| r.id.as_str()), Some("2"));

        listing.set_query("macul");
        assert_eq!(listing.visible().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["1"]);

        listing.set_query("GATO");
        assert_eq!(listing.visible().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["2"]);

        listing.set_query("cat");
        assert_eq!(listing.visible_count(), 1);

        listing.set_query("perdió");
        assert_eq!(listing.visible_count(), 2);

        listing.set_query("loro");
        assert_eq!(listing.state(), ListingState::Empty);
    }

    #[test]
    fn query_whitespace_is_part_of_the_needle() {
        let mut listing = loaded(vec![
            row("1", "dog", "Firulais", "Xmacul", "2024-05-01T10:00:00Z"),
            row("2", "cat", "Michi", "Parque macul", "2024-05-02T10:00:00Z"),
        ]);
        listing.set_query(" macul");
        assert_eq!(listing.visible().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn numeric_ids_from_the_hosted_table_are_listed() {
        let mut numeric = row("0", "dog", "Firulais", "Macul", "2024-05-01T10:00:00Z");
        numeric["id"] = json!(42);
        let listing = loaded(vec![numeric]);
        assert_eq!(listing.total_count(), 1);
        assert_eq!(listing.selected().map(|r| r.id.as_str()), Some("42"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let listing = loaded(vec![
            row("1", "dog", "Firulais", "Macul", "2024-05-01T10:00:00Z"),
            json!({"id": "broken"}),
        ]);
        assert_eq!(listing.total_count(), 1);
    }

    #[test]
    fn selection_wraps_and_clamps() {
        let mut listing = loaded(vec![
            row("1", "dog", "A", "X", "2024-05-01T10:00:00Z"),
            row("2", "dog", "B", "Y", "2024-05-02T10:00:00Z"),
        ]);
        listing.move_up();
        assert_eq!(listing.selected().map(|r| r.id.as_str()), Some("1"));
        listing.move_down();
        assert_eq!(listing.selected_index(), 0);

        listing.move_up();
        listing.set_query("b");
        assert_eq!(listing.selected().map(|r| r.id.as_str()), Some("2"));
    }
}
