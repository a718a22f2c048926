//! Tri-state column sorting for the results table
//!
//! Each click on a column cycles default -> descending -> ascending -> default;
//! clicking a different column starts that column at descending. The order is
//! kept as a list of row indices, and every index stands for a row *and* its
//! detail row, so the two can never be separated by a sort.

use crate::{ReportError, TestRow};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Duration,
    Name,
    Status,
}

impl SortColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::Duration => "duration",
            SortColumn::Name => "name",
            SortColumn::Status => "status",
        }
    }

    /// Two-way comparison of the column's field; ties are left to the
    /// stable sort
    fn compare(self, a: &TestRow, b: &TestRow) -> Ordering {
        match self {
            SortColumn::Duration => a
                .duration
                .partial_cmp(&b.duration)
                .unwrap_or(Ordering::Equal),
            SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortColumn::Status => a.status.cmp(&b.status),
        }
    }
}

impl std::str::FromStr for SortColumn {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, ReportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duration" | "time" => Ok(SortColumn::Duration),
            "name" | "title" => Ok(SortColumn::Name),
            "status" => Ok(SortColumn::Status),
            other => Err(ReportError::UnknownColumn(other.to_string())),
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Default,
    Descending,
    Ascending,
}

impl SortDirection {
    fn cycle(self) -> Self {
        match self {
            SortDirection::Default => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Default,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Default => "",
            SortDirection::Descending => "▼",
            SortDirection::Ascending => "▲",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortState {
    /// State after clicking `column`
    pub fn clicked(self, column: SortColumn) -> Self {
        match self.column {
            Some(active) if active == column => {
                let direction = self.direction.cycle();
                if direction == SortDirection::Default {
                    SortState::default()
                } else {
                    SortState {
                        column: Some(column),
                        direction,
                    }
                }
            }
            _ => SortState {
                column: Some(column),
                direction: SortDirection::Descending,
            },
        }
    }

    pub fn is_default(&self) -> bool {
        self.direction == SortDirection::Default
    }
}

/// `column[:asc|desc]`; a bare column sorts descending like a first click
impl std::str::FromStr for SortState {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, ReportError> {
        let (column, direction) = match s.split_once(':') {
            Some((c, d)) => (c, Some(d.trim().to_ascii_lowercase())),
            None => (s, None),
        };
        let column: SortColumn = column.parse()?;
        let direction = match direction.as_deref() {
            None | Some("desc") | Some("descending") => SortDirection::Descending,
            Some("asc") | Some("ascending") => SortDirection::Ascending,
            Some("default") | Some("none") => return Ok(SortState::default()),
            Some(other) => return Err(ReportError::UnknownColumn(format!("{column}:{other}"))),
        };
        Ok(SortState {
            column: Some(column),
            direction,
        })
    }
}

/// One physical table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "row", rename_all = "lowercase")]
pub enum TableSlot {
    Row(usize),
    Detail(usize),
}

#[derive(Debug, Clone)]
pub struct SortController {
    /// Harness order captured at load
    original: Vec<usize>,
    order: Vec<usize>,
    state: SortState,
}

impl SortController {
    pub fn new(row_count: usize) -> Self {
        let original: Vec<usize> = (0..row_count).collect();
        Self {
            order: original.clone(),
            original,
            state: SortState::default(),
        }
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    /// Row indices in display order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Click a column header
    pub fn click(&mut self, column: SortColumn, rows: &[TestRow]) -> SortState {
        let next = self.state.clicked(column);
        self.apply(next, rows);
        next
    }

    /// Move to `state` directly. Default restores the captured order;
    /// otherwise the current order is stably sorted.
    pub fn apply(&mut self, state: SortState, rows: &[TestRow]) {
        self.state = state;
        match (state.column, state.direction) {
            (Some(column), SortDirection::Descending) => self.order.sort_by(|a, b| {
                match (rows.get(*a), rows.get(*b)) {
                    (Some(ra), Some(rb)) => column.compare(rb, ra),
                    _ => Ordering::Equal,
                }
            }),
            (Some(column), SortDirection::Ascending) => self.order.sort_by(|a, b| {
                match (rows.get(*a), rows.get(*b)) {
                    (Some(ra), Some(rb)) => column.compare(ra, rb),
                    _ => Ordering::Equal,
                }
            }),
            _ => {
                self.state = SortState::default();
                self.order.clone_from(&self.original);
            }
        }
        tracing::debug!(column = ?self.state.column, direction = ?self.state.direction, "table sorted");
    }

    pub fn reset(&mut self) {
        self.state = SortState::default();
        self.order.clone_from(&self.original);
    }

    /// Physical layout: every row immediately followed by its detail row
    pub fn layout(&self) -> Vec<TableSlot> {
        self.order
            .iter()
            .flat_map(|i| [TableSlot::Row(*i), TableSlot::Detail(*i)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestStatus;
    use proptest::prelude::*;

    fn rows(durations: &[f64]) -> Vec<TestRow> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| TestRow {
                id: format!("t{i}"),
                name: format!("test {i}"),
                status: TestStatus::Passed,
                duration: *d,
                components: vec![],
                summary: String::new(),
                details: vec![],
                logs: None,
            })
            .collect()
    }

    #[test]
    fn click_cycle_on_same_column() {
        let s = SortState::default();
        let s = s.clicked(SortColumn::Duration);
        assert_eq!(s.direction, SortDirection::Descending);
        let s = s.clicked(SortColumn::Duration);
        assert_eq!(s.direction, SortDirection::Ascending);
        let s = s.clicked(SortColumn::Duration);
        assert_eq!(s, SortState::default());
    }

    #[test]
    fn other_column_resets_to_descending() {
        let s = SortState::default()
            .clicked(SortColumn::Duration)
            .clicked(SortColumn::Duration)
            .clicked(SortColumn::Name);
        assert_eq!(s.column, Some(SortColumn::Name));
        assert_eq!(s.direction, SortDirection::Descending);
    }

    #[test]
    fn sorts_by_duration_both_ways() {
        let data = rows(&[2.0, 0.5, 3.0]);
        let mut sc = SortController::new(data.len());
        sc.click(SortColumn::Duration, &data);
        assert_eq!(sc.order(), &[2, 0, 1]);
        sc.click(SortColumn::Duration, &data);
        assert_eq!(sc.order(), &[1, 0, 2]);
        sc.click(SortColumn::Duration, &data);
        assert_eq!(sc.order(), &[0, 1, 2]);
    }

    #[test]
    fn ties_keep_relative_order() {
        let data = rows(&[1.0, 5.0, 1.0, 1.0]);
        let mut sc = SortController::new(data.len());
        sc.click(SortColumn::Duration, &data);
        assert_eq!(sc.order(), &[1, 0, 2, 3]);
    }

    #[test]
    fn layout_pairs_rows_with_details() {
        let data = rows(&[1.0, 2.0]);
        let mut sc = SortController::new(data.len());
        sc.click(SortColumn::Duration, &data);
        assert_eq!(
            sc.layout(),
            vec![
                TableSlot::Row(1),
                TableSlot::Detail(1),
                TableSlot::Row(0),
                TableSlot::Detail(0)
            ]
        );
    }

    #[test]
    fn parse_column_names() {
        assert_eq!("Duration".parse::<SortColumn>().unwrap(), SortColumn::Duration);
        assert_eq!("title".parse::<SortColumn>().unwrap(), SortColumn::Name);
        assert!("size".parse::<SortColumn>().is_err());
    }

    #[test]
    fn parse_sort_spec() {
        let s: SortState = "name".parse().unwrap();
        assert_eq!(s.direction, SortDirection::Descending);
        let s: SortState = "duration:asc".parse().unwrap();
        assert_eq!((s.column, s.direction), (Some(SortColumn::Duration), SortDirection::Ascending));
        assert!("status:sideways".parse::<SortState>().is_err());
    }

    #[test]
    fn apply_direct_state_from_default() {
        let data = rows(&[2.0, 0.5, 3.0]);
        let mut sc = SortController::new(data.len());
        sc.apply("duration:asc".parse().unwrap(), &data);
        assert_eq!(sc.order(), &[1, 0, 2]);
        sc.reset();
        assert_eq!(sc.order(), &[0, 1, 2]);
        assert!(sc.state().is_default());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn three_clicks_restore_original_order(durations in prop::collection::vec(0.0f64..10.0, 0..20)) {
            let data = rows(&durations);
            let mut sc = SortController::new(data.len());
            let before = sc.order().to_vec();
            sc.click(SortColumn::Duration, &data);
            sc.click(SortColumn::Duration, &data);
            sc.click(SortColumn::Duration, &data);
            prop_assert_eq!(sc.order(), before.as_slice());
        }

        #[test]
        fn rows_and_details_stay_adjacent(
            durations in prop::collection::vec(0.0f64..5.0, 1..15),
            clicks in prop::collection::vec(prop::sample::select(vec![SortColumn::Duration, SortColumn::Name, SortColumn::Status]), 0..6),
        ) {
            let data = rows(&durations);
            let mut sc = SortController::new(data.len());
            for c in clicks {
                sc.click(c, &data);
            }
            let layout = sc.layout();
            prop_assert_eq!(layout.len(), data.len() * 2);
            for pair in layout.chunks(2) {
                match pair {
                    [TableSlot::Row(a), TableSlot::Detail(b)] => prop_assert_eq!(a, b),
                    other => prop_assert!(false, "unpaired slots: {:?}", other),
                }
            }
        }
    }
}
