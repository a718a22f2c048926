//! Integration tests: engine flow against tests/fixtures/report.json

use qareport::export::MemoryClipboard;
use qareport::preferences::{MemoryStore, PreferenceStore, ResolvedTheme, ThemePreference, THEME_KEY};
use qareport::session::{ModalTarget, ModalView, Transition};
use qareport::sort::{SortColumn, SortDirection};
use qareport::{Intent, Report, ReportEngine, TestStatus};
use std::path::Path;
use std::time::{Duration, Instant};

const FIXTURE: &str = "tests/fixtures/report.json";
const LOGIN: &str = "tests/test_auth.py::test_login";
const LOGOUT: &str = "tests/test_auth.py::test_logout";
const MIGRATE: &str = "tests/test_db.py::test_migrate";
const UNTAGGED: &str = "tests/test_misc.py::test_untagged";

fn engine() -> ReportEngine {
    let report = Report::load(Path::new(FIXTURE))
        .unwrap_or_else(|e| panic!("load({}) failed: {}", FIXTURE, e));
    ReportEngine::new(report, PreferenceStore::in_memory(ResolvedTheme::Dark))
}

fn visible_ids(e: &ReportEngine) -> Vec<String> {
    e.view().visible_rows().map(|r| r.id.clone()).collect()
}

// --- Filtering ---

#[test]
fn unfiltered_report_shows_everything() {
    let e = engine();
    let view = e.view();
    assert_eq!(view.total, 4);
    assert_eq!(view.visible, 4);
    assert_eq!(view.title.as_deref(), Some("nightly api run"));
}

#[test]
fn axes_combine_with_and() {
    let mut e = engine();
    e.dispatch(Intent::ToggleStatus(TestStatus::Passed));
    assert_eq!(visible_ids(&e), vec![LOGIN, UNTAGGED]);

    e.dispatch(Intent::SetSearch("SESSION".into()));
    assert_eq!(visible_ids(&e), vec![LOGIN]);

    e.dispatch(Intent::SetSearch(String::new()));
    e.dispatch(Intent::ToggleAllComponents);
    e.dispatch(Intent::ToggleComponent("auth".into()));
    // untagged rows fail a component restriction
    assert_eq!(visible_ids(&e), vec![LOGIN]);
}

#[test]
fn counts_only_cover_present_statuses() {
    let e = engine();
    let statuses: Vec<TestStatus> = e.view().counts.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![TestStatus::Passed, TestStatus::Failed, TestStatus::Skipped]
    );
}

#[test]
fn empty_component_selection_hides_all() {
    let mut e = engine();
    e.dispatch(Intent::ToggleAllComponents);
    assert_eq!(e.view().visible, 0);
    e.dispatch(Intent::ToggleAllComponents);
    assert_eq!(e.view().visible, 4);
}

// --- Sorting ---

#[test]
fn duration_sort_cycles_back_to_harness_order() {
    let mut e = engine();
    let original = visible_ids(&e);

    assert!(matches!(
        e.dispatch(Intent::ClickSort(SortColumn::Duration)),
        Transition::Sort(_)
    ));
    assert_eq!(visible_ids(&e), vec![LOGOUT, UNTAGGED, LOGIN, MIGRATE]);
    assert_eq!(e.view().sort.direction, SortDirection::Descending);

    e.dispatch(Intent::ClickSort(SortColumn::Duration));
    assert_eq!(visible_ids(&e), vec![MIGRATE, LOGIN, UNTAGGED, LOGOUT]);

    e.dispatch(Intent::ClickSort(SortColumn::Duration));
    assert_eq!(visible_ids(&e), original);
    assert!(e.view().sort.column.is_none());
}

#[test]
fn sort_keeps_hidden_rows_in_place() {
    let mut e = engine();
    e.dispatch(Intent::ToggleStatus(TestStatus::Failed));
    e.dispatch(Intent::ClickSort(SortColumn::Name));
    let view = e.view();
    assert_eq!(view.rows.len(), 4);
    assert_eq!(view.visible, 1);
}

// --- Expansion and export ---

#[test]
fn accordion_then_multi_expansion() {
    let mut e = engine();
    e.dispatch(Intent::ToggleRow { id: LOGIN.into(), multi: false });
    e.dispatch(Intent::ToggleRow { id: LOGOUT.into(), multi: false });
    let open: Vec<String> = e.view().rows.iter().filter(|r| r.open).map(|r| r.id.clone()).collect();
    assert_eq!(open, vec![LOGOUT]);

    e.dispatch(Intent::ToggleRow { id: LOGIN.into(), multi: true });
    assert_eq!(e.view().rows.iter().filter(|r| r.open).count(), 2);
}

#[test]
fn export_detail_flattens_steps_and_skips_attachments() {
    let e = engine();
    let text = e.export_detail(LOGIN).unwrap();
    assert_eq!(
        text,
        "Execution Log:\n✓ open session\n  ✓ status is 200\nReason: ok"
    );

    let failed = e.export_detail(LOGOUT).unwrap();
    assert!(failed.contains("  ✗ cookie removed (expected None got 'abc')"));
    assert!(failed.contains("Payload: {\"cookie\": \"abc\", \"ttl\": 30}"));
}

#[test]
fn export_unknown_test_fails() {
    let e = engine();
    assert!(e.export_detail("nope").is_err());
}

#[test]
fn copy_detail_confirms_then_expires() {
    let mut e = engine();
    let mut clipboard = MemoryClipboard::new();
    let now = Instant::now();
    assert!(e.copy_detail(LOGIN, &mut clipboard, now).unwrap());
    assert!(clipboard.contents().unwrap_or_default().starts_with("Execution Log:"));
    assert!(e.is_confirming("detail", LOGIN, now + Duration::from_millis(100)));
    assert!(!e.is_confirming("detail", LOGIN, now + Duration::from_secs(5)));
    assert!(!e.is_confirming("logs", LOGIN, now));
}

#[test]
fn refused_clipboard_reports_false() {
    let mut e = engine();
    let mut clipboard = MemoryClipboard::refusing();
    assert!(!e.copy_detail(LOGIN, &mut clipboard, Instant::now()).unwrap());
}

// --- Modals ---

#[test]
fn log_modal_filters_flow_into_export() {
    let mut e = engine();
    let modal = e.open_attachment(LOGIN, ModalTarget::Logs).unwrap();
    assert_eq!(modal.view.kind(), "logs");

    e.dispatch(Intent::ToggleLogger("urllib3".into()));
    let text = e.export_logs(LOGIN).unwrap();
    assert!(!text.contains("urllib3"));
    assert!(text.contains("INFO auth.client client.py:22 logged in\n"));
    assert!(text.contains("as admin"));

    e.dispatch(Intent::CloseModal);
    assert!(e.export_logs(LOGIN).unwrap().contains("urllib3"));
}

#[test]
fn attachment_opens_as_json_tree() {
    let mut e = engine();
    e.open_attachment(LOGIN, ModalTarget::Attachment("response".into()))
        .unwrap();
    e.dispatch(Intent::ModalCollapseAll);
    e.dispatch(Intent::ModalSearch("qa".into()));
    e.dispatch(Intent::ModalNextMatch);

    let Some(modal) = &e.session().modal else {
        panic!("modal should be open");
    };
    let ModalView::Json(view) = &modal.view else {
        panic!("expected a JSON tree, got {}", modal.view.kind());
    };
    assert_eq!(view.search().position(), Some((1, 1)));
    let shown: Vec<String> = view
        .lines()
        .into_iter()
        .filter(|l| !l.hidden)
        .map(|l| l.text)
        .collect();
    assert!(shown.iter().any(|t| t.contains("\"qa\"")));
}

#[test]
fn missing_detail_key_opens_nothing() {
    let mut e = engine();
    assert!(e
        .open_attachment(MIGRATE, ModalTarget::Detail("Payload".into()))
        .is_none());
}

#[test]
fn cancel_returns_to_quiescent_state() {
    let mut e = engine();
    e.dispatch(Intent::ToggleStatus(TestStatus::Failed));
    e.dispatch(Intent::ToggleRow { id: LOGOUT.into(), multi: false });
    e.open_attachment(LOGOUT, ModalTarget::Detail("Payload".into()));
    e.dispatch(Intent::Cancel);
    assert!(e.session().is_quiescent());
    assert_eq!(e.view().visible, 4);
}

// --- Preferences ---

#[test]
fn stored_theme_survives_a_new_store() {
    let store = MemoryStore::new().with(THEME_KEY, "light");
    let prefs = PreferenceStore::new(Box::new(store), ResolvedTheme::Dark);
    assert_eq!(prefs.theme(), ThemePreference::Light);
    assert_eq!(prefs.resolved(), ResolvedTheme::Light);
}
