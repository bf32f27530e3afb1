// 🎛️ Tracker - the one object every surface drives
// Owns the record store, the mounted view and any delete awaiting confirmation.
// UI events (navigate / submit / delete) go through here, then the surface re-renders.

use crate::forms::{self, FormError, FormSchema, FormState, SubmitError};
use crate::record::Record;
use crate::storage::KeyValueStorage;
use crate::store::{RecordStore, StoreError};
use crate::view::{render, view_for, NavTag, Screen, View, ViewDescriptor, ViewError};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

pub const SAVED_MESSAGE: &str = "Record saved!";
pub const DELETE_PROMPT: &str = "Delete this record?";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SubmitError> for TrackerError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Form(e) => TrackerError::Form(e),
            SubmitError::Store(e) => TrackerError::Store(e),
        }
    }
}

/// A delete waiting on the user's yes/no
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub index: usize,
    pub record: Record,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Record),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Last message for the user (the status line, not a blocking alert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct Tracker<S> {
    store: RecordStore<S>,
    view: View,
    pending_delete: Option<PendingDelete>,
    notice: Option<Notice>,
}

impl<S: KeyValueStorage> Tracker<S> {
    pub fn new(store: RecordStore<S>) -> Self {
        Self {
            store,
            view: View::Home,
            pending_delete: None,
            notice: None,
        }
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Mount the view for `tag`, replacing whatever was shown
    pub fn navigate(&mut self, tag: NavTag) -> Screen {
        debug!("Navigating to {tag}");
        self.view = View::from(tag);
        self.pending_delete = None;
        self.screen()
    }

    pub fn navigate_str(&mut self, tag: &str) -> Result<Screen, TrackerError> {
        let tag = tag.parse::<NavTag>()?;
        Ok(self.navigate(tag))
    }

    pub fn descriptor(&self) -> ViewDescriptor {
        view_for(self.view.tag())
    }

    /// Render the mounted view from the current store contents
    pub fn screen(&self) -> Screen {
        render(&self.descriptor(), self.store.records())
    }

    /// Schema of the mounted form
    pub fn form(&self) -> Option<FormSchema> {
        match self.view {
            View::Form(ref record_type) => FormSchema::for_type(record_type),
            _ => None,
        }
    }

    /// Submit the mounted form. On success `state` is cleared for the next entry.
    pub fn submit(
        &mut self,
        state: &mut FormState,
        today: NaiveDate,
    ) -> Result<Record, TrackerError> {
        let schema = self.form().ok_or(ViewError::NoFormMounted)?;

        match forms::submit(&schema, state, &mut self.store, today) {
            Ok(record) => {
                self.notice = Some(Notice {
                    level: NoticeLevel::Info,
                    message: SAVED_MESSAGE.to_string(),
                });
                Ok(record)
            }
            Err(e) => {
                self.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// First half of a delete: resolve the row key now, ask the user afterwards
    pub fn request_delete(&mut self, key: &str) -> Result<&PendingDelete, TrackerError> {
        let index = key
            .trim()
            .parse::<usize>()
            .map_err(|_| StoreError::InvalidIndex(key.to_string()))?;

        let record = self
            .store
            .get(index)
            .cloned()
            .ok_or(StoreError::OutOfRange {
                index,
                len: self.store.len(),
            })?;

        let pending = self.pending_delete.insert(PendingDelete {
            index,
            record,
            prompt: DELETE_PROMPT,
        });
        Ok(&*pending)
    }

    /// Second half of a delete. Either way the summary is mounted again.
    pub fn resolve_delete(&mut self, confirmed: bool) -> Result<DeleteOutcome, TrackerError> {
        let pending = self
            .pending_delete
            .take()
            .ok_or(ViewError::NoPendingDelete)?;

        self.view = View::Summary;

        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }

        let removed = self.store.remove(pending.index)?;
        self.notice = Some(Notice {
            level: NoticeLevel::Info,
            message: format!("Deleted {} record", removed.record_type),
        });
        Ok(DeleteOutcome::Deleted(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_STORAGE_KEY;

    fn tracker() -> Tracker<MemoryStorage> {
        Tracker::new(RecordStore::open(MemoryStorage::new(), DEFAULT_STORAGE_KEY).unwrap())
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn add_activity(tracker: &mut Tracker<MemoryStorage>, name: &str) {
        tracker.navigate(NavTag::Activity);
        let mut state = FormState::from_pairs([
            ("activity", name),
            ("duration", "30"),
            ("intensity", "High"),
            ("location", "Park"),
        ]);
        tracker.submit(&mut state, day()).unwrap();
    }

    #[test]
    fn test_starts_on_home() {
        let tracker = tracker();
        assert_eq!(tracker.view(), &View::Home);
        assert!(matches!(tracker.screen(), Screen::Home(_)));
    }

    #[test]
    fn test_navigate_replaces_view() {
        let mut tracker = tracker();
        assert!(matches!(tracker.navigate(NavTag::Work), Screen::Form(_)));
        assert_eq!(tracker.view(), &View::Form(RecordType::Work));

        assert!(matches!(tracker.navigate_str("summary").unwrap(), Screen::Summary(_)));
        assert!(matches!(
            tracker.navigate_str("nope"),
            Err(TrackerError::View(ViewError::UnknownTag(_)))
        ));
        assert_eq!(tracker.view(), &View::Summary);
    }

    #[test]
    fn test_submit_requires_mounted_form() {
        let mut tracker = tracker();
        let mut state = FormState::new();
        assert!(matches!(
            tracker.submit(&mut state, day()),
            Err(TrackerError::View(ViewError::NoFormMounted))
        ));
    }

    #[test]
    fn test_submit_saves_and_notifies() {
        let mut tracker = tracker();
        add_activity(&mut tracker, "Run");

        assert_eq!(tracker.store().len(), 1);
        assert_eq!(tracker.notice().unwrap().message, SAVED_MESSAGE);
        assert_eq!(tracker.store().list()[0].primary_info(), "Run • 30 min");
    }

    #[test]
    fn test_submit_error_sets_error_notice() {
        let mut tracker = tracker();
        tracker.navigate(NavTag::Expense);
        let mut state = FormState::new();

        assert!(matches!(
            tracker.submit(&mut state, day()),
            Err(TrackerError::Form(FormError::Missing { .. }))
        ));
        assert_eq!(tracker.notice().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_cancelled_delete_keeps_records() {
        let mut tracker = tracker();
        add_activity(&mut tracker, "Run");
        tracker.navigate(NavTag::Summary);

        let pending = tracker.request_delete("0").unwrap();
        assert_eq!(pending.prompt, DELETE_PROMPT);

        assert_eq!(tracker.resolve_delete(false).unwrap(), DeleteOutcome::Cancelled);
        assert_eq!(tracker.store().len(), 1);
        assert_eq!(tracker.view(), &View::Summary);
    }

    #[test]
    fn test_confirmed_delete_rerenders_summary() {
        let mut tracker = tracker();
        add_activity(&mut tracker, "A");
        add_activity(&mut tracker, "B");
        add_activity(&mut tracker, "C");
        tracker.navigate(NavTag::Summary);

        tracker.request_delete("1").unwrap();
        match tracker.resolve_delete(true).unwrap() {
            DeleteOutcome::Deleted(record) => assert_eq!(record.field_text("activity"), "B"),
            other => panic!("expected delete, got {other:?}"),
        }

        match tracker.screen() {
            Screen::Summary(summary) => {
                let rows: Vec<_> = summary
                    .history
                    .iter()
                    .map(|r| (r.number, r.primary_info.clone()))
                    .collect();
                assert_eq!(
                    rows,
                    vec![(1, "A • 30 min".to_string()), (2, "C • 30 min".to_string())]
                );
            }
            other => panic!("expected summary, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_errors() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.request_delete("0"),
            Err(TrackerError::Store(StoreError::OutOfRange { index: 0, len: 0 }))
        ));
        assert!(matches!(
            tracker.request_delete("x"),
            Err(TrackerError::Store(StoreError::InvalidIndex(_)))
        ));
        assert!(matches!(
            tracker.resolve_delete(true),
            Err(TrackerError::View(ViewError::NoPendingDelete))
        ));
    }

    #[test]
    fn test_navigation_drops_pending_delete() {
        let mut tracker = tracker();
        add_activity(&mut tracker, "Run");
        tracker.request_delete("0").unwrap();

        tracker.navigate(NavTag::Home);
        assert!(tracker.pending_delete().is_none());
    }
}
