use crate::{
    model::models::{DengueRecord, PaginationOutput, RecordFields, RecordFilter},
    service::records::unique_regions,
};

/**
 * A field of the edit buffer.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Location,
    Cases,
    Deaths,
    Date,
    Regions,
}

/**
 * Detached copy of a record's fields while it is being edited.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: String,
    pub fields: RecordFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/**
 * Message shown to the user after an operation.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/**
 * Interaction events for the record list.
 *
 * The server only replays the load, filter and page events to answer `records:list`. The edit,
 * delete and failure events describe the client's side of an edit session: a client calls the
 * PUT or DELETE endpoint and feeds the outcome back as `RecordUpdated`, `RecordDeleted` or
 * `OperationFailed`.
 */
#[derive(Debug, Clone)]
pub enum ListViewEvent {
    RecordsLoaded(Vec<DengueRecord>),
    FilterTextChanged(String),
    FilterRegionChanged(String),
    /**
     * Jump to a one-based page. Clamped to the available pages.
     */
    PageRequested(usize),
    NextPage,
    PreviousPage,
    EditStarted(String),
    EditFieldChanged(EditField, String),
    EditCancelled,
    /**
     * The store accepted an update. Replaces the record with the same id.
     */
    RecordUpdated(DengueRecord),
    /**
     * The store accepted a deletion.
     */
    RecordDeleted(String),
    /**
     * A store call failed. Records and edit buffer are left as they were.
     */
    OperationFailed(String),
}

/**
 * Snapshot of the record list view.
 *
 * Every interaction produces a new snapshot through `apply`; nothing is mutated in place
 * from the outside. Changing a filter moves back to page 1, anything else that shrinks the
 * filtered set clamps the current page.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewState {
    records: Vec<DengueRecord>,
    filter: RecordFilter,
    current_page: usize,
    page_size: usize,
    edit_buffer: Option<EditBuffer>,
    notice: Option<Notice>,
}

impl ListViewState {
    /**
     * Creates an empty view on page 1.
     *
     * # Arguments
     * `page_size`: Records per page. Values below 1 are treated as 1.
     */
    pub fn new(page_size: usize) -> Self {
        ListViewState { records: Vec::new(), filter: RecordFilter::default(), current_page: 1, page_size: page_size.max(1), edit_buffer: None, notice: None }
    }

    /**
     * Applies an event and returns the next snapshot.
     */
    #[must_use]
    pub fn apply(self, event: ListViewEvent) -> Self {
        let mut next = self;
        match event {
            ListViewEvent::RecordsLoaded(records) => {
                next.records = records;
                next.clamp_page();
            }
            ListViewEvent::FilterTextChanged(text) => {
                next.filter.text = text;
                next.current_page = 1;
            }
            ListViewEvent::FilterRegionChanged(region) => {
                next.filter.region = region;
                next.current_page = 1;
            }
            ListViewEvent::PageRequested(page) => {
                next.current_page = page;
                next.clamp_page();
            }
            ListViewEvent::NextPage => {
                next.current_page = next.current_page.saturating_add(1);
                next.clamp_page();
            }
            ListViewEvent::PreviousPage => {
                next.current_page = next.current_page.saturating_sub(1);
                next.clamp_page();
            }
            ListViewEvent::EditStarted(id) => {
                next.edit_buffer = next.records.iter().find(|record| record.id == id).map(|record| EditBuffer { id: record.id.clone(), fields: RecordFields::from(record) });
            }
            ListViewEvent::EditFieldChanged(field, value) => {
                if let Some(buffer) = next.edit_buffer.as_mut() {
                    let target = match field {
                        EditField::Location => &mut buffer.fields.location,
                        EditField::Cases => &mut buffer.fields.cases,
                        EditField::Deaths => &mut buffer.fields.deaths,
                        EditField::Date => &mut buffer.fields.date,
                        EditField::Regions => &mut buffer.fields.regions,
                    };
                    *target = value;
                }
            }
            ListViewEvent::EditCancelled => next.edit_buffer = None,
            ListViewEvent::RecordUpdated(updated) => {
                if let Some(record) = next.records.iter_mut().find(|record| record.id == updated.id) {
                    *record = updated;
                }
                next.edit_buffer = None;
                next.notice = Some(Notice { kind: NoticeKind::Success, message: "Data updated successfully!".to_string() });
                next.clamp_page();
            }
            ListViewEvent::RecordDeleted(id) => {
                next.records.retain(|record| record.id != id);
                if next.edit_buffer.as_ref().is_some_and(|buffer| buffer.id == id) {
                    next.edit_buffer = None;
                }
                next.notice = Some(Notice { kind: NoticeKind::Success, message: "Data deleted successfully!".to_string() });
                next.clamp_page();
            }
            ListViewEvent::OperationFailed(message) => next.notice = Some(Notice { kind: NoticeKind::Error, message }),
        }
        next
    }

    fn clamp_page(&mut self) {
        self.current_page = self.current_page.clamp(1, self.total_pages().max(1));
    }

    pub fn records(&self) -> &[DengueRecord] {
        &self.records
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit_buffer.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /**
     * Records passing the current filter, in load order.
     */
    pub fn filtered(&self) -> Vec<&DengueRecord> {
        self.records.iter().filter(|record| self.filter.matches(record)).collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /**
     * Records on the current page.
     */
    pub fn page_records(&self) -> Vec<&DengueRecord> {
        let start = (self.current_page - 1) * self.page_size;
        self.filtered().into_iter().skip(start).take(self.page_size).collect()
    }

    pub fn pagination(&self) -> PaginationOutput {
        let total_elements = self.filtered().len();
        PaginationOutput { page: self.current_page, page_size: self.page_size, total_pages: total_elements.div_ceil(self.page_size), total_elements }
    }

    /**
     * Region choices for the region filter.
     */
    pub fn regions(&self) -> Vec<String> {
        unique_regions(&self.records)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(id: usize, location: &str, region: &str) -> DengueRecord {
        DengueRecord { id: id.to_string(), location: location.to_string(), cases: i64::try_from(id).unwrap() * 10, deaths: 1, date: "2024-01-01".to_string(), regions: region.to_string() }
    }

    fn loaded(count: usize) -> ListViewState {
        let records = (0..count).map(|id| record(id, &format!("Town {id}"), if id % 2 == 0 { "NCR" } else { "CAR" })).collect();
        ListViewState::new(10).apply(ListViewEvent::RecordsLoaded(records))
    }

    fn ids(records: &[&DengueRecord]) -> Vec<String> {
        records.iter().map(|record| record.id.clone()).collect()
    }

    #[test]
    fn test_pages_of_twenty_five() {
        let state = loaded(25);
        assert_eq!(state.total_pages(), 3);
        assert_eq!(ids(&state.page_records()), (0..10).map(|id| id.to_string()).collect::<Vec<_>>());
        let state = state.apply(ListViewEvent::PageRequested(3));
        assert_eq!(ids(&state.page_records()), (20..25).map(|id| id.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_navigation_clamps() {
        let state = loaded(25).apply(ListViewEvent::PreviousPage);
        assert_eq!(state.current_page(), 1);
        let state = state.apply(ListViewEvent::NextPage).apply(ListViewEvent::NextPage).apply(ListViewEvent::NextPage);
        assert_eq!(state.current_page(), 3);
        let state = state.apply(ListViewEvent::PageRequested(99));
        assert_eq!(state.current_page(), 3);
        let empty = ListViewState::new(10).apply(ListViewEvent::NextPage);
        assert_eq!(empty.current_page(), 1);
        assert_eq!(empty.total_pages(), 0);
        assert!(empty.page_records().is_empty());
    }

    #[test]
    fn test_filter_text_and_region() {
        let records = vec![record(1, "Quezon City", "NCR"), record(2, "Baguio City", "CAR"), record(3, "Manila", "NCR"), record(4, "quezon province", "Region IV-A")];
        let state = ListViewState::new(10).apply(ListViewEvent::RecordsLoaded(records));
        let state = state.apply(ListViewEvent::FilterTextChanged("QUEZON".to_string()));
        assert_eq!(ids(&state.filtered()), vec!["1".to_string(), "4".to_string()]);
        let state = state.apply(ListViewEvent::FilterRegionChanged("NCR".to_string()));
        assert_eq!(ids(&state.filtered()), vec!["1".to_string()]);
        let state = state.apply(ListViewEvent::FilterTextChanged(String::new())).apply(ListViewEvent::FilterRegionChanged(String::new()));
        assert_eq!(state.filtered().len(), 4);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let state = loaded(25).apply(ListViewEvent::PageRequested(3));
        let state = state.apply(ListViewEvent::FilterRegionChanged("CAR".to_string()));
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.total_pages(), 2);
    }

    #[test]
    fn test_edit_updates_only_that_record() {
        let state = loaded(3).apply(ListViewEvent::EditStarted("1".to_string()));
        let buffer = state.edit_buffer().unwrap();
        assert_eq!(buffer.fields.cases, "10");
        let state = state.apply(ListViewEvent::EditFieldChanged(EditField::Cases, "99".to_string()));
        assert_eq!(state.records()[1].cases, 10, "edit buffer is detached from the list");
        let input = state.edit_buffer().unwrap().fields.validate().unwrap();
        let before = state.records().to_vec();
        let state = state.apply(ListViewEvent::RecordUpdated(DengueRecord::new("1".to_string(), input)));
        assert!(state.edit_buffer().is_none());
        assert_eq!(state.records()[1].cases, 99);
        assert_eq!(state.records()[1].location, before[1].location);
        assert_eq!(state.records()[0], before[0]);
        assert_eq!(state.records()[2], before[2]);
        assert_eq!(state.notice().unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn test_edit_cancel_discards_buffer() {
        let before = loaded(3);
        let state = before.clone().apply(ListViewEvent::EditStarted("2".to_string())).apply(ListViewEvent::EditFieldChanged(EditField::Location, "Elsewhere".to_string())).apply(ListViewEvent::EditCancelled);
        assert_eq!(state, before);
    }

    #[test]
    fn test_delete_removes_exactly_one_and_clamps() {
        let state = loaded(11).apply(ListViewEvent::PageRequested(2));
        let state = state.apply(ListViewEvent::RecordDeleted("10".to_string()));
        assert_eq!(state.records().len(), 10);
        assert!(state.records().iter().all(|record| record.id != "10"));
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_failure_keeps_records() {
        let before = loaded(3).apply(ListViewEvent::EditStarted("0".to_string()));
        let state = before.clone().apply(ListViewEvent::OperationFailed("Store unavailable".to_string()));
        assert_eq!(state.records(), before.records());
        assert_eq!(state.edit_buffer(), before.edit_buffer());
        assert_eq!(state.notice(), Some(&Notice { kind: NoticeKind::Error, message: "Store unavailable".to_string() }));
    }
}
