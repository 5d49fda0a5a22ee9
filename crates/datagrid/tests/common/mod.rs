//! Shared fixtures: a grid host that records notifications and queues
//! scheduled tasks, and a static row type.

#![allow(dead_code)]

use std::cell::RefCell;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use datagrid::{
    cell_enum, ColumnId, DeferredTask, FilterChange, FilterId, GridEnum, GridHost, GridOptions,
    Result, Row, TypeClassifier,
};
use datagrid_macros::GridRow;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    GroupingChanged(ColumnId),
    HiddenChanged(ColumnId, bool),
    FilterChanged(FilterId, FilterChange),
    FilterRemoved(FilterId),
    Rerender,
    Repipeline,
    Scheduled(Duration),
}

pub struct RecordingHost<R> {
    pub items: Vec<R>,
    pub options: GridOptions,
    pub classifier: TypeClassifier,
    events: RefCell<Vec<Event>>,
    tasks: RefCell<Vec<DeferredTask<R>>>,
}

impl<R: Row> RecordingHost<R> {
    pub fn new(items: Vec<R>) -> Self {
        RecordingHost {
            items,
            options: GridOptions::default(),
            classifier: TypeClassifier::default(),
            events: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
        }
    }

    pub fn with_options(mut self, options: GridOptions) -> Self {
        self.options = options;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Runs every queued task as if its delay had elapsed.
    pub fn run_scheduled(&self) -> Result<()> {
        let tasks: Vec<DeferredTask<R>> = self.tasks.borrow_mut().drain(..).collect();
        let host: &dyn GridHost<R> = self;
        for task in tasks {
            task(host)?;
        }
        Ok(())
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl<R: Row> GridHost<R> for RecordingHost<R> {
    fn items(&self) -> &[R] {
        &self.items
    }

    fn options(&self) -> &GridOptions {
        &self.options
    }

    fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    fn grouping_changed(&self, column: ColumnId) {
        self.record(Event::GroupingChanged(column));
    }

    fn column_hidden_changed(&self, column: ColumnId, hidden: bool) {
        self.record(Event::HiddenChanged(column, hidden));
    }

    fn filter_changed(&self, filter: FilterId, change: &FilterChange) {
        self.record(Event::FilterChanged(filter, change.clone()));
    }

    fn filter_removed(&self, filter: FilterId) {
        self.record(Event::FilterRemoved(filter));
    }

    fn request_rerender(&self) {
        self.record(Event::Rerender);
    }

    fn request_repipeline(&self) {
        self.record(Event::Repipeline);
    }

    fn schedule_once(&self, delay: Duration, task: DeferredTask<R>) {
        self.record(Event::Scheduled(delay));
        self.tasks.borrow_mut().push(task);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Active,
    Done,
}

impl GridEnum for Status {
    const TYPE_NAME: &'static str = "Status";

    fn discriminant(&self) -> u32 {
        match self {
            Status::Pending => 0,
            Status::Active => 1,
            Status::Done => 2,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Active => "Active",
            Status::Done => "Done",
        }
    }
}

cell_enum!(Status);

#[derive(Debug, Clone, GridRow)]
pub struct Person {
    #[grid(rename = "Name")]
    pub name: String,
    #[grid(rename = "Age")]
    pub age: Option<i32>,
    #[grid(rename = "Status")]
    pub status: Status,
    #[grid(rename = "Active")]
    pub active: bool,
    #[grid(rename = "Joined")]
    pub joined: NaiveDateTime,
    #[grid(skip)]
    pub notes: Vec<String>,
}

pub fn date_time(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid date")
}

pub fn person(name: &str, age: Option<i32>, status: Status) -> Person {
    Person {
        name: name.to_string(),
        age,
        status,
        active: status == Status::Active,
        joined: date_time(2024, 1, 1, 9, 0),
        notes: Vec::new(),
    }
}

pub fn people() -> Vec<Person> {
    vec![
        person("Ann", Some(30), Status::Active),
        person("bob", Some(25), Status::Pending),
        person("Cid", Some(30), Status::Done),
        person("Dee", None, Status::Active),
    ]
}
