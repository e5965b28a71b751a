//! Status sinks: where workflow step events are reported.

use std::{fmt, io::Write};
use tracing::{info, warn};

use docflow_core::lookup::ProvisionStatus;

/// One reportable outcome of a workflow step.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Database { name: String, status: ProvisionStatus },
    Collection { name: String, status: ProvisionStatus },
    Document { id: String, status: ProvisionStatus },
    /// One page of query results; empty when nothing matched.
    QueryPage { ids: Vec<String> },
    Replaced { id: String },
    Deleted { id: String },
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowEvent::Database { name, status }
            | WorkflowEvent::Collection { name, status } => write!(f, "{status}: {name}"),
            WorkflowEvent::Document { id, status } => write!(f, "{status}: {id}"),
            WorkflowEvent::QueryPage { ids } if ids.is_empty() => f.write_str("Nothing Found"),
            WorkflowEvent::QueryPage { ids } => {
                write!(f, "Running Query Asynchronously: {}", ids.join(", "))
            }
            WorkflowEvent::Replaced { id } => write!(f, "Document Replaced: {id}"),
            WorkflowEvent::Deleted { id } => write!(f, "Document Removed: {id}"),
        }
    }
}

/// Receives workflow events as they happen.
pub trait StatusSink {
    fn report(&mut self, event: &WorkflowEvent);
}

/// Records every event, in order.
impl StatusSink for Vec<WorkflowEvent> {
    fn report(&mut self, event: &WorkflowEvent) {
        self.push(event.clone());
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn report(&mut self, event: &WorkflowEvent) {
        (**self).report(event)
    }
}

/// Emits each event as an `info` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn report(&mut self, event: &WorkflowEvent) {
        info!(event = %event, "workflow step");
    }
}

/// Prints each event as a framed title.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for ConsoleSink<W> {
    fn report(&mut self, event: &WorkflowEvent) {
        let rule = "*".repeat(51);
        if let Err(err) = writeln!(self.out, "\n{rule}\n{event}\n{rule}") {
            warn!(error = %err, "could not write status");
        }
    }
}

/// Forwards every event to two sinks.
#[derive(Debug)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: StatusSink, B: StatusSink> StatusSink for Tee<A, B> {
    fn report(&mut self, event: &WorkflowEvent) {
        self.0.report(event);
        self.1.report(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_as_status_lines() {
        let found = WorkflowEvent::Database {
            name: "FamilyDB".into(),
            status: ProvisionStatus::Found,
        };
        assert_eq!(found.to_string(), "Found: FamilyDB");
        assert_eq!(WorkflowEvent::QueryPage { ids: vec![] }.to_string(), "Nothing Found");
        assert_eq!(
            WorkflowEvent::Deleted { id: "Andersen.1".into() }.to_string(),
            "Document Removed: Andersen.1"
        );
    }

    #[test]
    fn console_sink_frames_each_event() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.report(&WorkflowEvent::Replaced { id: "Andersen.1".into() });

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("Document Replaced: Andersen.1"));
        assert_eq!(out.matches(&"*".repeat(51)).count(), 2);
    }

    #[test]
    fn tee_reports_to_both() {
        let mut first: Vec<WorkflowEvent> = Vec::new();
        let mut second: Vec<WorkflowEvent> = Vec::new();
        Tee(&mut first, &mut second).report(&WorkflowEvent::Deleted { id: "x".into() });
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}
