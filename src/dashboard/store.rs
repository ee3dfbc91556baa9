use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::backend::types::ApiOpportunity;
use crate::models::Opportunity;

/// Identifies one list read. Issued before the request goes out so that
/// reads are ordered by when they started, not when they landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

/// In-memory opportunity list plus the list-level UI state around it.
///
/// The list is only ever replaced wholesale; failures leave it untouched.
#[derive(Debug, Default)]
pub struct OpportunityStore {
    items: Vec<Opportunity>,
    last_loaded: Option<DateTime<Utc>>,
    last_run: Option<DateTime<Utc>>,
    error: Option<String>,
    next_seq: u64,
    committed_seq: u64,
}

impl OpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Opportunity] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&Opportunity> {
        self.items.iter().find(|o| o.id == id)
    }

    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.last_loaded
    }

    /// When the last successful analysis run finished.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.next_seq += 1;
        LoadTicket { seq: self.next_seq }
    }

    /// True once a read started after `ticket` has been committed.
    pub fn is_superseded(&self, ticket: LoadTicket) -> bool {
        ticket.seq < self.committed_seq
    }

    /// Apply the rows from the read behind `ticket`. Returns `None` and
    /// leaves the list alone when a newer read already landed.
    pub fn commit(&mut self, ticket: LoadTicket, rows: Vec<ApiOpportunity>) -> Option<usize> {
        if self.is_superseded(ticket) {
            return None;
        }
        self.committed_seq = ticket.seq;
        Some(self.replace(rows))
    }

    /// Replace the whole list with a fresh read, keeping server order.
    /// Returns the number of rows kept.
    pub fn replace(&mut self, rows: Vec<ApiOpportunity>) -> usize {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut items = Vec::with_capacity(rows.len());

        for row in rows {
            if !seen.insert(row.id) {
                tracing::warn!(id = row.id, ticker = %row.ticker, "Dropping duplicate opportunity id");
                continue;
            }
            items.push(Opportunity::from(row));
        }

        self.items = items;
        self.last_loaded = Some(Utc::now());
        self.items.len()
    }

    pub fn mark_run(&mut self, at: DateTime<Utc>) {
        self.last_run = Some(at);
    }

    /// Set the banner for a failed operation and return its text.
    pub fn record_error(&mut self, operation: &str, error: impl std::fmt::Display) -> String {
        let message = format!("Failed to {operation}: {error}");
        self.error = Some(message.clone());
        message
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
