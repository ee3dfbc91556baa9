use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::OpportunityDetail;

/// Separator between exchange code and symbol, as in `NASDAQ:AAPL`.
const EXCHANGE_SEPARATOR: char = ':';

/// Chart widget symbol for a ticker.
///
/// Tickers that already carry an exchange qualifier pass through; everything
/// else gets `exchange` prefixed. This is a guess, not exchange resolution:
/// an NYSE listing without a qualifier ends up under the default exchange.
pub fn chart_symbol(ticker: &str, exchange: &str) -> String {
    if ticker.contains(EXCHANGE_SEPARATOR) {
        ticker.to_string()
    } else {
        format!("{exchange}{EXCHANGE_SEPARATOR}{ticker}")
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetailState {
    #[default]
    Idle,
    Loading { id: i64 },
    Loaded { id: i64, detail: Box<OpportunityDetail> },
    Errored { id: i64, message: String },
}

impl DetailState {
    /// Opportunity the overlay is showing, if open.
    pub fn id(&self) -> Option<i64> {
        match self {
            DetailState::Idle => None,
            DetailState::Loading { id }
            | DetailState::Loaded { id, .. }
            | DetailState::Errored { id, .. } => Some(*id),
        }
    }
}

/// Identifies one detail request. A response is only applied while its
/// ticket is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    pub id: i64,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Indicators,
    Rationale,
    Chart,
    Timeline,
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indicators" => Ok(Section::Indicators),
            "rationale" => Ok(Section::Rationale),
            "chart" => Ok(Section::Chart),
            "timeline" => Ok(Section::Timeline),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Indicators => "indicators",
            Section::Rationale => "rationale",
            Section::Chart => "chart",
            Section::Timeline => "timeline",
        };
        f.write_str(name)
    }
}

/// Expanded/collapsed flags for the overlay sections. All collapsed by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetailSections {
    pub indicators: bool,
    pub rationale: bool,
    pub chart: bool,
    pub timeline: bool,
}

impl DetailSections {
    pub fn is_open(&self, section: Section) -> bool {
        match section {
            Section::Indicators => self.indicators,
            Section::Rationale => self.rationale,
            Section::Chart => self.chart,
            Section::Timeline => self.timeline,
        }
    }

    fn flag_mut(&mut self, section: Section) -> &mut bool {
        match section {
            Section::Indicators => &mut self.indicators,
            Section::Rationale => &mut self.rationale,
            Section::Chart => &mut self.chart,
            Section::Timeline => &mut self.timeline,
        }
    }
}

/// Per-overlay fetch state: `idle → loading → loaded | errored`.
///
/// Nothing is cached across opens; reopening an item issues a new ticket and
/// the caller fetches again.
#[derive(Debug, Default)]
pub struct DetailController {
    state: DetailState,
    sections: DetailSections,
    current: Option<DetailTicket>,
    next_seq: u64,
}

impl DetailController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn sections(&self) -> DetailSections {
        self.sections
    }

    /// Open the overlay for `id`. Any in-flight request becomes stale.
    pub fn open(&mut self, id: i64) -> DetailTicket {
        self.next_seq += 1;
        let ticket = DetailTicket {
            id,
            seq: self.next_seq,
        };
        self.current = Some(ticket);
        self.state = DetailState::Loading { id };
        self.sections = DetailSections::default();
        ticket
    }

    /// Apply a fetch result. Returns `false` (and changes nothing) when the
    /// ticket no longer matches the open item.
    pub fn complete(
        &mut self,
        ticket: DetailTicket,
        result: Result<OpportunityDetail, String>,
    ) -> bool {
        if self.current != Some(ticket) {
            return false;
        }

        self.current = None;
        self.state = match result {
            Ok(detail) => DetailState::Loaded {
                id: ticket.id,
                detail: Box::new(detail),
            },
            Err(message) => DetailState::Errored {
                id: ticket.id,
                message,
            },
        };
        true
    }

    pub fn close(&mut self) {
        self.current = None;
        self.state = DetailState::Idle;
        self.sections = DetailSections::default();
    }

    /// Flip one section and return its new value. Works in any state.
    pub fn toggle(&mut self, section: Section) -> bool {
        let flag = self.sections.flag_mut(section);
        *flag = !*flag;
        *flag
    }
}
