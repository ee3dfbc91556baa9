pub mod client;
pub mod types;

pub use client::{BackendClient, BackendError};
pub use types::{
    ApiOpportunity, ApiOpportunityDetail, ChatResponse, HealthResponse, ResearchRequest,
    ResearchResponse,
};
