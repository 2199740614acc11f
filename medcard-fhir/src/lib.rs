//! FHIR record retrieval and flattening for MedCard health summaries.
//!
//! The aggregator locates a subject in the upstream record store by external
//! identifier, pulls the demographic, practitioner, allergy and
//! related-person resources, and flattens them into the fully-defaulted
//! [`medcard_core::HealthCard`] view model. When the store is unreachable or
//! the subject is unknown, a deterministic sample profile is served instead,
//! so callers always receive something renderable.

mod aggregate;
pub mod extract;
mod sample;
mod transport;

pub use aggregate::RecordAggregator;
pub use sample::sample_card;
pub use transport::{find_patient_id, HttpRecordStore, RecordStore};
