//! Orchestration: locate the subject, walk the linked resources, assemble
//! the card. Owns the fallback policy that keeps the UI contract total.

use medcard_core::{AggregatorConfig, CardOrigin, CareProvider, HealthCard, RecordError, UNKNOWN};
use serde_json::Value;

use crate::extract;
use crate::sample;
use crate::transport::{find_patient_id, HttpRecordStore, RecordStore};

const LOINC_SYSTEM: &str = "http://loinc.org";
const BLOOD_GROUP_CODE: &str = "883-9";

/// One aggregation surface over a record store.
///
/// Each call is independent and stateless; a single aggregator can serve
/// concurrent callers.
pub struct RecordAggregator<S> {
    store: S,
}

impl RecordAggregator<HttpRecordStore> {
    /// Aggregator talking HTTP to the configured record store.
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self::new(HttpRecordStore::new(config))
    }
}

impl<S: RecordStore> RecordAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch and flatten everything for one subject.
    ///
    /// This call never fails: when the subject cannot be located or the
    /// base record cannot be fetched, the sample profile is served instead,
    /// and partial upstream failures degrade individual fields. The card's
    /// `origin` says which path was taken.
    pub async fn aggregate(&self, identifier: &str) -> HealthCard {
        match self.fetch_upstream(identifier).await {
            Ok(Some(card)) => card,
            Ok(None) => {
                tracing::info!("subject not found in record store, serving sample profile");
                sample::sample_card(identifier)
            }
            Err(err) => {
                tracing::warn!(error = %err, "record aggregation failed, serving sample profile");
                sample::sample_card(identifier)
            }
        }
    }

    /// Upstream path: `Ok(None)` when the identifier matches no subject,
    /// `Err` when the subject or their base record cannot be fetched.
    async fn fetch_upstream(&self, identifier: &str) -> Result<Option<HealthCard>, RecordError> {
        let Some(subject_id) = find_patient_id(&self.store, identifier).await? else {
            return Ok(None);
        };

        let resource = self.store.get_json(&format!("Patient/{subject_id}")).await?;

        let mut patient = extract::patient_record(&resource);
        if patient.id.is_empty() {
            patient.id = subject_id.clone();
        }
        patient.pcp = self.fetch_care_provider(&resource).await;

        let allergies = match self
            .store
            .get_json(&format!("AllergyIntolerance?patient={subject_id}"))
            .await
        {
            Ok(bundle) => extract::allergy_records(&bundle),
            Err(err) => {
                tracing::warn!(error = %err, "allergy list fetch failed, rendering empty list");
                Vec::new()
            }
        };

        let contacts = match self
            .store
            .get_json(&format!("RelatedPerson?patient={subject_id}"))
            .await
        {
            Ok(bundle) => extract::emergency_contacts(&bundle),
            Err(err) => {
                tracing::warn!(error = %err, "contact list fetch failed, rendering empty list");
                Vec::new()
            }
        };

        patient.blood_group = self.resolve_blood_group(&resource, &subject_id).await;

        tracing::debug!(
            allergies = allergies.len(),
            contacts = contacts.len(),
            pcp = patient.pcp.is_some(),
            "assembled card from record store"
        );
        Ok(Some(HealthCard::new(
            CardOrigin::Upstream,
            patient,
            allergies,
            contacts,
        )))
    }

    /// Follow the first `generalPractitioner` link, if any. A failed fetch
    /// only costs this one field.
    async fn fetch_care_provider(&self, patient_resource: &Value) -> Option<CareProvider> {
        let reference = patient_resource
            .get("generalPractitioner")
            .and_then(Value::as_array)
            .and_then(|references| references.first())
            .and_then(|practitioner| practitioner.get("reference"))
            .and_then(Value::as_str)?;

        match self.store.get_json(reference).await {
            Ok(resource) => Some(extract::care_provider(&resource)),
            Err(err) => {
                tracing::debug!(error = %err, "care provider fetch failed, leaving field absent");
                None
            }
        }
    }

    /// Two-phase blood group resolution: the patient-extension side channel
    /// first, then one LOINC 883-9 observation query. A phase-two failure
    /// is swallowed and the group stays "Unknown".
    async fn resolve_blood_group(&self, patient_resource: &Value, subject_id: &str) -> String {
        if let Some(group) = extract::blood_group_extension(patient_resource) {
            return group;
        }

        let path =
            format!("Observation?patient={subject_id}&code={LOINC_SYSTEM}|{BLOOD_GROUP_CODE}");
        match self.store.get_json(&path).await {
            Ok(bundle) => {
                extract::blood_group_observation(&bundle).unwrap_or_else(|| UNKNOWN.to_string())
            }
            Err(err) => {
                tracing::debug!(error = %err, "blood group observation lookup failed");
                UNKNOWN.to_string()
            }
        }
    }
}
