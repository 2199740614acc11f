//! Pure extractors turning loosely-shaped store resources into flat records.
//! Every function is total: whatever shape comes back, missing or malformed
//! data becomes sentinel defaults. Nothing here performs I/O.

use medcard_core::{
    AllergyRecord, CareProvider, EmergencyContact, PatientRecord, NOT_AVAILABLE, UNKNOWN,
};
use serde_json::Value;

/// Flatten a `Patient` resource into the demographic record. Blood group and
/// the care-provider link are resolved by the aggregator and left at their
/// defaults here.
pub fn patient_record(resource: &Value) -> PatientRecord {
    PatientRecord {
        id: resource_id(resource),
        name: human_name(resource).unwrap_or_else(|| UNKNOWN.to_string()),
        birth_date: non_empty(resource.get("birthDate")).unwrap_or_else(|| UNKNOWN.to_string()),
        gender: non_empty(resource.get("gender")).unwrap_or_else(|| UNKNOWN.to_string()),
        address: postal_address(resource).unwrap_or_else(|| UNKNOWN.to_string()),
        phone: telecom_value(resource, "phone").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        email: telecom_value(resource, "email").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ..PatientRecord::default()
    }
}

/// Flatten a `Practitioner` resource into the care-provider summary.
pub fn care_provider(resource: &Value) -> CareProvider {
    CareProvider {
        id: resource_id(resource),
        name: human_name(resource).unwrap_or_else(|| UNKNOWN.to_string()),
        phone: telecom_value(resource, "phone").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        address: postal_address(resource).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

/// Flatten an `AllergyIntolerance` search bundle. Entries without a store id
/// get a positional one (`allergy-1`, `allergy-2`, ...).
pub fn allergy_records(bundle: &Value) -> Vec<AllergyRecord> {
    bundle_resources(bundle)
        .enumerate()
        .map(|(index, resource)| AllergyRecord {
            id: resource_or_positional_id(resource, "allergy", index),
            substance: resource
                .get("code")
                .and_then(code_text)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            severity: allergy_severity(resource).unwrap_or_else(|| UNKNOWN.to_string()),
            status: clinical_status(resource).unwrap_or_else(|| UNKNOWN.to_string()),
        })
        .collect()
}

/// Flatten a `RelatedPerson` search bundle into emergency contacts.
pub fn emergency_contacts(bundle: &Value) -> Vec<EmergencyContact> {
    bundle_resources(bundle)
        .enumerate()
        .map(|(index, resource)| EmergencyContact {
            id: resource_or_positional_id(resource, "contact", index),
            name: human_name(resource).unwrap_or_else(|| UNKNOWN.to_string()),
            relationship: relationship_label(resource).unwrap_or_else(|| UNKNOWN.to_string()),
            phone: telecom_value(resource, "phone").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
        .collect()
}

/// Phase-one blood group lookup: the first patient extension whose url
/// mentions the blood group. A matching but valueless extension yields
/// `None`, which lets the observation query still run.
pub fn blood_group_extension(patient: &Value) -> Option<String> {
    let extensions = patient.get("extension").and_then(Value::as_array)?;
    let hit = extensions.iter().find(|ext| {
        ext.get("url")
            .and_then(Value::as_str)
            .map(|url| {
                let url = url.to_lowercase();
                url.contains("bloodgroup") || url.contains("blood-group")
            })
            .unwrap_or(false)
    })?;

    non_empty(hit.get("valueString")).or_else(|| non_empty(hit.get("valueCode")))
}

/// Phase-two blood group lookup: the first returned observation's string
/// value, else the text of its codeable value.
pub fn blood_group_observation(bundle: &Value) -> Option<String> {
    let resource = bundle
        .get("entry")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())?
        .get("resource")?;

    non_empty(resource.get("valueString")).or_else(|| {
        resource
            .get("valueCodeableConcept")
            .and_then(|concept| non_empty(concept.get("text")))
    })
}

fn bundle_resources(bundle: &Value) -> impl Iterator<Item = &Value> {
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|entry| entry.get("resource"))
}

fn resource_id(resource: &Value) -> String {
    resource
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn resource_or_positional_id(resource: &Value, prefix: &str, index: usize) -> String {
    resource
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{prefix}-{}", index + 1))
}

fn human_name(resource: &Value) -> Option<String> {
    let name = resource
        .get("name")
        .and_then(Value::as_array)
        .and_then(|names| names.first())?;

    let mut parts: Vec<&str> = Vec::new();
    if let Some(given) = name.get("given").and_then(Value::as_array) {
        parts.extend(given.iter().filter_map(Value::as_str));
    }
    if let Some(family) = name.get("family").and_then(Value::as_str) {
        parts.push(family);
    }

    let joined = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn postal_address(resource: &Value) -> Option<String> {
    let address = resource
        .get("address")
        .and_then(Value::as_array)
        .and_then(|addresses| addresses.first())?;

    let mut segments: Vec<String> = Vec::new();

    if let Some(lines) = address.get("line").and_then(Value::as_array) {
        let street = lines
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if !street.is_empty() {
            segments.push(street);
        }
    }

    if let Some(city) = non_empty(address.get("city")) {
        segments.push(city);
    }

    let state_zip = match (non_empty(address.get("state")), non_empty(address.get("postalCode"))) {
        (Some(state), Some(postal)) => Some(format!("{state} {postal}")),
        (Some(state), None) => Some(state),
        (None, Some(postal)) => Some(postal),
        (None, None) => None,
    };
    if let Some(state_zip) = state_zip {
        segments.push(state_zip);
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join(", "))
    }
}

fn telecom_value(resource: &Value, system: &str) -> Option<String> {
    let telecom = resource.get("telecom").and_then(Value::as_array)?;
    // The first entry with a matching system ends the scan, valueless or not.
    let hit = telecom
        .iter()
        .find(|entry| entry.get("system").and_then(Value::as_str) == Some(system))?;
    non_empty(hit.get("value"))
}

fn code_text(concept: &Value) -> Option<String> {
    non_empty(concept.get("text")).or_else(|| {
        concept
            .get("coding")
            .and_then(Value::as_array)
            .and_then(|codings| codings.first())
            .and_then(|coding| non_empty(coding.get("display")))
    })
}

fn allergy_severity(resource: &Value) -> Option<String> {
    resource
        .get("reaction")
        .and_then(Value::as_array)
        .and_then(|reactions| reactions.first())
        .and_then(|reaction| non_empty(reaction.get("severity")))
        .or_else(|| non_empty(resource.get("criticality")))
}

fn clinical_status(resource: &Value) -> Option<String> {
    resource
        .get("clinicalStatus")
        .and_then(|status| status.get("coding"))
        .and_then(Value::as_array)
        .and_then(|codings| codings.first())
        .and_then(|coding| non_empty(coding.get("code")))
}

fn relationship_label(resource: &Value) -> Option<String> {
    resource
        .get("relationship")
        .and_then(Value::as_array)
        .and_then(|relationships| relationships.first())
        .and_then(|relationship| relationship.get("coding"))
        .and_then(Value::as_array)
        .and_then(|codings| codings.first())
        .and_then(|coding| non_empty(coding.get("display")))
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_patient_gets_all_sentinels() {
        let record = patient_record(&json!({}));

        assert_eq!(record.id, "");
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.birth_date, "Unknown");
        assert_eq!(record.gender, "Unknown");
        assert_eq!(record.blood_group, "Unknown");
        assert_eq!(record.address, "Unknown");
        assert_eq!(record.phone, "N/A");
        assert_eq!(record.email, "N/A");
        assert!(record.pcp.is_none());
    }

    #[test]
    fn non_object_resource_is_tolerated() {
        let record = patient_record(&json!("not even an object"));
        assert_eq!(record.name, "Unknown");

        let record = patient_record(&Value::Null);
        assert_eq!(record.phone, "N/A");
    }

    #[test]
    fn name_joins_all_given_parts_before_family() {
        let record = patient_record(&json!({
            "name": [{ "given": ["Maria", "Elena"], "family": "Rivera" }]
        }));
        assert_eq!(record.name, "Maria Elena Rivera");
    }

    #[test]
    fn whitespace_only_name_counts_as_absent() {
        let record = patient_record(&json!({
            "name": [{ "given": ["   "], "family": "  " }]
        }));
        assert_eq!(record.name, "Unknown");
    }

    #[test]
    fn name_with_only_family_still_renders() {
        let record = patient_record(&json!({
            "name": [{ "family": "Rivera" }]
        }));
        assert_eq!(record.name, "Rivera");
    }

    #[test]
    fn later_name_entries_are_ignored() {
        let record = patient_record(&json!({
            "name": [
                { "given": ["Maria"], "family": "Rivera" },
                { "given": ["M"], "family": "R" }
            ]
        }));
        assert_eq!(record.name, "Maria Rivera");
    }

    #[test]
    fn full_address_renders_on_one_line() {
        let record = patient_record(&json!({
            "address": [{
                "line": ["742 Oak Ave", "Apt 3B"],
                "city": "Boston",
                "state": "MA",
                "postalCode": "02115"
            }]
        }));
        assert_eq!(record.address, "742 Oak Ave, Apt 3B, Boston, MA 02115");
    }

    #[test]
    fn partial_address_leaves_no_stray_separators() {
        let record = patient_record(&json!({
            "address": [{ "city": "Boston", "postalCode": "02115" }]
        }));
        assert_eq!(record.address, "Boston, 02115");

        let record = patient_record(&json!({
            "address": [{ "line": ["742 Oak Ave"] }]
        }));
        assert_eq!(record.address, "742 Oak Ave");

        let record = patient_record(&json!({
            "address": [{ "state": "MA" }]
        }));
        assert_eq!(record.address, "MA");
    }

    #[test]
    fn address_entry_with_no_usable_parts_is_absent() {
        let record = patient_record(&json!({
            "address": [{ "line": ["  "], "city": "" }]
        }));
        assert_eq!(record.address, "Unknown");
    }

    #[test]
    fn telecom_takes_first_matching_system() {
        let record = patient_record(&json!({
            "telecom": [
                { "system": "phone", "value": "(617) 555-0142" },
                { "system": "phone", "value": "(617) 555-9999" },
                { "system": "email", "value": "maria@example.com" }
            ]
        }));
        assert_eq!(record.phone, "(617) 555-0142");
        assert_eq!(record.email, "maria@example.com");
    }

    #[test]
    fn valueless_telecom_match_ends_the_scan() {
        // The first entry with the right system wins even when it carries
        // no value; a later usable entry is not consulted.
        let record = patient_record(&json!({
            "telecom": [
                { "system": "phone" },
                { "system": "phone", "value": "(617) 555-9999" }
            ]
        }));
        assert_eq!(record.phone, "N/A");
    }

    #[test]
    fn practitioner_address_defaults_to_not_available() {
        let provider = care_provider(&json!({ "id": "prac-7" }));
        assert_eq!(provider.id, "prac-7");
        assert_eq!(provider.name, "Unknown");
        assert_eq!(provider.phone, "N/A");
        assert_eq!(provider.address, "N/A");
    }

    #[test]
    fn allergy_substance_prefers_text_over_display() {
        let records = allergy_records(&json!({
            "entry": [{ "resource": {
                "code": {
                    "text": "Penicillin",
                    "coding": [{ "display": "Penicillin G" }]
                }
            }}]
        }));
        assert_eq!(records[0].substance, "Penicillin");

        let records = allergy_records(&json!({
            "entry": [{ "resource": {
                "code": { "coding": [{ "display": "Penicillin G" }] }
            }}]
        }));
        assert_eq!(records[0].substance, "Penicillin G");

        let records = allergy_records(&json!({
            "entry": [{ "resource": { "code": {} } }]
        }));
        assert_eq!(records[0].substance, "Unknown");
    }

    #[test]
    fn allergy_severity_prefers_reaction_over_criticality() {
        let records = allergy_records(&json!({
            "entry": [{ "resource": {
                "criticality": "low",
                "reaction": [{ "severity": "severe" }]
            }}]
        }));
        assert_eq!(records[0].severity, "severe");

        let records = allergy_records(&json!({
            "entry": [{ "resource": { "criticality": "low", "reaction": [{}] } }]
        }));
        assert_eq!(records[0].severity, "low");
    }

    #[test]
    fn allergy_status_reads_first_clinical_status_coding() {
        let records = allergy_records(&json!({
            "entry": [{ "resource": {
                "clinicalStatus": { "coding": [{ "code": "active" }, { "code": "resolved" }] }
            }}]
        }));
        assert_eq!(records[0].status, "active");
    }

    #[test]
    fn missing_list_ids_are_synthesized_positionally() {
        let records = allergy_records(&json!({
            "entry": [
                { "resource": { "id": "al-991" } },
                { "resource": {} },
                { "resource": { "id": "" } }
            ]
        }));
        assert_eq!(records[0].id, "al-991");
        assert_eq!(records[1].id, "allergy-2");
        assert_eq!(records[2].id, "allergy-3");

        let contacts = emergency_contacts(&json!({
            "entry": [{ "resource": {} }]
        }));
        assert_eq!(contacts[0].id, "contact-1");
    }

    #[test]
    fn entries_without_resources_are_skipped() {
        let records = allergy_records(&json!({
            "entry": [
                { "fullUrl": "urn:uuid:abc" },
                { "resource": { "id": "al-1" } }
            ]
        }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "al-1");
    }

    #[test]
    fn empty_or_malformed_bundles_give_empty_lists() {
        assert!(allergy_records(&json!({})).is_empty());
        assert!(allergy_records(&json!({ "entry": "wat" })).is_empty());
        assert!(emergency_contacts(&Value::Null).is_empty());
    }

    #[test]
    fn contact_relationship_reads_first_coding_display() {
        let contacts = emergency_contacts(&json!({
            "entry": [{ "resource": {
                "name": [{ "given": ["Carlos"], "family": "Rivera" }],
                "relationship": [{ "coding": [{ "code": "SPS", "display": "spouse" }] }],
                "telecom": [{ "system": "phone", "value": "(617) 555-0177" }]
            }}]
        }));
        assert_eq!(contacts[0].name, "Carlos Rivera");
        assert_eq!(contacts[0].relationship, "spouse");
        assert_eq!(contacts[0].phone, "(617) 555-0177");
    }

    #[test]
    fn blood_group_extension_matches_url_loosely() {
        let group = blood_group_extension(&json!({
            "extension": [{
                "url": "http://example.org/fhir/StructureDefinition/Patient-BloodGroup",
                "valueString": "B-"
            }]
        }));
        assert_eq!(group.as_deref(), Some("B-"));

        let group = blood_group_extension(&json!({
            "extension": [{
                "url": "http://example.org/fhir/blood-group",
                "valueCode": "O+"
            }]
        }));
        assert_eq!(group.as_deref(), Some("O+"));
    }

    #[test]
    fn valueless_blood_group_extension_yields_none() {
        let group = blood_group_extension(&json!({
            "extension": [{ "url": "http://example.org/fhir/bloodgroup" }]
        }));
        assert!(group.is_none());
    }

    #[test]
    fn unrelated_extensions_are_ignored() {
        let group = blood_group_extension(&json!({
            "extension": [{
                "url": "http://hl7.org/fhir/StructureDefinition/patient-birthPlace",
                "valueString": "Boston"
            }]
        }));
        assert!(group.is_none());
    }

    #[test]
    fn observation_value_string_beats_codeable_text() {
        let group = blood_group_observation(&json!({
            "entry": [{ "resource": {
                "valueString": "A+",
                "valueCodeableConcept": { "text": "Group A RhD positive" }
            }}]
        }));
        assert_eq!(group.as_deref(), Some("A+"));

        let group = blood_group_observation(&json!({
            "entry": [{ "resource": {
                "valueCodeableConcept": { "text": "Group A RhD positive" }
            }}]
        }));
        assert_eq!(group.as_deref(), Some("Group A RhD positive"));
    }

    #[test]
    fn empty_observation_bundle_yields_none() {
        assert!(blood_group_observation(&json!({ "entry": [] })).is_none());
        assert!(blood_group_observation(&json!({})).is_none());
    }
}
