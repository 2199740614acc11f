//! Canned fallback profiles, served when the record store cannot.
//!
//! All data here is fictional and fixed. The identifier substring switch
//! exists purely so manual demos can show two distinct profiles; it is not
//! authentication and must never grow trust decisions.

use medcard_core::{
    AllergyRecord, CardOrigin, CareProvider, EmergencyContact, HealthCard, PatientRecord,
};

/// Deterministic profile for an identifier. Identifiers containing "123"
/// get the second canned profile.
pub fn sample_card(identifier: &str) -> HealthCard {
    if identifier.contains("123") {
        variant_profile()
    } else {
        baseline_profile()
    }
}

fn baseline_profile() -> HealthCard {
    HealthCard::new(
        CardOrigin::Sample,
        baseline_patient(),
        vec![
            allergy("allergy-001", "Penicillin", "High", "Active"),
            allergy("allergy-002", "Peanuts", "High", "Active"),
            allergy("allergy-003", "Shellfish", "Medium", "Active"),
        ],
        vec![
            contact("contact-001", "Jane Smith", "Spouse", "(555) 987-6543"),
            contact("contact-002", "Robert Smith", "Father", "(555) 456-7890"),
        ],
    )
}

// The second profile swaps the person and the lists but keeps the rest of
// the baseline demographics, matching the portal's long-standing demo data.
fn variant_profile() -> HealthCard {
    let patient = PatientRecord {
        name: "Alice Johnson".to_string(),
        birth_date: "1990-07-22".to_string(),
        gender: "female".to_string(),
        blood_group: "O-".to_string(),
        ..baseline_patient()
    };

    HealthCard::new(
        CardOrigin::Sample,
        patient,
        vec![allergy("allergy-004", "Latex", "High", "Active")],
        vec![contact("contact-003", "Mike Johnson", "Brother", "(555) 234-5678")],
    )
}

fn baseline_patient() -> PatientRecord {
    PatientRecord {
        id: "patient-001".to_string(),
        name: "John Smith".to_string(),
        birth_date: "1985-03-15".to_string(),
        gender: "male".to_string(),
        blood_group: "A+".to_string(),
        pcp: Some(CareProvider {
            id: "practitioner-001".to_string(),
            name: "Sarah Chen".to_string(),
            phone: "(555) 321-7700".to_string(),
            address: "450 Medical Plaza, Anytown, NY 12345".to_string(),
        }),
        address: "123 Main St, Anytown, NY 12345".to_string(),
        phone: "(555) 123-4567".to_string(),
        email: "john.smith@email.com".to_string(),
    }
}

fn allergy(id: &str, substance: &str, severity: &str, status: &str) -> AllergyRecord {
    AllergyRecord {
        id: id.to_string(),
        substance: substance.to_string(),
        severity: severity.to_string(),
        status: status.to_string(),
    }
}

fn contact(id: &str, name: &str, relationship: &str, phone: &str) -> EmergencyContact {
    EmergencyContact {
        id: id.to_string(),
        name: name.to_string(),
        relationship: relationship.to_string(),
        phone: phone.to_string(),
    }
}
