//! Kiểu dữ liệu phẳng dùng chung giữa tầng truy xuất MedCard và nơi hiển thị.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Giá trị hiển thị khi kho hồ sơ không cung cấp thông tin.
pub const UNKNOWN: &str = "Unknown";

/// Giá trị hiển thị cho thông tin liên lạc còn thiếu (điện thoại, email).
pub const NOT_AVAILABLE: &str = "N/A";

/// Id đại diện cho cả khối thông tin bệnh nhân khi chọn chia sẻ.
pub const PATIENT_SELECTION_ID: &str = "patient";

/// Cấu hình kết nối tới kho hồ sơ FHIR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatorConfig {
    /// URL gốc của endpoint FHIR R4, không có dấu gạch chéo cuối.
    pub base_url: String,
    /// Thời gian chờ tối đa cho mỗi request (giây).
    pub timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hapi.fhir.org/baseR4".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Hồ sơ nhân khẩu đã làm phẳng để hiển thị. Trường nào nguồn không
/// cung cấp sẽ mang giá trị mặc định thay vì bị bỏ trống.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub birth_date: String,
    pub gender: String,
    pub blood_group: String,
    /// Bác sĩ phụ trách chính, nếu hồ sơ có tham chiếu.
    pub pcp: Option<CareProvider>,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: UNKNOWN.to_string(),
            birth_date: UNKNOWN.to_string(),
            gender: UNKNOWN.to_string(),
            blood_group: UNKNOWN.to_string(),
            pcp: None,
            address: UNKNOWN.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            email: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Thông tin tóm tắt về bác sĩ phụ trách.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareProvider {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl Default for CareProvider {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: UNKNOWN.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            address: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Một dị ứng đã ghi nhận.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllergyRecord {
    pub id: String,
    pub substance: String,
    pub severity: String,
    pub status: String,
}

impl Default for AllergyRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            substance: UNKNOWN.to_string(),
            severity: UNKNOWN.to_string(),
            status: UNKNOWN.to_string(),
        }
    }
}

/// Người liên hệ khẩn cấp lấy từ các bản ghi RelatedPerson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

impl Default for EmergencyContact {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: UNKNOWN.to_string(),
            relationship: UNKNOWN.to_string(),
            phone: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Nguồn gốc dữ liệu của thẻ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardOrigin {
    /// Dữ liệu thật lấy từ kho hồ sơ.
    Upstream,
    /// Hồ sơ mẫu dùng khi không kết nối được hoặc không tìm thấy bệnh nhân.
    Sample,
}

/// Kết quả tổng hợp cuối cùng trả về cho UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCard {
    pub retrieved_at: DateTime<Utc>,
    pub origin: CardOrigin,
    pub patient: PatientRecord,
    pub allergies: Vec<AllergyRecord>,
    pub contacts: Vec<EmergencyContact>,
}

impl HealthCard {
    /// Khởi tạo thẻ từ các thành phần đã chuẩn bị, giữ nguyên thứ tự danh sách.
    pub fn new(
        origin: CardOrigin,
        patient: PatientRecord,
        allergies: Vec<AllergyRecord>,
        contacts: Vec<EmergencyContact>,
    ) -> Self {
        Self {
            retrieved_at: Utc::now(),
            origin,
            patient,
            allergies,
            contacts,
        }
    }

    /// Lọc thẻ theo các id người dùng đã tích chọn.
    ///
    /// Id đặc biệt [`PATIENT_SELECTION_ID`] chọn cả khối thông tin bệnh
    /// nhân; các id còn lại đối chiếu với id của dị ứng và người liên hệ.
    pub fn select(&self, picked: &HashSet<String>) -> SharePayload {
        SharePayload {
            patient: picked
                .contains(PATIENT_SELECTION_ID)
                .then(|| self.patient.clone()),
            allergies: self
                .allergies
                .iter()
                .filter(|a| picked.contains(&a.id))
                .cloned()
                .collect(),
            contacts: self
                .contacts
                .iter()
                .filter(|c| picked.contains(&c.id))
                .cloned()
                .collect(),
        }
    }

    /// Chọn toàn bộ nội dung thẻ.
    pub fn select_all(&self) -> SharePayload {
        SharePayload {
            patient: Some(self.patient.clone()),
            allergies: self.allergies.clone(),
            contacts: self.contacts.clone(),
        }
    }
}

/// Phần nội dung được chọn để chia sẻ (chép vào clipboard, mã quét).
///
/// Mục không được chọn bị loại bỏ hẳn khỏi JSON thay vì xuất hiện rỗng.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SharePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<AllergyRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<EmergencyContact>,
}

impl SharePayload {
    /// Đúng khi không có mục nào được chọn.
    pub fn is_empty(&self) -> bool {
        self.patient.is_none() && self.allergies.is_empty() && self.contacts.is_empty()
    }

    /// Dựng khối văn bản thuần hiển thị cạnh mã quét. Mục rỗng bị bỏ qua;
    /// không chọn gì thì trả về chuỗi rỗng.
    pub fn to_text(&self) -> String {
        let mut sections = Vec::new();

        if let Some(patient) = &self.patient {
            let mut lines = vec![
                "PATIENT INFO".to_string(),
                format!("Name: {}", patient.name),
                format!("Birth Date: {}", patient.birth_date),
                format!("Gender: {}", patient.gender),
                format!("Blood Group: {}", patient.blood_group),
            ];
            if let Some(pcp) = &patient.pcp {
                lines.push(format!("Primary Care: {} ({})", pcp.name, pcp.phone));
            }
            lines.push(format!("Address: {}", patient.address));
            lines.push(format!("Phone: {}", patient.phone));
            lines.push(format!("Email: {}", patient.email));
            sections.push(lines.join("\n"));
        }

        if !self.allergies.is_empty() {
            let entries: Vec<String> = self
                .allergies
                .iter()
                .map(|a| {
                    format!(
                        "Substance: {}\nSeverity: {}\nStatus: {}",
                        a.substance, a.severity, a.status
                    )
                })
                .collect();
            sections.push(format!("ALLERGIES\n{}", entries.join("\n\n")));
        }

        if !self.contacts.is_empty() {
            let entries: Vec<String> = self
                .contacts
                .iter()
                .map(|c| {
                    format!(
                        "Name: {}\nRelationship: {}\nPhone: {}",
                        c.name, c.relationship, c.phone
                    )
                })
                .collect();
            sections.push(format!("EMERGENCY CONTACTS\n{}", entries.join("\n\n")));
        }

        sections.join("\n\n")
    }
}

/// Lỗi khi truy xuất kho hồ sơ.
///
/// "Không tìm thấy bệnh nhân" là kết quả bình thường chứ không phải lỗi;
/// phía tìm kiếm trả về `None` cho trường hợp đó.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Kho hồ sơ trả về mã {status} cho {resource}")]
    UpstreamStatus { resource: String, status: u16 },
    #[error("Không kết nối được kho hồ sơ khi lấy {resource}: {detail}")]
    Unreachable { resource: String, detail: String },
    #[error("Không đọc được dữ liệu {resource}: {detail}")]
    Decode { resource: String, detail: String },
}

impl RecordError {
    /// Mã HTTP đính kèm lỗi, nếu có nhận được phản hồi.
    pub fn status(&self) -> Option<u16> {
        match self {
            RecordError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Đường dẫn resource của request bị lỗi.
    pub fn resource(&self) -> &str {
        match self {
            RecordError::UpstreamStatus { resource, .. }
            | RecordError::Unreachable { resource, .. }
            | RecordError::Decode { resource, .. } => resource,
        }
    }
}
