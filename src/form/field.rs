//! Canonical field identifiers.
//!
//! The same camelCase names are used as form field ids, in validation
//! errors, and as the keys of the lead payload sent to the backend.

use serde::{Deserialize, Serialize};

/// Every field the questionnaire collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldId {
    #[serde(rename = "customer")]
    Customer,
    #[serde(rename = "role")]
    Role,
    #[serde(rename = "hospitalName")]
    HospitalName,
    #[serde(rename = "hospitalEmail")]
    HospitalEmail,
    #[serde(rename = "hospitalContact")]
    HospitalContact,
    #[serde(rename = "cnpj")]
    Cnpj,
    #[serde(rename = "cep")]
    Cep,
    #[serde(rename = "street")]
    Street,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "neighborhood")]
    Neighborhood,
    #[serde(rename = "city")]
    City,
    #[serde(rename = "state")]
    State,
    #[serde(rename = "businessMoment")]
    BusinessMoment,
    #[serde(rename = "hasClinicalEngineering")]
    HasClinicalEngineering,
    #[serde(rename = "clinicalEngineeringModel")]
    ClinicalEngineeringModel,
    #[serde(rename = "needing")]
    Needing,
    #[serde(rename = "cmeStatus")]
    CmeStatus,
    #[serde(rename = "cmeIntent")]
    CmeIntent,
    #[serde(rename = "surgeryDays")]
    SurgeryDays,
    #[serde(rename = "intervalCMEHour")]
    IntervalCmeHour,
    #[serde(rename = "processingTissue")]
    ProcessingTissue,
    #[serde(rename = "numberOfSurgery")]
    NumberOfSurgery,
    #[serde(rename = "numberSurgeryRoomDay")]
    NumberSurgeryRoomDay,
    #[serde(rename = "numberBedUTI")]
    NumberBedUti,
    #[serde(rename = "numberBedIntern")]
    NumberBedIntern,
    #[serde(rename = "numberBedRPA")]
    NumberBedRpa,
    #[serde(rename = "numberBedObs")]
    NumberBedObs,
    #[serde(rename = "numberBedHospitalDay")]
    NumberBedHospitalDay,
}

impl FieldId {
    pub const ALL: [FieldId; 28] = [
        Self::Customer,
        Self::Role,
        Self::HospitalName,
        Self::HospitalEmail,
        Self::HospitalContact,
        Self::Cnpj,
        Self::Cep,
        Self::Street,
        Self::Number,
        Self::Neighborhood,
        Self::City,
        Self::State,
        Self::BusinessMoment,
        Self::HasClinicalEngineering,
        Self::ClinicalEngineeringModel,
        Self::Needing,
        Self::CmeStatus,
        Self::CmeIntent,
        Self::SurgeryDays,
        Self::IntervalCmeHour,
        Self::ProcessingTissue,
        Self::NumberOfSurgery,
        Self::NumberSurgeryRoomDay,
        Self::NumberBedUti,
        Self::NumberBedIntern,
        Self::NumberBedRpa,
        Self::NumberBedObs,
        Self::NumberBedHospitalDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Role => "role",
            Self::HospitalName => "hospitalName",
            Self::HospitalEmail => "hospitalEmail",
            Self::HospitalContact => "hospitalContact",
            Self::Cnpj => "cnpj",
            Self::Cep => "cep",
            Self::Street => "street",
            Self::Number => "number",
            Self::Neighborhood => "neighborhood",
            Self::City => "city",
            Self::State => "state",
            Self::BusinessMoment => "businessMoment",
            Self::HasClinicalEngineering => "hasClinicalEngineering",
            Self::ClinicalEngineeringModel => "clinicalEngineeringModel",
            Self::Needing => "needing",
            Self::CmeStatus => "cmeStatus",
            Self::CmeIntent => "cmeIntent",
            Self::SurgeryDays => "surgeryDays",
            Self::IntervalCmeHour => "intervalCMEHour",
            Self::ProcessingTissue => "processingTissue",
            Self::NumberOfSurgery => "numberOfSurgery",
            Self::NumberSurgeryRoomDay => "numberSurgeryRoomDay",
            Self::NumberBedUti => "numberBedUTI",
            Self::NumberBedIntern => "numberBedIntern",
            Self::NumberBedRpa => "numberBedRPA",
            Self::NumberBedObs => "numberBedObs",
            Self::NumberBedHospitalDay => "numberBedHospitalDay",
        }
    }

    /// Whether the field is written directly as text. Surgery days are
    /// derived from the weekday selector instead.
    pub fn is_text_input(&self) -> bool {
        !matches!(self, Self::SurgeryDays)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("Unknown field: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        for field in FieldId::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{field}\""), "mismatch for {field:?}");
        }
    }

    #[test]
    fn parses_every_canonical_name() {
        for field in FieldId::ALL {
            assert_eq!(field.as_str().parse::<FieldId>().unwrap(), field);
        }
        assert!("hospital_email".parse::<FieldId>().is_err());
    }
}
