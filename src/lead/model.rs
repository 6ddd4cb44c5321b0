//! The frozen lead record submitted to the backend.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrorKind};
use crate::form::rules::parse_decimal;
use crate::form::{FieldId, FormValues};

/// Fixed answers to "Qual o momento atual do empreendimento?".
pub const BUSINESS_MOMENT_OPTIONS: &[&str] = &[
    "Elaboração projetos",
    "Visita técnica para avaliação diagnóstica",
    "Dimensionamento e especificação técnica dos equipamentos para aquisição",
    "Análise técnica financeira comparativa dos equipamentos",
    "Comissionamento das instalações",
    "Outro momento",
];

pub const YES_NO_OPTIONS: &[&str] = &["sim", "nao"];
pub const ENGINEERING_MODEL_OPTIONS: &[&str] = &["Própria", "Terceirizada"];
pub const CME_STATUS_OPTIONS: &[&str] = &["Irei implantar", "Já possuo"];
pub const CME_INTENT_OPTIONS: &[&str] = &["Quero substituir", "Quero ampliar"];

/// Yes/no answers, sent as `"sim"` / `"nao"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "sim")]
    Yes,
    #[serde(rename = "nao")]
    No,
}

impl YesNo {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "sim" => Some(Self::Yes),
            "nao" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineeringModel {
    #[serde(rename = "Própria")]
    Own,
    #[serde(rename = "Terceirizada")]
    Outsourced,
}

impl EngineeringModel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Própria" => Some(Self::Own),
            "Terceirizada" => Some(Self::Outsourced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmeStatus {
    #[serde(rename = "Irei implantar")]
    Planning,
    #[serde(rename = "Já possuo")]
    Existing,
}

impl CmeStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Irei implantar" => Some(Self::Planning),
            "Já possuo" => Some(Self::Existing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmeIntent {
    #[serde(rename = "Quero substituir")]
    Replace,
    #[serde(rename = "Quero ampliar")]
    Expand,
}

impl CmeIntent {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Quero substituir" => Some(Self::Replace),
            "Quero ampliar" => Some(Self::Expand),
            _ => None,
        }
    }
}

/// A complete, typed lead. Built once from validated form input and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub customer: String,
    pub role: String,
    pub hospital_name: String,
    pub hospital_email: String,
    /// Digits only.
    pub hospital_contact: String,
    /// Digits only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    /// Digits only.
    pub cep: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub business_moment: String,
    pub has_clinical_engineering: YesNo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_engineering_model: Option<EngineeringModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needing: Option<String>,
    pub cme_status: CmeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cme_intent: Option<CmeIntent>,
    pub surgery_days: Vec<String>,
    #[serde(rename = "intervalCMEHour")]
    pub interval_cme_hour: f64,
    pub processing_tissue: YesNo,
    pub number_of_surgery: u32,
    pub number_surgery_room_day: u32,
    #[serde(rename = "numberBedUTI")]
    pub number_bed_uti: u32,
    pub number_bed_intern: u32,
    #[serde(rename = "numberBedRPA")]
    pub number_bed_rpa: u32,
    pub number_bed_obs: u32,
    pub number_bed_hospital_day: u32,
    pub accept_terms: bool,
}

/// Collects conversion failures so every bad field is reported at once.
struct Extractor<'a> {
    form: &'a FormValues,
    errors: Vec<ValidationError>,
}

impl<'a> Extractor<'a> {
    fn text(&mut self, field: FieldId) -> String {
        let value = self.form.get(field).trim().to_string();
        if value.is_empty() {
            self.fail(field, ValidationErrorKind::Required, "Preencha este campo");
        }
        value
    }

    fn optional_text(&self, field: FieldId) -> Option<String> {
        Some(self.form.get(field).trim().to_string()).filter(|s| !s.is_empty())
    }

    fn digits(&mut self, field: FieldId) -> String {
        let digits = self.form.digits(field);
        if digits.is_empty() {
            self.fail(field, ValidationErrorKind::Required, "Preencha este campo");
        }
        digits
    }

    fn count(&mut self, field: FieldId) -> u32 {
        match self.form.get(field).trim().parse() {
            Ok(n) => n,
            Err(_) => {
                self.fail(field, ValidationErrorKind::FormatInvalid, "Informe um número inteiro");
                0
            }
        }
    }

    fn choice<T>(&mut self, field: FieldId, parse: fn(&str) -> Option<T>) -> Option<T> {
        let parsed = parse(self.form.get(field));
        if parsed.is_none() {
            self.fail(field, ValidationErrorKind::Required, "Selecione uma opção");
        }
        parsed
    }

    fn fail(&mut self, field: FieldId, kind: ValidationErrorKind, message: &str) {
        self.errors.push(ValidationError::new(field, kind, message));
    }
}

impl LeadRecord {
    /// Freeze validated form input into a typed record.
    ///
    /// Conditional answers are only carried when their governing answer
    /// makes them applicable, and a missing applicable answer is an error.
    pub fn from_form(form: &FormValues) -> Result<Self, Vec<ValidationError>> {
        let mut x = Extractor {
            form,
            errors: Vec::new(),
        };

        let customer = x.text(FieldId::Customer);
        let role = x.text(FieldId::Role);
        let hospital_name = x.text(FieldId::HospitalName);
        let hospital_email = x.text(FieldId::HospitalEmail);
        let hospital_contact = x.digits(FieldId::HospitalContact);
        let cnpj = Some(form.digits(FieldId::Cnpj)).filter(|s| !s.is_empty());
        let cep = x.digits(FieldId::Cep);
        let street = x.text(FieldId::Street);
        let number = x.text(FieldId::Number);
        let neighborhood = x.text(FieldId::Neighborhood);
        let city = x.text(FieldId::City);
        let state = x.text(FieldId::State).to_uppercase();

        let business_moment = x.text(FieldId::BusinessMoment);
        let has_clinical_engineering = x.choice(FieldId::HasClinicalEngineering, YesNo::parse);
        let clinical_engineering_model = match has_clinical_engineering {
            Some(YesNo::Yes) => x.choice(FieldId::ClinicalEngineeringModel, EngineeringModel::parse),
            _ => None,
        };
        let needing = x.optional_text(FieldId::Needing);

        let cme_status = x.choice(FieldId::CmeStatus, CmeStatus::parse);
        let cme_intent = match cme_status {
            Some(CmeStatus::Existing) => x.choice(FieldId::CmeIntent, CmeIntent::parse),
            _ => None,
        };

        let surgery_days: Vec<String> = form.days().derived().into_iter().map(String::from).collect();
        if surgery_days.is_empty() {
            x.fail(
                FieldId::SurgeryDays,
                ValidationErrorKind::Required,
                "Selecione ao menos um dia",
            );
        }

        let interval_cme_hour = match parse_decimal(form.get(FieldId::IntervalCmeHour)) {
            Some(hours) if hours > 0.0 => hours,
            _ => {
                x.fail(
                    FieldId::IntervalCmeHour,
                    ValidationErrorKind::FormatInvalid,
                    "Informe um número de horas válido",
                );
                0.0
            }
        };
        let processing_tissue = x.choice(FieldId::ProcessingTissue, YesNo::parse);

        let number_of_surgery = x.count(FieldId::NumberOfSurgery);
        let number_surgery_room_day = x.count(FieldId::NumberSurgeryRoomDay);
        let number_bed_uti = x.count(FieldId::NumberBedUti);
        let number_bed_intern = x.count(FieldId::NumberBedIntern);
        let number_bed_rpa = x.count(FieldId::NumberBedRpa);
        let number_bed_obs = x.count(FieldId::NumberBedObs);
        let number_bed_hospital_day = x.count(FieldId::NumberBedHospitalDay);

        match (has_clinical_engineering, cme_status, processing_tissue) {
            (Some(has_clinical_engineering), Some(cme_status), Some(processing_tissue))
                if x.errors.is_empty() =>
            {
                Ok(Self {
                    customer,
                    role,
                    hospital_name,
                    hospital_email,
                    hospital_contact,
                    cnpj,
                    cep,
                    street,
                    number,
                    neighborhood,
                    city,
                    state,
                    business_moment,
                    has_clinical_engineering,
                    clinical_engineering_model,
                    needing,
                    cme_status,
                    cme_intent,
                    surgery_days,
                    interval_cme_hour,
                    processing_tissue,
                    number_of_surgery,
                    number_surgery_room_day,
                    number_bed_uti,
                    number_bed_intern,
                    number_bed_rpa,
                    number_bed_obs,
                    number_bed_hospital_day,
                    accept_terms: form.consent(),
                })
            }
            _ => Err(x.errors),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::form::Weekday;

    /// A fully valid questionnaire, reused by the session and wizard tests.
    pub(crate) fn filled_form() -> FormValues {
        let mut form = FormValues::new();
        for (field, value) in [
            (FieldId::Customer, "Maria Souza"),
            (FieldId::Role, "Enfermeira chefe"),
            (FieldId::HospitalName, "Hospital São Lucas"),
            (FieldId::HospitalEmail, "a@h.com"),
            (FieldId::HospitalContact, "(41) 99876-5432"),
            (FieldId::Cep, "80010-010"),
            (FieldId::Street, "Rua XV de Novembro"),
            (FieldId::Number, "100"),
            (FieldId::Neighborhood, "Centro"),
            (FieldId::City, "Curitiba"),
            (FieldId::State, "PR"),
            (FieldId::BusinessMoment, "Outro momento"),
            (FieldId::HasClinicalEngineering, "nao"),
            (FieldId::CmeStatus, "Irei implantar"),
            (FieldId::IntervalCmeHour, "12"),
            (FieldId::ProcessingTissue, "sim"),
            (FieldId::NumberOfSurgery, "4"),
            (FieldId::NumberSurgeryRoomDay, "6"),
            (FieldId::NumberBedUti, "10"),
            (FieldId::NumberBedIntern, "80"),
            (FieldId::NumberBedRpa, "6"),
            (FieldId::NumberBedObs, "12"),
            (FieldId::NumberBedHospitalDay, "0"),
        ] {
            form.set(field, value);
        }
        form.days_mut().toggle_day(Weekday::Monday);
        form.days_mut().toggle_day(Weekday::Wednesday);
        form.set_consent(true);
        form
    }

    #[test]
    fn converts_filled_form() {
        let record = LeadRecord::from_form(&filled_form()).unwrap();
        assert_eq!(record.hospital_contact, "41998765432");
        assert_eq!(record.cep, "80010010");
        assert_eq!(record.cnpj, None);
        assert_eq!(record.has_clinical_engineering, YesNo::No);
        assert_eq!(record.clinical_engineering_model, None);
        assert_eq!(record.cme_intent, None);
        assert_eq!(record.surgery_days, vec!["monday", "wednesday"]);
        assert_eq!(record.interval_cme_hour, 12.0);
        assert_eq!(record.number_bed_intern, 80);
        assert!(record.accept_terms);
    }

    #[test]
    fn serializes_canonical_names() {
        let mut form = filled_form();
        form.set(FieldId::Cnpj, "12.345.678/0001-90");
        let json = serde_json::to_value(LeadRecord::from_form(&form).unwrap()).unwrap();

        assert_eq!(json["hospitalEmail"], "a@h.com");
        assert_eq!(json["cnpj"], "12345678000190");
        assert_eq!(json["hasClinicalEngineering"], "nao");
        assert_eq!(json["cmeStatus"], "Irei implantar");
        assert_eq!(json["intervalCMEHour"], 12.0);
        assert_eq!(json["numberBedUTI"], 10);
        assert_eq!(json["numberBedRPA"], 6);
        assert_eq!(json["surgeryDays"], serde_json::json!(["monday", "wednesday"]));
        assert!(json.get("clinicalEngineeringModel").is_none());
        assert!(json.get("cmeIntent").is_none());
    }

    #[test]
    fn applicable_conditional_answers_are_required() {
        let mut form = filled_form();
        form.set(FieldId::HasClinicalEngineering, "sim");
        form.set(FieldId::CmeStatus, "Já possuo");

        let errors = LeadRecord::from_form(&form).unwrap_err();
        let fields: Vec<FieldId> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![FieldId::ClinicalEngineeringModel, FieldId::CmeIntent]
        );

        form.set(FieldId::ClinicalEngineeringModel, "Terceirizada");
        form.set(FieldId::CmeIntent, "Quero ampliar");
        let record = LeadRecord::from_form(&form).unwrap();
        assert_eq!(record.clinical_engineering_model, Some(EngineeringModel::Outsourced));
        assert_eq!(record.cme_intent, Some(CmeIntent::Expand));
    }

    #[test]
    fn stale_conditional_answer_is_not_carried() {
        let mut form = filled_form();
        form.set(FieldId::ClinicalEngineeringModel, "Própria");
        let record = LeadRecord::from_form(&form).unwrap();
        assert_eq!(record.clinical_engineering_model, None);
    }

    #[test]
    fn reports_every_bad_count() {
        let mut form = filled_form();
        form.set(FieldId::NumberBedUti, "dez");
        form.set(FieldId::NumberBedObs, "-1");
        form.days_mut().toggle_day(Weekday::Monday);
        form.days_mut().toggle_day(Weekday::Wednesday);

        let errors = LeadRecord::from_form(&form).unwrap_err();
        let fields: Vec<FieldId> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![FieldId::SurgeryDays, FieldId::NumberBedUti, FieldId::NumberBedObs]
        );
    }
}
