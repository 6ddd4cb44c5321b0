//! The questionnaire schema: which fields live on which step, their rules,
//! and when conditional fields apply.

use crate::error::ValidationError;
use crate::lead::model::{
    BUSINESS_MOMENT_OPTIONS, CME_INTENT_OPTIONS, CME_STATUS_OPTIONS, ENGINEERING_MODEL_OPTIONS,
    YES_NO_OPTIONS,
};

use super::field::FieldId;
use super::rules::{Predicate, Rule};
use super::values::FormValues;

const FILL: &str = "Preencha este campo";
const CHOOSE: &str = "Selecione uma opção";
const WHOLE_NUMBER: &str = "Informe um número inteiro";

/// Rules and placement of a single field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub id: FieldId,
    pub step: usize,
    pub rules: Vec<Rule>,
    /// When set, the field only applies while the predicate holds. An
    /// inapplicable field is cleared and never reports errors.
    pub applies_when: Option<Predicate>,
}

impl FieldSpec {
    fn new(id: FieldId, step: usize) -> Self {
        Self {
            id,
            step,
            rules: Vec::new(),
            applies_when: None,
        }
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Required while `when` holds; cleared as soon as it stops holding.
    fn required_when(mut self, when: Predicate, message: &str) -> Self {
        self.applies_when = Some(when);
        self.rules.push(Rule::required_when(when, message));
        self
    }

    pub fn applies(&self, form: &FormValues) -> bool {
        self.applies_when.is_none_or(|when| when(form))
    }

    /// First failing rule, if any. Inapplicable fields always pass.
    pub fn validate(&self, form: &FormValues) -> Option<ValidationError> {
        if !self.applies(form) {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.check(self.id, form))
    }
}

/// Ordered field specs grouped into steps.
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    total_steps: usize,
}

fn has_clinical_engineering(form: &FormValues) -> bool {
    form.get(FieldId::HasClinicalEngineering) == "sim"
}

fn has_existing_cme(form: &FormValues) -> bool {
    form.get(FieldId::CmeStatus) == "Já possuo"
}

fn cme_status_answered(form: &FormValues) -> bool {
    form.is_set(FieldId::CmeStatus)
}

impl FormSchema {
    /// Build a schema from explicit specs. Steps are numbered from zero and
    /// every step below `total_steps` is expected to own at least one field.
    pub fn new(fields: Vec<FieldSpec>, total_steps: usize) -> Self {
        Self {
            fields,
            total_steps,
        }
    }

    /// The four-step CME questionnaire.
    pub fn cme() -> Self {
        use FieldId::*;

        let count = |id| {
            FieldSpec::new(id, 3)
                .rule(Rule::required(FILL))
                .rule(Rule::pattern(r"^\d+$", WHOLE_NUMBER))
        };

        let fields = vec![
            // Identity and address
            FieldSpec::new(Customer, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Informe o seu Nome e sobrenome")),
            FieldSpec::new(HospitalEmail, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::pattern(
                    r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
                    "Preencha com um e-mail válido!",
                )),
            FieldSpec::new(HospitalContact, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::digits(r"^\d{10,11}$", "Informe um número válido!")),
            FieldSpec::new(HospitalName, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Preencha com o nome do hospital")),
            FieldSpec::new(Cnpj, 0).rule(Rule::digits(r"^\d{14}$", "Informe um documento válido")),
            FieldSpec::new(Role, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Informe um cargo")),
            FieldSpec::new(Cep, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::digits(r"^\d{8}$", "Informe um cep válido")),
            FieldSpec::new(Number, 0).rule(Rule::required(FILL)),
            FieldSpec::new(Street, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Informe a rua ou avenida")),
            FieldSpec::new(Neighborhood, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Informe o nome do Bairro")),
            FieldSpec::new(City, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::min_length(3, "Informe a Cidade")),
            FieldSpec::new(State, 0)
                .rule(Rule::required(FILL))
                .rule(Rule::pattern(r"^[A-Za-z]{2}$", "Informe o UF")),
            // Clinical engineering
            FieldSpec::new(BusinessMoment, 1)
                .rule(Rule::required(CHOOSE))
                .rule(Rule::one_of(BUSINESS_MOMENT_OPTIONS, CHOOSE)),
            FieldSpec::new(HasClinicalEngineering, 1)
                .rule(Rule::required(CHOOSE))
                .rule(Rule::one_of(YES_NO_OPTIONS, CHOOSE)),
            FieldSpec::new(ClinicalEngineeringModel, 1)
                .required_when(has_clinical_engineering, CHOOSE)
                .rule(Rule::one_of(ENGINEERING_MODEL_OPTIONS, CHOOSE)),
            FieldSpec::new(Needing, 1),
            // CME profile
            FieldSpec::new(CmeStatus, 2)
                .rule(Rule::required(CHOOSE))
                .rule(Rule::one_of(CME_STATUS_OPTIONS, CHOOSE)),
            FieldSpec::new(CmeIntent, 2)
                .required_when(has_existing_cme, CHOOSE)
                .rule(Rule::one_of(CME_INTENT_OPTIONS, CHOOSE)),
            FieldSpec::new(SurgeryDays, 2).rule(Rule::required("Selecione ao menos um dia")),
            FieldSpec::new(IntervalCmeHour, 2)
                .rule(Rule::required(FILL))
                .rule(Rule::positive_number("Informe um número de horas válido")),
            FieldSpec::new(ProcessingTissue, 2)
                .required_when(cme_status_answered, CHOOSE)
                .rule(Rule::one_of(YES_NO_OPTIONS, CHOOSE)),
            // Capacity
            count(NumberOfSurgery),
            count(NumberSurgeryRoomDay),
            count(NumberBedUti),
            count(NumberBedIntern),
            count(NumberBedRpa),
            count(NumberBedObs),
            count(NumberBedHospitalDay),
        ];

        Self::new(fields, 4)
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn last_step(&self) -> usize {
        self.total_steps.saturating_sub(1)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn spec(&self, field: FieldId) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == field)
    }

    pub fn fields_for_step(&self, step: usize) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.step == step)
    }

    /// Step that owns the e-mail field; leaving it runs the duplicate gate.
    pub fn email_step(&self) -> Option<usize> {
        self.spec(FieldId::HospitalEmail).map(|f| f.step)
    }

    /// Fresh validation of every field on `step`.
    pub fn step_errors(&self, step: usize, form: &FormValues) -> Vec<ValidationError> {
        self.fields_for_step(step)
            .filter_map(|f| f.validate(form))
            .collect()
    }

    pub fn is_step_valid(&self, step: usize, form: &FormValues) -> bool {
        self.fields_for_step(step).all(|f| f.validate(form).is_none())
    }

    /// Fields whose governing predicate no longer holds but still carry a
    /// value.
    pub fn stale_fields<'a>(&'a self, form: &'a FormValues) -> impl Iterator<Item = FieldId> + 'a {
        self.fields
            .iter()
            .filter(move |f| !f.applies(form) && form.is_set(f.id))
            .map(|f| f.id)
    }
}

impl Default for FormSchema {
    fn default() -> Self {
        Self::cme()
    }
}
