//! Patient record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::PatientId;

/// Beneficiary sex as carried in TISS documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Indeterminate,
}

impl Gender {
    /// Interprets the free-text label kept by the record store
    ///
    /// Unknown or absent labels map to [`Gender::Indeterminate`].
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_lowercase()).as_deref() {
            Some("male" | "m" | "masculino") => Gender::Male,
            Some("female" | "f" | "feminino") => Gender::Female,
            _ => Gender::Indeterminate,
        }
    }
}

/// A patient as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    #[serde(default)]
    pub name: Option<String>,
    /// Either `NNN.NNN.NNN-NN` or eleven bare digits
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_labels() {
        assert_eq!(Gender::from_label(Some("female")), Gender::Female);
        assert_eq!(Gender::from_label(Some(" Male ")), Gender::Male);
        assert_eq!(Gender::from_label(Some("F")), Gender::Female);
        assert_eq!(Gender::from_label(Some("masculino")), Gender::Male);
        assert_eq!(Gender::from_label(Some("other")), Gender::Indeterminate);
        assert_eq!(Gender::from_label(None), Gender::Indeterminate);
    }
}
