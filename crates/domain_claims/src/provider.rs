//! Provider record

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::ProviderId;

/// Kind of healthcare provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Hospital,
    Clinic,
    Laboratory,
    ImagingCenter,
    Specialist,
    GeneralPractitioner,
    Pharmacy,
    Ambulance,
    #[default]
    Other,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Hospital => "hospital",
            ProviderType::Clinic => "clinic",
            ProviderType::Laboratory => "laboratory",
            ProviderType::ImagingCenter => "imaging_center",
            ProviderType::Specialist => "specialist",
            ProviderType::GeneralPractitioner => "general_practitioner",
            ProviderType::Pharmacy => "pharmacy",
            ProviderType::Ambulance => "ambulance",
            ProviderType::Other => "other",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    #[serde(default)]
    pub name: Option<String>,
    /// Either `NN.NNN.NNN/NNNN-NN` or fourteen bare digits
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default, rename = "type")]
    pub provider_type: ProviderType,
}
