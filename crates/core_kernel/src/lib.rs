//! Core Kernel - Foundational types shared by the TISS codec crates
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic and fixed-point rendering
//! - Integer record identifiers for claims, patients, providers and plans
//! - Brazilian national identifiers (CPF, CNPJ)
//! - An injectable clock so document construction never reads wall time ambiently
//! - The port error taxonomy used by storage collaborators

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod national_ids;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{Clock, SystemClock, FixedClock, format_iso_date};
pub use identifiers::{ClaimId, PatientId, ProviderId, HealthPlanId};
pub use national_ids::{Cpf, Cnpj, NationalIdError};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
