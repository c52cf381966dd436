//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants: national identifiers carry valid check
//! digits, claim values are positive and every generated bundle is complete.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{ClaimId, Cnpj, Cpf, Money};
use domain_claims::{ClaimBundle, Gender, ProviderType};

use crate::builders::ClaimBundleBuilder;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

fn to_text(digits: &[u32]) -> String {
    digits.iter().filter_map(|d| char::from_digit(*d, 10)).collect()
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Strategy for generating CPFs with valid check digits
pub fn cpf_strategy() -> impl Strategy<Value = Cpf> {
    proptest::collection::vec(0u32..10, 9)
        .prop_filter("repeated digits", |d| d.windows(2).any(|w| w[0] != w[1]))
        .prop_map(|mut digits| {
            for len in 9..11 {
                let sum: u32 = digits
                    .iter()
                    .enumerate()
                    .map(|(n, d)| d * (len as u32 + 1 - n as u32))
                    .sum();
                digits.push(((sum * 10) % 11) % 10);
            }
            Cpf::parse(&to_text(&digits)).unwrap()
        })
}

/// Strategy for generating CNPJs with valid check digits
pub fn cnpj_strategy() -> impl Strategy<Value = Cnpj> {
    proptest::collection::vec(0u32..10, 12)
        .prop_filter("repeated digits", |d| d.windows(2).any(|w| w[0] != w[1]))
        .prop_map(|mut digits| {
            let first = cnpj_check_digit(&digits, &CNPJ_FIRST_WEIGHTS);
            digits.push(first);
            let second = cnpj_check_digit(&digits, &CNPJ_SECOND_WEIGHTS);
            digits.push(second);
            Cnpj::parse(&to_text(&digits)).unwrap()
        })
}

/// Strategy for generating amounts of at least 0.10 with up to three decimal places
pub fn positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (100i64..100_000_000i64, 0u32..4u32).prop_map(|(m, s)| Decimal::new(m, s))
}

/// Strategy for generating positive BRL values after rounding
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64).prop_map(|cents| Money::brl(Decimal::new(cents, 2)))
}

/// Strategy for generating calendar dates between 1930 and 2029
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..36_500u64).prop_map(|days| {
        NaiveDate::from_ymd_opt(1930, 1, 1)
            .and_then(|start| start.checked_add_days(Days::new(days)))
            .unwrap()
    })
}

pub fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![
        Just(Gender::Male),
        Just(Gender::Female),
        Just(Gender::Indeterminate),
    ]
}

pub fn provider_type_strategy() -> impl Strategy<Value = ProviderType> {
    prop_oneof![
        Just(ProviderType::Hospital),
        Just(ProviderType::Clinic),
        Just(ProviderType::Laboratory),
        Just(ProviderType::ImagingCenter),
        Just(ProviderType::Specialist),
        Just(ProviderType::Other),
    ]
}

/// Strategy for generating person or company names, accents and markup
/// characters included
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}",
        "[A-ZÁÉÓ][a-záéíóúãç]{2,10} (da|de|dos) [A-Z][a-z]{2,10}",
        "[A-Z][a-z]{2,8} & [A-Z][a-z]{2,8} <Ltda>",
    ]
}

/// Strategy for generating procedure codes
pub fn procedure_code_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["PROC-[0-9]{3}", "[0-9]{8}"]
}

/// Strategy for generating ICD-10 style diagnosis codes
pub fn diagnosis_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z][0-9]{2}(\\.[0-9])?"
}

/// Strategy for generating complete claim bundles
pub fn claim_bundle_strategy() -> impl Strategy<Value = ClaimBundle> {
    (
        (1i64..1_000_000i64).prop_map(ClaimId::new),
        procedure_code_strategy(),
        diagnosis_code_strategy(),
        date_strategy(),
        positive_decimal_strategy(),
        proptest::option::of(name_strategy()),
        (name_strategy(), cpf_strategy(), date_strategy(), gender_strategy()),
        (name_strategy(), cnpj_strategy(), provider_type_strategy()),
    )
        .prop_map(
            |(
                claim_id,
                procedure,
                diagnosis,
                service_date,
                value,
                description,
                (patient_name, cpf, birth_date, gender),
                (provider_name, cnpj, provider_type),
            )| {
                ClaimBundleBuilder::new()
                    .with_claim_id(claim_id)
                    .with_procedure_code(procedure)
                    .with_diagnosis_code(diagnosis)
                    .with_service_date(service_date)
                    .with_value(value)
                    .with_description(description.as_deref())
                    .with_patient_name(patient_name)
                    .with_cpf(cpf)
                    .with_birth_date(birth_date)
                    .with_gender(gender)
                    .with_provider_name(provider_name)
                    .with_cnpj(cnpj)
                    .with_provider_type(provider_type)
                    .build()
            },
        )
}
