//! Brazilian national identifiers
//!
//! CPF identifies a natural person (11 digits), CNPJ a legal entity
//! (14 digits). Both are accepted with or without punctuation and always
//! render in their canonical punctuated form:
//!
//! ```text
//! CPF   NNN.NNN.NNN-NN
//! CNPJ  NN.NNN.NNN/NNNN-NN
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a CPF or CNPJ
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NationalIdError {
    #[error("{kind} must have {expected} digits, found {found}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{kind} contains invalid character {character:?}")]
    InvalidCharacter { kind: &'static str, character: char },
}

fn digits_of(kind: &'static str, raw: &str, expected: usize) -> Result<Vec<u8>, NationalIdError> {
    let mut digits = Vec::with_capacity(expected);
    for c in raw.trim().chars() {
        match c {
            '0'..='9' => digits.push(c as u8 - b'0'),
            '.' | '-' | '/' | ' ' => {}
            other => {
                return Err(NationalIdError::InvalidCharacter {
                    kind,
                    character: other,
                })
            }
        }
    }
    if digits.len() != expected {
        return Err(NationalIdError::WrongLength {
            kind,
            expected,
            found: digits.len(),
        });
    }
    Ok(digits)
}

fn all_same(digits: &[u8]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Cadastro de Pessoas Físicas
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf([u8; 11]);

impl Cpf {
    pub fn parse(raw: &str) -> Result<Self, NationalIdError> {
        let digits = digits_of("CPF", raw, 11)?;
        let mut out = [0u8; 11];
        out.copy_from_slice(&digits);
        Ok(Self(out))
    }

    /// Returns the eleven digits without punctuation
    pub fn digits(&self) -> String {
        self.0.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Verifies the two trailing check digits (modulo 11)
    pub fn has_valid_check_digits(&self) -> bool {
        if all_same(&self.0) {
            return false;
        }
        (9..11).all(|i| {
            let sum: u32 = (0..i)
                .map(|n| self.0[n] as u32 * (i as u32 + 1 - n as u32))
                .sum();
            ((sum * 10) % 11) % 10 == self.0[i] as u32
        })
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits();
        write!(f, "{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }
}

impl FromStr for Cpf {
    type Err = NationalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cpf {
    type Error = NationalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(value: Cpf) -> Self {
        value.to_string()
    }
}

/// Cadastro Nacional da Pessoa Jurídica
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnpj([u8; 14]);

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

impl Cnpj {
    pub fn parse(raw: &str) -> Result<Self, NationalIdError> {
        let digits = digits_of("CNPJ", raw, 14)?;
        let mut out = [0u8; 14];
        out.copy_from_slice(&digits);
        Ok(Self(out))
    }

    /// Returns the fourteen digits without punctuation
    pub fn digits(&self) -> String {
        self.0.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Verifies the two trailing check digits (modulo 11)
    pub fn has_valid_check_digits(&self) -> bool {
        if all_same(&self.0) {
            return false;
        }
        let check = |weights: &[u32]| {
            let sum: u32 = weights
                .iter()
                .zip(self.0.iter())
                .map(|(w, d)| w * *d as u32)
                .sum();
            let rem = sum % 11;
            if rem < 2 { 0 } else { 11 - rem }
        };
        check(&CNPJ_FIRST_WEIGHTS) == self.0[12] as u32
            && check(&CNPJ_SECOND_WEIGHTS) == self.0[13] as u32
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits();
        write!(
            f,
            "{}.{}.{}/{}-{}",
            &d[0..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..14]
        )
    }
}

impl FromStr for Cnpj {
    type Err = NationalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cnpj {
    type Error = NationalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cnpj> for String {
    fn from(value: Cnpj) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_formats_bare_digits() {
        let cpf = Cpf::parse("98765432100").unwrap();
        assert_eq!(cpf.to_string(), "987.654.321-00");
        assert_eq!(cpf.digits(), "98765432100");
    }

    #[test]
    fn test_cpf_accepts_formatted_input() {
        let cpf: Cpf = "987.654.321-00".parse().unwrap();
        assert_eq!(cpf.to_string(), "987.654.321-00");
    }

    #[test]
    fn test_cpf_check_digits() {
        assert!(Cpf::parse("987.654.321-00").unwrap().has_valid_check_digits());
        assert!(Cpf::parse("529.982.247-25").unwrap().has_valid_check_digits());
        assert!(!Cpf::parse("529.982.247-26").unwrap().has_valid_check_digits());
        assert!(!Cpf::parse("111.111.111-11").unwrap().has_valid_check_digits());
    }

    #[test]
    fn test_cpf_wrong_length() {
        let err = Cpf::parse("123.456.789").unwrap_err();
        assert_eq!(
            err,
            NationalIdError::WrongLength { kind: "CPF", expected: 11, found: 9 }
        );
    }

    #[test]
    fn test_cpf_invalid_character() {
        assert!(matches!(
            Cpf::parse("123.456.789-0x"),
            Err(NationalIdError::InvalidCharacter { character: 'x', .. })
        ));
    }

    #[test]
    fn test_cnpj_formats_bare_digits() {
        let cnpj = Cnpj::parse("11222333000181").unwrap();
        assert_eq!(cnpj.to_string(), "11.222.333/0001-81");
    }

    #[test]
    fn test_cnpj_check_digits() {
        assert!(Cnpj::parse("11.222.333/0001-81").unwrap().has_valid_check_digits());
        assert!(!Cnpj::parse("11.222.333/0001-82").unwrap().has_valid_check_digits());
    }

    #[test]
    fn test_serde_uses_formatted_string() {
        let cpf = Cpf::parse("98765432100").unwrap();
        let json = serde_json::to_string(&cpf).unwrap();
        assert_eq!(json, "\"987.654.321-00\"");
        let back: Cpf = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cpf);
    }
}
