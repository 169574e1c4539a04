use crate::errors::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));
static CEP_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").expect("valid regex"));
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

pub fn only_digits(value: &str) -> String {
    NON_DIGITS.replace_all(value, "").into_owned()
}

/// Checks length and both CPF check digits. Punctuation is ignored.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = only_digits(cpf)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    for position in 9..11 {
        let weighted: u32 = digits[..position]
            .iter()
            .enumerate()
            .map(|(index, digit)| digit * (position as u32 + 1 - index as u32))
            .sum();
        let check = ((weighted * 10) % 11) % 10;
        if digits[position] != check {
            return false;
        }
    }
    true
}

/// Format only. Whether the CEP exists is a question for the postal
/// lookup service, which this crate does not call.
pub fn validate_cep(cep: &str) -> bool {
    CEP_SHAPE.is_match(&only_digits(cep))
}

pub fn validate_email(email: &str) -> bool {
    let trimmed = email.trim();
    trimmed.is_empty() || EMAIL_SHAPE.is_match(trimmed)
}

pub fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "required fields missing: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_cpf_with_or_without_punctuation() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("52998224725"));
    }

    #[test]
    fn rejects_bad_cpfs() {
        assert!(!validate_cpf("529.982.247-26"));
        assert!(!validate_cpf("111.111.111-11"));
        assert!(!validate_cpf("1234"));
        assert!(!validate_cpf(""));
    }

    #[test]
    fn cep_needs_eight_digits() {
        assert!(validate_cep("01310-100"));
        assert!(!validate_cep("0131-100"));
        assert!(!validate_cep("abc"));
    }

    #[test]
    fn email_is_optional_but_must_look_right() {
        assert!(validate_email(""));
        assert!(validate_email("ana@cidade.gov.br"));
        assert!(!validate_email("ana@"));
    }

    #[test]
    fn missing_fields_are_named() {
        let error = require_fields(&[("title", "Buraco"), ("bairro", " "), ("type", "")])
            .expect_err("missing fields");
        let message = error.to_string();
        assert!(message.contains("bairro"));
        assert!(message.contains("type"));
        assert!(!message.contains("title"));
    }
}
