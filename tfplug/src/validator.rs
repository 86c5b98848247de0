//! Reusable attribute validators
//!
//! Each validator reports through diagnostics attached to the attribute path
//! so that every violation in a configuration can be reported at once.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};

fn invalid(request: &ValidatorRequest, summary: String, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![Diagnostic::error(summary, detail).with_attribute(request.path.clone())],
    }
}

/// Value must be one of a fixed set of strings
pub struct StringInValidator {
    pub allowed: Vec<String>,
    pub message: Option<String>,
}

impl StringInValidator {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            message: None,
        }
    }

    /// Replace the generated summary with a fixed message
    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

impl Validator for StringInValidator {
    fn description(&self) -> String {
        format!("value must be one of {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match &request.config_value.value {
            Dynamic::String(s) if !self.allowed.iter().any(|a| a == s) => {
                let summary = self.message.clone().unwrap_or_else(|| {
                    format!("{} must be one of {}", request.path, self.allowed.join(", "))
                });
                invalid(&request, summary, format!("Got {:?}", s))
            }
            _ => ValidatorResponse::default(),
        }
    }
}

/// Whole number within an inclusive range
pub struct IntRangeValidator {
    pub min: i64,
    pub max: i64,
    pub message: Option<String>,
}

impl IntRangeValidator {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            message: None,
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

impl Validator for IntRangeValidator {
    fn description(&self) -> String {
        format!("value must be a whole number within {}-{}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let n = match &request.config_value.value {
            Dynamic::Number(n) => *n,
            _ => return ValidatorResponse::default(),
        };

        let in_range = n.fract() == 0.0 && n >= self.min as f64 && n <= self.max as f64;
        if in_range {
            return ValidatorResponse::default();
        }

        let summary = self.message.clone().unwrap_or_else(|| {
            format!(
                "{} must be a value within {}-{}",
                request.path, self.min, self.max
            )
        });
        invalid(&request, summary, format!("Got {}", n))
    }
}

/// String must match a regular expression
pub struct StringPatternValidator {
    pub pattern: String,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            description: description.to_string(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let s = match &request.config_value.value {
            Dynamic::String(s) => s,
            _ => return ValidatorResponse::default(),
        };

        match regex::Regex::new(&self.pattern) {
            Ok(re) if re.is_match(s) => ValidatorResponse::default(),
            Ok(_) => invalid(
                &request,
                format!("{} must match {}", request.path, self.description),
                format!("Value '{}' does not match pattern", s),
            ),
            Err(e) => invalid(
                &request,
                format!("Invalid pattern for {}", request.path),
                e.to_string(),
            ),
        }
    }
}

/// Bounds on the number of elements in a list or set
pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("list length must be within {:?}-{:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        let items = match request.config_value.value.elements() {
            Some(items) => items,
            None => return response,
        };

        if let Some(min) = self.min {
            if items.len() < min {
                response.diagnostics.push(
                    Diagnostic::error(
                        format!("{} must have at least {} items", request.path, min),
                        format!("Got {} items", items.len()),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        if let Some(max) = self.max {
            if items.len() > max {
                response.diagnostics.push(
                    Diagnostic::error(
                        format!("{} must have at most {} items", request.path, max),
                        format!("Got {} items", items.len()),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        response
    }
}
