// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Outcome of evaluating an expression node

use crate::error::{Error, SystemError, ValidationError};

/// Pass/fail with the reasons for failure
///
/// When `system_error` is set, `pass` and `validation_errors` carry no
/// meaning.
#[derive(Debug, Default)]
pub struct EvaluationResult {
    /// Whether the expression held
    pub pass: bool,
    /// Rules that returned `false`
    pub validation_errors: Vec<ValidationError>,
    /// Evaluation could not complete
    pub system_error: Option<SystemError>,
}

impl EvaluationResult {
    /// A passing result
    pub fn passed() -> Self {
        Self {
            pass: true,
            ..Self::default()
        }
    }

    /// A failing result with `errors`
    pub fn failed(errors: Vec<ValidationError>) -> Self {
        Self {
            pass: false,
            validation_errors: errors,
            system_error: None,
        }
    }

    /// A result carrying a system error
    pub fn system(error: impl Into<SystemError>) -> Self {
        Self {
            pass: false,
            validation_errors: Vec::new(),
            system_error: Some(error.into()),
        }
    }

    /// Pass, or fail with a single error labelled `label`
    ///
    /// Used where no rule call explains the failure (literals, negation),
    /// so a failing result always carries at least one error.
    pub fn from_bool(pass: bool, label: impl FnOnce() -> String) -> Self {
        if pass {
            Self::passed()
        } else {
            Self::failed(vec![ValidationError::new(label())])
        }
    }

    /// Whether evaluation was aborted
    pub fn is_system_error(&self) -> bool {
        self.system_error.is_some()
    }

    /// Flatten into the errors reported to callers
    ///
    /// A system error is reported alone; a pass reports nothing.
    pub fn into_errors(self) -> Vec<Error> {
        if let Some(err) = self.system_error {
            return vec![Error::System(err)];
        }
        if self.pass {
            return Vec::new();
        }
        self.validation_errors
            .into_iter()
            .map(Error::Validation)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failing_literal_reports_label() {
        let errors = EvaluationResult::from_bool(false, || "false".to_string()).into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].as_validation(),
            Some(&ValidationError::new("false"))
        );
        assert!(EvaluationResult::from_bool(true, String::new).into_errors().is_empty());
    }
}
