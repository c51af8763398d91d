//! Contact form validation and simulated submission

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::{DomCommand, Effects, PageEvent, PageState, Target, TimerAction};

/// Simulated network round trip
pub const SUBMIT_DELAY_MS: f64 = 1500.0;
/// How long the success message keeps its highlight
pub const STATUS_CLEAR_MS: f64 = 5000.0;

pub const SUCCESS_MESSAGE: &str = "✨ Message sent successfully! I'll get back to you soon.";

static EMAIL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Why a submission was refused; the message is shown to the visitor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in all fields.")]
    MissingField,

    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

pub fn is_valid_email(email: &str) -> bool {
    match &*EMAIL {
        Ok(re) => re.is_match(email),
        Err(_) => false,
    }
}

impl FormFields {
    /// Trim every field and check it is complete and well formed
    pub fn validate(&self) -> Result<FormFields, FormError> {
        let trimmed = FormFields {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            message: self.message.trim().to_owned(),
        };
        if trimmed.name.is_empty() || trimmed.email.is_empty() || trimmed.message.is_empty() {
            return Err(FormError::MissingField);
        }
        if !is_valid_email(&trimmed.email) {
            return Err(FormError::InvalidEmail);
        }
        Ok(trimmed)
    }
}

/// Submission state of the contact form
#[derive(Debug, Default)]
pub struct ContactForm {
    pub sending: bool,
    pub sent: usize,
}

pub fn on_submit(state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::Submit(fields) = event else {
        return;
    };
    if state.form.sending {
        warn!("submit ignored while a message is being sent");
        return;
    }

    match fields.validate() {
        Err(err) => {
            fx.emit(DomCommand::SetText {
                target: Target::FormStatus,
                text: err.to_string(),
            });
            fx.emit(DomCommand::SetClassName {
                target: Target::FormStatus,
                class_name: "form-status error",
            });
        }
        Ok(valid) => {
            info!(name = %valid.name, "sending contact message");
            state.form.sending = true;
            fx.set_class(Target::SubmitButton, "loading", true);
            fx.emit(DomCommand::SetDisabled {
                target: Target::SubmitButton,
                disabled: true,
            });
            fx.after(SUBMIT_DELAY_MS, TimerAction::FinishSubmission);
        }
    }
}

pub(super) fn finish_submission(state: &mut PageState, fx: &mut Effects<'_>) {
    state.form.sending = false;
    state.form.sent += 1;
    fx.set_class(Target::SubmitButton, "loading", false);
    fx.emit(DomCommand::SetDisabled {
        target: Target::SubmitButton,
        disabled: false,
    });
    fx.emit(DomCommand::SetText {
        target: Target::FormStatus,
        text: SUCCESS_MESSAGE.to_owned(),
    });
    fx.emit(DomCommand::SetClassName {
        target: Target::FormStatus,
        class_name: "form-status success",
    });
    fx.emit(DomCommand::ResetForm);
    fx.after(STATUS_CLEAR_MS, TimerAction::ClearStatus);
}

pub(super) fn clear_status(fx: &mut Effects<'_>) {
    fx.emit(DomCommand::SetClassName {
        target: Target::FormStatus,
        class_name: "form-status",
    });
}
