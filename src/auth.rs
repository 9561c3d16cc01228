//! Mock authentication and sign-up validation

use serde::Serialize;

use crate::error::CareError;
use crate::types::User;

const LOGIN_ID: &str = "touch";
const LOGIN_PASSWORD: &str = "ntp1231";

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 6;

/// The account the mock login signs into
pub fn default_user() -> User {
    User {
        id: "1".to_string(),
        name: "NTP".to_string(),
        email: "NTP@ntpercent.ai".to_string(),
        phone: "010-2211-2233".to_string(),
    }
}

/// Credential check against the built-in account
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAuthenticator;

impl MockAuthenticator {
    pub fn login(&self, id: &str, password: &str) -> Result<User, CareError> {
        if id.trim().is_empty() || password.trim().is_empty() {
            return Err(CareError::AuthError("id and password are required".to_string()));
        }
        if id == LOGIN_ID && password == LOGIN_PASSWORD {
            Ok(default_user())
        } else {
            Err(CareError::AuthError("id or password is incorrect".to_string()))
        }
    }
}

/// Sign-up form fields
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub id: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignUpField {
    Id,
    Email,
    Password,
    ConfirmPassword,
    Name,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: SignUpField,
    pub message: &'static str,
}

impl SignUpForm {
    /// Every failing field, in form order; empty when the form is valid
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut fail = |field: SignUpField, message: &'static str| errors.push(FieldError { field, message });

        if self.id.trim().is_empty() {
            fail(SignUpField::Id, "id is required");
        }

        if self.email.trim().is_empty() {
            fail(SignUpField::Email, "email is required");
        } else if !is_email(&self.email) {
            fail(SignUpField::Email, "email is not valid");
        }

        if self.password.trim().is_empty() {
            fail(SignUpField::Password, "password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            fail(SignUpField::Password, "password must be at least 6 characters");
        }

        if self.confirm_password.trim().is_empty() {
            fail(SignUpField::ConfirmPassword, "password confirmation is required");
        } else if self.password != self.confirm_password {
            fail(SignUpField::ConfirmPassword, "passwords do not match");
        }

        if self.name.trim().is_empty() {
            fail(SignUpField::Name, "name is required");
        }

        if self.phone.trim().is_empty() {
            fail(SignUpField::Phone, "phone is required");
        } else if !self.phone.chars().all(|c| c.is_ascii_digit() || c == '-') {
            fail(SignUpField::Phone, "phone may only contain digits and dashes");
        }

        errors
    }
}

/// Some whitespace-free run of `s` reads `local@host.tld`.
///
/// The run may sit anywhere in `s`, so `"a b@c.de"` passes on `b@c.de`.
fn is_email(s: &str) -> bool {
    s.split_whitespace().any(|run| {
        run.char_indices().any(|(at, c)| {
            c == '@' && at > 0 && {
                let domain = &run[at + 1..];
                domain
                    .char_indices()
                    .any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
            }
        })
    })
}
