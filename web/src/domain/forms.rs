//! Form inputs validated before anything reaches the backend.
//!
//! Each constructor collects every field problem at once into [`FormErrors`]
//! so the UI can mark all offending fields in a single round trip. Only
//! validated values can be turned into backend request bodies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use zeroize::Zeroizing;

use super::messages::fields;

const PASSWORD_MIN_CHARS: usize = 6;
const OTP_DIGITS: usize = 6;

/// Form fields the UI can attach a message to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Email,
    Password,
    ConfirmPassword,
    Code,
}

impl FormField {
    /// Attribute a backend-reported field name to a form field.
    ///
    /// The backend reports either the JSON key or its display label, in any
    /// case, so `"Email"`, `"email"` and `"Mật khẩu"` all resolve.
    ///
    /// # Examples
    /// ```
    /// use threads_web::domain::FormField;
    ///
    /// assert_eq!(FormField::from_remote("Email"), Some(FormField::Email));
    /// assert_eq!(FormField::from_remote("Xác nhận mật khẩu"), Some(FormField::ConfirmPassword));
    /// assert_eq!(FormField::from_remote("nickname"), None);
    /// ```
    pub fn from_remote(name: &str) -> Option<Self> {
        let normalised = name.trim().to_lowercase();
        match normalised.as_str() {
            "email" => Some(Self::Email),
            "password" | "mật khẩu" => Some(Self::Password),
            "confirmpassword" | "confirm_password" | "xác nhận mật khẩu" => {
                Some(Self::ConfirmPassword)
            }
            "code" | "otp" | "mã otp" => Some(Self::Code),
            _ => None,
        }
    }

    /// JSON key used by the UI for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-scoped validation messages; the first message per field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    /// Record a message unless the field already has one.
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// True when no field has a message.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with a message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over fields and messages in field order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

/// Syntactically valid, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate an address, returning the field message on failure.
    ///
    /// # Examples
    /// ```
    /// use threads_web::domain::Email;
    ///
    /// assert!(Email::parse("  user@example.com ").is_ok());
    /// assert!(Email::parse("user@localhost").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(fields::EMAIL_REQUIRED);
        }
        if is_plausible_address(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(fields::EMAIL_INVALID)
        }
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn is_plausible_address(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

impl TryFrom<String> for Email {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated login form.
///
/// ## Invariants
/// - `email` is a plausible address.
/// - `password` is non-empty; whitespace is kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw login inputs.
    ///
    /// # Examples
    /// ```
    /// use threads_web::domain::{FormField, LoginCredentials};
    ///
    /// let creds = LoginCredentials::try_from_parts("a@b.io", "pw").unwrap();
    /// assert_eq!(creds.email().as_str(), "a@b.io");
    ///
    /// let errors = LoginCredentials::try_from_parts("", "").unwrap_err();
    /// assert!(errors.get(FormField::Email).is_some());
    /// assert!(errors.get(FormField::Password).is_some());
    /// ```
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let email = Email::parse(email)
            .map_err(|message| errors.add(FormField::Email, message))
            .ok();
        if password.is_empty() {
            errors.add(FormField::Password, fields::PASSWORD_REQUIRED);
        }
        match email {
            Some(email) => errors.into_result(|| Self {
                email,
                password: Zeroizing::new(password.to_owned()),
            }),
            None => Err(errors),
        }
    }

    /// Address the user typed.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password the user typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Body for `POST /api/v1/login`.
    pub fn to_backend_body(&self) -> Value {
        json!({ "email": self.email.as_str(), "password": self.password() })
    }
}

/// Validated registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    email: Email,
    password: Zeroizing<String>,
}

impl RegisterForm {
    /// Validate raw registration inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let email = Email::parse(email)
            .map_err(|message| errors.add(FormField::Email, message))
            .ok();
        if password.chars().count() < PASSWORD_MIN_CHARS {
            errors.add(FormField::Password, fields::PASSWORD_TOO_SHORT);
        }
        if password != confirm_password {
            errors.add(FormField::ConfirmPassword, fields::CONFIRM_MISMATCH);
        }
        match email {
            Some(email) => errors.into_result(|| Self {
                email,
                password: Zeroizing::new(password.to_owned()),
            }),
            None => Err(errors),
        }
    }

    /// Address being registered.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Body for `POST /api/v1/register`. The confirmation is re-sent because
    /// the backend checks it independently.
    pub fn to_backend_body(&self) -> Value {
        let password = self.password.as_str();
        json!({
            "email": self.email.as_str(),
            "password": password,
            "confirmPassword": password,
        })
    }
}

/// Six-digit one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Validate a code.
    ///
    /// # Examples
    /// ```
    /// use threads_web::domain::OtpCode;
    ///
    /// assert!(OtpCode::parse("012345").is_ok());
    /// assert!(OtpCode::parse("12345").is_err());
    /// assert!(OtpCode::parse("12345a").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if trimmed.len() == OTP_DIGITS && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(fields::OTP_INVALID)
        }
    }

    /// Borrow the digits.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated OTP verification form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCodeForm {
    email: Email,
    code: OtpCode,
}

impl VerifyCodeForm {
    /// Validate raw verification inputs.
    pub fn try_from_parts(email: &str, code: &str) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let email = Email::parse(email)
            .map_err(|message| errors.add(FormField::Email, message))
            .ok();
        let code = OtpCode::parse(code)
            .map_err(|message| errors.add(FormField::Code, message))
            .ok();
        match (email, code) {
            (Some(email), Some(code)) => Ok(Self { email, code }),
            _ => Err(errors),
        }
    }

    /// Build from already-validated parts.
    pub fn new(email: Email, code: OtpCode) -> Self {
        Self { email, code }
    }

    /// Address being verified.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Body for `POST /api/v1/verify-code`.
    pub fn to_backend_body(&self) -> Value {
        json!({ "email": self.email.as_str(), "code": self.code.as_str() })
    }
}
