//! User domain types and validation rules.
//!
//! The email validator is intentionally permissive: it checks structure
//! (`local@domain.tld` with non-empty segments), not RFC 5322 conformance.
//! That is a documented limitation of the lookup contract, not a bug.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use userhub_core::{AppError, AppResult, NonEmptyString};

/// Unique identifier for a user record.
///
/// Ids are assigned by the backing store and treated as opaque strings;
/// this module never mints one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(NonEmptyString);

impl UserId {
    /// Creates a user identifier from a store-assigned value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.as_str())
    }
}

/// Validated email address.
///
/// Validation is a pure structural check on the supplied string: no
/// trimming, no case folding. Repository matching is exact, so the value
/// is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Accepts exactly the shape `local@domain.tld`: one `@`, non-empty
    /// local part, and a `.` in the domain with at least one character on
    /// each side. Dots inside segments are allowed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        if !Self::is_valid(&value) {
            return Err(AppError::Validation(format!(
                "invalid email address: '{value}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns whether the supplied string is structurally a valid email
    /// address. Pure predicate; no side effects.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }

        // The domain needs an interior dot: at least one character between
        // the `@` and the `.`, and at least one after the `.`.
        // `.` is ASCII, so a byte scan is position-exact.
        let bytes = domain.as_bytes();
        bytes
            .iter()
            .enumerate()
            .any(|(position, byte)| *byte == b'.' && position > 0 && position + 1 < bytes.len())
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Reserved key holding the store-assigned identifier.
pub const ID_KEY: &str = "id";

/// Reserved key holding the natural key used for lookups.
pub const EMAIL_KEY: &str = "email";

/// A user record as stored by the backing collection.
///
/// The document is an opaque key-value mapping with two reserved keys:
/// `id` (present once stored) and `email` (read for matching). Every other
/// field passes through this module unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDocument {
    data: Map<String, Value>,
}

impl UserDocument {
    /// Creates a validated user document projection.
    ///
    /// The payload must be a JSON object carrying a non-empty string
    /// `email` field; everything else is opaque.
    pub fn new(data: Value) -> AppResult<Self> {
        let Value::Object(data) = data else {
            return Err(AppError::Validation(
                "user document must be a JSON object".to_owned(),
            ));
        };

        match data.get(EMAIL_KEY) {
            Some(Value::String(email)) if !email.is_empty() => {}
            _ => {
                return Err(AppError::Validation(
                    "user document must carry a non-empty string 'email' field".to_owned(),
                ));
            }
        }

        if let Some(id) = data.get(ID_KEY)
            && !matches!(id, Value::String(value) if !value.is_empty())
        {
            return Err(AppError::Validation(
                "user document 'id' field must be a non-empty string".to_owned(),
            ));
        }

        Ok(Self { data })
    }

    /// Returns the email the document is keyed on.
    #[must_use]
    pub fn email(&self) -> &str {
        match self.data.get(EMAIL_KEY) {
            Some(Value::String(email)) => email.as_str(),
            // Unreachable after construction; empty keeps the accessor total.
            _ => "",
        }
    }

    /// Returns the store-assigned identifier, if the document was stored.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self.data.get(ID_KEY) {
            Some(Value::String(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Returns a passthrough field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the full underlying mapping.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns a copy of the document with the given store-assigned id.
    #[must_use]
    pub fn with_id(mut self, id: &UserId) -> Self {
        self.data
            .insert(ID_KEY.to_owned(), Value::String(id.as_str().to_owned()));
        self
    }

    /// Returns a copy with the patch applied on top: patched fields are
    /// set, every other field is left untouched. The result is re-validated
    /// so a patch cannot break the document invariants.
    pub fn patched(&self, patch: &FieldPatch) -> AppResult<Self> {
        let mut data = self.data.clone();
        for (key, value) in patch.fields() {
            data.insert(key.clone(), value.clone());
        }

        Self::new(Value::Object(data))
    }
}

/// A partial update: set exactly these fields, leave the rest untouched.
///
/// Never a full-document replace.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPatch {
    fields: Map<String, Value>,
}

impl FieldPatch {
    /// Creates a validated field patch from a JSON object payload.
    pub fn new(fields: Value) -> AppResult<Self> {
        let Value::Object(fields) = fields else {
            return Err(AppError::Validation(
                "field patch must be a JSON object".to_owned(),
            ));
        };

        if fields.is_empty() {
            return Err(AppError::Validation(
                "field patch must name at least one field".to_owned(),
            ));
        }

        Ok(Self { fields })
    }

    /// Returns the fields to set.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// An exact-match query filter over user documents.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilter {
    criteria: Map<String, Value>,
}

impl UserFilter {
    /// Creates a filter matching documents with exactly this email.
    #[must_use]
    pub fn by_email(email: &EmailAddress) -> Self {
        let mut criteria = Map::new();
        criteria.insert(
            EMAIL_KEY.to_owned(),
            Value::String(email.as_str().to_owned()),
        );
        Self { criteria }
    }

    /// Returns the exact-match criteria.
    #[must_use]
    pub fn criteria(&self) -> &Map<String, Value> {
        &self.criteria
    }
}
