use super::domain::{Identity, RequestChanges, RequestDraft, RequestForm, RequestPatch};

/// Field-level rejections raised before a request reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identity must be 1-{max} ASCII letters or digits, found {found:?}")]
    Identity { max: usize, found: String },
    #[error("{field} must be 1-{max} alphabetic characters, found {found:?}")]
    Name {
        field: &'static str,
        max: usize,
        found: String,
    },
    #[error("age must be between 0 and {max}, found {found}")]
    Age { max: u8, found: i64 },
    #[error("unknown status {0:?}")]
    UnknownStatus(String),
    #[error("status target must be approved or rejected, found {0}")]
    StatusTarget(&'static str),
    #[error("malformed payload: {0}")]
    Payload(String),
}

const DEFAULT_IDENTITY_MAX: usize = 10;
const DEFAULT_NAME_MAX: usize = 20;
const DEFAULT_AGE_MAX: u8 = 99;

/// Length and range limits applied to inbound request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    pub identity_max: usize,
    pub name_max: usize,
    pub age_max: u8,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            identity_max: DEFAULT_IDENTITY_MAX,
            name_max: DEFAULT_NAME_MAX,
            age_max: DEFAULT_AGE_MAX,
        }
    }
}

/// Guard turning raw forms and patches into validated drafts.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    limits: IntakeLimits,
}

impl IntakeGuard {
    pub fn with_limits(limits: IntakeLimits) -> Self {
        Self { limits }
    }

    pub fn draft_from_form(&self, form: RequestForm) -> Result<RequestDraft, ValidationError> {
        Ok(RequestDraft {
            identity: self.identity(form.identity)?,
            given_name: self.name("given_name", form.given_name)?,
            family_name: self.name("family_name", form.family_name)?,
            age: self.age(form.age)?,
            affinity: form.affinity,
        })
    }

    /// Validate only the fields present in `patch`.
    pub fn changes_from_patch(&self, patch: RequestPatch) -> Result<RequestChanges, ValidationError> {
        Ok(RequestChanges {
            identity: patch.identity.map(|raw| self.identity(raw)).transpose()?,
            given_name: patch
                .given_name
                .map(|raw| self.name("given_name", raw))
                .transpose()?,
            family_name: patch
                .family_name
                .map(|raw| self.name("family_name", raw))
                .transpose()?,
            age: patch.age.map(|raw| self.age(raw)).transpose()?,
            affinity: patch.affinity,
        })
    }

    fn identity(&self, raw: String) -> Result<Identity, ValidationError> {
        let length = raw.chars().count();
        let well_formed = (1..=self.limits.identity_max).contains(&length)
            && raw.chars().all(|c| c.is_ascii_alphanumeric());
        if !well_formed {
            return Err(ValidationError::Identity {
                max: self.limits.identity_max,
                found: raw,
            });
        }
        Ok(Identity(raw))
    }

    fn name(&self, field: &'static str, raw: String) -> Result<String, ValidationError> {
        let length = raw.chars().count();
        let well_formed = (1..=self.limits.name_max).contains(&length)
            && raw.chars().all(char::is_alphabetic);
        if !well_formed {
            return Err(ValidationError::Name {
                field,
                max: self.limits.name_max,
                found: raw,
            });
        }
        Ok(raw)
    }

    fn age(&self, raw: i64) -> Result<u8, ValidationError> {
        match u8::try_from(raw) {
            Ok(age) if age <= self.limits.age_max => Ok(age),
            _ => Err(ValidationError::Age {
                max: self.limits.age_max,
                found: raw,
            }),
        }
    }
}
