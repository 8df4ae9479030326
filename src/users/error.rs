//! User-facing error types for profile, role, and password operations.

use thiserror::Error;

use crate::store::StoreError;

/// Which minimum-reputation setting a check was evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinRepSetting {
    /// `min_rep_aboutme`
    AboutMe,
    /// `min_rep_signature`
    Signature,
}

impl MinRepSetting {
    /// Suffix used in the surfaced error code.
    pub const fn code_suffix(self) -> &'static str {
        match self {
            Self::AboutMe => "min-rep-aboutme",
            Self::Signature => "min-rep-signature",
        }
    }
}

/// Errors surfaced by the user subsystem.
///
/// Every variant maps to a stable machine-readable code via
/// [`UserError::code`]; `Display` carries the human-readable
/// interpolation.
#[derive(Debug, Error)]
pub enum UserError {
    /// Profile update submitted without a target uid.
    #[error("invalid update target")]
    InvalidUpdateUid,

    /// Operation referenced a missing or guest uid.
    #[error("invalid uid")]
    InvalidUid,

    /// Email address failed format validation.
    #[error("invalid email address")]
    InvalidEmail,

    /// Username shorter than the configured minimum.
    #[error("username is shorter than {minimum} characters")]
    UsernameTooShort {
        /// Configured minimum length.
        minimum: usize,
    },

    /// Username longer than the configured maximum.
    #[error("username is longer than {maximum} characters")]
    UsernameTooLong {
        /// Configured maximum length.
        maximum: usize,
    },

    /// Username contains illegal characters or yields no slug.
    #[error("invalid username")]
    InvalidUsername,

    /// Another user already owns this username slug.
    #[error("username already taken")]
    UsernameTaken,

    /// Username rejected by a registered check hook; carries the hook's
    /// own error code.
    #[error("username rejected: {0}")]
    UsernameVetoed(String),

    /// About-me text exceeds the configured maximum.
    #[error("about me is longer than {maximum} characters")]
    AboutMeTooLong {
        /// Configured maximum length.
        maximum: usize,
    },

    /// Signature exceeds the configured maximum.
    #[error("signature is longer than {maximum} characters")]
    SignatureTooLong {
        /// Configured maximum length.
        maximum: usize,
    },

    /// Fullname is a URL or exceeds 255 characters.
    #[error("invalid fullname")]
    InvalidFullname,

    /// Birthday is not a parseable date.
    #[error("invalid birthday")]
    InvalidBirthday,

    /// Group title names a privilege group or a reserved group.
    #[error("invalid group title")]
    InvalidGroupTitle,

    /// Caller's reputation is below a built-in field threshold.
    #[error("needs {required} reputation to edit this field")]
    NotEnoughReputation {
        /// Which setting gated the edit.
        setting: MinRepSetting,
        /// Reputation required.
        required: i64,
    },

    /// Caller's reputation is below a custom field's threshold.
    #[error("needs {required} reputation to edit \"{field}\"")]
    NotEnoughReputationCustomField {
        /// Reputation required.
        required: i64,
        /// Display name of the field.
        field: String,
    },

    /// Custom field value exceeds 255 characters.
    #[error("value for \"{field}\" is too long")]
    CustomFieldValueTooLong {
        /// Display name of the field.
        field: String,
    },

    /// Number field did not parse as a number.
    #[error("value for \"{field}\" is not a number")]
    CustomFieldInvalidNumber {
        /// Display name of the field.
        field: String,
    },

    /// Free-text field looked like a URL.
    #[error("value for \"{field}\" must not be a link")]
    CustomFieldInvalidText {
        /// Display name of the field.
        field: String,
    },

    /// Date field did not parse as a calendar date.
    #[error("value for \"{field}\" is not a valid date")]
    CustomFieldInvalidDate {
        /// Display name of the field.
        field: String,
    },

    /// Link field was not a valid URL.
    #[error("value for \"{field}\" is not a valid link")]
    CustomFieldInvalidLink {
        /// Display name of the field.
        field: String,
    },

    /// Select value is not one of the configured options.
    #[error("value for \"{field}\" is not an allowed option")]
    CustomFieldInvalidSelect {
        /// Display name of the field.
        field: String,
    },

    /// Password shorter than the configured minimum.
    #[error("password is shorter than {minimum} characters")]
    PasswordTooShort {
        /// Configured minimum length.
        minimum: usize,
    },

    /// Caller lacks privileges for this operation.
    #[error("no privileges")]
    NoPrivileges,

    /// Non-admin attempted to change someone else's password.
    #[error("cannot change another user's password")]
    ChangePasswordPrivileges,

    /// Supplied current password did not match.
    #[error("wrong current password")]
    WrongCurrentPassword,

    /// New password matches the current one.
    #[error("new password matches the current password")]
    SamePassword,

    /// Password hashing or verification failed.
    #[error("password processing failed")]
    PasswordHash,

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A hook handler failed.
    #[error("hook failure: {0}")]
    Hook(#[from] anyhow::Error),
}

impl UserError {
    /// Stable machine-readable code for API serialization.
    pub fn code(&self) -> String {
        match self {
            Self::InvalidUpdateUid => "invalid-update-uid".into(),
            Self::InvalidUid => "invalid-uid".into(),
            Self::InvalidEmail => "invalid-email".into(),
            Self::UsernameTooShort { .. } => "username-too-short".into(),
            Self::UsernameTooLong { .. } => "username-too-long".into(),
            Self::InvalidUsername => "invalid-username".into(),
            Self::UsernameTaken => "username-taken".into(),
            Self::UsernameVetoed(code) => code.clone(),
            Self::AboutMeTooLong { .. } => "about-me-too-long".into(),
            Self::SignatureTooLong { .. } => "signature-too-long".into(),
            Self::InvalidFullname => "invalid-fullname".into(),
            Self::InvalidBirthday => "invalid-birthday".into(),
            Self::InvalidGroupTitle => "invalid-group-title".into(),
            Self::NotEnoughReputation { setting, .. } => {
                format!("not-enough-reputation-{}", setting.code_suffix())
            }
            Self::NotEnoughReputationCustomField { .. } => {
                "not-enough-reputation-custom-field".into()
            }
            Self::CustomFieldValueTooLong { .. } => "custom-user-field-value-too-long".into(),
            Self::CustomFieldInvalidNumber { .. } => "custom-user-field-invalid-number".into(),
            Self::CustomFieldInvalidText { .. } => "custom-user-field-invalid-text".into(),
            Self::CustomFieldInvalidDate { .. } => "custom-user-field-invalid-date".into(),
            Self::CustomFieldInvalidLink { .. } => "custom-user-field-invalid-link".into(),
            Self::CustomFieldInvalidSelect { .. } => {
                "custom-user-field-select-value-invalid".into()
            }
            Self::PasswordTooShort { .. } => "password-too-short".into(),
            Self::NoPrivileges => "no-privileges".into(),
            Self::ChangePasswordPrivileges => "change-password-error-privileges".into(),
            Self::WrongCurrentPassword => "change-password-error-wrong-current".into(),
            Self::SamePassword => "change-password-error-same-password".into(),
            Self::PasswordHash => "password-error".into(),
            Self::Store(_) => "internal-error".into(),
            Self::Hook(_) => "internal-error".into(),
        }
    }
}

/// Result alias for user operations.
pub type UserResult<T> = Result<T, UserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(UserError::InvalidUpdateUid.code(), "invalid-update-uid");
        assert_eq!(
            UserError::NotEnoughReputation {
                setting: MinRepSetting::AboutMe,
                required: 5
            }
            .code(),
            "not-enough-reputation-min-rep-aboutme"
        );
        assert_eq!(
            UserError::CustomFieldInvalidSelect {
                field: "Soccer Team".into()
            }
            .code(),
            "custom-user-field-select-value-invalid"
        );
        assert_eq!(
            UserError::UsernameVetoed("username-reserved".into()).code(),
            "username-reserved"
        );
    }

    #[test]
    fn test_display_interpolates_params() {
        let err = UserError::NotEnoughReputationCustomField {
            required: 7,
            field: "Lucky Number".into(),
        };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains("Lucky Number"));
    }
}
