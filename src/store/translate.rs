//! Store-wide path namespace translation.
//!
//! A store built on one machine can be checked on another where the same
//! tree lives under a different prefix (`D:\photos` vs `/mnt/d/photos`) or
//! with the other separator convention. [`PathTranslation`] rewrites every
//! stored path in the working copy once, before any diffing, so later set
//! comparisons see paths in the live filesystem's namespace.
//!
//! The rewrite touches only the working copy; check and enumerate runs
//! never checkpoint, so the durable store keeps its original paths.

use std::str::FromStr;

use super::database::{HashStore, StoreResult};

/// Target convention for separator conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorConversion {
    /// `/` becomes `\`
    ToWindows,
    /// `\` becomes `/`
    ToUnix,
}

impl SeparatorConversion {
    /// `(from, to)` characters for this conversion.
    #[must_use]
    pub fn chars(self) -> (char, char) {
        match self {
            Self::ToWindows => ('/', '\\'),
            Self::ToUnix => ('\\', '/'),
        }
    }

    /// The conversion that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::ToWindows => Self::ToUnix,
            Self::ToUnix => Self::ToWindows,
        }
    }
}

impl FromStr for SeparatorConversion {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" | "windows" => Ok(Self::ToWindows),
            "u" | "unix" => Ok(Self::ToUnix),
            _ => Err(TranslateError::UnknownConversion(s.to_string())),
        }
    }
}

/// Malformed translation arguments. All are fatal before any work starts.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TranslateError {
    /// Only one of the two prefixes was supplied.
    #[error("Path substitution needs both sides")]
    NeedsBothSides,

    /// Separator conversion was requested without a prefix substitution.
    #[error("Path conversion only useful with path substitution")]
    ConversionWithoutSubstitution,

    /// The prefix to replace is empty.
    #[error("Path substitution prefix must not be empty")]
    EmptyPrefix,

    /// Conversion target other than Windows or Unix.
    #[error("Path conversion to [w]indows or [u]nix, got {0:?}")]
    UnknownConversion(String),
}

/// Counts of rewritten records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Records whose prefix was substituted
    pub prefixed: usize,
    /// Records whose separators changed
    pub converted: usize,
    /// Records that now share a path with another record
    pub collisions: usize,
}

/// A prefix substitution with optional separator conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTranslation {
    from_prefix: String,
    to_prefix: String,
    conversion: Option<SeparatorConversion>,
}

impl PathTranslation {
    /// Validate translation arguments.
    ///
    /// Returns `Ok(None)` when nothing was requested.
    ///
    /// # Errors
    ///
    /// Fails if only one prefix is given, if a conversion is given without
    /// a substitution, or if the prefix to replace is empty.
    pub fn from_args(
        from_prefix: Option<String>,
        to_prefix: Option<String>,
        conversion: Option<SeparatorConversion>,
    ) -> Result<Option<Self>, TranslateError> {
        match (from_prefix, to_prefix) {
            (None, None) if conversion.is_some() => {
                Err(TranslateError::ConversionWithoutSubstitution)
            }
            (None, None) => Ok(None),
            (Some(from), Some(to)) => Self::new(from, to, conversion).map(Some),
            _ => Err(TranslateError::NeedsBothSides),
        }
    }

    /// Build a translation from `from_prefix` to `to_prefix`.
    ///
    /// # Errors
    ///
    /// Fails with [`TranslateError::EmptyPrefix`] if `from_prefix` is empty.
    pub fn new(
        from_prefix: impl Into<String>,
        to_prefix: impl Into<String>,
        conversion: Option<SeparatorConversion>,
    ) -> Result<Self, TranslateError> {
        let from_prefix = from_prefix.into();
        if from_prefix.is_empty() {
            return Err(TranslateError::EmptyPrefix);
        }
        Ok(Self {
            from_prefix,
            to_prefix: to_prefix.into(),
            conversion,
        })
    }

    /// Prefix being replaced.
    #[must_use]
    pub fn from_prefix(&self) -> &str {
        &self.from_prefix
    }

    /// Replacement prefix.
    #[must_use]
    pub fn to_prefix(&self) -> &str {
        &self.to_prefix
    }

    /// Separator conversion applied after the substitution.
    #[must_use]
    pub fn conversion(&self) -> Option<SeparatorConversion> {
        self.conversion
    }

    /// Rewrite one path the way [`PathTranslation::apply`] rewrites the store.
    #[must_use]
    pub fn translate_path(&self, path: &str) -> String {
        let substituted = path.replace(&self.from_prefix, &self.to_prefix);
        match self.conversion {
            Some(conversion) => {
                let (from, to) = conversion.chars();
                substituted.replace(from, &to.to_string())
            }
            None => substituted,
        }
    }

    /// Rewrite every stored path in the working copy.
    pub fn apply(&self, store: &HashStore) -> StoreResult<TranslationReport> {
        let prefixed = store.rewrite_prefix(&self.from_prefix, &self.to_prefix)?;
        let converted = match self.conversion {
            Some(conversion) => {
                let (from, to) = conversion.chars();
                store.convert_separators(from, to)?
            }
            None => 0,
        };
        log::info!(
            "Translated store paths {:?} -> {:?}: {} substituted, {} converted",
            self.from_prefix,
            self.to_prefix,
            prefixed,
            converted
        );
        let collisions = store.duplicate_paths()?;
        if collisions > 0 {
            log::warn!(
                "Translation merged {} stored paths into existing ones; those paths are checked more than once",
                collisions
            );
        }
        Ok(TranslationReport {
            prefixed,
            converted,
            collisions,
        })
    }
}
