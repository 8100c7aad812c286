//! Parsing and merging of volume tag specifications.
//!
//! A tag specification is a comma separated list of `key=value` pairs. Keys
//! of the form `namespace.key` become defined tags; bare keys become
//! free-form tags.

use thiserror::Error;

use crate::backend::{DefinedTags, FreeformTags};

/// Errors raised while parsing a tag specification.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TagError {
    /// Raised when a tag does not match `(<namespace>.)<tagkey>=<value>`.
    #[error("tag format must follow (<namespace>.)<tagkey>=<value>: {tag:?}")]
    Format {
        /// The offending tag, verbatim.
        tag: String,
    },
}

/// Defined and free-form tags resolved for a single volume.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagSet {
    /// Namespaced tags.
    pub defined: DefinedTags,
    /// Unnamespaced tags.
    pub freeform: FreeformTags,
}

impl TagSet {
    /// Parses a tag specification. An empty string yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Format`] when any tag lacks exactly one `=` or its
    /// key has more than one `.`.
    pub fn parse(spec: &str) -> Result<Self, TagError> {
        let mut tags = Self::default();
        if spec.is_empty() {
            return Ok(tags);
        }

        for tag in spec.split(',') {
            let format_error = || TagError::Format {
                tag: tag.to_owned(),
            };
            let mut parts = tag.split('=');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(format_error());
            };

            let mut segments = key.split('.');
            match (segments.next(), segments.next(), segments.next()) {
                (Some(_), None, _) => {
                    tags.freeform.insert(key.to_owned(), value.to_owned());
                }
                (Some(namespace), Some(name), None) => {
                    tags.defined
                        .entry(namespace.to_owned())
                        .or_default()
                        .insert(name.to_owned(), value.to_owned());
                }
                _ => return Err(format_error()),
            }
        }
        Ok(tags)
    }

    /// Overlays `overrides` on top of `self`.
    ///
    /// Override values win per `(namespace, key)` and per free-form key.
    /// Sibling keys already present in a namespace are kept.
    #[must_use]
    pub fn merge(mut self, overrides: Self) -> Self {
        for (namespace, tags) in overrides.defined {
            self.defined.entry(namespace).or_default().extend(tags);
        }
        self.freeform.extend(overrides.freeform);
        self
    }

    /// Resolves the tags for a volume from the process-wide defaults and the
    /// claim's own specification.
    ///
    /// # Errors
    ///
    /// Returns [`TagError`] when either specification is malformed; no partial
    /// result is produced.
    pub fn resolve(defaults: &str, annotations: &str) -> Result<Self, TagError> {
        let base = Self::parse(defaults)?;
        let overrides = Self::parse(annotations)?;
        Ok(base.merge(overrides))
    }

    /// Returns `true` when no tags are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defined.is_empty() && self.freeform.is_empty()
    }
}
