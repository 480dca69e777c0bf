//! Dotted-path field-mask helpers.
//!
//! The registry's Get/Set protocol is driven by sets of dotted string paths
//! over the end-device schema (`session.keys.f_nwk_s_int_key.key`). A mask
//! entry covers itself and every descendant: a mask containing `session`
//! covers `session.dev_addr`.

use thiserror::Error;

/// Errors produced by mask validation helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldMaskError {
    /// A required path is missing from the mask.
    #[error("field `{path}` is required")]
    MissingField {
        /// The required path.
        path: String,
    },

    /// A forbidden path is present in the mask.
    #[error("field `{path}` cannot be set")]
    ForbiddenField {
        /// The forbidden path.
        path: String,
    },

    /// A path does not exist in the entity schema.
    #[error("unknown field path `{path}`")]
    UnknownField {
        /// The unknown path.
        path: String,
    },
}

/// Returns whether `ancestor` equals `path` or is a dotted prefix of it.
fn covers(ancestor: &str, path: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'.')
}

/// Returns whether the mask covers any of the given fields.
///
/// A field is covered when the mask contains it or one of its ancestors.
pub fn has_any_field<S: AsRef<str>>(mask: &[S], fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|field| mask.iter().any(|entry| covers(entry.as_ref(), field)))
}

/// Returns whether the mask touches `field` at all: contains it, an
/// ancestor of it, or any descendant of it.
pub fn touches<S: AsRef<str>>(mask: &[S], field: &str) -> bool {
    mask.iter().any(|entry| {
        let entry = entry.as_ref();
        covers(entry, field) || covers(field, entry)
    })
}

/// Adds the given fields to the mask, skipping entries already present.
pub fn add_fields(mask: &mut Vec<String>, fields: &[&str]) {
    for field in fields {
        if !mask.iter().any(|entry| entry == field) {
            mask.push((*field).to_string());
        }
    }
}

/// Requires every given field to be covered by the mask.
///
/// # Errors
///
/// Returns [`FieldMaskError::MissingField`] naming the first field that is
/// not covered.
pub fn require_fields<S: AsRef<str>>(mask: &[S], fields: &[&str]) -> Result<(), FieldMaskError> {
    for field in fields {
        if !has_any_field(mask, &[field]) {
            return Err(FieldMaskError::MissingField {
                path: (*field).to_string(),
            });
        }
    }
    Ok(())
}

/// Rejects masks that touch any of the given fields.
///
/// A mask entry touches a prohibited field when either one covers the
/// other: prohibiting `session.keys.nwk_s_enc_key.key` rejects both that
/// exact entry and a whole-`session` entry.
///
/// # Errors
///
/// Returns [`FieldMaskError::ForbiddenField`] naming the first prohibited
/// field touched by the mask.
pub fn prohibit_fields<S: AsRef<str>>(mask: &[S], fields: &[&str]) -> Result<(), FieldMaskError> {
    for field in fields {
        for entry in mask {
            let entry = entry.as_ref();
            if covers(entry, field) || covers(field, entry) {
                return Err(FieldMaskError::ForbiddenField {
                    path: (*field).to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validates every mask entry against a schema path table.
///
/// An entry is valid when it is a known path or an ancestor of one, so a
/// schema listing only leaves still admits `session.keys`. Descendants of
/// leaves (element indices, unknown subfields) are rejected.
///
/// # Errors
///
/// Returns [`FieldMaskError::UnknownField`] naming the first entry absent
/// from the schema.
pub fn validate_paths<S: AsRef<str>, P: AsRef<str>>(
    mask: &[S],
    schema: &[P],
) -> Result<(), FieldMaskError> {
    for entry in mask {
        let entry = entry.as_ref();
        let known = schema.iter().any(|path| covers(entry, path.as_ref()));
        if !known {
            return Err(FieldMaskError::UnknownField {
                path: entry.to_string(),
            });
        }
    }
    Ok(())
}
