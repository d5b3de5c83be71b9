// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error handling facilities for the Berth control plane
//!
//! For HTTP-level error handling, see Dropshot.

use crate::api::external::ResourceType;
use dropshot::HttpError;
use serde::Deserialize;
use serde::Serialize;

/// An error that can be generated within a control plane component
///
/// These may be generated while handling a client request or as part of
/// background operation.  When generated as part of an HTTP request, an
/// `Error` will be converted into an HTTP error as one of the last steps in
/// processing the request.  This allows most of the system to remain agnostic
/// to the transport with which the system communicates with clients.
///
/// Where possible, reuse existing variants rather than inventing new ones to
/// distinguish cases that no programmatic consumer needs to distinguish.
#[derive(Clone, Debug, Deserialize, thiserror::Error, PartialEq, Serialize)]
pub enum Error {
    /// An object needed as part of this operation was not found.
    #[error("Object (of type {lookup_type:?}) not found: {type_name}")]
    ObjectNotFound { type_name: ResourceType, lookup_type: LookupType },
    /// An object already exists with the specified name or identifier.
    #[error("Object (of type {type_name:?}) already exists: {object_name}")]
    ObjectAlreadyExists { type_name: ResourceType, object_name: String },
    /// The request was well-formed, but the operation cannot be completed given
    /// the current state of the system.
    #[error("Invalid Request: {message}")]
    InvalidRequest { message: String },
    /// The caller is identified but is not allowed to perform the requested
    /// operation.
    ///
    /// The message is shown to the caller.  It may name the caller's own user
    /// and project, but nothing else.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },
    /// The system encountered an unhandled operational error.
    #[error("Internal Error: {internal_message}")]
    InternalError { internal_message: String },
}

/// Indicates how an object was looked up (for an `ObjectNotFound` error)
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum LookupType {
    /// a specific name was requested
    ByName(String),
    /// a specific id was requested with some composite type
    /// (caller summarizes it)
    ByCompositeId(String),
}

impl LookupType {
    /// Returns an ObjectNotFound error appropriate for the case where this
    /// lookup failed
    pub fn into_not_found(self, type_name: ResourceType) -> Error {
        Error::ObjectNotFound { type_name, lookup_type: self }
    }
}

impl From<&str> for LookupType {
    fn from(name: &str) -> Self {
        LookupType::ByName(name.to_owned())
    }
}

impl Error {
    /// Generates an [`Error::ObjectNotFound`] error for a lookup by object
    /// name.
    pub fn not_found_by_name(type_name: ResourceType, name: &str) -> Error {
        LookupType::from(name).into_not_found(type_name)
    }

    /// Generates an [`Error::InternalError`] error with the specific message
    ///
    /// InternalError should be used for operational conditions that should not
    /// happen but that we cannot reasonably handle at runtime (e.g.,
    /// deserializing a value from the database, or finding two records for
    /// something that is supposed to be unique).
    pub fn internal_error(internal_message: &str) -> Error {
        Error::InternalError { internal_message: internal_message.to_owned() }
    }

    /// Generates an [`Error::InvalidRequest`] error with the specific message
    ///
    /// This should be used for failures due possibly to invalid client input
    /// or malformed requests.
    pub fn invalid_request(message: &str) -> Error {
        Error::InvalidRequest { message: message.to_owned() }
    }

    /// Generates an [`Error::Forbidden`] error with the specific message
    pub fn forbidden(message: &str) -> Error {
        Error::Forbidden { message: message.to_owned() }
    }
}

impl From<Error> for HttpError {
    /// Converts an `Error` error into an `HttpError`.  This defines how
    /// errors that are represented internally using `Error` are ultimately
    /// exposed to clients over HTTP.
    fn from(error: Error) -> HttpError {
        match error {
            Error::ObjectNotFound { type_name: t, lookup_type: lt } => {
                let (lookup_field, lookup_value) = match lt {
                    LookupType::ByName(name) => ("name", name),
                    LookupType::ByCompositeId(label) => ("id", label),
                };
                let message = format!(
                    "not found: {} with {} \"{}\"",
                    t, lookup_field, lookup_value
                );
                HttpError::for_client_error(
                    Some(String::from("ObjectNotFound")),
                    http::StatusCode::NOT_FOUND,
                    message,
                )
            }

            Error::ObjectAlreadyExists { type_name: t, object_name: n } => {
                let message = format!("already exists: {} \"{}\"", t, n);
                HttpError::for_bad_request(
                    Some(String::from("ObjectAlreadyExists")),
                    message,
                )
            }

            Error::InvalidRequest { message } => HttpError::for_bad_request(
                Some(String::from("InvalidRequest")),
                message,
            ),

            Error::Forbidden { message } => HttpError::for_client_error(
                Some(String::from("Forbidden")),
                http::StatusCode::FORBIDDEN,
                message,
            ),

            Error::InternalError { internal_message } => {
                HttpError::for_internal_error(internal_message)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::internal_error(&e.to_string())
    }
}
