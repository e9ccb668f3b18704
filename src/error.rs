// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error taxonomy shared by every decoding stage.

use std::fmt;
use std::io;

/// Every failure mode the pipeline can produce.
///
/// Kinds mirror the on-disk decoding cascade: a stage either fails to read
/// bytes at all (`Io`), reads bytes that don't match an expected signature
/// or checksum (`FormatSignature`), reads well-formed-looking bytes that
/// don't satisfy a semantic expectation (`FormatSemantic`), or hits a shape
/// of input this crate deliberately does not handle (`Unsupported`).
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    FormatSignature(String),
    FormatSemantic(String),
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "I/O error: {}", e),
            Error::FormatSignature(ref s) => write!(f, "bad signature: {}", s),
            Error::FormatSemantic(ref s) => write!(f, "malformed metadata: {}", s),
            Error::Unsupported(ref s) => write!(f, "unsupported: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// Shorthand for building a `FormatSignature` error.
pub fn bad_signature<S: Into<String>>(msg: S) -> Error {
    Error::FormatSignature(msg.into())
}

/// Shorthand for building a `FormatSemantic` error.
pub fn bad_semantic<S: Into<String>>(msg: S) -> Error {
    Error::FormatSemantic(msg.into())
}

/// Shorthand for building an `Unsupported` error.
pub fn unsupported<S: Into<String>>(msg: S) -> Error {
    Error::Unsupported(msg.into())
}
