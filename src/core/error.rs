//! Purpose: Shared error type for registry resolution, sessions, and stores.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Single error currency across the core, the CLI, and the HTTP layer.
//! Invariants: Exit-code mapping is stable once published.
//! Invariants: Errors carry context (backend, record type) without losing the source.
use std::error::Error as StdError;
use std::fmt;

use crate::core::record::RecordType;
use crate::core::registry::BackendId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    UnrecognizedType,
    SessionClosed,
    CommitFailed,
    Storage,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    backend: Option<BackendId>,
    record_type: Option<RecordType>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            backend: None,
            record_type: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn backend(&self) -> Option<BackendId> {
        self.backend
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_backend(mut self, backend: BackendId) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(backend) = self.backend {
            write!(f, " (backend: {})", backend.as_str())?;
        }
        if let Some(record_type) = self.record_type {
            write!(f, " (type: {})", record_type.as_str())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::UnrecognizedType => 4,
        ErrorKind::SessionClosed => 5,
        ErrorKind::CommitFailed => 6,
        ErrorKind::Storage => 7,
        ErrorKind::Io => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use crate::core::record::RecordType;
    use crate::core::registry::BackendId;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::UnrecognizedType, 4),
            (ErrorKind::SessionClosed, 5),
            (ErrorKind::CommitFailed, 6),
            (ErrorKind::Storage, 7),
            (ErrorKind::Io, 8),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::CommitFailed)
            .with_message("commit rejected")
            .with_backend(BackendId::Secondary)
            .with_record_type(RecordType::Order);
        let rendered = err.to_string();
        assert!(rendered.contains("CommitFailed"));
        assert!(rendered.contains("commit rejected"));
        assert!(rendered.contains("secondary"));
        assert!(rendered.contains("order"));
    }
}
