//! Purpose: Crate-wide error value for etcd client operations.
//! Exports: `Error`, `ErrorKind`, `ApiResult`, `to_exit_code`, `kind_from_status`.
//! Role: Carries unclassified failures verbatim (status + raw body) to callers.
//! Invariants: Propagated HTTP failures keep the original status code and body.
//! Invariants: Exit-code mapping is stable once published.
use std::error::Error as StdError;
use std::fmt;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    AlreadyExists,
    PreconditionFailed,
    Permission,
    Unavailable,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    key: Option<String>,
    status: Option<u16>,
    body: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            key: None,
            status: None,
            body: None,
            source: None,
        }
    }

    /// Error for a non-2xx response that no fallback recovered.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        Self::new(kind_from_status(status))
            .with_message(format!("etcd responded with status {status}"))
            .with_status(status)
            .with_body(body)
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

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
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
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if let Some(body) = &self.body {
            let body = body.trim();
            if !body.is_empty() {
                write!(f, " (body: {body})")?;
            }
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

pub fn kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::AlreadyExists,
        412 => ErrorKind::PreconditionFailed,
        503 => ErrorKind::Unavailable,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::AlreadyExists => 4,
        ErrorKind::PreconditionFailed => 5,
        ErrorKind::Permission => 6,
        ErrorKind::Unavailable => 7,
        ErrorKind::Io => 8,
    }
}
