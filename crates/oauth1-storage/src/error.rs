//! Storage error types shared by all backends.

type Source = Box<dyn std::error::Error + Send + Sync>;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Record with the same key already exists (for create operations).
    AlreadyExists,
    /// Backend cannot serve the request right now.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Conflicting record key, for [`StorageErrorKind::AlreadyExists`].
    pub key: Option<String>,
    /// Backend identifier (e.g., "Memory").
    pub backend: Option<&'static str>,
    source: Option<Source>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            key: None,
            backend: None,
            source: None,
        }
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Create an already-exists error for `key`.
    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(StorageErrorKind::AlreadyExists)
        }
    }

    /// Create an unavailable error caused by `source`.
    #[must_use]
    pub fn unavailable(source: impl Into<Source>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(StorageErrorKind::Unavailable)
        }
    }

    /// Whether the error is a duplicate-key conflict.
    pub fn is_already_exists(&self) -> bool {
        self.kind == StorageErrorKind::AlreadyExists
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: source (key: abc)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
