
use std::error::Error;
use std::fmt::{self, Display, Debug};

/// Describes one family of failures carried by [`GenericError`].
pub trait ErrorDescription {
    fn description(&self) -> impl Display;

    /// HTTP status reported by the engine, when there is one.
    fn code(&self) -> Option<u16> {
        None
    }

    fn error_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

pub struct GenericError<T>(pub T) where T: ErrorDescription;

impl<T> GenericError<T>
where
    T: ErrorDescription,
{
    pub const fn new(err: T) -> Self {
        Self(err)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_inner(&self) -> &T {
        &self.0
    }

    pub fn error_name(&self) -> &'static str {
        self.0.error_name()
    }

    pub fn code(&self) -> Option<u16> {
        self.0.code()
    }
}

impl<T> Debug for GenericError<T>
where
    T: ErrorDescription,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(code) = self.0.code() {
            write!(f, "GenericError({}): {} ({})", self.error_name(), self.0.description(), code)
        } else {
            write!(f, "GenericError({}): {}", self.error_name(), self.0.description())
        }
    }
}

impl<T> Display for GenericError<T>
where
    T: ErrorDescription,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.description())
    }
}

impl<T> Error for GenericError<T>
where
    T: ErrorDescription,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl<T> From<T> for GenericError<T>
where
    T: ErrorDescription,
{
    fn from(err: T) -> Self {
        Self::new(err)
    }
}

/// Everything that can go wrong while talking to the engine or preparing a request.
#[derive(Debug)]
#[non_exhaustive]
pub enum NodeErrorDescription {
    /// The engine answered with a non-success status.
    Engine {
        status: u16,
        message: String,
    },
    /// The request never produced a usable response.
    Transport {
        message: String,
        source: reqwest::Error,
    },
    /// A success response whose body was not the expected JSON.
    Decode {
        message: String,
        source: serde_json::Error,
    },
    /// Rejected before any network call.
    Validation(String),
    Config(String),
}

impl ErrorDescription for NodeErrorDescription {
    fn description(&self) -> impl Display {
        match self {
            Self::Engine { status, message } => format!("HTTP {}: {}", status, message),
            Self::Transport { message, source } => format!("{}: {}", message, source),
            Self::Decode { message, source } => format!("{}: {}", message, source),
            Self::Validation(message) => message.clone(),
            Self::Config(message) => message.clone(),
        }
    }

    fn code(&self) -> Option<u16> {
        match self {
            Self::Engine { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn error_name(&self) -> &'static str {
        match self {
            Self::Engine { .. } => "EngineError",
            Self::Transport { .. } => "TransportError",
            Self::Decode { .. } => "DecodeError",
            Self::Validation(_) => "ValidationError",
            Self::Config(_) => "ConfigError",
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type NodeError = GenericError<NodeErrorDescription>;

pub type Result<T, E = NodeError> = std::result::Result<T, E>;

impl GenericError<NodeErrorDescription> {
    pub fn engine(status: u16, message: impl Into<String>) -> Self {
        Self::new(NodeErrorDescription::Engine { status, message: message.into() })
    }

    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::new(NodeErrorDescription::Transport { message: message.into(), source })
    }

    pub fn decode(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::new(NodeErrorDescription::Decode { message: message.into(), source })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(NodeErrorDescription::Validation(message.into()))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(NodeErrorDescription::Config(message.into()))
    }

    /// HTTP status of an engine rejection.
    pub fn status(&self) -> Option<u16> {
        self.code()
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.0, NodeErrorDescription::Validation(_))
    }

    pub fn is_engine(&self) -> bool {
        matches!(self.0, NodeErrorDescription::Engine { .. })
    }
}
