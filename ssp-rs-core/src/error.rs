use core::{error, fmt};

/// Errors raised whilst running ssp-rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument parsed into function were invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Two or more optional arguments passed into functions conflict.
    ConflictArg {
        /// Explaining what arg is invalid.
        reason: String,
    },
    /// Execution was attempted with a violated kernel invariant.
    ExecInvariantViolation {
        /// Why execution could not proceed.
        reason: String,
    },
    /// A channel requested by name is not part of the measurement info.
    MissingChannel {
        /// The requested channel name.
        name: String,
    },
    /// The FFT convolution could not be carried out.
    Conv {
        /// Why the convolution failed.
        reason: String,
    },
    /// A decomposition did not produce usable factors.
    Linalg {
        /// Why the decomposition failed.
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidArg`].
    pub fn invalid_arg(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArg {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::ConflictArg { reason } => write!(f, "Conflicting arguments: {reason}"),
            Error::ExecInvariantViolation { reason } => {
                write!(f, "Execution invariant violation: {reason}")
            }
            Error::MissingChannel { name } => {
                write!(f, "Channel `{name}` not found in measurement info")
            }
            Error::Conv { reason } => write!(f, "Convolution failed: {reason}"),
            Error::Linalg { reason } => write!(f, "Decomposition failed: {reason}"),
        }
    }
}

impl error::Error for Error {}

/// Result alias over [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_argument() {
        let err = Error::invalid_arg("tmax", "must be larger than tmin");
        assert_eq!(
            err.to_string(),
            "Invalid argument `tmax`: must be larger than tmin"
        );
        let err = Error::MissingChannel {
            name: "MEG 1531".into(),
        };
        assert_eq!(
            err.to_string(),
            "Channel `MEG 1531` not found in measurement info"
        );
    }
}
