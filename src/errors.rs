use snafu::Snafu;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// `nom` result type, specialized to our error.
pub type IResult<I, O, E = Error> = nom::IResult<I, O, E>;

/// Error types surfaced by this crate.
///
/// The first group is the closed taxonomy reported to callers of the
/// high-level operations; the remaining variants are parse and IO plumbing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// Structural parse failure, or a message without usable content.
    #[snafu(display("invalid message: {message}"))]
    InvalidMessage { message: String },
    /// A signature is present but does not verify, or the issuer key is missing.
    #[snafu(display("invalid signature"))]
    InvalidSignature,
    /// Verification was requested, but the message carries no signature.
    #[snafu(display("message is not signed"))]
    NotSigned,
    /// A locked secret key was needed and no passphrase was supplied.
    #[snafu(display("passphrase required to unlock secret key"))]
    PassphraseRequired,
    /// The supplied passphrase failed the secret key integrity check.
    #[snafu(display("incorrect passphrase"))]
    PassphraseIncorrect,
    /// MDC mismatch on an integrity protected data packet. Fatal, no
    /// plaintext is released.
    #[snafu(display("integrity check failed"))]
    IntegrityCheckFailed,
    /// The primitive layer does not provide the requested algorithm.
    #[snafu(display("crypto primitive unavailable: {message}"))]
    CryptoUnavailable { message: String },
    /// The primitive layer rejected the operation.
    #[snafu(display("crypto operation failed: {message}"))]
    CryptoFailure { message: String },
    /// Packet versions and parameters we don't support, but can safely skip.
    #[snafu(display("unsupported: {message}"))]
    Unsupported { message: String },
    /// Catch all.
    #[snafu(display("{message}"))]
    Message { message: String },

    #[snafu(display("IO error: {source}"), context(false))]
    IO { source: std::io::Error },
    #[snafu(display("invalid packet {kind:?}"))]
    PacketParsing { kind: nom::error::ErrorKind },
    #[snafu(display("packet is incomplete, needs {needed:?}"))]
    PacketIncomplete { needed: nom::Needed },
    #[snafu(display("invalid packet content: {source:?}"))]
    InvalidPacketContent { source: Box<Error> },
    #[snafu(display("invalid utf-8: {source}"), context(false))]
    Utf8 { source: std::str::Utf8Error },
}

impl Error {
    /// True for errors that mark data we can skip over, rather than data that
    /// is actively broken.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}

impl<I> nom::error::ParseError<I> for Error {
    fn from_error_kind(_input: I, kind: nom::error::ErrorKind) -> Self {
        Error::PacketParsing { kind }
    }

    fn append(_input: I, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl<I> nom::error::FromExternalError<I, Error> for Error {
    fn from_external_error(_input: I, _kind: nom::error::ErrorKind, e: Error) -> Self {
        e
    }
}

impl From<nom::Err<Error>> for Error {
    fn from(err: nom::Err<Error>) -> Error {
        match err {
            nom::Err::Incomplete(needed) => Error::PacketIncomplete { needed },
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
        }
    }
}

impl From<Error> for nom::Err<Error> {
    fn from(err: Error) -> nom::Err<Error> {
        match err {
            Error::PacketIncomplete { needed } => nom::Err::Incomplete(needed),
            e => nom::Err::Error(e),
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Error {
        Error::Message { message }
    }
}

impl From<rsa::errors::Error> for Error {
    fn from(err: rsa::errors::Error) -> Error {
        Error::CryptoFailure {
            message: err.to_string(),
        }
    }
}

impl From<signature::Error> for Error {
    fn from(err: signature::Error) -> Error {
        Error::CryptoFailure {
            message: err.to_string(),
        }
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::CryptoFailure {
            message: "invalid key or iv length".to_string(),
        }
    }
}

#[macro_export]
macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            bail!($fmt, $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr,) => ({
        ensure_eq!($left, $right)
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}

#[macro_export]
macro_rules! err_opt {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => return Some(Err(err)),
        }
    };
}
