use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A build error: one or more details, each with key/value context, optionally
/// chained behind the error that caused it.
#[derive(Debug)]
pub struct Error {
    detail: Vec<Box<dyn ErrorDetail>>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Places `self` behind `other`: `other` becomes the outermost error and
    /// `self` is reported as its cause.
    pub fn chain(self, mut other: Error) -> Self {
        fn _chain(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => _chain(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        _chain(self, &mut other);
        other
    }

    /// The outermost message.
    pub fn message(&self) -> String {
        self.detail.first().map(|d| d.to_string()).unwrap_or_default()
    }

    /// The value of the first context entry named `key`, searching this error
    /// and then every error behind it.
    pub fn context_value(&self, key: &str) -> Option<String> {
        let mut error = Some(self);
        while let Some(e) = error {
            let found = e.detail.iter()
                .flat_map(|d| d.context())
                .find(|(k, _)| k.as_deref() == Some(key))
                .map(|(_, v)| v);

            if found.is_some() {
                return found;
            }

            error = e.prev.as_deref();
        }

        None
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut ctxt = vec![];
        let mut error = self.source();
        while let Some(e) = error {
            ctxt.push((None, e.to_string()));
            error = e.source();
        }

        ctxt
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),+ $(,)?) => {
        $(
            impl $crate::error::ErrorDetail for $T {
                fn context(&self) -> Vec<(Option<String>, String)> {
                    let error: &(dyn std::error::Error + Send + Sync) = self;
                    error.context()
                }
            }
        )+
    }
}

impl_error_detail_with_std_error! {
    io::Error,
    std::string::FromUtf8Error,
    std::path::StripPrefixError,
    toml::de::Error,
    toml::ser::Error,
    serde_json::Error,
    jwalk::Error,
    notify::Error,
    minijinja::Error,
    chrono::ParseError,
}

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            prev: None,
            detail: vec![Box::new(detail)],
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Copy, Clone)] struct Indent(usize);

        impl fmt::Display for Indent {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for _ in 0..(self.0 * 4) { write!(f, " ")? }
                Ok(())
            }
        }

        struct NestedError<'a>(Indent, &'a Error);

        impl fmt::Display for NestedError<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let NestedError(indent, e) = self;
                let indent_line = format!("\n{indent}");

                for detail in &e.detail {
                    writeln!(f, "{indent}{}", format!("{:#}", detail).replace('\n', &indent_line))?;
                    for (key, value) in detail.context() {
                        let value = value.replace('\n', &indent_line);
                        match key {
                            Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                            None => writeln!(f, "{indent}{value}")?,
                        }
                    }

                    if std::env::var_os("RUST_BACKTRACE").is_some() {
                        writeln!(f, "{indent}[{}]", e.location)?;
                    }
                }

                if let Some(prev) = &e.prev {
                    NestedError(Indent(indent.0 + 1), prev).fmt(f)?;
                }

                Ok(())
            }
        }

        NestedError(Indent(0), self).fmt(f)
    }
}

/// An ad-hoc error detail built by [`error!`](crate::error!).
#[derive(Debug)]
pub struct Message {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for Message {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::Message {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

pub trait Chainable<T> {
    /// On error, wraps the error behind `other`.
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(other.into()))
        }
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(f().into()))
        }
    }
}
