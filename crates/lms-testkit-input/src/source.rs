//! Request-data categories.

use std::fmt;

/// One of the five categorized request-data maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Query string parameters.
    Get,
    /// Parsed form body.
    Post,
    /// Server and header metadata.
    Server,
    /// Process environment.
    Env,
    /// Cookie jar.
    Cookie,
}

impl InputSource {
    /// Every source, in the host's numeric order.
    pub const ALL: [Self; 5] = [Self::Post, Self::Get, Self::Cookie, Self::Env, Self::Server];

    /// Legacy numeric code for the form body.
    pub const INPUT_POST: i32 = 0;
    /// Legacy numeric code for the query string.
    pub const INPUT_GET: i32 = 1;
    /// Legacy numeric code for cookies.
    pub const INPUT_COOKIE: i32 = 2;
    /// Legacy numeric code for the environment.
    pub const INPUT_ENV: i32 = 4;
    /// Legacy numeric code for server metadata.
    pub const INPUT_SERVER: i32 = 5;

    /// Maps a legacy numeric source code. Unknown codes have no source.
    ///
    /// # Example
    ///
    /// ```
    /// use lms_testkit_input::InputSource;
    ///
    /// assert_eq!(InputSource::from_code(1), Some(InputSource::Get));
    /// assert_eq!(InputSource::from_code(3), None);
    /// ```
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::INPUT_POST => Some(Self::Post),
            Self::INPUT_GET => Some(Self::Get),
            Self::INPUT_COOKIE => Some(Self::Cookie),
            Self::INPUT_ENV => Some(Self::Env),
            Self::INPUT_SERVER => Some(Self::Server),
            _ => None,
        }
    }

    /// Returns the legacy numeric code.
    pub fn code(self) -> i32 {
        match self {
            Self::Post => Self::INPUT_POST,
            Self::Get => Self::INPUT_GET,
            Self::Cookie => Self::INPUT_COOKIE,
            Self::Env => Self::INPUT_ENV,
            Self::Server => Self::INPUT_SERVER,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Server => write!(f, "server"),
            Self::Env => write!(f, "env"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}
