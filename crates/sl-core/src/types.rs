use rand::RngCore;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ── Session id ──

/// Number of random bytes behind a session id.
pub const SESSION_ID_BYTES: usize = 16;

/// Length of the hex rendering of a session id.
pub const SESSION_ID_LEN: usize = SESSION_ID_BYTES * 2;

/// A 128-bit session identifier rendered as 32 lowercase hex digits.
///
/// The only ways to obtain one are [`SessionId::parse`], which rejects
/// anything that is not exactly that shape, and [`SessionId::random`]. Code
/// holding a `SessionId` can therefore splice it into file names and cache
/// keys without further checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == SESSION_ID_LEN
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_string()))
    }

    /// Draw a fresh id from the thread-local CSPRNG.
    ///
    /// No collision check happens here; see `IdGenerator` in `sl-store` for
    /// the checked variant.
    pub fn random() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid session id: {s:?}"))
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Key layout ──

/// Physical key convention of a backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// `sess_<ns>_<id>` with a `.lock` companion (directory entries).
    Files,
    /// `sess-<ns>-<id>` with a `-lock` companion (cache servers).
    Cache,
}

impl KeyStyle {
    fn separator(self) -> char {
        match self {
            Self::Files => '_',
            Self::Cache => '-',
        }
    }

    fn lock_suffix(self) -> &'static str {
        match self {
            Self::Files => ".lock",
            Self::Cache => "-lock",
        }
    }
}

impl fmt::Display for KeyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Files => "files",
            Self::Cache => "cache",
        };
        write!(f, "{s}")
    }
}

/// Maps session ids to entry and lock keys inside one namespace.
///
/// Entry keys and lock keys never overlap: a lock key is always an entry key
/// plus a suffix that cannot occur in a session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    style: KeyStyle,
    namespace: String,
    prefix: String,
}

impl KeyLayout {
    pub fn new(style: KeyStyle, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let sep = style.separator();
        let prefix = if namespace.is_empty() {
            format!("sess{sep}")
        } else {
            format!("sess{sep}{namespace}{sep}")
        };
        Self {
            style,
            namespace,
            prefix,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Common prefix of every entry key in this namespace.
    pub fn entry_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entry_key(&self, id: &SessionId) -> String {
        format!("{}{}", self.prefix, id)
    }

    pub fn lock_key(&self, id: &SessionId) -> String {
        format!("{}{}{}", self.prefix, id, self.style.lock_suffix())
    }

    /// Recover the session id from an entry key of this namespace.
    ///
    /// Returns `None` for lock keys, for keys of other namespaces that happen
    /// to share the prefix, and for anything else that is not exactly
    /// `prefix + id`.
    pub fn parse_entry_key(&self, key: &str) -> Option<SessionId> {
        key.strip_prefix(self.prefix.as_str())
            .and_then(SessionId::parse)
    }

    pub fn is_lock_key(&self, key: &str) -> bool {
        key.starts_with(self.prefix.as_str()) && key.ends_with(self.style.lock_suffix())
    }
}
