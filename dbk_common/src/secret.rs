use std::{
    env,
    fmt,
    fmt::{Debug, Display},
};

/// Wraps a value that must never show up in logs or debug output, such as a gateway server key or the JWT secret.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// Reads a secret from the environment. Unset and blank variables both give `None`.
    pub fn from_env(name: &str) -> Option<Self> {
        env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).map(Self::new)
    }

    /// True when no secret has been provided.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
