use std::{fmt::Display, panic::Location};

use anyhow::Context;

pub mod prelude {
    extern crate anyhow;
    pub use anyhow::{anyhow, bail, Context, Result};

    extern crate thiserror;
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
}

/// Format the `[file:line:col]` tag of a tracked caller.
fn locate(caller: &Location) -> String {
    format!("[{}:{}:{}]", caller.file(), caller.line(), caller.column())
}

/// Attach a context message, prefixed with the location of the caller, to a fallible value.
///
/// Implemented for both `Result<T, E>` and `Option<T>`, so that a missing pedigree entry
/// and a failed file read bubble up with the same kind of traceback.
pub trait LocatedError<T, E> {
    /// Wrap the error value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Same as `loc()`, but the context is only evaluated once an error does occur.
    fn with_loc<C, F>(self, f: F) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T, E> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {context}", locate(caller)))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {}", locate(caller), f()))
    }
}

pub trait LocatedOption<T> {
    /// Convert a `None` into an error carrying the context + the location at which it was called.
    fn loc<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Lazily evaluated version of `loc()`
    fn with_loc<C, F>(self, f: F) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {context}", locate(caller)))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {}", locate(caller), f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;
    use std::collections::HashMap;

    #[derive(Error, Debug)]
    enum LookupError {
        #[error("Individual {0} is not part of the pedigree")]
        Missing(String),
    }

    fn lookup(registry: &HashMap<&str, u32>, id: &str) -> Result<u32, LookupError> {
        registry.get(id).copied().ok_or_else(|| LookupError::Missing(id.to_string()))
    }

    fn lookup_located(registry: &HashMap<&str, u32>, id: &str) -> anyhow::Result<u32> {
        lookup(registry, id).with_loc(|| format!("While searching for {id}"))
    }

    #[test]
    fn context_carries_location() {
        let registry = HashMap::from([("A", 1)]);
        let err = lookup_located(&registry, "B").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with(&format!("[{}:", file!())), "{msg}");
        assert!(msg.ends_with("While searching for B"), "{msg}");
    }

    #[test]
    fn inner_error_stays_downcastable() {
        let registry = HashMap::from([("A", 1)]);
        let err = lookup_located(&registry, "B").unwrap_err();
        let inner = err.downcast_ref::<LookupError>();
        assert!(matches!(inner, Some(LookupError::Missing(id)) if id == "B"));
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn ok_values_pass_through() -> anyhow::Result<()> {
        let registry = HashMap::from([("A", 1)]);
        assert_eq!(lookup_located(&registry, "A")?, 1);
        assert_eq!(Some(7).loc("unused")?, 7);
        Ok(())
    }

    #[test]
    fn missing_option_is_an_error() {
        let none: Option<u8> = None;
        let err = none.with_loc(|| "Missing region code").unwrap_err();
        assert!(err.to_string().ends_with("Missing region code"));
    }
}
