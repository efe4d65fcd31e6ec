//! External requirements a provider's units depend on.
//!
//! A provider may declare named optional dependencies that must be loaded
//! before any of its units run. Loading goes through a [`Loader`] and happens
//! at most once per name; adding a name that has not been seen before marks
//! the set as not loaded again.
//!
//! The loader runs outside the state lock. Other threads wait for the load in
//! progress; a loader that resolves units of its own provider re-enters on the
//! loading thread and proceeds without waiting.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use normkit_model::{NormkitError, Result};
use tracing::debug;

/// Loads a named external capability.
///
/// Implementations must fail loudly rather than silently skip a name they
/// cannot provide.
pub trait Loader: Send + Sync {
    fn load(&self, name: &str) -> anyhow::Result<()>;
}

impl<F> Loader for F
where
    F: Fn(&str) -> anyhow::Result<()> + Send + Sync,
{
    fn load(&self, name: &str) -> anyhow::Result<()> {
        self(name)
    }
}

/// Loader used until a provider configures its own; rejects every name.
struct NoLoader;

impl Loader for NoLoader {
    fn load(&self, name: &str) -> anyhow::Result<()> {
        anyhow::bail!("no loader is configured to load `{name}'")
    }
}

struct RequirementState {
    names: BTreeSet<String>,
    loaded_names: BTreeSet<String>,
    loaded: bool,
    /// Thread currently running the loader.
    loading: Option<ThreadId>,
    loader: Arc<dyn Loader>,
}

/// Requirement set shared by every unit of one provider.
pub struct Requirements {
    state: Mutex<RequirementState>,
    load_finished: Condvar,
}

impl Requirements {
    pub fn new() -> Self {
        Self::with_loader(Arc::new(NoLoader))
    }

    pub fn with_loader(loader: Arc<dyn Loader>) -> Self {
        Self {
            state: Mutex::new(RequirementState {
                names: BTreeSet::new(),
                loaded_names: BTreeSet::new(),
                loaded: false,
                loading: None,
                loader,
            }),
            load_finished: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, RequirementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_loader(&self, loader: Arc<dyn Loader>) {
        self.state().loader = loader;
    }

    /// Add requirement names. Any name not already required clears the
    /// loaded flag.
    pub fn add<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state();
        for name in names {
            if state.names.insert(name.into()) {
                state.loaded = false;
            }
        }
    }

    pub fn remove<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state();
        for name in names {
            state.names.remove(name.as_ref());
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.state().names.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.state().names.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Load every required name not loaded yet, then mark the set loaded.
    ///
    /// Only one thread loads at a time; concurrent callers block until it
    /// finishes and never load the same name twice. A call made from inside
    /// the loader returns immediately. On failure the set stays unloaded and
    /// the loader's error is returned as [`NormkitError::Load`].
    pub fn ensure_loaded(&self) -> Result<()> {
        let current = thread::current().id();
        let mut state = self.state();
        loop {
            if state.loaded {
                return Ok(());
            }
            let loading = state.loading;
            match loading {
                Some(owner) if owner == current => return Ok(()),
                Some(_) => {
                    state = self
                        .load_finished
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }
        state.loading = Some(current);
        drop(state);
        let _loading = LoadingGuard(self);

        loop {
            let (name, loader) = {
                let mut state = self.state();
                let next = state.names.difference(&state.loaded_names).next().cloned();
                match next {
                    Some(name) => (name, Arc::clone(&state.loader)),
                    None => {
                        state.loaded = true;
                        break;
                    }
                }
            };
            debug!(requirement = %name, "loading requirement");
            loader.load(&name).map_err(NormkitError::Load)?;
            self.state().loaded_names.insert(name);
        }
        Ok(())
    }
}

/// Clears the loading mark and wakes waiters, also when the loader fails or
/// panics.
struct LoadingGuard<'a>(&'a Requirements);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.state().loading = None;
        self.0.load_finished.notify_all();
    }
}

impl Default for Requirements {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Requirements")
            .field("names", &state.names)
            .field("loaded", &state.loaded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader() -> (Arc<AtomicUsize>, Arc<dyn Loader>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let loader: Arc<dyn Loader> = Arc::new(move |_: &str| -> anyhow::Result<()> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (count, loader)
    }

    #[test]
    fn loads_once() {
        let (count, loader) = counting_loader();
        let requirements = Requirements::with_loader(loader);
        requirements.add(["nkf", "date"]);

        requirements.ensure_loaded().unwrap();
        requirements.ensure_loaded().unwrap();

        assert!(requirements.is_loaded());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn new_name_invalidates_loaded_state() {
        let (count, loader) = counting_loader();
        let requirements = Requirements::with_loader(loader);
        requirements.add(["nkf"]);
        requirements.ensure_loaded().unwrap();

        requirements.add(["nkf"]);
        assert!(requirements.is_loaded(), "known names keep the loaded state");

        requirements.add(["nkf", "date"]);
        assert!(!requirements.is_loaded());
        requirements.ensure_loaded().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2, "only `date` is loaded again");
    }

    #[test]
    fn default_loader_fails_loudly() {
        let requirements = Requirements::new();
        requirements.add(["missing"]);

        let err = requirements.ensure_loaded().unwrap_err();
        assert!(matches!(err, NormkitError::Load(_)));
        assert!(!requirements.is_loaded());
    }

    #[test]
    fn empty_requirements_need_no_loader() {
        let requirements = Requirements::new();
        requirements.ensure_loaded().unwrap();
        assert!(requirements.is_loaded());
    }
}
