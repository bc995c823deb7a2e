/// Load state of a collection that is read from the store on first use.
///
/// `Loaded` with an empty collection is a real answer ("the store has
/// nothing"), distinct from `Unloaded` ("nobody has asked yet").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cache<C> {
    Unloaded,
    Loaded(C),
}

impl<C> Cache<C> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn get(&self) -> Option<&C> {
        match self {
            Self::Loaded(c) => Some(c),
            Self::Unloaded => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut C> {
        match self {
            Self::Loaded(c) => Some(c),
            Self::Unloaded => None,
        }
    }

    /// Swap in a freshly loaded collection wholesale.
    pub fn replace(&mut self, contents: C) {
        *self = Self::Loaded(contents);
    }

    /// Forget the cached contents; the next access reloads.
    pub fn invalidate(&mut self) {
        *self = Self::Unloaded;
    }

    /// Return the cached contents, running `load` first if nothing is cached.
    /// A failed load leaves the cache `Unloaded`.
    pub fn get_or_try_load<E>(
        &mut self,
        load: impl FnOnce() -> Result<C, E>,
    ) -> Result<&mut C, E> {
        if let Self::Unloaded = self {
            *self = Self::Loaded(load()?);
        }
        match self {
            Self::Loaded(c) => Ok(c),
            Self::Unloaded => unreachable!("cache filled above"),
        }
    }
}

impl<C> Default for Cache<C> {
    fn default() -> Self {
        Self::Unloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_empty_is_not_unloaded() {
        let mut cache: Cache<Vec<u8>> = Cache::default();
        assert!(!cache.is_loaded());
        assert_eq!(cache.get(), None);

        cache.replace(Vec::new());
        assert!(cache.is_loaded());
        assert_eq!(cache.get(), Some(&Vec::new()));

        cache.invalidate();
        assert!(!cache.is_loaded());
    }

    #[test]
    fn loader_runs_once() {
        let mut cache: Cache<Vec<u8>> = Cache::Unloaded;
        let mut calls = 0;
        cache
            .get_or_try_load(|| {
                calls += 1;
                Ok::<_, ()>(vec![1])
            })
            .unwrap()
            .push(2);
        let contents = cache
            .get_or_try_load(|| {
                calls += 1;
                Ok::<_, ()>(vec![])
            })
            .unwrap();
        assert_eq!(contents, &vec![1, 2]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_load_stays_unloaded() {
        let mut cache: Cache<Vec<u8>> = Cache::Unloaded;
        assert_eq!(cache.get_or_try_load(|| Err("down")), Err("down"));
        assert!(!cache.is_loaded());
    }
}
