//! Random identifier allocation with collision checking.

use std::future::Future;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Default number of candidates drawn before giving up.
///
/// With 122 random bits per candidate, even one collision is practically
/// impossible; several in a row mean the random source is broken.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Draw a fresh random identifier in the canonical hyphenated UUID form.
pub fn random_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Whether `id` is in the canonical form produced by [`random_id`].
pub fn is_well_formed(id: &str) -> bool {
    Uuid::try_parse(id)
        .map(|u| u.get_version_num() == 4 && u.hyphenated().to_string() == id)
        .unwrap_or(false)
}

/// Produces identifiers that are not yet used in the collection.
#[derive(Debug, Clone, Copy)]
pub struct IdAllocator {
    max_attempts: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl IdAllocator {
    /// Create an allocator drawing at most `max_attempts` candidates (at least 1).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw candidates until `is_used` reports one as free.
    ///
    /// Every attempt draws a new candidate; a rejected one is never retried.
    /// Fails with `AllocationExhausted` after `max_attempts` used candidates.
    pub fn allocate(&self, mut is_used: impl FnMut(&str) -> bool) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = random_id();
            if !is_used(&candidate) {
                return Ok(candidate);
            }
            log::warn!(
                "Identifier collision on attempt {}/{}: {}",
                attempt,
                self.max_attempts,
                candidate
            );
        }
        Err(Error::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Same as [`allocate`](Self::allocate) with a fallible, asynchronous check.
    ///
    /// A failing check aborts allocation with its error; no candidate is
    /// returned unless the check confirmed it as unused.
    pub async fn allocate_async<F, Fut>(&self, mut is_used: F) -> Result<String>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = random_id();
            if !is_used(candidate.clone()).await? {
                return Ok(candidate);
            }
            log::warn!(
                "Identifier collision on attempt {}/{}: {}",
                attempt,
                self.max_attempts,
                candidate
            );
        }
        Err(Error::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}
