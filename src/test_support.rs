//! In-memory Wish Service stand-in shared by unit tests.

use crate::error::{Error, Result};
use crate::types::Wish;
use crate::wish_client::WishBackend;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Unavailable,
    Timeout,
}

impl Failure {
    fn error(self) -> Error {
        match self {
            Failure::Unavailable => Error::BackendUnavailable("connection refused".to_string()),
            Failure::Timeout => Error::BackendTimeout("no response within 5ms".to_string()),
        }
    }
}

pub(crate) struct FakeWishBackend {
    wishes: Vec<Wish>,
    list_failure: Option<Failure>,
    get_failure: Option<Failure>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl FakeWishBackend {
    pub(crate) fn with_wishes(records: &[(&str, &str)]) -> Self {
        Self {
            wishes: records
                .iter()
                .map(|(id, description)| Wish {
                    id: id.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            list_failure: None,
            get_failure: None,
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// `[{id:"1",description:"a"},{id:"2",description:"b"}]`
    pub(crate) fn sample() -> Self {
        Self::with_wishes(&[("1", "a"), ("2", "b")])
    }

    pub(crate) fn failing_list(mut self, failure: Failure) -> Self {
        self.list_failure = Some(failure);
        self
    }

    pub(crate) fn failing_get(mut self, failure: Failure) -> Self {
        self.get_failure = Some(failure);
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WishBackend for FakeWishBackend {
    async fn list_wishes(&self) -> Result<Vec<Wish>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match self.list_failure {
            Some(failure) => Err(failure.error()),
            None => Ok(self.wishes.clone()),
        }
    }

    async fn get_wish(&self, id: &str) -> Result<Option<Wish>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        match self.get_failure {
            Some(failure) => Err(failure.error()),
            None => Ok(self.wishes.iter().find(|wish| wish.id == id).cloned()),
        }
    }

    fn endpoint(&self) -> &str {
        "memory://wishes"
    }
}
