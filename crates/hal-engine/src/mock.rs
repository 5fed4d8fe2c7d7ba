//! # Mock Fetcher & Testing Guide
//!
//! The [`MockFetcher`] implements the same [`Fetcher`] API as a production
//! transport but operates entirely in-memory, so client proxy logic can be
//! tested deterministically without any network.
//!
//! Two styles are supported and can be mixed:
//!
//! - **Expectations**: `expect_fetch(uri).return_doc(..)` /
//!   `.return_err(..)` queue one-shot responses consumed in order;
//!   [`verify`](MockFetcher::verify) asserts the queue was drained.
//! - **Routes**: [`mount`](MockFetcher::mount) serves a document for a URI
//!   any number of times, which suits round-trip tests that only care about
//!   content.
//!
//! Every fetch is counted per URI ([`fetch_count`](MockFetcher::fetch_count)),
//! which is how tests assert the proxy's exactly-one-fetch guarantee and the
//! no-fetch-when-embedded guarantee.
//!
//! A fetch with no matching expectation or route panics: an unexpected
//! network call in a test is a bug worth failing loudly on.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::Fetcher;
use crate::document::HalDocument;
use crate::error::TransportError;

struct Expectation {
    uri: String,
    response: Result<HalDocument, TransportError>,
}

/// In-memory [`Fetcher`] with expectation tracking and fetch counting.
#[derive(Default)]
pub struct MockFetcher {
    expectations: Mutex<VecDeque<Expectation>>,
    routes: Mutex<HashMap<String, HalDocument>>,
    counts: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an expectation for the next unmatched fetch.
    pub fn expect_fetch(&self, uri: impl Into<String>) -> FetchExpectationBuilder<'_> {
        FetchExpectationBuilder {
            uri: uri.into(),
            mock: self,
        }
    }

    /// Serves `document` for `uri`, any number of times.
    pub fn mount(&self, uri: impl Into<String>, document: HalDocument) {
        self.routes.lock().unwrap().insert(uri.into(), document);
    }

    /// How many times `uri` has been fetched.
    pub fn fetch_count(&self, uri: &str) -> usize {
        self.counts.lock().unwrap().get(uri).copied().unwrap_or(0)
    }

    /// Total fetches across all URIs.
    pub fn total_fetches(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    /// Panics unless every queued expectation was consumed.
    pub fn verify(&self) {
        let expectations = self.expectations.lock().unwrap();
        if !expectations.is_empty() {
            panic!(
                "not all fetch expectations were met, {} remaining",
                expectations.len()
            );
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, uri: &str) -> Result<HalDocument, TransportError> {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(uri.to_string())
            .or_insert(0) += 1;

        if let Some(expectation) = self.expectations.lock().unwrap().pop_front() {
            if expectation.uri != uri {
                panic!(
                    "fetch mismatch: expected `{}`, got `{}`",
                    expectation.uri, uri
                );
            }
            return expectation.response;
        }
        if let Some(document) = self.routes.lock().unwrap().get(uri) {
            return Ok(document.clone());
        }
        panic!("unexpected fetch for `{uri}`");
    }
}

/// Builder for one fetch expectation.
pub struct FetchExpectationBuilder<'a> {
    uri: String,
    mock: &'a MockFetcher,
}

impl FetchExpectationBuilder<'_> {
    /// Completes the expectation with a successful document.
    pub fn return_doc(self, document: HalDocument) {
        self.mock.expectations.lock().unwrap().push_back(Expectation {
            uri: self.uri,
            response: Ok(document),
        });
    }

    /// Completes the expectation with a transport failure.
    pub fn return_err(self, error: TransportError) {
        self.mock.expectations.lock().unwrap().push_back(Expectation {
            uri: self.uri,
            response: Err(error),
        });
    }
}
