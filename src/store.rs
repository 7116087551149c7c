use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiError, CatalogApi};
use crate::format::group_by_rarity;
use crate::models::{MtgCard, MtgSet};

/// Holder of the latest fetched catalog data plus loading/error flags.
///
/// Constructed explicitly with the client it fetches through; no global
/// state. Every fetch follows the same protocol: `begin_fetch` flips the
/// loading flag, clears the error, and hands out a sequence number; the
/// matching `finish_*` applies the result. A finish whose sequence is older
/// than the newest issued one is dropped, so when fetches overlap the newest
/// request wins rather than the last response to arrive.
///
/// The begin/finish halves are public because the UI shell receives its
/// results as messages; the async `fetch_*` actions compose the halves for
/// callers that can await in place.
pub struct CatalogStore {
    api: Arc<dyn CatalogApi + Send + Sync>,
    latest_set: Option<MtgSet>,
    sets: Vec<MtgSet>,
    loading: bool,
    error: Option<String>,
    seq: u64,
}

impl CatalogStore {
    pub fn new(api: Arc<dyn CatalogApi + Send + Sync>) -> Self {
        Self {
            api,
            latest_set: None,
            sets: Vec::new(),
            loading: false,
            error: None,
            seq: 0,
        }
    }

    // -- Snapshot accessors --

    pub fn latest_set(&self) -> Option<&MtgSet> {
        self.latest_set.as_ref()
    }

    pub fn sets(&self) -> &[MtgSet] {
        &self.sets
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // -- Derived views --

    pub fn has_latest_set(&self) -> bool {
        self.latest_set.is_some()
    }

    pub fn latest_set_cards(&self) -> &[MtgCard] {
        self.latest_set
            .as_ref()
            .and_then(|set| set.cards.as_deref())
            .unwrap_or(&[])
    }

    pub fn sets_count(&self) -> usize {
        self.sets.len()
    }

    pub fn total_cards(&self) -> usize {
        self.latest_set_cards().len()
    }

    pub fn cards_by_rarity(&self) -> HashMap<String, Vec<MtgCard>> {
        group_by_rarity(self.latest_set_cards())
    }

    // -- Fetch protocol --

    /// Starts a fetch: loading on, error cleared, new sequence number issued.
    pub fn begin_fetch(&mut self) -> u64 {
        self.loading = true;
        self.error = None;
        self.seq += 1;
        self.seq
    }

    fn is_stale(&self, seq: u64) -> bool {
        seq < self.seq
    }

    pub fn finish_set_fetch(&mut self, seq: u64, result: Result<MtgSet, String>) {
        if self.is_stale(seq) {
            debug!("dropping stale set response (seq {} < {})", seq, self.seq);
            return;
        }
        match result {
            Ok(set) => self.latest_set = Some(set),
            Err(message) => self.error = Some(message),
        }
        self.loading = false;
    }

    pub fn finish_sets_fetch(&mut self, seq: u64, result: Result<Vec<MtgSet>, String>) {
        if self.is_stale(seq) {
            debug!("dropping stale sets response (seq {} < {})", seq, self.seq);
            return;
        }
        match result {
            Ok(sets) => self.sets = sets,
            Err(message) => self.error = Some(message),
        }
        self.loading = false;
    }

    /// Settles a cards-only fetch. The cards are handed back to the caller;
    /// only the loading and error flags live in the store.
    pub fn finish_cards_fetch(
        &mut self,
        seq: u64,
        result: Result<Vec<MtgCard>, String>,
    ) -> Vec<MtgCard> {
        if self.is_stale(seq) {
            debug!("dropping stale cards response (seq {} < {})", seq, self.seq);
            return Vec::new();
        }
        self.loading = false;
        match result {
            Ok(cards) => cards,
            Err(message) => {
                self.error = Some(message);
                Vec::new()
            }
        }
    }

    // -- Actions --

    pub async fn fetch_latest_set_with_cards(&mut self) {
        let seq = self.begin_fetch();
        let api = self.api.clone();
        let result = api
            .get_latest_set_with_cards()
            .await
            .map_err(|e| error_message(&e, "Failed to load the latest set"));
        self.finish_set_fetch(seq, result);
    }

    pub async fn fetch_all_sets(&mut self) {
        let seq = self.begin_fetch();
        let api = self.api.clone();
        let result = api
            .get_all_sets()
            .await
            .map_err(|e| error_message(&e, "Failed to load sets"));
        self.finish_sets_fetch(seq, result);
    }

    /// Loads one set, cards included, into the focused slot.
    pub async fn fetch_set_by_code(&mut self, set_code: &str) {
        let seq = self.begin_fetch();
        let api = self.api.clone();
        let result = api
            .get_set_with_cards(set_code)
            .await
            .map_err(|e| error_message(&e, &format!("Failed to load set {set_code}")));
        self.finish_set_fetch(seq, result);
    }

    /// Fetches just the cards of a set. Returns an empty list on failure,
    /// with the error captured in the store.
    pub async fn fetch_cards_from_set(&mut self, set_code: &str) -> Vec<MtgCard> {
        let seq = self.begin_fetch();
        let api = self.api.clone();
        let result = api.get_cards_from_set(set_code).await.map_err(|e| {
            error_message(&e, &format!("Failed to load cards for set {set_code}"))
        });
        self.finish_cards_fetch(seq, result)
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Back to the initial empty snapshot.
    pub fn reset(&mut self) {
        self.latest_set = None;
        self.sets = Vec::new();
        self.loading = false;
        self.error = None;
    }
}

/// Human-readable message for a failed request: the server's own message if
/// the envelope carried one, else the error's display form, else a fallback.
pub fn error_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Server(message) if !message.is_empty() => message.clone(),
        other => {
            let text = other.to_string();
            if text.is_empty() {
                fallback.to_owned()
            } else {
                text
            }
        }
    }
}
