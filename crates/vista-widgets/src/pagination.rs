#![forbid(unsafe_code)]

//! End-of-list detection and load bookkeeping.
//!
//! [`PaginationTrigger`] is a two-state machine:
//!
//! ```text
//! Idle --evaluate(near end, has_more)--> Loading
//! Loading --complete(Ok)--> Idle   (page appended, has_more updated)
//! Loading --complete(Err)--> Idle  (error returned, catalog untouched)
//! ```
//!
//! `is_loading` flips to `true` inside [`PaginationTrigger::evaluate`], before
//! the caller starts any fetch, so a burst of scroll events yields exactly one
//! [`LoadRequest`].
//!
//! Every request carries a [`LoadTicket`] stamped with the current
//! generation. [`PaginationTrigger::invalidate`] bumps the generation (catalog
//! replaced, view unmounted); a result for an older ticket is discarded
//! instead of being appended to the wrong catalog.
//!
//! After a failure the trigger stays quiet until [`PaginationTrigger::retry`]
//! or an invalidation, so a failing backend never turns scrolling into a
//! retry loop.
//!
//! A page that appends nothing while still claiming `has_more` stalls the
//! trigger: the pass that applies it cannot issue the same request again.
//! The next host event ([`PaginationTrigger::resume`]), a retry or an
//! invalidation releases it.

use std::fmt;

use vista_core::Keyed;
use vista_layout::LayoutPlan;
use vista_layout::window::VisibleRange;

use crate::catalog::Catalog;

/// Loading flags shared with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadState {
    /// The backend reported more items.
    pub has_more: bool,
    /// A request is in flight.
    pub is_loading: bool,
}

impl LoadState {
    /// No request in flight.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.is_loading
    }
}

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadTicket {
    generation: u64,
    sequence: u64,
}

impl LoadTicket {
    /// Catalog generation the request was issued against.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    /// Per-trigger request counter.
    #[inline]
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}#{}", self.generation, self.sequence)
    }
}

/// What the host should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRequest {
    /// Hand this back with the result.
    pub ticket: LoadTicket,
    /// Catalog length when the request was issued; the next page starts here.
    pub offset: usize,
}

/// One page returned by the host's loader.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    /// Records in display order. May overlap the catalog's tail.
    pub items: Vec<T>,
    /// Whether another page exists after this one.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A page with more to come.
    #[must_use]
    pub fn more(items: Vec<T>) -> Self {
        Self {
            items,
            has_more: true,
        }
    }

    /// The final page.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_more: false,
        }
    }
}

/// How close the rendered window is to the end of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndProximity {
    /// Measured viewport, empty catalog.
    Empty,
    /// Last row materialized (overscan included) and the total row count.
    Rows {
        last_rendered_row: usize,
        total_rows: usize,
    },
}

impl EndProximity {
    /// Derive proximity from a window pass. `None` when there is nothing to
    /// judge yet (unmeasured viewport or zero row extent).
    #[must_use]
    pub fn from_window(range: Option<&VisibleRange>, layout: &LayoutPlan) -> Option<Self> {
        if layout.is_empty() {
            return Some(Self::Empty);
        }
        range.map(|range| Self::Rows {
            last_rendered_row: range.last_row,
            total_rows: layout.total_rows,
        })
    }

    /// Within `threshold_rows` of the last row.
    #[must_use]
    pub fn is_near_end(&self, threshold_rows: usize) -> bool {
        match *self {
            Self::Empty => true,
            Self::Rows {
                last_rendered_row,
                total_rows,
            } => last_rendered_row.saturating_add(threshold_rows) >= total_rows.saturating_sub(1),
        }
    }
}

/// Why a result was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Issued before the catalog was replaced or the view unmounted.
    Superseded,
    /// Same generation but not the request currently in flight.
    NotInFlight,
}

/// What [`PaginationTrigger::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Items were appended.
    Applied {
        appended: usize,
        duplicates: usize,
        has_more: bool,
    },
    /// The result was stale and ignored. Applies to errors too.
    Discarded {
        ticket: LoadTicket,
        reason: DiscardReason,
    },
}

impl LoadOutcome {
    /// Whether the catalog changed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// A load failed. The catalog was not touched.
#[derive(Debug)]
pub enum LoadError<E> {
    /// The host's loader reported an error.
    Fetch { ticket: LoadTicket, source: E },
}

impl<E> LoadError<E> {
    /// Ticket of the failed request.
    #[must_use]
    pub fn ticket(&self) -> LoadTicket {
        match self {
            Self::Fetch { ticket, .. } => *ticket,
        }
    }

    /// Unwrap the loader's error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Fetch { source, .. } => source,
        }
    }
}

impl<E: fmt::Display> fmt::Display for LoadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch { ticket, source } => write!(f, "page load {ticket} failed: {source}"),
        }
    }
}

impl<E> std::error::Error for LoadError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source),
        }
    }
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaginationStats {
    /// Requests issued.
    pub requested: u64,
    /// Successful results applied, empty pages included.
    pub applied: u64,
    /// Failed or abandoned requests.
    pub failed: u64,
    /// Stale results ignored.
    pub discarded: u64,
    /// Applied pages that added no new identifier.
    pub stalled: u64,
}

/// Issues at most one [`LoadRequest`] at a time.
#[derive(Debug, Clone)]
pub struct PaginationTrigger {
    threshold_rows: usize,
    state: LoadState,
    generation: u64,
    sequence: u64,
    in_flight: Option<LoadTicket>,
    failed: bool,
    stalled: bool,
    stats: PaginationStats,
}

impl PaginationTrigger {
    /// Create an idle trigger.
    #[must_use]
    pub fn new(threshold_rows: usize, has_more: bool) -> Self {
        Self {
            threshold_rows,
            state: LoadState {
                has_more,
                is_loading: false,
            },
            generation: 0,
            sequence: 0,
            in_flight: None,
            failed: false,
            stalled: false,
            stats: PaginationStats::default(),
        }
    }

    /// Current flags.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Current generation.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticket of the request in flight.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> Option<LoadTicket> {
        self.in_flight
    }

    /// Whether the last load failed and no retry was requested yet.
    #[inline]
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Whether the last page added nothing and no host event followed yet.
    #[inline]
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Rows from the end at which a request is issued.
    #[inline]
    #[must_use]
    pub fn threshold_rows(&self) -> usize {
        self.threshold_rows
    }

    /// Change the trigger distance. Takes effect on the next evaluation.
    pub fn set_threshold_rows(&mut self, rows: usize) {
        self.threshold_rows = rows;
    }

    /// Override `has_more`, e.g. when the host learns the total count.
    pub fn set_has_more(&mut self, has_more: bool) {
        self.state.has_more = has_more;
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PaginationStats {
        self.stats
    }

    /// Decide whether to request the next page.
    ///
    /// Returns a request only when the window is near the end, more items
    /// exist and nothing is in flight. A pending failure or a stall holds
    /// the trigger.
    pub fn evaluate(&mut self, proximity: EndProximity, catalog_len: usize) -> Option<LoadRequest> {
        if !self.state.has_more || self.state.is_loading || self.failed || self.stalled {
            return None;
        }
        if !proximity.is_near_end(self.threshold_rows) {
            return None;
        }

        self.sequence += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            sequence: self.sequence,
        };
        self.state.is_loading = true;
        self.in_flight = Some(ticket);
        self.stats.requested += 1;

        vista_core::debug!(
            message = "pagination_trigger",
            ticket = %ticket,
            offset = catalog_len,
            ?proximity
        );
        Some(LoadRequest {
            ticket,
            offset: catalog_len,
        })
    }

    /// Apply the result of a request.
    ///
    /// A result for any ticket other than the one in flight is discarded
    /// and reported as `Ok(LoadOutcome::Discarded)`, whether it succeeded or
    /// not. For the current ticket, success appends the page with identifier
    /// deduplication and failure returns [`LoadError::Fetch`]; either way
    /// `is_loading` is cleared.
    pub fn complete<T, E>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Page<T>, E>,
        catalog: &mut Catalog<T>,
    ) -> Result<LoadOutcome, LoadError<E>>
    where
        T: Keyed,
    {
        if self.in_flight != Some(ticket) {
            let reason = if ticket.generation != self.generation {
                DiscardReason::Superseded
            } else {
                DiscardReason::NotInFlight
            };
            self.stats.discarded += 1;
            vista_core::debug!(
                message = "pagination_discarded",
                ticket = %ticket,
                generation = self.generation,
                ?reason
            );
            return Ok(LoadOutcome::Discarded { ticket, reason });
        }

        self.in_flight = None;
        self.state.is_loading = false;

        match result {
            Ok(page) => {
                let report = catalog.append_unique(page.items);
                self.state.has_more = page.has_more;
                self.stats.applied += 1;
                if report.appended == 0 && page.has_more {
                    self.stalled = true;
                    self.stats.stalled += 1;
                    vista_core::warn!(
                        message = "pagination_stalled",
                        ticket = %ticket,
                        duplicates = report.duplicates
                    );
                }
                vista_core::debug!(
                    message = "pagination_applied",
                    ticket = %ticket,
                    appended = report.appended,
                    duplicates = report.duplicates,
                    has_more = page.has_more
                );
                Ok(LoadOutcome::Applied {
                    appended: report.appended,
                    duplicates: report.duplicates,
                    has_more: page.has_more,
                })
            }
            Err(source) => {
                self.failed = true;
                self.stats.failed += 1;
                vista_core::warn!(message = "pagination_failed", ticket = %ticket);
                Err(LoadError::Fetch { ticket, source })
            }
        }
    }

    /// Give up on the request in flight without a result, e.g. because the
    /// loader thread died. Counts as a failure. Returns `false` if `ticket`
    /// is not the request in flight.
    pub fn abandon(&mut self, ticket: LoadTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        self.state.is_loading = false;
        self.failed = true;
        self.stats.failed += 1;
        vista_core::warn!(message = "pagination_failed", ticket = %ticket, abandoned = true);
        true
    }

    /// Clear a pending failure or stall so the next evaluation may trigger
    /// again. Returns whether either was pending.
    pub fn retry(&mut self) -> bool {
        let failed = std::mem::replace(&mut self.failed, false);
        let stalled = std::mem::replace(&mut self.stalled, false);
        failed || stalled
    }

    /// Release a stall. Called for every host event; a pending failure
    /// still waits for [`PaginationTrigger::retry`].
    pub fn resume(&mut self) {
        self.stalled = false;
    }

    /// Start a new generation: forget the in-flight request, any failure
    /// and any stall.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.state.is_loading = false;
        self.failed = false;
        self.stalled = false;
    }

    /// Invalidate and set `has_more` for a fresh catalog.
    pub fn reset(&mut self, has_more: bool) {
        self.invalidate();
        self.state.has_more = has_more;
    }
}

impl Default for PaginationTrigger {
    fn default() -> Self {
        Self::new(2, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEAR: EndProximity = EndProximity::Rows {
        last_rendered_row: 9,
        total_rows: 10,
    };
    const FAR: EndProximity = EndProximity::Rows {
        last_rendered_row: 9,
        total_rows: 2500,
    };

    #[derive(Debug, PartialEq)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn threshold_boundary() {
        let at = EndProximity::Rows {
            last_rendered_row: 7,
            total_rows: 10,
        };
        assert!(at.is_near_end(2));
        assert!(!at.is_near_end(1));
        assert!(EndProximity::Empty.is_near_end(0));
        assert!(!FAR.is_near_end(2));
    }

    #[test]
    fn burst_collapses_to_one_request() {
        let mut p = PaginationTrigger::new(2, true);
        let first = p.evaluate(NEAR, 40);
        assert!(first.is_some());
        for _ in 0..50 {
            assert!(p.evaluate(NEAR, 40).is_none());
        }
        assert!(p.state().is_loading);
        assert_eq!(p.stats().requested, 1);
        assert_eq!(first.unwrap().offset, 40);
    }

    #[test]
    fn has_more_false_never_triggers() {
        let mut p = PaginationTrigger::new(2, false);
        assert!(p.evaluate(NEAR, 40).is_none());
        assert!(p.evaluate(EndProximity::Empty, 0).is_none());
    }

    #[test]
    fn far_from_end_does_not_trigger() {
        let mut p = PaginationTrigger::new(2, true);
        assert!(p.evaluate(FAR, 10_000).is_none());
        assert!(p.state().is_idle());
    }

    #[test]
    fn success_appends_and_updates_has_more() {
        let mut catalog: Catalog<u32> = (0..4).collect();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(NEAR, catalog.len()).unwrap();

        let outcome = p
            .complete(req.ticket, Ok::<_, Boom>(Page::last(vec![3, 4, 5])), &mut catalog)
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                appended: 2,
                duplicates: 1,
                has_more: false
            }
        );
        assert_eq!(catalog.len(), 6);
        assert_eq!(
            p.state(),
            LoadState {
                has_more: false,
                is_loading: false
            }
        );
    }

    #[test]
    fn failure_clears_loading_and_latches() {
        let mut catalog: Catalog<u32> = (0..4).collect();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(NEAR, 4).unwrap();

        let err = p
            .complete(req.ticket, Err::<Page<u32>, _>(Boom), &mut catalog)
            .unwrap_err();
        assert_eq!(err.ticket(), req.ticket);
        assert_eq!(err.to_string(), format!("page load {} failed: boom", req.ticket));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(catalog.len(), 4);
        assert!(p.state().has_more);
        assert!(!p.state().is_loading);

        assert!(p.evaluate(NEAR, 4).is_none());
        assert!(p.retry());
        assert!(p.evaluate(NEAR, 4).is_some());
    }

    #[test]
    fn empty_page_stalls_until_resumed() {
        let mut catalog: Catalog<u32> = (0..4).collect();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(NEAR, 4).unwrap();

        let outcome = p
            .complete(req.ticket, Ok::<_, Boom>(Page::more(vec![2, 3])), &mut catalog)
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                appended: 0,
                duplicates: 2,
                has_more: true
            }
        );
        assert!(p.is_stalled());
        assert!(!p.has_failed());
        assert!(p.evaluate(NEAR, 4).is_none());
        assert_eq!(p.stats().stalled, 1);

        p.resume();
        assert!(p.evaluate(NEAR, 4).is_some());
    }

    #[test]
    fn final_empty_page_does_not_stall() {
        let mut catalog: Catalog<u32> = Catalog::new();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(EndProximity::Empty, 0).unwrap();
        p.complete(req.ticket, Ok::<_, Boom>(Page::last(Vec::new())), &mut catalog)
            .unwrap();
        assert!(!p.is_stalled());
        assert!(!p.state().has_more);
    }

    #[test]
    fn retry_and_invalidate_release_a_stall() {
        let mut catalog: Catalog<u32> = Catalog::new();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(EndProximity::Empty, 0).unwrap();
        p.complete(req.ticket, Ok::<_, Boom>(Page::more(Vec::new())), &mut catalog)
            .unwrap();
        assert!(p.retry());
        assert!(!p.retry());

        let req = p.evaluate(EndProximity::Empty, 0).unwrap();
        p.complete(req.ticket, Ok::<_, Boom>(Page::more(Vec::new())), &mut catalog)
            .unwrap();
        p.invalidate();
        assert!(!p.is_stalled());
        assert!(p.evaluate(EndProximity::Empty, 0).is_some());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut catalog: Catalog<u32> = Catalog::new();
        let mut p = PaginationTrigger::new(2, true);
        let old = p.evaluate(EndProximity::Empty, 0).unwrap();
        p.invalidate();
        assert!(!p.state().is_loading);

        let outcome = p
            .complete(old.ticket, Ok::<_, Boom>(Page::more(vec![1, 2])), &mut catalog)
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Discarded {
                ticket: old.ticket,
                reason: DiscardReason::Superseded
            }
        );
        assert!(catalog.is_empty());

        // a stale error is not surfaced either
        let outcome = p
            .complete(old.ticket, Err::<Page<u32>, _>(Boom), &mut catalog)
            .unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(p.stats().discarded, 2);
    }

    #[test]
    fn duplicate_completion_is_not_in_flight() {
        let mut catalog: Catalog<u32> = Catalog::new();
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(EndProximity::Empty, 0).unwrap();
        p.complete(req.ticket, Ok::<_, Boom>(Page::more(vec![1])), &mut catalog)
            .unwrap();
        let again = p
            .complete(req.ticket, Ok::<_, Boom>(Page::more(vec![2])), &mut catalog)
            .unwrap();
        assert_eq!(
            again,
            LoadOutcome::Discarded {
                ticket: req.ticket,
                reason: DiscardReason::NotInFlight
            }
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn abandon_only_matches_in_flight() {
        let mut p = PaginationTrigger::new(2, true);
        let req = p.evaluate(NEAR, 4).unwrap();
        let other = LoadTicket {
            generation: 7,
            sequence: 1,
        };
        assert!(!p.abandon(other));
        assert!(p.state().is_loading);
        assert!(p.abandon(req.ticket));
        assert!(!p.state().is_loading);
        assert!(p.has_failed());
        assert_eq!(p.stats().failed, 1);
    }

    #[test]
    fn tickets_carry_generation() {
        let mut p = PaginationTrigger::new(0, true);
        let a = p.evaluate(EndProximity::Empty, 0).unwrap().ticket;
        p.reset(true);
        let b = p.evaluate(EndProximity::Empty, 0).unwrap().ticket;
        assert_eq!(a.generation() + 1, b.generation());
        assert!(b.sequence() > a.sequence());
        assert_eq!(a.to_string(), "g0#1");
    }

    #[test]
    fn from_window_empty_plan() {
        let plan = LayoutPlan::default();
        assert_eq!(
            EndProximity::from_window(None, &plan),
            Some(EndProximity::Empty)
        );
    }
}
