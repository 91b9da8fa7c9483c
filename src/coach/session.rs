//! The active coaching session and the slot that guards it.
//!
//! Only one session is live at a time. Requests take a ticket before their
//! provider call; when they complete, the slot decides whether the result
//! may still replace (analysis) or extend (follow-up) the live session.

use std::sync::Mutex;

use tracing::debug;

use crate::models::ChatTurn;

/// Provider-facing history for the most recent analysis of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub file_name: String,
    pub messages: Vec<ChatTurn>,
}

/// Ordering token taken before a top-level analysis starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// The live session together with the generation it was committed at.
///
/// A follow-up extends exactly this generation; if anything else has been
/// committed in the meantime, its result is stale.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub generation: u64,
    pub session: Session,
}

#[derive(Debug, Default)]
struct SlotState {
    next_ticket: u64,
    last_committed_ticket: u64,
    generation: u64,
    active: Option<Session>,
}

/// Owner of the single live [`Session`].
#[derive(Debug, Default)]
pub struct SessionSlot {
    state: Mutex<SlotState>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the next ticket for a top-level analysis.
    pub fn begin(&self) -> Ticket {
        let mut state = self.lock();
        state.next_ticket += 1;
        Ticket(state.next_ticket)
    }

    /// Replace the live session unless a newer analysis already committed.
    ///
    /// Returns `false` when the completion is stale and was discarded.
    pub fn commit_analysis(&self, ticket: Ticket, session: Session) -> bool {
        let mut state = self.lock();
        if ticket.0 <= state.last_committed_ticket {
            debug!(
                ticket = ticket.0,
                committed = state.last_committed_ticket,
                "discarding stale analysis session"
            );
            return false;
        }
        state.last_committed_ticket = ticket.0;
        state.generation += 1;
        state.active = Some(session);
        true
    }

    /// Replace the live session with an extension of `generation`.
    ///
    /// Returns `false` when the live session changed while the follow-up
    /// was in flight.
    pub fn commit_follow_up(&self, generation: u64, session: Session) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.active.is_none() {
            debug!(
                base = generation,
                current = state.generation,
                "discarding stale follow-up session"
            );
            return false;
        }
        state.generation += 1;
        state.active = Some(session);
        true
    }

    /// A copy of the live session, if any.
    pub fn active(&self) -> Option<ActiveSession> {
        let state = self.lock();
        state.active.clone().map(|session| ActiveSession {
            generation: state.generation,
            session,
        })
    }

    /// Drop the live session.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(file: &str) -> Session {
        Session {
            file_name: file.to_string(),
            messages: vec![ChatTurn::system("s"), ChatTurn::user(file)],
        }
    }

    #[test]
    fn empty_slot_has_no_session() {
        assert!(SessionSlot::new().active().is_none());
    }

    #[test]
    fn analysis_replaces_session() {
        let slot = SessionSlot::new();
        let first = slot.begin();
        assert!(slot.commit_analysis(first, session("a.js")));
        let second = slot.begin();
        assert!(slot.commit_analysis(second, session("b.js")));
        assert_eq!(slot.active().unwrap().session.file_name, "b.js");
    }

    #[test]
    fn older_analysis_completing_late_is_discarded() {
        let slot = SessionSlot::new();
        let older = slot.begin();
        let newer = slot.begin();
        assert!(slot.commit_analysis(newer, session("new.js")));
        assert!(!slot.commit_analysis(older, session("old.js")));
        assert_eq!(slot.active().unwrap().session.file_name, "new.js");
    }

    #[test]
    fn older_analysis_completing_first_still_commits() {
        let slot = SessionSlot::new();
        let older = slot.begin();
        let newer = slot.begin();
        assert!(slot.commit_analysis(older, session("old.js")));
        assert!(slot.commit_analysis(newer, session("new.js")));
        assert_eq!(slot.active().unwrap().session.file_name, "new.js");
    }

    #[test]
    fn follow_up_extends_current_generation() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        slot.commit_analysis(ticket, session("a.js"));
        let active = slot.active().unwrap();

        let mut extended = active.session.clone();
        extended.messages.push(ChatTurn::user("why?"));
        assert!(slot.commit_follow_up(active.generation, extended));
        assert_eq!(slot.active().unwrap().session.messages.len(), 3);
    }

    #[test]
    fn follow_up_on_replaced_session_is_discarded() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        slot.commit_analysis(ticket, session("a.js"));
        let base = slot.active().unwrap();

        let ticket = slot.begin();
        slot.commit_analysis(ticket, session("b.js"));

        assert!(!slot.commit_follow_up(base.generation, base.session));
        assert_eq!(slot.active().unwrap().session.file_name, "b.js");
    }

    #[test]
    fn clear_invalidates_pending_follow_up() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        slot.commit_analysis(ticket, session("a.js"));
        let base = slot.active().unwrap();
        slot.clear();
        assert!(!slot.commit_follow_up(base.generation, base.session));
        assert!(slot.active().is_none());
    }
}
