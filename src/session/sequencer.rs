//! Per-question ordering of in-flight answer writes.
//!
//! Every `answer` call takes a ticket before going to the network. When the
//! response comes back, the ticket is presented again and only accepted if
//! nothing newer for the same question has been applied in the meantime.

use std::collections::HashMap;

/// Issue order of one answer write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTicket {
    epoch: u64,
    seq: u64,
}

impl AnswerTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct AnswerSequencer {
    /// Bumped on reset; tickets from an older epoch are never accepted
    epoch: u64,
    next_seq: u64,
    /// Highest seq applied per question id
    applied: HashMap<String, u64>,
}

impl AnswerSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a write that is about to be issued.
    pub fn issue(&mut self) -> AnswerTicket {
        self.next_seq += 1;
        AnswerTicket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }

    /// Record a confirmed write for `question_id`.
    ///
    /// Returns `false` if the ticket belongs to a previous session or a newer
    /// write for the same question has already been applied.
    pub fn accept(&mut self, question_id: &str, ticket: AnswerTicket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match self.applied.get(question_id) {
            Some(&last) if last >= ticket.seq => false,
            _ => {
                self.applied.insert(question_id.to_string(), ticket.seq);
                true
            }
        }
    }

    /// Forget all applied writes and invalidate outstanding tickets.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.applied.clear();
    }
}
