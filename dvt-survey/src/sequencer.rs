//! Response sequencer: one-pass walk over the presentation order
//!
//! States are `Presenting { index, .. }` for `index` in `[0, total)` and the
//! terminal `Completed`. Transitions are pure: `transition(state, event,
//! total)` returns the next state plus the response to record, if any.
//! There is no backward navigation; once a drop is confirmed the sequencer
//! never returns to it.

use dvt_common::{Drop, SessionId, SurveyResponse};
use serde::Serialize;
use thiserror::Error;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub const RATING_REQUIRED_PROMPT: &str = "Please rate the visual impact before continuing.";

/// A visuals-impact rating in `1..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, SequencerError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SequencerError::InvalidRating(value.into()))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SequencerState {
    Presenting {
        index: usize,
        /// `None` until the participant picks a rating
        rating: Option<Rating>,
        comment: String,
    },
    Completed,
}

impl SequencerState {
    /// Entry state for position `index`: rating and comment cleared
    pub fn presenting(index: usize) -> Self {
        Self::Presenting {
            index,
            rating: None,
            comment: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    SelectRating(u8),
    EditComment(String),
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("{}", RATING_REQUIRED_PROMPT)]
    RatingRequired,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("All drops have already been rated")]
    AlreadyCompleted,

    #[error("No videos available")]
    EmptyCatalog,
}

/// What a confirmation produced: the response for `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub index: usize,
    pub rating: Rating,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SequencerState,
    pub recorded: Option<Recorded>,
}

impl Transition {
    fn stay(next: SequencerState) -> Self {
        Self { next, recorded: None }
    }

    /// True when this transition entered `Completed`
    pub fn completed(&self) -> bool {
        self.recorded.is_some() && self.next == SequencerState::Completed
    }
}

/// Pure transition function
pub fn transition(
    state: &SequencerState,
    event: SequencerEvent,
    total: usize,
) -> Result<Transition, SequencerError> {
    let SequencerState::Presenting {
        index,
        rating,
        comment,
    } = state
    else {
        return Err(SequencerError::AlreadyCompleted);
    };
    let index = *index;

    match event {
        SequencerEvent::SelectRating(value) => {
            let rating = Rating::new(value)?;
            Ok(Transition::stay(SequencerState::Presenting {
                index,
                rating: Some(rating),
                comment: comment.clone(),
            }))
        }
        SequencerEvent::EditComment(text) => Ok(Transition::stay(SequencerState::Presenting {
            index,
            rating: *rating,
            comment: text,
        })),
        SequencerEvent::Confirm => {
            let rating = rating.ok_or(SequencerError::RatingRequired)?;
            let next = if index + 1 < total {
                SequencerState::presenting(index + 1)
            } else {
                SequencerState::Completed
            };
            Ok(Transition {
                next,
                recorded: Some(Recorded {
                    index,
                    rating,
                    comment: comment.clone(),
                }),
            })
        }
    }
}

/// Sequencer bound to one session's presentation order and participant
#[derive(Debug, Clone)]
pub struct ResponseSequencer {
    session_id: SessionId,
    onboarding_name: String,
    order: Vec<Drop>,
    state: SequencerState,
}

/// Outcome of a successful confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub response: SurveyResponse,
    pub completed: bool,
}

impl ResponseSequencer {
    /// Start at `Presenting(0)`; an empty order never starts
    pub fn start(
        session_id: SessionId,
        onboarding_name: impl Into<String>,
        order: Vec<Drop>,
    ) -> Result<Self, SequencerError> {
        if order.is_empty() {
            return Err(SequencerError::EmptyCatalog);
        }
        Ok(Self {
            session_id,
            onboarding_name: onboarding_name.into(),
            order,
            state: SequencerState::presenting(0),
        })
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    /// Drop currently shown, `None` once completed
    pub fn current(&self) -> Option<&Drop> {
        match &self.state {
            SequencerState::Presenting { index, .. } => self.order.get(*index),
            SequencerState::Completed => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == SequencerState::Completed
    }

    pub fn is_last(&self) -> bool {
        matches!(self.state, SequencerState::Presenting { index, .. } if index + 1 == self.order.len())
    }

    pub fn select_rating(&mut self, value: u8) -> Result<(), SequencerError> {
        self.apply(SequencerEvent::SelectRating(value)).map(|_| ())
    }

    pub fn edit_comment(&mut self, text: impl Into<String>) -> Result<(), SequencerError> {
        self.apply(SequencerEvent::EditComment(text.into())).map(|_| ())
    }

    /// Confirm the current drop and advance
    pub fn confirm(&mut self) -> Result<Confirmed, SequencerError> {
        let transition = self.apply(SequencerEvent::Confirm)?;
        let completed = transition.completed();
        let recorded = transition
            .recorded
            .ok_or(SequencerError::RatingRequired)?;
        let drop = &self.order[recorded.index];

        Ok(Confirmed {
            response: SurveyResponse::new(
                self.session_id,
                self.onboarding_name.clone(),
                drop.id.clone(),
                recorded.rating.value(),
                &recorded.comment,
            ),
            completed,
        })
    }

    pub fn apply(&mut self, event: SequencerEvent) -> Result<Transition, SequencerError> {
        let transition = transition(&self.state, event, self.order.len())?;
        self.state = transition.next.clone();
        Ok(transition)
    }
}
