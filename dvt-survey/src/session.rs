//! One participant's run through the study
//!
//! A session is created with a fresh id and a shuffled presentation order,
//! waits for onboarding, then hands control to the response sequencer.
//! Writes are not performed here: operations return the records to persist
//! and the caller dispatches them.

use dvt_common::{Drop, Participant, SessionId, SurveyResponse};
use rand::Rng;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::onboarding::{validate_onboarding, FieldErrors, OnboardingForm};
use crate::sequencer::{Confirmed, Rating, ResponseSequencer, SequencerError, SequencerEvent, SequencerState};
use crate::shuffle::shuffle;

pub const COMPLETION_MESSAGE: &str =
    "Thank you for participating! Your responses have been recorded.";
pub const SAVE_FAILED_PROMPT: &str = "Failed to save your response. Please try again.";
pub const NO_VIDEOS_MESSAGE: &str = "No videos available";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Onboarding form has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Onboarding already submitted for this session")]
    AlreadyOnboarded,

    #[error("Onboarding must be completed first")]
    NotOnboarded,

    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    /// A response write failed and has not been retried successfully
    #[error("{} response(s) not saved", .0)]
    UnsavedResponses(usize),

    #[error("Responses are still being saved")]
    SaveInProgress,
}

#[derive(Debug, Clone)]
enum Phase {
    Onboarding,
    Feed(ResponseSequencer),
    /// Onboarded, but the catalog had nothing to show
    Empty,
}

#[derive(Debug, Clone)]
pub struct SurveySession {
    id: SessionId,
    order: Vec<Drop>,
    participant: Option<Participant>,
    phase: Phase,
    pending_retries: Vec<SurveyResponse>,
    /// Response writes dispatched but not yet resolved
    writes_in_flight: usize,
    last_active: Instant,
}

impl SurveySession {
    /// New session id plus a one-time shuffle of the whole catalog
    pub fn initialize<R: Rng + ?Sized>(catalog: &[Drop], rng: &mut R) -> Self {
        Self {
            id: SessionId::generate(),
            order: shuffle(catalog, rng),
            participant: None,
            phase: Phase::Onboarding,
            pending_retries: Vec::new(),
            writes_in_flight: 0,
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The fixed presentation order for this session
    pub fn order(&self) -> &[Drop] {
        &self.order
    }

    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        matches!(&self.phase, Phase::Feed(sequencer) if sequencer.is_completed())
    }

    /// Validate onboarding and start the sequencer
    ///
    /// Returns the participant record to persist. The session moves on
    /// whether or not that write later succeeds.
    pub fn submit_onboarding(&mut self, form: &OnboardingForm) -> Result<Participant, SessionError> {
        if self.participant.is_some() {
            return Err(SessionError::AlreadyOnboarded);
        }

        let participant = validate_onboarding(form, self.id).map_err(SessionError::Validation)?;

        self.phase = match ResponseSequencer::start(self.id, participant.name.clone(), self.order.clone()) {
            Ok(sequencer) => Phase::Feed(sequencer),
            Err(_) => Phase::Empty,
        };
        self.participant = Some(participant.clone());
        Ok(participant)
    }

    pub fn select_rating(&mut self, value: u8) -> Result<(), SessionError> {
        self.sequencer_mut()?.select_rating(value)?;
        Ok(())
    }

    pub fn edit_comment(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.sequencer_mut()?.edit_comment(text)?;
        Ok(())
    }

    /// Confirm the current drop; returns the response to persist
    pub fn confirm(&mut self) -> Result<Confirmed, SessionError> {
        Ok(self.sequencer_mut()?.confirm()?)
    }

    /// Apply a sequencer event; `Some` when it recorded a response
    pub fn apply(&mut self, event: SequencerEvent) -> Result<Option<Confirmed>, SessionError> {
        match event {
            SequencerEvent::SelectRating(value) => self.select_rating(value).map(|_| None),
            SequencerEvent::EditComment(text) => self.edit_comment(text).map(|_| None),
            SequencerEvent::Confirm => self.confirm().map(Some),
        }
    }

    /// Remember a response whose write failed so the participant can retry
    pub fn record_failed_write(&mut self, response: SurveyResponse) {
        if response.session_id == self.id
            && !self.pending_retries.iter().any(|r| r.drop_id == response.drop_id)
        {
            self.pending_retries.push(response);
        }
    }

    /// Hand back failed writes for another attempt
    pub fn take_pending_retries(&mut self) -> Vec<SurveyResponse> {
        std::mem::take(&mut self.pending_retries)
    }

    pub fn pending_retries(&self) -> &[SurveyResponse] {
        &self.pending_retries
    }

    /// Note a response write handed to the dispatcher
    pub fn begin_write(&mut self) {
        self.writes_in_flight += 1;
    }

    /// Resolve one in-flight write; `failed` carries the response on error
    pub fn finish_write(&mut self, failed: Option<SurveyResponse>) {
        self.writes_in_flight = self.writes_in_flight.saturating_sub(1);
        if let Some(response) = failed {
            self.record_failed_write(response);
        }
    }

    pub fn is_saving(&self) -> bool {
        self.writes_in_flight > 0
    }

    /// Every dispatched response has been written
    pub fn ensure_settled(&self) -> Result<(), SessionError> {
        if !self.pending_retries.is_empty() {
            return Err(SessionError::UnsavedResponses(self.pending_retries.len()));
        }
        if self.is_saving() {
            return Err(SessionError::SaveInProgress);
        }
        Ok(())
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_active = now;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    fn sequencer_mut(&mut self) -> Result<&mut ResponseSequencer, SessionError> {
        match &mut self.phase {
            Phase::Feed(sequencer) => Ok(sequencer),
            Phase::Empty => Err(SequencerError::EmptyCatalog.into()),
            Phase::Onboarding => Err(SessionError::NotOnboarded),
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SessionView {
        let screen = match &self.phase {
            Phase::Onboarding => Screen::Onboarding,
            Phase::Empty => Screen::Empty {
                message: NO_VIDEOS_MESSAGE,
            },
            Phase::Feed(sequencer) => match (sequencer.state(), sequencer.current()) {
                (
                    SequencerState::Presenting {
                        index,
                        rating,
                        comment,
                    },
                    Some(drop),
                ) => Screen::Presenting {
                    drop: drop.clone(),
                    position: index + 1,
                    total: sequencer.total(),
                    rating: *rating,
                    comment: comment.clone(),
                    button_label: if sequencer.is_last() { "Finish" } else { "Next" },
                },
                _ => Screen::Completed {
                    message: COMPLETION_MESSAGE,
                },
            },
        };

        SessionView {
            session_id: self.id,
            screen,
            save_error: (!self.pending_retries.is_empty()).then_some(SAVE_FAILED_PROMPT),
            pending_retries: self.pending_retries.len(),
            saving: self.is_saving(),
        }
    }
}

/// What the participant currently sees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub screen: Screen,
    /// Retry prompt, present while any response write has failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<&'static str>,
    pub pending_retries: usize,
    /// Response writes not yet resolved
    pub saving: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Onboarding,
    Presenting {
        drop: Drop,
        /// 1-based
        position: usize,
        total: usize,
        rating: Option<Rating>,
        comment: String,
        button_label: &'static str,
    },
    Empty {
        message: &'static str,
    },
    Completed {
        message: &'static str,
    },
}
