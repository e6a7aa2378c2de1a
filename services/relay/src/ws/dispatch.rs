//! Per-Call Event Dispatch
//!
//! One dispatcher task per connection consumes the call's event queue and
//! processes each event to completion before taking the next. This is the
//! serialization point the interrupt algorithm relies on: a new prompt never
//! starts streaming while a prior one is in flight, and an interrupt queued
//! during streaming is applied right after the reply resolves.

use super::protocol::{InboundMessage, OutboundMessage};
use super::stream::stream_reply;
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use voicerelay_core::{convo::Turn, interrupt, store::StoreError};

pub(crate) async fn run_dispatcher(
    state: Arc<AppState>,
    call_sid: String,
    mut events: mpsc::Receiver<InboundMessage>,
    out: mpsc::Sender<OutboundMessage>,
) {
    while let Some(event) = events.recv().await {
        handle_event(&state, &call_sid, event, &out).await;
    }
}

async fn handle_event(
    state: &AppState,
    call_sid: &str,
    event: InboundMessage,
    out: &mpsc::Sender<OutboundMessage>,
) {
    match event {
        InboundMessage::Setup { call_sid: sid } => {
            // The channel is bound at handshake time; a repeated setup for
            // the same call resets its history.
            if sid == call_sid {
                warn!("repeated setup event; resetting history");
                state.sessions.create(call_sid);
            } else {
                warn!(other = %sid, "setup for a different call on a bound channel; ignoring");
            }
        }
        InboundMessage::Prompt { voice_prompt } => {
            info!(prompt = %voice_prompt, "processing prompt");
            if let Err(e) = handle_prompt(state, call_sid, voice_prompt, out).await {
                error!(error = %e, "dropping prompt for unknown session");
            }
        }
        InboundMessage::Interrupt {
            utterance_until_interrupt,
        } => {
            info!(heard = %utterance_until_interrupt, "handling interruption");
            match interrupt::apply(&state.sessions, call_sid, &utterance_until_interrupt) {
                Ok(true) => info!("history truncated at interruption point"),
                Ok(false) => info!("interrupt matched no assistant turn; history unchanged"),
                Err(e) => error!(error = %e, "dropping interrupt for unknown session"),
            }
        }
        InboundMessage::Error { description } => {
            error!(%description, "error event from relay");
        }
        InboundMessage::Unknown => {
            warn!("unknown event type received; ignoring");
        }
    }
}

async fn handle_prompt(
    state: &AppState,
    call_sid: &str,
    voice_prompt: String,
    out: &mpsc::Sender<OutboundMessage>,
) -> Result<(), StoreError> {
    state.sessions.append(call_sid, Turn::user(voice_prompt))?;
    let history = state.sessions.get(call_sid)?;

    let reply = stream_reply(state.llm.as_ref(), &history, out).await;

    // An empty reply records no turn, so consecutive user turns can occur.
    if !reply.is_empty() {
        state.sessions.append(call_sid, Turn::assistant(reply))?;
    }
    Ok(())
}
