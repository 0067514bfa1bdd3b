//! Reply sequences for accepted pushes.
//!
//! Every accepted push gets its own [`Handshake`] entity, so several packs can
//! be answered at once without sharing state. A handshake never sends its
//! first reply in the frame the push was classified in; it waits for the next
//! one.
//!
//! * Identifier-bearing pushes: `Accepted`, a delay, optionally `Downloaded`,
//!   another delay, then `SuccessfullyLoaded`.
//! * Hash-only pushes: `SuccessfullyLoaded` and nothing else.
//!
//! A reply that cannot be sent ends the handshake where it stands. Nothing is
//! retried.

use std::time::Duration;

use bevy::prelude::*;

use brine_proto::event::serverbound::{ReplyTarget, ResourcePackResult};

use crate::{offer::ResourcePackOffer, reply::ReplyWriter, settings::ResourcePackSettings};

/// An accepted push whose reply sequence has not finished yet.
#[derive(Component, Debug)]
pub struct Handshake {
    offer: ResourcePackOffer,
    stage: HandshakeStage,
    report_downloaded: bool,
    stage_delay: Duration,
}

#[derive(Debug, Clone)]
pub enum HandshakeStage {
    /// Waiting for the next frame to send the first reply.
    Scheduled,
    /// `Accepted` went out; waiting to report progress.
    Accepted(Timer),
    /// Waiting to report `SuccessfullyLoaded`.
    Loading(Timer),
}

impl Handshake {
    pub fn new(offer: ResourcePackOffer, settings: &ResourcePackSettings) -> Self {
        Self {
            offer,
            stage: HandshakeStage::Scheduled,
            report_downloaded: settings.report_downloaded,
            stage_delay: settings.stage_delay,
        }
    }

    pub fn offer(&self) -> &ResourcePackOffer {
        &self.offer
    }

    pub fn stage(&self) -> &HandshakeStage {
        &self.stage
    }

    fn target(&self) -> ReplyTarget {
        match &self.offer {
            ResourcePackOffer::Modern { identifier, .. } => {
                ReplyTarget::Identifier(identifier.clone())
            }
            ResourcePackOffer::Legacy { details } => {
                ReplyTarget::Hash(details.hash.clone().unwrap_or_default())
            }
        }
    }

    fn stage_timer(&self) -> Timer {
        Timer::new(self.stage_delay, TimerMode::Once)
    }

    /// Moves the handshake forward by `delta`. Returns `true` once there is
    /// nothing left to send.
    fn advance(&mut self, delta: Duration, replies: &mut ReplyWriter) -> bool {
        match &mut self.stage {
            HandshakeStage::Scheduled => {
                if let ResourcePackOffer::Legacy { .. } = self.offer {
                    replies.send_or_log(self.target(), ResourcePackResult::SuccessfullyLoaded);
                    return true;
                }

                if !replies.send_or_log(self.target(), ResourcePackResult::Accepted) {
                    return true;
                }
                self.stage = HandshakeStage::Accepted(self.stage_timer());
                false
            }

            HandshakeStage::Accepted(timer) => {
                if !timer.tick(delta).just_finished() {
                    return false;
                }

                if self.report_downloaded
                    && !replies.send_or_log(self.target(), ResourcePackResult::Downloaded)
                {
                    return true;
                }
                self.stage = HandshakeStage::Loading(self.stage_timer());
                false
            }

            HandshakeStage::Loading(timer) => {
                if !timer.tick(delta).just_finished() {
                    return false;
                }

                if replies.send_or_log(self.target(), ResourcePackResult::SuccessfullyLoaded) {
                    debug!("Resource pack handshake complete for {}", self.target());
                }
                true
            }
        }
    }
}

/// Queues a handshake for `offer`, to start on the next frame.
pub(crate) fn schedule(
    commands: &mut Commands,
    offer: ResourcePackOffer,
    settings: &ResourcePackSettings,
) {
    let name = match &offer {
        ResourcePackOffer::Modern { identifier, .. } => {
            format!("Resource Pack Handshake ({})", identifier)
        }
        ResourcePackOffer::Legacy { details } => format!(
            "Resource Pack Handshake (hash {})",
            details.hash.as_deref().unwrap_or_default()
        ),
    };

    debug!("Scheduling {} handshake", offer.shape());
    commands.spawn((Handshake::new(offer, settings), Name::new(name)));
}

/// System that drives every in-flight handshake.
pub(crate) fn advance_handshakes(
    time: Res<Time>,
    mut handshakes: Query<(Entity, &mut Handshake)>,
    mut replies: ReplyWriter,
    mut commands: Commands,
) {
    for (entity, mut handshake) in handshakes.iter_mut() {
        if handshake.advance(time.delta(), &mut replies) {
            commands.entity(entity).despawn();
        }
    }
}
