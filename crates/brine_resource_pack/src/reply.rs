//! Outbound replies and the state of the connection they travel on.

use bevy::{ecs::system::SystemParam, prelude::*};
use bevy_ecs::message::Message;
use thiserror::Error;

use brine_proto::event::{
    clientbound::{Disconnect, LoginSuccess},
    serverbound::{ReplyTarget, ResourcePackResult, ResourcePackStatus},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("connection is closed: {reason}")]
    ChannelClosed { reason: String },
}

/// Whether the connection can currently take replies.
///
/// Closed by [`Disconnect`] and opened again by [`LoginSuccess`].
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyChannel {
    #[default]
    Open,
    Closed {
        reason: String,
    },
}

/// A reply the user asked for explicitly, outside of any handshake.
#[derive(Message, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ManualReply {
    /// Send `Declined`.
    Decline,
    /// Send `FailedDownload`.
    DownloadFailed,
}

/// A Bevy system param that writes [`ResourcePackStatus`] replies.
#[derive(SystemParam)]
pub struct ReplyWriter<'w> {
    channel: Res<'w, ReplyChannel>,
    writer: MessageWriter<'w, ResourcePackStatus>,
}

impl ReplyWriter<'_> {
    pub fn send(
        &mut self,
        target: ReplyTarget,
        result: ResourcePackResult,
    ) -> Result<(), ReplyError> {
        if let ReplyChannel::Closed { reason } = &*self.channel {
            return Err(ReplyError::ChannelClosed {
                reason: reason.clone(),
            });
        }

        debug!("Sending resource pack status {} for {}", result, target);
        self.writer.write(ResourcePackStatus { target, result });
        Ok(())
    }

    /// Like [`send`][Self::send], but logs a failure instead of returning it.
    /// Returns whether the reply went out.
    pub fn send_or_log(&mut self, target: ReplyTarget, result: ResourcePackResult) -> bool {
        match self.send(target.clone(), result) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "Failed to send resource pack status {} for {}: {}",
                    result, target, err
                );
                false
            }
        }
    }
}

/// System that keeps [`ReplyChannel`] in step with the session.
pub(crate) fn track_connection(
    mut login_success_events: MessageReader<LoginSuccess>,
    mut disconnect_events: MessageReader<Disconnect>,
    mut channel: ResMut<ReplyChannel>,
) {
    if login_success_events.read().last().is_some() && *channel != ReplyChannel::Open {
        debug!("Session established, reply channel open");
        *channel = ReplyChannel::Open;
    }

    if let Some(disconnect) = disconnect_events.read().last() {
        debug!("Session ended, reply channel closed");
        *channel = ReplyChannel::Closed {
            reason: disconnect.reason.clone(),
        };
    }
}

/// System that sends [`ManualReply`] requests.
pub(crate) fn send_manual_replies(
    mut requests: MessageReader<ManualReply>,
    mut replies: ReplyWriter,
) {
    for request in requests.read() {
        let result = match request {
            ManualReply::Decline => ResourcePackResult::Declined,
            ManualReply::DownloadFailed => ResourcePackResult::FailedDownload,
        };

        info!("Manually reporting {}", result);
        replies.send_or_log(ReplyTarget::Unspecified, result);
    }
}
