//! Automatic answers to server-pushed resource packs.
//!
//! Servers push resource packs in one of two shapes: [`AddResourcePack`]
//! carries an identifier, [`ResourcePackSend`] only a hash. The
//! [`ResourcePackPlugin`] records every push in a bounded history, decides
//! whether to accept it, and for accepted pushes sends the reply sequence the
//! push's shape expects. Nothing is ever downloaded; the client only claims to
//! have loaded the pack.
//!
//! [`AddResourcePack`]: brine_proto::event::clientbound::AddResourcePack
//! [`ResourcePackSend`]: brine_proto::event::clientbound::ResourcePackSend

use bevy::{ecs::schedule::IntoScheduleConfigs, prelude::*};

pub mod driver;
pub mod handler;
pub mod history;
pub mod offer;
pub mod reply;
pub mod settings;

pub use driver::{Handshake, HandshakeStage};
pub use handler::{HandlerStatus, ResourcePackHandler};
pub use history::{HistoryEntry, RequestHistory, HISTORY_CAPACITY};
pub use offer::{OfferDetails, ResourcePackOffer};
pub use reply::{ManualReply, ReplyChannel, ReplyError, ReplyWriter};
pub use settings::{ResourcePackSettings, DEFAULT_STAGE_DELAY};

/// Plugin that answers resource pack pushes without user intervention.
///
/// # Events
///
/// The plugin registers the following events:
///
/// * [`ManualReply`]
///
/// The plugin acts on the following events:
///
/// * [`AddResourcePack`][brine_proto::event::clientbound::AddResourcePack]
/// * [`ResourcePackSend`][brine_proto::event::clientbound::ResourcePackSend]
/// * [`LoginSuccess`][brine_proto::event::clientbound::LoginSuccess]
/// * [`Disconnect`][brine_proto::event::clientbound::Disconnect]
/// * [`ManualReply`]
///
/// The plugin sends the following events:
///
/// * [`ResourcePackStatus`][brine_proto::event::serverbound::ResourcePackStatus]
///
/// # Resources
///
/// The plugin registers the following resources:
///
/// * [`ResourcePackHandler`]
/// * [`ReplyChannel`]
///
/// The plugin expects [`Time`] to exist and the protocol events to be
/// registered (see [`brine_proto::ProtocolPlugin`]).
pub struct ResourcePackPlugin {
    settings: ResourcePackSettings,
    start_enabled: bool,
}

impl ResourcePackPlugin {
    pub fn new(settings: ResourcePackSettings) -> Self {
        Self {
            settings,
            start_enabled: true,
        }
    }

    /// Leaves the handler disabled until [`ResourcePackHandler::enable`] is
    /// called.
    pub fn start_disabled(mut self) -> Self {
        self.start_enabled = false;
        self
    }
}

impl Default for ResourcePackPlugin {
    fn default() -> Self {
        Self::new(ResourcePackSettings::default())
    }
}

impl Plugin for ResourcePackPlugin {
    fn build(&self, app: &mut App) {
        let mut handler = ResourcePackHandler::new(self.settings.clone());
        if self.start_enabled {
            handler.enable();
        }

        app.insert_resource(handler)
            .init_resource::<ReplyChannel>()
            .add_message::<ManualReply>()
            .add_systems(
                Update,
                (
                    reply::track_connection,
                    // Runs before `receive_offers` so that a handshake scheduled
                    // this frame sends its first reply next frame.
                    driver::advance_handshakes,
                    handler::receive_offers,
                    reply::send_manual_replies,
                )
                    .chain(),
            );
    }
}
