//! Backend-agnostic protocol messages for the Brine client.
//!
//! A protocol backend translates wire packets into the [`event::clientbound`]
//! messages and turns [`event::serverbound`] messages back into packets. Game
//! logic only ever talks to these messages.

use bevy::prelude::*;

pub mod event;

/// Registers every protocol message with the app.
///
/// # Events
///
/// The plugin registers the following events:
///
/// * [`LoginSuccess`][event::clientbound::LoginSuccess]
/// * [`Disconnect`][event::clientbound::Disconnect]
/// * [`AddResourcePack`][event::clientbound::AddResourcePack]
/// * [`ResourcePackSend`][event::clientbound::ResourcePackSend]
/// * [`ResourcePackStatus`][event::serverbound::ResourcePackStatus]
///
/// # Resources
///
/// The plugin does not register any resources.
pub struct ProtocolPlugin;

impl Plugin for ProtocolPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<event::clientbound::LoginSuccess>()
            .add_message::<event::clientbound::Disconnect>()
            .add_message::<event::clientbound::AddResourcePack>()
            .add_message::<event::clientbound::ResourcePackSend>()
            .add_message::<event::serverbound::ResourcePackStatus>();
    }
}
