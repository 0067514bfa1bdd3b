//! Subscription state, accept policy and request history.

use std::time::SystemTime;

use bevy::prelude::*;
use serde::Serialize;

use brine_proto::event::clientbound::{AddResourcePack, ResourcePackSend};

use crate::{
    driver,
    history::{HistoryEntry, RequestHistory},
    offer::{or_absent, ResourcePackOffer},
    settings::ResourcePackSettings,
};

/// Answers resource pack pushes according to [`ResourcePackSettings`].
///
/// Starts disabled. While disabled, pushes are consumed without being
/// recorded or answered.
#[derive(Resource, Debug)]
pub struct ResourcePackHandler {
    enabled: bool,
    settings: ResourcePackSettings,
    history: RequestHistory,
}

/// Point-in-time view of a [`ResourcePackHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerStatus {
    pub enabled: bool,
    pub auto_accept: bool,
    pub auto_accept_forced: bool,
    pub history_count: usize,
    pub last_request: Option<HistoryEntry>,
}

impl ResourcePackHandler {
    pub fn new(settings: ResourcePackSettings) -> Self {
        Self {
            enabled: false,
            settings,
            history: RequestHistory::default(),
        }
    }

    /// Subscribes to both push messages. Does nothing if already subscribed.
    pub fn enable(&mut self) {
        if self.enabled {
            debug!("Resource pack handler already enabled");
            return;
        }

        self.enabled = true;
        info!("Resource pack handler enabled, listening for AddResourcePack and ResourcePackSend");
    }

    /// Unsubscribes from both push messages. Handshakes already in progress
    /// keep running.
    pub fn disable(&mut self) {
        if !self.enabled {
            debug!("Resource pack handler not enabled");
            return;
        }

        self.enabled = false;
        info!("Resource pack handler disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &ResourcePackSettings {
        &self.settings
    }

    pub fn set_auto_accept(&mut self, auto_accept: bool) {
        self.settings.auto_accept = auto_accept;
        info!("Auto-accept for optional resource packs set to {}", auto_accept);
    }

    pub fn set_auto_accept_forced(&mut self, auto_accept_forced: bool) {
        self.settings.auto_accept_forced = auto_accept_forced;
        info!(
            "Auto-accept for forced resource packs set to {}",
            auto_accept_forced
        );
    }

    /// Recorded pushes, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.all()
    }

    pub fn last_request(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Resource pack history cleared");
    }

    pub fn status(&self) -> HandlerStatus {
        HandlerStatus {
            enabled: self.enabled,
            auto_accept: self.settings.auto_accept,
            auto_accept_forced: self.settings.auto_accept_forced,
            history_count: self.history.len(),
            last_request: self.history.last().cloned(),
        }
    }

    /// Records `offer` and returns whether it should be accepted.
    pub fn handle(&mut self, offer: &ResourcePackOffer) -> bool {
        let details = offer.details();

        if self.settings.log_packets {
            info!(
                shape = offer.shape(),
                url = or_absent(&details.url),
                hash = or_absent(&details.hash),
                forced = details.forced,
                prompt = or_absent(&details.prompt_message),
                "Resource pack push received"
            );
        }

        self.history
            .record(HistoryEntry::from_offer(offer, SystemTime::now()));

        let should_accept = if details.forced {
            debug!(
                "Forced resource pack, autoAcceptForced = {}",
                self.settings.auto_accept_forced
            );
            self.settings.auto_accept_forced
        } else {
            debug!(
                "Optional resource pack, autoAccept = {}",
                self.settings.auto_accept
            );
            self.settings.auto_accept
        };

        if !should_accept {
            info!(
                "Leaving resource pack {} unanswered",
                or_absent(&details.url)
            );
        }

        should_accept
    }
}

impl Default for ResourcePackHandler {
    fn default() -> Self {
        Self::new(ResourcePackSettings::default())
    }
}

/// System that classifies incoming pushes and schedules a handshake for each
/// accepted one.
pub(crate) fn receive_offers(
    mut modern: MessageReader<AddResourcePack>,
    mut legacy: MessageReader<ResourcePackSend>,
    mut handler: ResMut<ResourcePackHandler>,
    mut commands: Commands,
) {
    let offers: Vec<ResourcePackOffer> = modern
        .read()
        .map(ResourcePackOffer::from)
        .chain(legacy.read().map(ResourcePackOffer::from))
        .collect();

    if !handler.is_enabled() {
        if !offers.is_empty() {
            trace!("Ignoring {} resource pack push(es) while disabled", offers.len());
        }
        return;
    }

    for offer in offers {
        if handler.handle(&offer) {
            driver::schedule(&mut commands, offer, handler.settings());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::offer::OfferDetails;

    fn offer(forced: bool) -> ResourcePackOffer {
        ResourcePackOffer::Legacy {
            details: OfferDetails {
                url: Some(String::from("https://example.com/pack.zip")),
                hash: Some(String::from("abc")),
                forced,
                prompt_message: None,
            },
        }
    }

    #[test]
    fn starts_disabled() {
        let handler = ResourcePackHandler::default();
        assert!(!handler.is_enabled());
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut handler = ResourcePackHandler::default();

        handler.disable();
        assert!(!handler.is_enabled());

        handler.enable();
        handler.enable();
        assert!(handler.is_enabled());

        handler.disable();
        handler.disable();
        assert!(!handler.is_enabled());
    }

    #[test]
    fn forced_offers_follow_auto_accept_forced() {
        let mut handler = ResourcePackHandler::new(ResourcePackSettings {
            auto_accept: true,
            auto_accept_forced: false,
            ..Default::default()
        });

        assert!(!handler.handle(&offer(true)));
        assert!(handler.handle(&offer(false)));

        handler.set_auto_accept_forced(true);
        assert!(handler.handle(&offer(true)));
    }

    #[test]
    fn optional_offers_follow_auto_accept() {
        let mut handler = ResourcePackHandler::new(ResourcePackSettings {
            auto_accept: false,
            auto_accept_forced: true,
            ..Default::default()
        });

        assert!(!handler.handle(&offer(false)));
        assert!(handler.handle(&offer(true)));

        handler.set_auto_accept(true);
        assert!(handler.handle(&offer(false)));
    }

    #[test]
    fn declined_offers_are_still_recorded() {
        let mut handler = ResourcePackHandler::new(ResourcePackSettings {
            auto_accept: false,
            ..Default::default()
        });

        handler.handle(&offer(false));

        assert_eq!(handler.history().len(), 1);
        assert_eq!(
            handler.last_request().and_then(|entry| entry.hash.as_deref()),
            Some("abc")
        );
    }

    #[test]
    fn status_reflects_state() {
        let mut handler = ResourcePackHandler::default();
        handler.enable();
        handler.set_auto_accept(false);
        handler.handle(&offer(true));

        let status = handler.status();
        assert!(status.enabled);
        assert!(!status.auto_accept);
        assert!(status.auto_accept_forced);
        assert_eq!(status.history_count, 1);
        assert_eq!(status.last_request.as_ref(), handler.last_request());

        // Reading the status changes nothing.
        assert_eq!(handler.status(), status);
    }

    #[test]
    fn clear_history_leaves_no_last_request() {
        let mut handler = ResourcePackHandler::default();
        assert_eq!(handler.last_request(), None);

        handler.handle(&offer(false));
        handler.clear_history();

        assert!(handler.history().is_empty());
        assert_eq!(handler.last_request(), None);
        assert_eq!(handler.status().history_count, 0);
    }
}
