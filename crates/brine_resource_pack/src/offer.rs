//! Inbound resource pack pushes, normalized into one type.

use brine_proto::event::clientbound::{AddResourcePack, ResourcePackSend};

/// Rendered in logs in place of a field the server left out.
pub const ABSENT: &str = "<none>";

/// Fields shared by both push shapes. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferDetails {
    pub url: Option<String>,
    pub hash: Option<String>,
    pub forced: bool,
    pub prompt_message: Option<String>,
}

/// A resource pack the server asked the client to install.
///
/// The variant is fixed by the message the push arrived on and decides which
/// reply sequence answers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePackOffer {
    /// Push carrying an identifier. Replies echo the identifier and report
    /// intermediate progress.
    Modern {
        identifier: String,
        details: OfferDetails,
    },
    /// Hash-only push. Replies echo the hash and only report the outcome.
    Legacy { details: OfferDetails },
}

impl ResourcePackOffer {
    pub fn details(&self) -> &OfferDetails {
        match self {
            ResourcePackOffer::Modern { details, .. } | ResourcePackOffer::Legacy { details } => {
                details
            }
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            ResourcePackOffer::Modern { identifier, .. } => Some(identifier),
            ResourcePackOffer::Legacy { .. } => None,
        }
    }

    pub fn is_forced(&self) -> bool {
        self.details().forced
    }

    /// Short name of the wire shape, for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            ResourcePackOffer::Modern { .. } => "modern",
            ResourcePackOffer::Legacy { .. } => "legacy",
        }
    }
}

impl From<&AddResourcePack> for ResourcePackOffer {
    fn from(push: &AddResourcePack) -> Self {
        ResourcePackOffer::Modern {
            identifier: push.uuid.clone(),
            details: OfferDetails {
                url: push.url.clone(),
                hash: push.hash.clone(),
                forced: push.forced,
                prompt_message: push.prompt_message.clone(),
            },
        }
    }
}

impl From<&ResourcePackSend> for ResourcePackOffer {
    fn from(push: &ResourcePackSend) -> Self {
        ResourcePackOffer::Legacy {
            details: OfferDetails {
                url: push.url.clone(),
                hash: push.hash.clone(),
                forced: push.forced,
                prompt_message: push.prompt_message.clone(),
            },
        }
    }
}

/// Returns the field's value, or [`ABSENT`] when it is missing.
pub fn or_absent(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(ABSENT)
}
