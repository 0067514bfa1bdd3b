//! Messages sent to and received from the server.

pub use uuid::Uuid;

pub mod clientbound {
    use bevy_ecs::message::Message;

    use super::Uuid;

    /// The server accepted the login; the connection is now usable for play.
    #[derive(Message, Debug, Clone, PartialEq, Eq)]
    pub struct LoginSuccess {
        pub uuid: Uuid,
        pub username: String,
    }

    /// The connection to the server was closed.
    #[derive(Message, Debug, Clone, PartialEq, Eq)]
    pub struct Disconnect {
        pub reason: String,
    }

    /// Resource pack push carrying a pack identifier.
    ///
    /// Newer servers identify every pushed pack so that several packs can be
    /// in flight at once. Replies to this push must echo the identifier.
    #[derive(Message, Debug, Clone, Default, PartialEq, Eq)]
    pub struct AddResourcePack {
        pub uuid: String,
        pub url: Option<String>,
        pub hash: Option<String>,
        pub forced: bool,
        pub prompt_message: Option<String>,
    }

    /// Resource pack push in the older, hash-only shape.
    #[derive(Message, Debug, Clone, Default, PartialEq, Eq)]
    pub struct ResourcePackSend {
        pub url: Option<String>,
        pub hash: Option<String>,
        pub forced: bool,
        pub prompt_message: Option<String>,
    }
}

pub mod serverbound {
    use std::fmt;

    use bevy_ecs::message::Message;

    /// Reply to a resource pack push.
    #[derive(Message, Debug, Clone, PartialEq, Eq)]
    pub struct ResourcePackStatus {
        pub target: ReplyTarget,
        pub result: ResourcePackResult,
    }

    /// Which pack a [`ResourcePackStatus`] refers to.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub enum ReplyTarget {
        /// Identifier echoed from an [`AddResourcePack`][super::clientbound::AddResourcePack].
        Identifier(String),
        /// Hash echoed from a [`ResourcePackSend`][super::clientbound::ResourcePackSend].
        Hash(String),
        /// Not tied to a particular push.
        Unspecified,
    }

    impl fmt::Display for ReplyTarget {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ReplyTarget::Identifier(identifier) => write!(f, "identifier={}", identifier),
                ReplyTarget::Hash(hash) => write!(f, "hash={:?}", hash),
                ReplyTarget::Unspecified => f.write_str("unspecified"),
            }
        }
    }

    /// Status codes a client may report for a pushed resource pack.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    #[repr(i32)]
    pub enum ResourcePackResult {
        SuccessfullyLoaded = 0,
        Declined = 1,
        FailedDownload = 2,
        Accepted = 3,
        Downloaded = 4,
        InvalidUrl = 5,
        FailedReload = 6,
        Discarded = 7,
    }

    impl ResourcePackResult {
        /// Wire value of this result.
        pub fn code(self) -> i32 {
            self as i32
        }

        pub fn from_code(code: i32) -> Option<Self> {
            Some(match code {
                0 => Self::SuccessfullyLoaded,
                1 => Self::Declined,
                2 => Self::FailedDownload,
                3 => Self::Accepted,
                4 => Self::Downloaded,
                5 => Self::InvalidUrl,
                6 => Self::FailedReload,
                7 => Self::Discarded,
                _ => return None,
            })
        }
    }

    impl fmt::Display for ResourcePackResult {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

#[cfg(test)]
mod test {
    use super::serverbound::ResourcePackResult;

    #[test]
    fn result_codes_match_protocol() {
        assert_eq!(ResourcePackResult::SuccessfullyLoaded.code(), 0);
        assert_eq!(ResourcePackResult::Declined.code(), 1);
        assert_eq!(ResourcePackResult::FailedDownload.code(), 2);
        assert_eq!(ResourcePackResult::Accepted.code(), 3);
        assert_eq!(ResourcePackResult::Downloaded.code(), 4);
        assert_eq!(ResourcePackResult::Discarded.code(), 7);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(
            ResourcePackResult::from_code(6),
            Some(ResourcePackResult::FailedReload)
        );
        assert_eq!(ResourcePackResult::from_code(8), None);
        assert_eq!(ResourcePackResult::from_code(-1), None);
    }
}
