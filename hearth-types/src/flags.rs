//! Concrete flag sets.

use crate::bitfield::{BitField, FlagSet};

/// Declares a marker type implementing [`FlagSet`], a `BitField` alias for it,
/// and one associated constant per flag.
macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $marker:ident => $alias:ident {
            $($(#[$flag_meta:meta])* $name:ident = $bit:expr),+ $(,)?
        }
    ) => {
        #[doc = concat!("Marker type carrying the flag mapping of [`", stringify!($alias), "`].")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $marker;

        impl FlagSet for $marker {
            const KIND: &'static str = stringify!($alias);
            const FLAGS: &'static [(&'static str, u64)] = &[$((stringify!($name), $bit)),+];
        }

        $(#[$meta])*
        pub type $alias = BitField<$marker>;

        impl BitField<$marker> {
            $(
                $(#[$flag_meta])*
                pub const $name: Self = Self::new($bit);
            )+
        }
    };
}

flag_set! {
    /// Capabilities attached to an invite.
    InviteFlag => InviteFlags {
        /// The invite grants guest (temporary, voice-only) membership.
        GUEST = 1 << 0,
        /// The invite has been viewed by its recipient.
        VIEWED = 1 << 1,
    }
}

flag_set! {
    /// Public badges on a user profile.
    UserFlag => UserFlags {
        STAFF = 1 << 0,
        PARTNER = 1 << 1,
        HYPESQUAD = 1 << 2,
        BUG_HUNTER_LEVEL_1 = 1 << 3,
        HYPESQUAD_ONLINE_HOUSE_1 = 1 << 6,
        HYPESQUAD_ONLINE_HOUSE_2 = 1 << 7,
        HYPESQUAD_ONLINE_HOUSE_3 = 1 << 8,
        PREMIUM_EARLY_SUPPORTER = 1 << 9,
        TEAM_PSEUDO_USER = 1 << 10,
        BUG_HUNTER_LEVEL_2 = 1 << 14,
        VERIFIED_BOT = 1 << 16,
        VERIFIED_DEVELOPER = 1 << 17,
        CERTIFIED_MODERATOR = 1 << 18,
        BOT_HTTP_INTERACTIONS = 1 << 19,
        ACTIVE_DEVELOPER = 1 << 22,
    }
}

flag_set! {
    /// Behavioural flags on a channel.
    ChannelFlag => ChannelFlags {
        /// The thread is pinned to the top of its parent forum.
        PINNED = 1 << 1,
        /// A tag must be chosen when creating a thread in this forum.
        REQUIRE_TAG = 1 << 4,
        HIDE_MEDIA_DOWNLOAD_OPTIONS = 1 << 15,
    }
}
