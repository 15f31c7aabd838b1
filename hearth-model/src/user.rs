use crate::patch::{PatchDocument, Patchable};
use hearth_types::{Snowflake, UserFlags};

/// A cached user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: Snowflake,
    pub username: Option<String>,
    pub global_name: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub flags: UserFlags,
}

impl User {
    /// `username#discriminator` for legacy accounts, bare username otherwise.
    pub fn tag(&self) -> Option<String> {
        let username = self.username.as_deref()?;
        match self.discriminator.as_deref() {
            Some(disc) if disc != "0" => Some(format!("{username}#{disc}")),
            _ => Some(username.to_string()),
        }
    }

    /// Global display name, falling back to the username.
    pub fn display_name(&self) -> Option<&str> {
        self.global_name.as_deref().or(self.username.as_deref())
    }
}

impl Patchable for User {
    type Id = Snowflake;

    const ID_KEY: &'static str = "id";

    fn id(&self) -> Snowflake {
        self.id
    }

    fn with_id(id: Snowflake) -> Self {
        Self {
            id,
            username: None,
            global_name: None,
            discriminator: None,
            avatar: None,
            bot: false,
            flags: UserFlags::empty(),
        }
    }

    fn patch(&mut self, doc: &PatchDocument) {
        doc.apply("username", &mut self.username);
        doc.apply("global_name", &mut self.global_name);
        doc.apply("discriminator", &mut self.discriminator);
        doc.apply("avatar", &mut self.avatar);
        doc.apply("bot", &mut self.bot);
        doc.apply("public_flags", &mut self.flags);
    }
}
