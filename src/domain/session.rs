/// Identity of the signed-in user, handed to a chat session explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Session {
    /// Builds a session from optional identity parts. A blank user id means
    /// nobody is signed in.
    pub fn from_parts(user_id: Option<&str>, display_name: Option<&str>) -> Option<Self> {
        let user_id = user_id.map(str::trim).filter(|id| !id.is_empty())?;

        Some(Self {
            user_id: user_id.to_owned(),
            display_name: display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_id_means_no_session() {
        assert_eq!(Session::from_parts(None, Some("Ada")), None);
        assert_eq!(Session::from_parts(Some("   "), Some("Ada")), None);
    }

    #[test]
    fn trims_identity_parts() {
        let session = Session::from_parts(Some(" u-1 "), Some(" Ada ")).expect("session");

        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn blank_display_name_is_dropped() {
        let session = Session::from_parts(Some("u-1"), Some("")).expect("session");

        assert_eq!(session.display_name, None);
    }
}
