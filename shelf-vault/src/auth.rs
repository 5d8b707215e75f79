/// The group whose members may use the administrative user directory.
pub const ADMIN_GROUP: &str = "Admin";

/// The group every account falls back to when none is given.
pub const DEFAULT_GROUP: &str = "User";

/// The authenticated identity a caller acts as, passed explicitly into
/// every operation instead of living in process-wide state. The username
/// and group set come from the access-control collaborator and are taken
/// at face value here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
    pub groups: Vec<String>,
}

impl AuthContext {
    pub fn new(
        username: impl Into<String>,
        groups: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            username: username.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|group| group == ADMIN_GROUP)
    }

    /// Whether this identity may touch records owned by `owner`.
    #[must_use]
    pub fn may_act_for(&self, owner: &str) -> bool {
        self.username == owner || self.is_admin()
    }
}
