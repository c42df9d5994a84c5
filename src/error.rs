/// Non-fatal failure kinds. Each one is logged and the app carries on with whatever
/// in-memory state resulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    StoreLoad,
    Fetch,
    Save,
    NotificationAuth,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::StoreLoad => "store_load_failure",
            FailureKind::Fetch => "fetch_failure",
            FailureKind::Save => "save_failure",
            FailureKind::NotificationAuth => "notification_auth_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
