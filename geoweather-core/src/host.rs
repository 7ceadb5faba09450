use async_trait::async_trait;

/// Result of asking the user for location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    PermanentlyDenied,
    /// The host wants the user told why the permission is needed first.
    RationaleNeeded,
}

/// Platform services the workflow talks to, besides location, network and rendering.
#[async_trait]
pub trait Host: Send + Sync {
    /// Send the user to the place where location can be switched on.
    fn open_location_settings(&self);

    /// Ask for fine and coarse location permission.
    async fn request_location_permission(&self) -> PermissionOutcome;

    /// Explain why location permission is needed and where to grant it.
    fn show_permission_rationale(&self);

    /// Short user-visible message.
    fn notify(&self, message: &str);

    /// Region of the host locale, e.g. `"US"`.
    fn country_code(&self) -> Option<String>;
}
