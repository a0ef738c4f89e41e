//! Host runtime information port.

/// Read-only facts about the running host session.
#[cfg_attr(test, mockall::automock)]
pub trait HostInfoPort: Send + Sync {
    /// Installed version of this system.
    fn system_version(&self) -> String;
    /// Installed version of an add-on module, if it is installed.
    fn module_version(&self, package: &str) -> Option<String>;
    /// Display title of an add-on module.
    fn module_title(&self, package: &str) -> Option<String>;
    /// Whether the current user has game-master privileges.
    fn user_is_gm(&self) -> bool;
}
