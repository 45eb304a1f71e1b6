//! Error type for client construction.

use crate::settings::SettingsError;
use configsync_core::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
