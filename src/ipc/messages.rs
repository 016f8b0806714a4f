//! Frames exchanged between views and the sync hub

use serde::{Deserialize, Serialize};

use crate::preference::{StorageChange, ViewId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// First frame of every connection
    Register(ViewId),

    /// A view changed a stored key; relayed to every other view
    PreferenceChanged(StorageChange),

    /// Health check; the hub answers once it has handled everything sent before
    Ping,

    Pong,
}
