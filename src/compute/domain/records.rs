//! Records returned by the compute backend.

use super::{
    Classification, DeviceName, FlavorName, ImageRef, InstanceId, LifecycleSnapshot, StateMapper,
    UnknownStateError, VolumeId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance type known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flavor {
    /// Backend flavor identifier.
    pub id: String,
    /// Flavor name.
    pub name: FlavorName,
}

impl Flavor {
    /// Creates a flavor.
    #[must_use]
    pub fn new(id: impl Into<String>, name: FlavorName) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }
}

/// Backend view of a compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Instance identifier.
    pub id: InstanceId,
    /// Display name.
    pub display_name: Option<String>,
    /// Flavor the instance runs with.
    pub flavor: Flavor,
    /// Image the instance was booted or rebuilt from.
    pub image: ImageRef,
    /// Raw lifecycle tag as reported by the backend.
    pub state_tag: String,
    /// Whether the underlying instance is paused or suspended.
    pub frozen: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl InstanceRecord {
    /// Parses the raw lifecycle tag into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStateError`] when the backend reports a tag outside
    /// the known lifecycle domain.
    pub fn lifecycle(&self) -> Result<LifecycleSnapshot, UnknownStateError> {
        LifecycleSnapshot::parse(&self.state_tag, self.frozen)
    }

    /// Classifies the instance's current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStateError`] when the lifecycle tag cannot be
    /// classified.
    pub fn classify(&self) -> Result<Classification, UnknownStateError> {
        StateMapper::classify(self.lifecycle()?)
    }
}

/// Backend view of a block storage volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Volume identifier.
    pub id: VolumeId,
    /// Size in GiB.
    pub size_gb: u32,
    /// Current attachment, if any.
    pub attachment: Option<VolumeAttachment>,
}

/// Attachment of a volume to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    /// Instance the volume is attached to.
    pub instance_id: InstanceId,
    /// Guest device name.
    pub device: DeviceName,
}

/// Remote console connection details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Console {
    /// Console protocol, for example `novnc`.
    pub kind: String,
    /// Connection URL.
    pub url: String,
}
