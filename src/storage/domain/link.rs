//! Storage link endpoints, requests and created links.

use super::StorageLinkDomainError;
use crate::compute::domain::{DeviceName, InstanceId, VolumeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identifier attribute shared by all OCCI entities.
pub const ATTR_CORE_ID: &str = "occi.core.id";
/// Guest device attribute of a storage link.
pub const ATTR_DEVICE_ID: &str = "occi.storagelink.deviceid";
/// Mount point attribute of a storage link.
pub const ATTR_MOUNTPOINT: &str = "occi.storagelink.mountpoint";
/// State attribute of a storage link.
pub const ATTR_LINK_STATE: &str = "occi.storagelink.state";

/// Kind of the resource at one end of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// OCCI compute resource.
    Compute,
    /// OCCI storage resource.
    Storage,
    /// OCCI network resource.
    Network,
}

impl EntityKind {
    /// Returns the kind term.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of an OCCI link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEndpoint {
    /// Resource kind.
    pub kind: EntityKind,
    /// Resource `occi.core.id`.
    pub id: Uuid,
}

impl LinkEndpoint {
    /// Creates a compute endpoint.
    #[must_use]
    pub const fn compute(instance_id: InstanceId) -> Self {
        Self {
            kind: EntityKind::Compute,
            id: instance_id.into_inner(),
        }
    }

    /// Creates a storage endpoint.
    #[must_use]
    pub const fn storage(volume_id: VolumeId) -> Self {
        Self {
            kind: EntityKind::Storage,
            id: volume_id.into_inner(),
        }
    }

    /// Creates an endpoint of any kind.
    #[must_use]
    pub const fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Storage link as submitted by the OCCI front end.
///
/// The compute and storage resources may appear on either end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLinkRequest {
    source: LinkEndpoint,
    target: LinkEndpoint,
    attributes: BTreeMap<String, String>,
}

impl StorageLinkRequest {
    /// Creates a request without attributes.
    #[must_use]
    pub const fn new(source: LinkEndpoint, target: LinkEndpoint) -> Self {
        Self {
            source,
            target,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute, replacing any previous value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the guest device the volume should appear under.
    #[must_use]
    pub fn with_device(self, device: impl Into<String>) -> Self {
        self.with_attribute(ATTR_DEVICE_ID, device)
    }

    /// Returns the link source.
    #[must_use]
    pub const fn source(&self) -> LinkEndpoint {
        self.source
    }

    /// Returns the link target.
    #[must_use]
    pub const fn target(&self) -> LinkEndpoint {
        self.target
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Finds the endpoint of the given kind, preferring the target.
    fn endpoint_of(&self, kind: EntityKind) -> Option<Uuid> {
        [self.target, self.source]
            .into_iter()
            .find(|endpoint| endpoint.kind == kind)
            .map(|endpoint| endpoint.id)
    }

    /// Returns the compute instance the volume is attached to.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkDomainError::InstanceEndpointMissing`] when
    /// neither end is a compute resource.
    pub fn instance_id(&self) -> Result<InstanceId, StorageLinkDomainError> {
        self.endpoint_of(EntityKind::Compute)
            .map(InstanceId::from_uuid)
            .ok_or(StorageLinkDomainError::InstanceEndpointMissing)
    }

    /// Returns the volume to attach.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkDomainError::VolumeEndpointMissing`] when
    /// neither end is a storage resource.
    pub fn volume_id(&self) -> Result<VolumeId, StorageLinkDomainError> {
        self.endpoint_of(EntityKind::Storage)
            .map(VolumeId::from_uuid)
            .ok_or(StorageLinkDomainError::VolumeEndpointMissing)
    }

    /// Returns the requested guest device.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkDomainError::MissingAttribute`] when no device
    /// is given, or [`StorageLinkDomainError::InvalidDevice`] when it is
    /// blank.
    pub fn device(&self) -> Result<DeviceName, StorageLinkDomainError> {
        let device = self
            .attribute(ATTR_DEVICE_ID)
            .ok_or(StorageLinkDomainError::MissingAttribute(ATTR_DEVICE_ID))?;
        Ok(DeviceName::new(device)?)
    }
}

/// Unique identifier of a created storage link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageLinkId(Uuid);

impl StorageLinkId {
    /// Creates a new random link identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for StorageLinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StorageLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attached volume as exposed through the OCCI storage link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLink {
    id: StorageLinkId,
    instance_id: InstanceId,
    volume_id: VolumeId,
    device: DeviceName,
}

impl StorageLink {
    /// Creates a freshly attached link.
    #[must_use]
    pub fn attached(instance_id: InstanceId, volume_id: VolumeId, device: DeviceName) -> Self {
        Self {
            id: StorageLinkId::new(),
            instance_id,
            volume_id,
            device,
        }
    }

    /// Returns the link identifier.
    #[must_use]
    pub const fn id(&self) -> StorageLinkId {
        self.id
    }

    /// Returns the attached instance.
    #[must_use]
    pub const fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Returns the attached volume.
    #[must_use]
    pub const fn volume_id(&self) -> VolumeId {
        self.volume_id
    }

    /// Returns the guest device.
    #[must_use]
    pub const fn device(&self) -> &DeviceName {
        &self.device
    }

    /// Returns the OCCI attributes describing the link.
    ///
    /// The mount point is not known to the backend and is reported empty;
    /// the state is always `active` for an attached link.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (ATTR_CORE_ID, self.id.to_string()),
            (ATTR_DEVICE_ID, self.device.as_str().to_owned()),
            (ATTR_MOUNTPOINT, String::new()),
            (ATTR_LINK_STATE, "active".to_owned()),
        ])
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use crate::compute::domain::ComputeDomainError;
    use rstest::rstest;

    #[rstest]
    fn resolves_endpoints_when_compute_is_source() {
        let instance_id = InstanceId::new();
        let volume_id = VolumeId::new();
        let request = StorageLinkRequest::new(
            LinkEndpoint::compute(instance_id),
            LinkEndpoint::storage(volume_id),
        );

        assert_eq!(request.instance_id(), Ok(instance_id));
        assert_eq!(request.volume_id(), Ok(volume_id));
    }

    #[rstest]
    fn resolves_endpoints_when_compute_is_target() {
        let instance_id = InstanceId::new();
        let volume_id = VolumeId::new();
        let request = StorageLinkRequest::new(
            LinkEndpoint::storage(volume_id),
            LinkEndpoint::compute(instance_id),
        );

        assert_eq!(request.instance_id(), Ok(instance_id));
        assert_eq!(request.volume_id(), Ok(volume_id));
    }

    #[rstest]
    fn missing_endpoints_are_reported() {
        let request = StorageLinkRequest::new(
            LinkEndpoint::new(EntityKind::Network, Uuid::new_v4()),
            LinkEndpoint::new(EntityKind::Network, Uuid::new_v4()),
        );

        assert_eq!(
            request.instance_id(),
            Err(StorageLinkDomainError::InstanceEndpointMissing)
        );
        assert_eq!(
            request.volume_id(),
            Err(StorageLinkDomainError::VolumeEndpointMissing)
        );
    }

    #[rstest]
    #[case(None, StorageLinkDomainError::MissingAttribute(ATTR_DEVICE_ID))]
    #[case(
        Some("   "),
        StorageLinkDomainError::InvalidDevice(ComputeDomainError::EmptyDeviceName)
    )]
    fn device_must_be_present_and_non_blank(
        #[case] device: Option<&str>,
        #[case] expected: StorageLinkDomainError,
    ) {
        let base = || {
            StorageLinkRequest::new(
                LinkEndpoint::compute(InstanceId::new()),
                LinkEndpoint::storage(VolumeId::new()),
            )
        };
        let request = device.map_or_else(base, |value| base().with_device(value));

        assert_eq!(request.device(), Err(expected));
    }

    #[rstest]
    fn attributes_describe_an_active_link() {
        let device = DeviceName::new("/dev/vdb").expect("valid device");
        let link = StorageLink::attached(InstanceId::new(), VolumeId::new(), device);

        let attributes = link.attributes();

        assert_eq!(attributes.get(ATTR_CORE_ID), Some(&link.id().to_string()));
        assert_eq!(
            attributes.get(ATTR_DEVICE_ID).map(String::as_str),
            Some("/dev/vdb")
        );
        assert_eq!(attributes.get(ATTR_MOUNTPOINT).map(String::as_str), Some(""));
        assert_eq!(
            attributes.get(ATTR_LINK_STATE).map(String::as_str),
            Some("active")
        );
    }
}
