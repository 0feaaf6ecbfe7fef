//! OCCI compute entity input and launch-parameter extraction.
//!
//! Only the parts of the OCCI model needed to launch an instance are
//! represented: the attribute map and the mixins attached to the entity.

use super::{ComputeDomainError, Flavor, FlavorName, ImageRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Hostname attribute of an OCCI compute resource.
pub const ATTR_HOSTNAME: &str = "occi.compute.hostname";
/// Key pair name attribute of the OpenStack key pair extension.
pub const ATTR_KEY_PAIR_NAME: &str = "org.openstack.credentials.publickey.name";
/// Public key data attribute of the OpenStack key pair extension.
pub const ATTR_KEY_PAIR_DATA: &str = "org.openstack.credentials.publickey.data";
/// Admin password attribute of the OpenStack admin password extension.
pub const ATTR_ADMIN_PASSWORD: &str = "org.openstack.credentials.admin_pwd";
/// IP family attribute (`ipv4` or `ipv6`) of the OpenStack access IP extension.
pub const ATTR_ACCESS_IP_VERSION: &str = "org.openstack.network.access.version";
/// Address attribute of the OpenStack access IP extension.
pub const ATTR_ACCESS_IP: &str = "org.openstack.network.access.ip";

/// Mixin attached to an OCCI compute entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mixin {
    /// Resource template naming a flavor.
    ResourceTemplate {
        /// Template term, equal to the flavor name.
        term: String,
    },
    /// OS template naming an image.
    OsTemplate {
        /// Template term.
        term: String,
        /// Backend image identifier.
        os_id: String,
    },
    /// OpenStack key pair extension.
    KeyPair,
    /// OpenStack admin password extension.
    AdminPassword,
    /// OpenStack access IP extension.
    AccessIp,
    /// Security group the instance should join.
    SecurityGroup {
        /// Security group name.
        term: String,
    },
    /// Any other mixin; ignored during extraction.
    Other {
        /// Category scheme.
        scheme: String,
        /// Category term.
        term: String,
    },
}

/// Compute entity as received from the OCCI front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeEntity {
    attributes: BTreeMap<String, String>,
    mixins: Vec<Mixin>,
}

impl ComputeEntity {
    /// Creates an entity with no attributes and no mixins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any previous value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a mixin.
    #[must_use]
    pub fn with_mixin(mut self, mixin: Mixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the attached mixins.
    #[must_use]
    pub fn mixins(&self) -> &[Mixin] {
        &self.mixins
    }

    fn required(&self, name: &'static str) -> Result<&str, ComputeDomainError> {
        self.attribute(name)
            .ok_or(ComputeDomainError::MissingAttribute(name))
    }
}

/// Public key credentials injected into the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Key pair name.
    pub name: String,
    /// Public key material.
    pub data: String,
}

/// Externally reachable address requested for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version", content = "address", rename_all = "snake_case")]
pub enum AccessIp {
    /// IPv4 access address.
    Ipv4(Ipv4Addr),
    /// IPv6 access address.
    Ipv6(Ipv6Addr),
}

impl AccessIp {
    fn from_attributes(entity: &ComputeEntity) -> Result<Self, ComputeDomainError> {
        let version = entity.required(ATTR_ACCESS_IP_VERSION)?;
        let address = entity.required(ATTR_ACCESS_IP)?;
        let invalid_address = || ComputeDomainError::InvalidAttribute {
            attribute: ATTR_ACCESS_IP,
            value: address.to_owned(),
        };
        match version.trim().to_ascii_lowercase().as_str() {
            "ipv4" => address
                .trim()
                .parse()
                .map(Self::Ipv4)
                .map_err(|_| invalid_address()),
            "ipv6" => address
                .trim()
                .parse()
                .map(Self::Ipv6)
                .map_err(|_| invalid_address()),
            _ => Err(ComputeDomainError::InvalidAttribute {
                attribute: ATTR_ACCESS_IP_VERSION,
                value: version.to_owned(),
            }),
        }
    }
}

/// Launch parameters extracted from a compute entity, before flavor and
/// password defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    display_name: Option<String>,
    flavor: Option<FlavorName>,
    image: ImageRef,
    key_pair: Option<KeyPair>,
    admin_password: Option<String>,
    access_ip: Option<AccessIp>,
    security_groups: Vec<String>,
}

impl LaunchSpec {
    /// Extracts launch parameters from an entity's mixins and attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeDomainError`] when the OS template is missing, a
    /// template family appears more than once, or a mixin's required
    /// attributes are missing or malformed.
    pub fn from_entity(entity: &ComputeEntity) -> Result<Self, ComputeDomainError> {
        let mut resource_terms = Vec::new();
        let mut os_ids = Vec::new();
        let mut key_pair = None;
        let mut admin_password = None;
        let mut access_ip = None;
        let mut security_groups = Vec::new();

        for mixin in entity.mixins() {
            match mixin {
                Mixin::ResourceTemplate { term } => resource_terms.push(term.as_str()),
                Mixin::OsTemplate { os_id, .. } => os_ids.push(os_id.as_str()),
                Mixin::KeyPair => {
                    key_pair = Some(KeyPair {
                        name: entity.required(ATTR_KEY_PAIR_NAME)?.to_owned(),
                        data: entity.required(ATTR_KEY_PAIR_DATA)?.to_owned(),
                    });
                }
                Mixin::AdminPassword => {
                    let password = entity.required(ATTR_ADMIN_PASSWORD)?;
                    if password.is_empty() {
                        return Err(ComputeDomainError::EmptyPassword);
                    }
                    admin_password = Some(password.to_owned());
                }
                Mixin::AccessIp => access_ip = Some(AccessIp::from_attributes(entity)?),
                Mixin::SecurityGroup { term } => security_groups.push(term.clone()),
                Mixin::Other { .. } => {}
            }
        }

        let flavor = match single("resource", &resource_terms)? {
            Some(term) if !term.trim().is_empty() => Some(FlavorName::new(term)?),
            _ => None,
        };
        let os_id = single("os", &os_ids)?.ok_or(ComputeDomainError::MissingOsTemplate)?;
        let image = ImageRef::new(os_id)?;

        Ok(Self {
            display_name: entity.attribute(ATTR_HOSTNAME).map(str::to_owned),
            flavor,
            image,
            key_pair,
            admin_password,
            access_ip,
            security_groups,
        })
    }

    /// Returns the requested flavor, if a resource template was supplied.
    #[must_use]
    pub const fn flavor(&self) -> Option<&FlavorName> {
        self.flavor.as_ref()
    }

    /// Returns the requested image.
    #[must_use]
    pub const fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Returns the requested display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the explicitly requested admin password.
    #[must_use]
    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }

    /// Returns the requested access IP.
    #[must_use]
    pub const fn access_ip(&self) -> Option<AccessIp> {
        self.access_ip
    }

    /// Returns the requested key pair.
    #[must_use]
    pub const fn key_pair(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    /// Returns the requested security groups in mixin order.
    #[must_use]
    pub fn security_groups(&self) -> &[String] {
        &self.security_groups
    }

    /// Completes the spec with a resolved flavor; `generate_password` is
    /// only called when no admin password was requested.
    #[must_use]
    pub fn into_request(
        self,
        flavor: Flavor,
        generate_password: impl FnOnce() -> String,
    ) -> LaunchRequest {
        LaunchRequest {
            display_name: self.display_name,
            flavor,
            image: self.image,
            key_pair: self.key_pair,
            admin_password: self.admin_password.unwrap_or_else(generate_password),
            access_ip: self.access_ip,
            security_groups: self.security_groups,
            min_count: 1,
            max_count: 1,
        }
    }
}

/// Returns the only element of `items`, or `None` when it is empty.
fn single<'a>(
    family: &'static str,
    items: &[&'a str],
) -> Result<Option<&'a str>, ComputeDomainError> {
    match items {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        _ => Err(ComputeDomainError::DuplicateTemplate {
            family,
            count: items.len(),
        }),
    }
}

/// Fully resolved instance launch request sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Display name (also used as description).
    pub display_name: Option<String>,
    /// Resolved flavor.
    pub flavor: Flavor,
    /// Image to boot from.
    pub image: ImageRef,
    /// Injected key pair.
    pub key_pair: Option<KeyPair>,
    /// Admin password.
    pub admin_password: String,
    /// Access IP.
    pub access_ip: Option<AccessIp>,
    /// Security groups to join.
    pub security_groups: Vec<String>,
    /// Minimum number of instances to launch.
    pub min_count: u32,
    /// Maximum number of instances to launch.
    pub max_count: u32,
}
