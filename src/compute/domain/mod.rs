//! Domain model for OCCI compute state mapping and launch extraction.
//!
//! The compute domain classifies backend lifecycle tags into OCCI states and
//! permitted actions, and turns OCCI compute entities into launch requests.
//! Backend access stays outside this boundary.

mod action;
mod classify;
mod context;
mod entity;
mod error;
mod ids;
mod lifecycle;
mod records;
mod restart;
mod state;

pub use action::{Action, ActionSet, OCCI_COMPUTE_ACTION_SCHEME, OPENSTACK_ACTION_SCHEME};
pub use classify::{Classification, StateMapper};
pub use context::SecurityContext;
pub use entity::{
    ATTR_ACCESS_IP, ATTR_ACCESS_IP_VERSION, ATTR_ADMIN_PASSWORD, ATTR_HOSTNAME,
    ATTR_KEY_PAIR_DATA, ATTR_KEY_PAIR_NAME, AccessIp, ComputeEntity, KeyPair, LaunchRequest,
    LaunchSpec, Mixin,
};
pub use error::{ComputeDomainError, ParseActionError, ParseNormalizedStateError, UnknownStateError};
pub use ids::{DeviceName, FlavorName, ImageRef, InstanceId, VolumeId};
pub use lifecycle::{LifecycleSnapshot, LifecycleState};
pub use records::{Console, Flavor, InstanceRecord, VolumeAttachment, VolumeRecord};
pub use restart::{RebootType, RestartMethod};
pub use state::NormalizedState;
