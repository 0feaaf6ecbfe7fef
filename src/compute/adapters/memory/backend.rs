//! In-memory compute backend for lifecycle tests.

use crate::compute::{
    domain::{
        Console, DeviceName, Flavor, FlavorName, ImageRef, InstanceId, InstanceRecord,
        LaunchRequest, LifecycleState, RebootType, SecurityContext, VolumeAttachment, VolumeId,
        VolumeRecord,
    },
    ports::{ComputeBackend, ComputeBackendError, ComputeBackendResult},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory compute backend.
///
/// Lifecycle operations complete synchronously: a `pause` leaves the
/// instance `paused` rather than `pausing`. Transitional tags can be forced
/// with [`InMemoryComputeBackend::force_state`]. Instances and volumes are
/// scoped to the project of the creating [`SecurityContext`]; admin contexts
/// see every project.
pub struct InMemoryComputeBackend<C>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryComputeState>>,
    clock: Arc<C>,
}

impl<C> Clone for InMemoryComputeBackend<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryComputeState {
    instances: HashMap<InstanceId, StoredInstance>,
    flavors: Vec<Flavor>,
    images: HashSet<ImageRef>,
    volumes: HashMap<VolumeId, StoredVolume>,
}

#[derive(Debug, Clone)]
struct StoredInstance {
    project_id: String,
    record: InstanceRecord,
    admin_password: String,
    previous_flavor: Option<Flavor>,
    soft_deleted: bool,
}

impl StoredInstance {
    fn visible_to(&self, ctx: &SecurityContext) -> bool {
        !self.soft_deleted && (ctx.is_admin() || self.project_id == ctx.project_id())
    }

    fn is_in(&self, states: &[LifecycleState]) -> bool {
        LifecycleState::try_from(self.record.state_tag.as_str())
            .is_ok_and(|state| states.contains(&state))
    }

    fn require(&self, states: &[LifecycleState]) -> ComputeBackendResult<()> {
        if self.is_in(states) {
            return Ok(());
        }
        Err(ComputeBackendError::InvalidInstanceState {
            instance_id: self.record.id,
            state: self.record.state_tag.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct StoredVolume {
    project_id: String,
    record: VolumeRecord,
}

impl StoredVolume {
    fn visible_to(&self, ctx: &SecurityContext) -> bool {
        ctx.is_admin() || self.project_id == ctx.project_id()
    }
}

fn lock_error(err: impl ToString) -> ComputeBackendError {
    ComputeBackendError::runtime(std::io::Error::other(err.to_string()))
}

impl<C> InMemoryComputeBackend<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty backend using the given clock for timestamps.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryComputeState::default())),
            clock,
        }
    }

    fn read_state(&self) -> ComputeBackendResult<RwLockReadGuard<'_, InMemoryComputeState>> {
        self.state.read().map_err(lock_error)
    }

    fn write_state(&self) -> ComputeBackendResult<RwLockWriteGuard<'_, InMemoryComputeState>> {
        self.state.write().map_err(lock_error)
    }

    /// Registers a flavor.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn add_flavor(&self, flavor: Flavor) -> ComputeBackendResult<()> {
        let mut state = self.write_state()?;
        state.flavors.retain(|known| known.name != flavor.name);
        state.flavors.push(flavor);
        Ok(())
    }

    /// Registers a bootable image.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn add_image(&self, image: ImageRef) -> ComputeBackendResult<()> {
        self.write_state()?.images.insert(image);
        Ok(())
    }

    /// Creates an unattached volume in the context's project.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn add_volume(&self, ctx: &SecurityContext, size_gb: u32) -> ComputeBackendResult<VolumeId> {
        let volume_id = VolumeId::new();
        let stored = StoredVolume {
            project_id: ctx.project_id().to_owned(),
            record: VolumeRecord {
                id: volume_id,
                size_gb,
                attachment: None,
            },
        };
        self.write_state()?.volumes.insert(volume_id, stored);
        Ok(volume_id)
    }

    /// Overrides the lifecycle tag and frozen flag of an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::InstanceNotFound`] when the instance
    /// does not exist, or runtime errors when lock acquisition fails.
    pub fn force_state(
        &self,
        instance_id: InstanceId,
        state_tag: impl Into<String>,
        frozen: bool,
    ) -> ComputeBackendResult<()> {
        let now = self.clock.utc();
        let mut state = self.write_state()?;
        let stored = state
            .instances
            .get_mut(&instance_id)
            .ok_or(ComputeBackendError::InstanceNotFound(instance_id))?;
        stored.record.state_tag = state_tag.into();
        stored.record.frozen = frozen;
        stored.record.updated_at = now;
        Ok(())
    }

    /// Returns the current admin password of an instance.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn admin_password(&self, instance_id: InstanceId) -> ComputeBackendResult<Option<String>> {
        Ok(self
            .read_state()?
            .instances
            .get(&instance_id)
            .map(|stored| stored.admin_password.clone()))
    }

    /// Returns whether an instance has been soft deleted.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn is_soft_deleted(&self, instance_id: InstanceId) -> ComputeBackendResult<bool> {
        Ok(self
            .read_state()?
            .instances
            .get(&instance_id)
            .is_some_and(|stored| stored.soft_deleted))
    }

    /// Returns whether an image is registered.
    ///
    /// # Errors
    ///
    /// Returns backend runtime errors when lock acquisition fails.
    pub fn has_image(&self, image: &ImageRef) -> ComputeBackendResult<bool> {
        Ok(self.read_state()?.images.contains(image))
    }

    /// Applies `mutate` to a visible instance and refreshes its timestamp.
    fn update_instance<T>(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        mutate: impl FnOnce(&mut StoredInstance) -> ComputeBackendResult<T>,
    ) -> ComputeBackendResult<T> {
        let now = self.clock.utc();
        let mut state = self.write_state()?;
        let stored = state
            .instances
            .get_mut(&instance_id)
            .filter(|stored| stored.visible_to(ctx))
            .ok_or(ComputeBackendError::InstanceNotFound(instance_id))?;
        let outcome = mutate(stored)?;
        stored.record.updated_at = now;
        Ok(outcome)
    }

    /// Moves an instance from one of `from` into `to`.
    fn transition(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        from: &[LifecycleState],
        to: LifecycleState,
        frozen: bool,
    ) -> ComputeBackendResult<()> {
        self.update_instance(ctx, instance_id, |stored| {
            stored.require(from)?;
            stored.record.state_tag = to.as_str().to_owned();
            stored.record.frozen = frozen;
            Ok(())
        })
    }
}

#[async_trait]
impl<C> ComputeBackend for InMemoryComputeBackend<C>
where
    C: Clock + Send + Sync,
{
    async fn get(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<InstanceRecord> {
        self.read_state()?
            .instances
            .get(&instance_id)
            .filter(|stored| stored.visible_to(ctx))
            .map(|stored| stored.record.clone())
            .ok_or(ComputeBackendError::InstanceNotFound(instance_id))
    }

    async fn create(
        &self,
        ctx: &SecurityContext,
        request: &LaunchRequest,
    ) -> ComputeBackendResult<InstanceRecord> {
        let now = self.clock.utc();
        let mut state = self.write_state()?;
        if !state.images.contains(&request.image) {
            return Err(ComputeBackendError::ImageNotFound(request.image.clone()));
        }

        let record = InstanceRecord {
            id: InstanceId::new(),
            display_name: request.display_name.clone(),
            flavor: request.flavor.clone(),
            image: request.image.clone(),
            state_tag: LifecycleState::Active.as_str().to_owned(),
            frozen: false,
            created_at: now,
            updated_at: now,
        };
        state.instances.insert(
            record.id,
            StoredInstance {
                project_id: ctx.project_id().to_owned(),
                record: record.clone(),
                admin_password: request.admin_password.clone(),
                previous_flavor: None,
                soft_deleted: false,
            },
        );
        Ok(record)
    }

    async fn rebuild(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image: &ImageRef,
        admin_password: &str,
    ) -> ComputeBackendResult<()> {
        if !self.read_state()?.images.contains(image) {
            return Err(ComputeBackendError::ImageNotFound(image.clone()));
        }
        self.update_instance(ctx, instance_id, |stored| {
            stored.require(&[LifecycleState::Active])?;
            stored.record.image = image.clone();
            admin_password.clone_into(&mut stored.admin_password);
            Ok(())
        })
    }

    async fn find_flavor(
        &self,
        _ctx: &SecurityContext,
        name: &FlavorName,
    ) -> ComputeBackendResult<Flavor> {
        self.read_state()?
            .flavors
            .iter()
            .find(|flavor| flavor.name == *name)
            .cloned()
            .ok_or_else(|| ComputeBackendError::FlavorNotFound(name.clone()))
    }

    async fn resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        flavor_id: &str,
    ) -> ComputeBackendResult<()> {
        let target = self
            .read_state()?
            .flavors
            .iter()
            .find(|flavor| flavor.id == flavor_id)
            .cloned()
            .ok_or_else(|| {
                ComputeBackendError::runtime(std::io::Error::other(format!(
                    "unknown flavor id {flavor_id}"
                )))
            })?;
        self.update_instance(ctx, instance_id, |stored| {
            stored.require(&[LifecycleState::Active])?;
            if stored.record.flavor.id == target.id {
                return Err(ComputeBackendError::CannotResizeToSameSize(instance_id));
            }
            let previous = std::mem::replace(&mut stored.record.flavor, target);
            stored.previous_flavor = Some(previous);
            LifecycleState::Resized
                .as_str()
                .clone_into(&mut stored.record.state_tag);
            Ok(())
        })
    }

    async fn confirm_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.update_instance(ctx, instance_id, |stored| {
            stored
                .previous_flavor
                .take()
                .ok_or(ComputeBackendError::MigrationNotFound(instance_id))?;
            LifecycleState::Active
                .as_str()
                .clone_into(&mut stored.record.state_tag);
            Ok(())
        })
    }

    async fn revert_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.update_instance(ctx, instance_id, |stored| {
            let previous = stored
                .previous_flavor
                .take()
                .ok_or(ComputeBackendError::MigrationNotFound(instance_id))?;
            stored.record.flavor = previous;
            LifecycleState::Active
                .as_str()
                .clone_into(&mut stored.record.state_tag);
            Ok(())
        })
    }

    async fn delete(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        let mut state = self.write_state()?;
        let visible = state
            .instances
            .get(&instance_id)
            .is_some_and(|stored| stored.visible_to(ctx));
        if !visible {
            return Err(ComputeBackendError::InstanceNotFound(instance_id));
        }
        state.instances.remove(&instance_id);
        for volume in state.volumes.values_mut() {
            let attached_here = volume
                .record
                .attachment
                .as_ref()
                .is_some_and(|attachment| attachment.instance_id == instance_id);
            if attached_here {
                volume.record.attachment = None;
            }
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.update_instance(ctx, instance_id, |stored| {
            stored.soft_deleted = true;
            Ok(())
        })
    }

    async fn pause(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.transition(
            ctx,
            instance_id,
            &[LifecycleState::Active],
            LifecycleState::Paused,
            true,
        )
    }

    async fn unpause(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.transition(
            ctx,
            instance_id,
            &[LifecycleState::Paused],
            LifecycleState::Active,
            false,
        )
    }

    async fn suspend(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.transition(
            ctx,
            instance_id,
            &[LifecycleState::Active],
            LifecycleState::Suspended,
            true,
        )
    }

    async fn resume(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()> {
        self.transition(
            ctx,
            instance_id,
            &[LifecycleState::Suspended],
            LifecycleState::Active,
            false,
        )
    }

    async fn snapshot(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image_name: &str,
    ) -> ComputeBackendResult<ImageRef> {
        self.update_instance(ctx, instance_id, |stored| {
            stored.require(&[
                LifecycleState::Active,
                LifecycleState::Paused,
                LifecycleState::Suspended,
            ])
        })?;
        let image = ImageRef::new(format!("{image_name}-{}", Uuid::new_v4()))
            .map_err(ComputeBackendError::runtime)?;
        self.write_state()?.images.insert(image.clone());
        Ok(image)
    }

    async fn reboot(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        reboot_type: RebootType,
    ) -> ComputeBackendResult<()> {
        let allowed: &[LifecycleState] = match reboot_type {
            RebootType::Soft => &[LifecycleState::Active],
            RebootType::Hard => &[
                LifecycleState::Active,
                LifecycleState::Paused,
                LifecycleState::Suspended,
            ],
        };
        self.transition(ctx, instance_id, allowed, LifecycleState::Active, false)
    }

    async fn set_admin_password(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        password: &str,
    ) -> ComputeBackendResult<()> {
        self.update_instance(ctx, instance_id, |stored| {
            stored.require(&[LifecycleState::Active])?;
            password.clone_into(&mut stored.admin_password);
            Ok(())
        })
    }

    async fn vnc_console(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<Console> {
        let record = self.get(ctx, instance_id).await?;
        if record.state_tag != LifecycleState::Active.as_str() {
            return Err(ComputeBackendError::ConsoleUnavailable(instance_id));
        }
        Ok(Console {
            kind: "novnc".to_owned(),
            url: format!("http://127.0.0.1:6080/vnc_auto.html?token={instance_id}"),
        })
    }

    async fn get_volume(
        &self,
        ctx: &SecurityContext,
        volume_id: VolumeId,
    ) -> ComputeBackendResult<VolumeRecord> {
        self.read_state()?
            .volumes
            .get(&volume_id)
            .filter(|stored| stored.visible_to(ctx))
            .map(|stored| stored.record.clone())
            .ok_or(ComputeBackendError::VolumeNotFound(volume_id))
    }

    async fn attach_volume(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        volume_id: VolumeId,
        device: &DeviceName,
    ) -> ComputeBackendResult<()> {
        let mut state = self.write_state()?;
        let instance_visible = state
            .instances
            .get(&instance_id)
            .is_some_and(|stored| stored.visible_to(ctx));
        if !instance_visible {
            return Err(ComputeBackendError::InstanceNotFound(instance_id));
        }
        let volume = state
            .volumes
            .get_mut(&volume_id)
            .filter(|stored| stored.visible_to(ctx))
            .ok_or(ComputeBackendError::VolumeNotFound(volume_id))?;
        if volume.record.attachment.is_some() {
            return Err(ComputeBackendError::VolumeInUse(volume_id));
        }
        volume.record.attachment = Some(VolumeAttachment {
            instance_id,
            device: device.clone(),
        });
        Ok(())
    }

    async fn detach_volume(
        &self,
        ctx: &SecurityContext,
        volume_id: VolumeId,
    ) -> ComputeBackendResult<()> {
        let mut state = self.write_state()?;
        let volume = state
            .volumes
            .get_mut(&volume_id)
            .filter(|stored| stored.visible_to(ctx))
            .ok_or(ComputeBackendError::VolumeNotFound(volume_id))?;
        volume.record.attachment = None;
        Ok(())
    }
}
