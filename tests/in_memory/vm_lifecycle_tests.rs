//! In-memory integration tests for VM lifecycle operations.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::helpers::{BOOT_IMAGE, Cloud, compute_entity, ctx, seeded_cloud};
use nova_occi::compute::{
    domain::{
        Action, ComputeEntity, ImageRef, InstanceId, Mixin, NormalizedState, RestartMethod,
        SecurityContext,
    },
    ports::ComputeBackendError,
    services::{ActionOutcome, ActionRequest, ErrorKind, GlueConfig, VmServiceError},
};
use rstest::rstest;

async fn launch(cloud: &Cloud, ctx: &SecurityContext) -> Result<InstanceId, eyre::Report> {
    let instance = cloud
        .vms
        .create(ctx, &compute_entity("web-1", "m1.small"))
        .await?;
    Ok(instance.id)
}

async fn state_of(
    cloud: &Cloud,
    ctx: &SecurityContext,
    instance_id: InstanceId,
) -> Result<NormalizedState, eyre::Report> {
    Ok(cloud.vms.occi_state(ctx, instance_id).await?.state())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_vm_is_active_with_generated_password(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance = cloud
        .vms
        .create(&ctx, &compute_entity("web-1", "m1.small"))
        .await?;

    eyre::ensure!(instance.display_name.as_deref() == Some("web-1"));
    eyre::ensure!(instance.flavor.name.as_str() == "m1.small");
    let password = cloud
        .backend
        .admin_password(instance.id)?
        .ok_or_else(|| eyre::eyre!("instance should have a password"))?;
    eyre::ensure!(password.chars().count() == 12, "unexpected password {password}");

    let classification = cloud.vms.occi_state(&ctx, instance.id).await?;
    eyre::ensure!(classification.state() == NormalizedState::Active);
    eyre::ensure!(!classification.permits(Action::Start));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_with_unregistered_image_is_invalid_input(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let entity = ComputeEntity::new().with_mixin(Mixin::OsTemplate {
        term: "fedora".to_owned(),
        os_id: "fedora-40".to_owned(),
    });

    let err = cloud
        .vms
        .create(&ctx, &entity)
        .await
        .expect_err("unregistered image must fail");

    eyre::ensure!(matches!(
        err,
        VmServiceError::Backend(ComputeBackendError::ImageNotFound(_))
    ));
    eyre::ensure!(err.kind() == ErrorKind::InvalidInput);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_then_start_round_trips_through_suspended(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud
        .vms
        .trigger(&ctx, instance_id, ActionRequest::Stop)
        .await?;
    let stopped = cloud.vms.occi_state(&ctx, instance_id).await?;
    eyre::ensure!(stopped.state() == NormalizedState::Suspended);
    eyre::ensure!(stopped.permits(Action::Start));

    cloud
        .vms
        .trigger(&ctx, instance_id, ActionRequest::Start)
        .await?;
    eyre::ensure!(state_of(&cloud, &ctx, instance_id).await? == NormalizedState::Active);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn suspend_pauses_and_start_unpauses(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud
        .vms
        .trigger(&ctx, instance_id, ActionRequest::Suspend)
        .await?;
    let paused = cloud.vms.instance(&ctx, instance_id).await?;
    eyre::ensure!(paused.state_tag == "paused", "got {}", paused.state_tag);

    cloud
        .vms
        .trigger(&ctx, instance_id, ActionRequest::Start)
        .await?;
    eyre::ensure!(state_of(&cloud, &ctx, instance_id).await? == NormalizedState::Active);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn actions_are_refused_in_transitional_states(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;
    cloud.backend.force_state(instance_id, "rebooting", false)?;

    let result = cloud
        .vms
        .trigger(&ctx, instance_id, ActionRequest::Restart(RestartMethod::Cold))
        .await;

    match result {
        Err(err @ VmServiceError::ActionNotPermitted { .. }) => {
            eyre::ensure!(err.status_code() == 409);
            Ok(())
        }
        other => Err(eyre::eyre!("expected ActionNotPermitted, got {other:?}")),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resize_then_revert_restores_flavor(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud.vms.resize(&ctx, instance_id, "m1.medium").await?;
    let resized = cloud.vms.instance(&ctx, instance_id).await?;
    eyre::ensure!(resized.flavor.name.as_str() == "m1.medium");
    eyre::ensure!(state_of(&cloud, &ctx, instance_id).await? == NormalizedState::Inactive);

    cloud.vms.revert_resize(&ctx, instance_id).await?;
    let reverted = cloud.vms.instance(&ctx, instance_id).await?;
    eyre::ensure!(reverted.flavor.name.as_str() == "m1.small");
    eyre::ensure!(reverted.state_tag == "active");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resize_to_current_flavor_is_rejected(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    let err = cloud
        .vms
        .resize(&ctx, instance_id, "m1.small")
        .await
        .expect_err("same-size resize must fail");

    eyre::ensure!(matches!(
        err,
        VmServiceError::Backend(ComputeBackendError::CannotResizeToSameSize(_))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_image_registers_snapshot(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    let outcome = cloud
        .vms
        .trigger(
            &ctx,
            instance_id,
            ActionRequest::CreateImage("nightly".to_owned()),
        )
        .await?;

    let ActionOutcome::ImageCreated(image) = outcome else {
        return Err(eyre::eyre!("expected a created image, got {outcome:?}"));
    };
    eyre::ensure!(image.as_str().starts_with("nightly-"));
    eyre::ensure!(cloud.backend.has_image(&image)?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn change_password_and_rebuild_replace_the_password(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud
        .vms
        .trigger(
            &ctx,
            instance_id,
            ActionRequest::ChangePassword("n3w-Secret".to_owned()),
        )
        .await?;
    eyre::ensure!(cloud.backend.admin_password(instance_id)?.as_deref() == Some("n3w-Secret"));

    cloud
        .vms
        .rebuild(&ctx, instance_id, &ImageRef::new(BOOT_IMAGE)?)
        .await?;
    let rebuilt = cloud.backend.admin_password(instance_id)?;
    eyre::ensure!(rebuilt.as_deref() != Some("n3w-Secret"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn vnc_console_is_only_offered_while_active(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    let console = cloud.vms.vnc_console(&ctx, instance_id).await?;
    eyre::ensure!(console.is_some_and(|found| found.kind == "novnc"));

    cloud.vms.stop(&ctx, instance_id).await?;
    eyre::ensure!(cloud.vms.vnc_console(&ctx, instance_id).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn instances_are_scoped_to_their_project(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;
    let other_tenant = SecurityContext::new("bob", "project-b");
    let admin = SecurityContext::new("root", "project-admin").with_admin(true);

    let err = cloud
        .vms
        .instance(&other_tenant, instance_id)
        .await
        .expect_err("other projects must not see the instance");
    eyre::ensure!(err.kind() == ErrorKind::NotFound);

    cloud.vms.instance(&admin, instance_id).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_soft_deletes_when_reclaim_interval_is_set(
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = Cloud::seeded(GlueConfig::with_reclaim_interval(3600))?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud.vms.delete(&ctx, instance_id).await?;

    eyre::ensure!(cloud.backend.is_soft_deleted(instance_id)?);
    eyre::ensure!(cloud.vms.instance(&ctx, instance_id).await.is_err());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_instance_immediately_by_default(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let instance_id = launch(&cloud, &ctx).await?;

    cloud.vms.delete(&ctx, instance_id).await?;

    eyre::ensure!(!cloud.backend.is_soft_deleted(instance_id)?);
    eyre::ensure!(cloud.backend.admin_password(instance_id)?.is_none());
    Ok(())
}

#[rstest]
fn cloud_refuses_a_configuration_without_password_length() {
    let config = GlueConfig {
        password_length: 0,
        ..GlueConfig::default()
    };

    let result = Cloud::seeded(config);

    assert!(result.is_err(), "zero password length must be rejected");
}
