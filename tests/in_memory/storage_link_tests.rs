//! In-memory integration tests for storage links.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::helpers::{Cloud, compute_entity, ctx, seeded_cloud};
use nova_occi::compute::{
    domain::{InstanceId, SecurityContext, VolumeId},
    ports::ComputeBackend,
    services::ErrorKind,
};
use nova_occi::storage::{
    domain::{ATTR_DEVICE_ID, ATTR_LINK_STATE, LinkEndpoint, StorageLinkRequest},
    services::StorageLinkServiceError,
};
use rstest::rstest;

async fn instance_and_volume(
    cloud: &Cloud,
    ctx: &SecurityContext,
) -> Result<(InstanceId, VolumeId), eyre::Report> {
    let instance = cloud
        .vms
        .create(ctx, &compute_entity("db-1", "m1.small"))
        .await?;
    let volume_id = cloud.backend.add_volume(ctx, 10)?;
    Ok((instance.id, volume_id))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creating_a_link_attaches_the_volume(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let (instance_id, volume_id) = instance_and_volume(&cloud, &ctx).await?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::compute(instance_id),
        LinkEndpoint::storage(volume_id),
    )
    .with_device("/dev/vdb");

    let link = cloud.links.create(&ctx, &request).await?;

    let attributes = link.attributes();
    eyre::ensure!(attributes.get(ATTR_DEVICE_ID).map(String::as_str) == Some("/dev/vdb"));
    eyre::ensure!(attributes.get(ATTR_LINK_STATE).map(String::as_str) == Some("active"));
    let volume = cloud.backend.get_volume(&ctx, volume_id).await?;
    let attachment = volume
        .attachment
        .ok_or_else(|| eyre::eyre!("volume should be attached"))?;
    eyre::ensure!(attachment.instance_id == instance_id);
    eyre::ensure!(attachment.device.as_str() == "/dev/vdb");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn linking_an_attached_volume_is_a_conflict(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let (instance_id, volume_id) = instance_and_volume(&cloud, &ctx).await?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::storage(volume_id),
        LinkEndpoint::compute(instance_id),
    )
    .with_device("/dev/vdb");
    cloud.links.create(&ctx, &request).await?;

    let err = cloud
        .links
        .create(&ctx, &request.clone().with_device("/dev/vdc"))
        .await
        .expect_err("second attachment must fail");

    eyre::ensure!(err.kind() == ErrorKind::Conflict);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn linking_to_a_missing_instance_is_not_found(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let volume_id = cloud.backend.add_volume(&ctx, 1)?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::compute(InstanceId::new()),
        LinkEndpoint::storage(volume_id),
    )
    .with_device("/dev/vdb");

    let err = cloud
        .links
        .create(&ctx, &request)
        .await
        .expect_err("missing instance must fail");

    eyre::ensure!(err.kind() == ErrorKind::NotFound);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn link_without_device_is_rejected(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let (instance_id, volume_id) = instance_and_volume(&cloud, &ctx).await?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::compute(instance_id),
        LinkEndpoint::storage(volume_id),
    );

    let err = cloud
        .links
        .create(&ctx, &request)
        .await
        .expect_err("link without device must fail");

    eyre::ensure!(matches!(err, StorageLinkServiceError::Domain(_)));
    eyre::ensure!(err.kind() == ErrorKind::InvalidInput);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_link_detaches_the_volume(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let (instance_id, volume_id) = instance_and_volume(&cloud, &ctx).await?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::compute(instance_id),
        LinkEndpoint::storage(volume_id),
    )
    .with_device("/dev/vdb");
    cloud.links.create(&ctx, &request).await?;

    cloud.links.delete(&ctx, &request).await?;

    let volume = cloud.backend.get_volume(&ctx, volume_id).await?;
    eyre::ensure!(volume.attachment.is_none());
    cloud.links.create(&ctx, &request).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_an_instance_releases_its_volumes(
    seeded_cloud: Result<Cloud, eyre::Report>,
    ctx: SecurityContext,
) -> Result<(), eyre::Report> {
    let cloud = seeded_cloud?;
    let (instance_id, volume_id) = instance_and_volume(&cloud, &ctx).await?;
    let request = StorageLinkRequest::new(
        LinkEndpoint::compute(instance_id),
        LinkEndpoint::storage(volume_id),
    )
    .with_device("/dev/vdb");
    cloud.links.create(&ctx, &request).await?;

    cloud.vms.delete(&ctx, instance_id).await?;

    let volume = cloud.backend.get_volume(&ctx, volume_id).await?;
    eyre::ensure!(volume.attachment.is_none());
    Ok(())
}
