//! When steps for OCCI state mapping BDD scenarios.

use super::world::{StateMappingWorld, run_async};
use nova_occi::compute::{
    domain::{Action, RestartMethod, StateMapper},
    services::ActionRequest,
};
use rstest_bdd_macros::when;

#[when("the tag is classified")]
fn tag_is_classified(world: &mut StateMappingWorld) -> Result<(), eyre::Report> {
    let tag = world
        .pending_tag
        .as_deref()
        .ok_or_else(|| eyre::eyre!("missing lifecycle tag in scenario world"))?;
    world.last_classification = Some(StateMapper::classify_tag(tag, world.frozen));
    Ok(())
}

#[when(r#"the "{name}" action is triggered"#)]
fn action_is_triggered(world: &mut StateMappingWorld, name: String) -> Result<(), eyre::Report> {
    let instance_id = world.instance_id()?;
    let action = Action::try_from(name.as_str())
        .map_err(|err| eyre::eyre!("invalid action in scenario: {err}"))?;
    let request = match action {
        Action::Start => ActionRequest::Start,
        Action::Stop => ActionRequest::Stop,
        Action::Suspend => ActionRequest::Suspend,
        Action::Restart => ActionRequest::Restart(RestartMethod::Graceful),
        Action::ConfirmResize => ActionRequest::ConfirmResize,
        Action::RevertResize => ActionRequest::RevertResize,
        Action::ChangePassword => ActionRequest::ChangePassword("bdd-Secret9".to_owned()),
        Action::CreateImage => ActionRequest::CreateImage("bdd-snapshot".to_owned()),
    };
    let result = run_async(world.service.trigger(&world.ctx, instance_id, request));
    world.last_trigger_result = Some(result);
    Ok(())
}
