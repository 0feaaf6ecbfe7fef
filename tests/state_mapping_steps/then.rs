//! Then steps for OCCI state mapping BDD scenarios.

use super::world::{StateMappingWorld, run_async};
use nova_occi::compute::{
    domain::{Action, ActionSet, Classification, NormalizedState},
    services::VmServiceError,
};
use rstest_bdd_macros::then;

fn classification(world: &StateMappingWorld) -> Result<&Classification, eyre::Report> {
    match world.last_classification.as_ref() {
        Some(Ok(classification)) => Ok(classification),
        Some(Err(err)) => Err(eyre::eyre!("classification failed: {err}")),
        None => Err(eyre::eyre!("missing classification result")),
    }
}

#[then(r#"the normalized state is "{state}""#)]
fn normalized_state_is(world: &StateMappingWorld, state: String) -> Result<(), eyre::Report> {
    let expected = NormalizedState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let actual = classification(world)?.state();
    eyre::ensure!(actual == expected, "expected state {expected}, found {actual}");
    Ok(())
}

#[then(r#"the permitted actions are "{actions}""#)]
fn permitted_actions_are(world: &StateMappingWorld, actions: String) -> Result<(), eyre::Report> {
    let expected = actions
        .split(',')
        .map(|item| Action::try_from(item.trim()))
        .collect::<Result<ActionSet, _>>()
        .map_err(|err| eyre::eyre!("invalid expected action in scenario: {err}"))?;
    let actual = classification(world)?.actions();
    eyre::ensure!(
        *actual == expected,
        "expected actions {expected}, found {actual}"
    );
    Ok(())
}

#[then("no actions are permitted")]
fn no_actions_are_permitted(world: &StateMappingWorld) -> Result<(), eyre::Report> {
    let actual = classification(world)?.actions();
    eyre::ensure!(actual.is_empty(), "expected no actions, found {actual}");
    Ok(())
}

#[then("classification fails with an unknown state error")]
fn classification_fails_with_unknown_state(
    world: &StateMappingWorld,
) -> Result<(), eyre::Report> {
    let result = world
        .last_classification
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing classification result"))?;
    eyre::ensure!(result.is_err(), "expected UnknownState error, got {result:?}");
    Ok(())
}

#[then("the action is accepted")]
fn action_is_accepted(world: &StateMappingWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_trigger_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing trigger result"))?;
    eyre::ensure!(result.is_ok(), "expected accepted action, got {result:?}");
    Ok(())
}

#[then("the action is refused as not permitted")]
fn action_is_refused(world: &StateMappingWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_trigger_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing trigger result"))?;
    eyre::ensure!(
        matches!(result, Err(VmServiceError::ActionNotPermitted { .. })),
        "expected ActionNotPermitted error, got {result:?}"
    );
    Ok(())
}

#[then(r#"the VM's OCCI state is "{state}""#)]
fn vm_occi_state_is(world: &StateMappingWorld, state: String) -> Result<(), eyre::Report> {
    let expected = NormalizedState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let instance_id = world.instance_id()?;
    let actual = run_async(world.service.occi_state(&world.ctx, instance_id))?.state();
    eyre::ensure!(actual == expected, "expected state {expected}, found {actual}");
    Ok(())
}

#[then(r#"the VM permits the "{name}" action"#)]
fn vm_permits_action(world: &StateMappingWorld, name: String) -> Result<(), eyre::Report> {
    let action = Action::try_from(name.as_str())
        .map_err(|err| eyre::eyre!("invalid action in scenario: {err}"))?;
    let instance_id = world.instance_id()?;
    let classification = run_async(world.service.occi_state(&world.ctx, instance_id))?;
    eyre::ensure!(
        classification.permits(action),
        "expected {action} to be permitted, found {}",
        classification.actions()
    );
    Ok(())
}
