//! Tests for applying mutations and running mutator pipelines.

mod common;

use common::{basic_plan, check_version_requirement, v};
use mixedversion::step::RunHookStep;
use mixedversion::{
    ApplyError, ClusterSettingConfig, Mutation, MutatorConfig, SettingValue, SimRng, Step,
    StepId, StepKind, apply_mutations, mutate_plan,
};

fn hook(name: &str) -> Step {
    Step::RunHook(RunHookStep {
        name: name.to_string(),
    })
}

fn hook_names(steps: &[mixedversion::PlanStep]) -> Vec<String> {
    steps
        .iter()
        .filter_map(|s| match &s.step {
            Step::RunHook(h) => Some(h.name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn insert_before_and_after_land_next_to_anchor() {
    let plan = basic_plan(1, 3);
    let anchor = plan.upgrades[0].steps[2].clone();

    let mutated = apply_mutations(
        &plan,
        &[
            Mutation::insert_before(anchor.clone(), hook("before")),
            Mutation::insert_after(anchor.clone(), hook("after")),
        ],
    )
    .unwrap();

    let steps = &mutated.upgrades[0].steps;
    let at = steps.iter().position(|s| s.id == anchor.id).unwrap();
    assert_eq!(steps[at - 1].step, hook("before"));
    assert_eq!(steps[at + 1].step, hook("after"));

    // Inserted steps run against the anchor's topology.
    assert_eq!(steps[at - 1].context, anchor.context);
    assert_eq!(steps[at + 1].context, anchor.context);
}

#[test]
fn repeated_insert_after_keeps_sequence_order() {
    let plan = basic_plan(1, 4);
    let anchor = plan.upgrades[0].steps[1].clone();

    let mutations: Vec<Mutation> = ["a", "b", "c"]
        .iter()
        .map(|name| Mutation::insert_after(anchor.clone(), hook(name)))
        .collect();
    let mutated = apply_mutations(&plan, &mutations).unwrap();

    let steps = &mutated.upgrades[0].steps;
    let at = steps.iter().position(|s| s.id == anchor.id).unwrap();
    let names = hook_names(&steps[at + 1..at + 4]);
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn inserted_steps_get_fresh_ids() {
    let plan = basic_plan(2, 5);
    let anchor = plan.upgrades[1].steps[0].clone();
    let mutated =
        apply_mutations(&plan, &[Mutation::insert_before(anchor, hook("x"))]).unwrap();

    let mut ids: Vec<StepId> = mutated.steps().map(|s| s.id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert_eq!(total, plan.len() + 1);
}

#[test]
fn missing_anchor_is_an_error() {
    let plan = basic_plan(1, 6);
    let mut ghost = plan.upgrades[0].steps[0].clone();
    ghost.id = StepId::new(10_000);

    let result = apply_mutations(&plan, &[Mutation::insert_before(ghost, hook("x"))]);
    assert_eq!(result, Err(ApplyError::StepNotFound(StepId::new(10_000))));
}

#[test]
fn inserting_next_to_a_removed_step_fails() {
    let plan = basic_plan(1, 7);
    let target = plan.upgrades[0].steps[3].clone();

    let result = apply_mutations(
        &plan,
        &[
            Mutation::remove(target.clone()),
            Mutation::insert_before(target.clone(), hook("x")),
        ],
    );
    assert_eq!(result, Err(ApplyError::StepNotFound(target.id)));
}

#[test]
fn base_plan_is_left_untouched() {
    let plan = basic_plan(2, 8);
    let snapshot = plan.clone();
    let target = plan.upgrades[0].steps[1].clone();

    let mutated = apply_mutations(&plan, &[Mutation::remove(target)]).unwrap();
    assert_eq!(plan, snapshot);
    assert_eq!(mutated.len(), plan.len() - 1);
}

#[test]
fn mutate_plan_runs_configured_mutators() {
    let config = MutatorConfig {
        seed: Some(77),
        preserve_downgrade_option: true,
        cluster_settings: vec![ClusterSettingConfig {
            name: "kv.rangefeed.enabled".to_string(),
            values: vec![SettingValue::Bool(true), SettingValue::Bool(false)],
            min_version: Some(v("v23.2.12")),
            max_changes: 6,
        }],
    };
    let mutators = config.mutators().unwrap();
    assert_eq!(mutators.len(), 2);

    let plan = basic_plan(4, 9);
    let (mut rng, seed) = config.rng();
    assert_eq!(seed, 77);
    let mutated = mutate_plan(&plan, &mutators, &mut rng).unwrap();

    assert_eq!(
        mutated.count(StepKind::AllowUpgrade),
        plan.count(StepKind::AllowUpgrade)
    );
    let changes = mutated.setting_changes("kv.rangefeed.enabled").count();
    assert!((1..=6).contains(&changes));
    assert_eq!(mutated.len(), plan.len() + changes);

    // Every injected change runs where a node can service it.
    let min = v("v23.2.12");
    for step in mutated.setting_changes("kv.rangefeed.enabled") {
        let probe = Mutation::insert_before(step.clone(), step.step.clone());
        check_version_requirement(Some(&min), &probe).unwrap();
    }

    // Same seed, same result.
    let (mut again, _) = config.rng();
    assert_eq!(mutate_plan(&plan, &mutators, &mut again).unwrap(), mutated);

    // Different seed, very likely a different plan; at minimum still valid.
    let mut other = SimRng::new(78);
    assert!(mutate_plan(&plan, &mutators, &mut other).is_ok());
}

#[test]
fn invalid_config_entries_fail_fast() {
    let config = MutatorConfig {
        seed: None,
        preserve_downgrade_option: false,
        cluster_settings: vec![ClusterSettingConfig {
            name: "x".to_string(),
            values: vec![SettingValue::Int(1)],
            min_version: None,
            max_changes: 0,
        }],
    };
    assert!(config.mutators().is_err());
}
