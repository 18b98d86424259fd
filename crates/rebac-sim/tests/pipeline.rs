//! End-to-end pipeline tests
//!
//! Small networks driven through ingestion, propagation and estimation.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rebac_sim::setup::{AgentSpec, Newcomer};
use rebac_sim::{
    build_environment, distribute, Dataset, Environment, Pipeline, RunMode, SimError,
};
use rebac_types::{
    AgentCharacter, AgentId, Content, ContentId, PrivacySetting, Relation, RelationSchema,
    RelationType, SharingDecision,
};

fn three_agents(relations: Vec<Relation>) -> Dataset {
    Dataset {
        agents: (1..=3).map(|id| AgentSpec::new(AgentId(id))).collect(),
        relations,
        contents: Vec::new(),
    }
}

fn friend_content(id: u64, owner: u32, tags: &[&str], decision: SharingDecision) -> Content {
    Content::new(
        ContentId(id),
        tags.iter().map(|t| t.to_string()).collect(),
        PrivacySetting::new().with_rule(RelationType::Friend, decision),
    )
    .with_owner(AgentId(owner))
}

fn friends_network(pipeline: Pipeline) -> Environment {
    let data = three_agents(vec![Relation::new(AgentId(1), AgentId(2), RelationType::Friend)]);
    build_environment(&data, &RelationSchema::friends_only(), true, pipeline).unwrap()
}

/// Test the single-content scenario: only the related agent sees and learns it
#[test]
fn test_content_reaches_only_related_agents() {
    let mut env = friends_network(Pipeline::external());
    let content = friend_content(1, 1, &["beach", "party"], SharingDecision::Permit);

    let outcome = env.add_content(content, &RunMode::new(0.0)).unwrap();

    assert_eq!(outcome.visible_to, vec![AgentId(2)]);
    let viewer = env.agent(AgentId(2)).unwrap();
    assert_eq!(viewer.visible_contents(), &[ContentId(1)]);
    assert!(env.agent(AgentId(3)).unwrap().visible_contents().is_empty());

    let external = viewer.external_model();
    assert_eq!(external.len(), 2);
    for tag in ["beach", "party"] {
        assert!(external.weighted_support(tag).unwrap()[0] > 0.0);
    }
    assert_eq!(env.agent(AgentId(1)).unwrap().owned_contents(), &[ContentId(1)]);
}

/// Test that multi-relational visibility follows the ground truth per type
#[test]
fn test_multi_relation_visibility() {
    let schema = RelationSchema::new([RelationType::Friend, RelationType::Colleague]);
    let data = three_agents(vec![
        Relation::new(AgentId(1), AgentId(2), RelationType::Friend),
        Relation::new(AgentId(1), AgentId(3), RelationType::Colleague),
    ]);
    let mut env = build_environment(&data, &schema, false, Pipeline::external()).unwrap();

    let hidden = Content::new(
        ContentId(1),
        vec!["beach".into()],
        PrivacySetting::new()
            .with_rule(RelationType::Friend, SharingDecision::Deny)
            .with_rule(RelationType::Colleague, SharingDecision::Deny),
    )
    .with_owner(AgentId(1));
    env.add_content(hidden, &RunMode::new(0.0)).unwrap();
    assert!(env.agent(AgentId(2)).unwrap().visible_contents().is_empty());

    let shared = Content::new(
        ContentId(2),
        vec!["beach".into()],
        PrivacySetting::new()
            .with_rule(RelationType::Friend, SharingDecision::Permit)
            .with_rule(RelationType::Colleague, SharingDecision::Deny),
    )
    .with_owner(AgentId(1));
    env.add_content(shared, &RunMode::new(0.0)).unwrap();
    assert_eq!(env.agent(AgentId(2)).unwrap().visible_contents(), &[ContentId(2)]);
    assert!(env.agent(AgentId(3)).unwrap().visible_contents().is_empty());
}

/// Test that the internal pipeline never propagates
#[test]
fn test_internal_pipeline_keeps_content_private() {
    let mut env = friends_network(Pipeline::internal_only());
    let outcome = env
        .add_content(
            friend_content(1, 1, &["beach"], SharingDecision::Permit),
            &RunMode::new(0.0),
        )
        .unwrap();
    assert!(outcome.visible_to.is_empty());
    assert!(env.agent(AgentId(2)).unwrap().external_model().is_empty());
}

/// Test that trust follows how well the viewer's own model matches the owner
#[test]
fn test_trust_tracks_agreement() {
    let mut env = friends_network(Pipeline::external());
    let training = RunMode::new(0.0);

    // agent 2 learns beach is public
    env.add_content(friend_content(1, 2, &["beach"], SharingDecision::Permit), &training)
        .unwrap();
    env.add_content(friend_content(2, 2, &["office"], SharingDecision::Deny), &training)
        .unwrap();

    // agent 1 agrees on beach, then contradicts on office
    env.add_content(friend_content(3, 1, &["beach"], SharingDecision::Permit), &training)
        .unwrap();
    let trust = env.agent(AgentId(2)).unwrap().trust_toward(AgentId(1)).unwrap();
    assert_eq!(trust.value_for(0), 1.0);

    env.add_content(friend_content(4, 1, &["office"], SharingDecision::Permit), &training)
        .unwrap();
    let trust = env.agent(AgentId(2)).unwrap().trust_toward(AgentId(1)).unwrap();
    assert_eq!(trust.value_for(0), 0.5);
}

/// Test that only normal owners are evaluated in the external pipeline
#[test]
fn test_only_normal_owners_are_scored() {
    let mut data = three_agents(vec![
        Relation::new(AgentId(1), AgentId(2), RelationType::Friend),
        Relation::new(AgentId(2), AgentId(3), RelationType::Friend),
    ]);
    data.agents[0].character = AgentCharacter::AlwaysPermit;
    let mut env =
        build_environment(&data, &RelationSchema::friends_only(), true, Pipeline::external())
            .unwrap();
    let testing = RunMode::new(0.0).predicting();

    let skipped = env
        .add_content(friend_content(1, 1, &["beach"], SharingDecision::Permit), &testing)
        .unwrap();
    assert!(skipped.estimates.is_none());

    let scored = env
        .add_content(friend_content(2, 2, &["beach"], SharingDecision::Permit), &testing)
        .unwrap();
    assert_eq!(scored.estimates.map(|e| e.len()), Some(1));
    assert_eq!(env.relation_stats().total() + env.external_stats().total(), 1);
    assert!(env.agent_stats(AgentId(1)).is_none());
    assert_eq!(env.agent_stats(AgentId(2)).unwrap().total(), 1);
}

/// Test that distributing to an empty population fails
#[test]
fn test_distribution_without_agents() {
    let data = Dataset::default();
    let mut env =
        build_environment(&data, &RelationSchema::friends_only(), true, Pipeline::external())
            .unwrap();
    let contents = vec![friend_content(1, 0, &["beach"], SharingDecision::Permit)];
    let mut rng = SmallRng::seed_from_u64(1);

    let result = distribute(&mut env, &contents, &RunMode::new(0.0), &mut rng, None);
    assert!(matches!(result, Err(SimError::NoAgents)));
}

/// Test that a newcomer owns nothing before its join turn
#[test]
fn test_newcomer_waits_for_turn() {
    let mut env = friends_network(Pipeline::external());
    let contents: Vec<Content> = (0..9)
        .map(|id| friend_content(id, 0, &["beach"], SharingDecision::Permit))
        .collect();
    let mut rng = SmallRng::seed_from_u64(3);
    let newcomer = Newcomer::joining_after(AgentId(3), 5);

    distribute(&mut env, &contents[..5], &RunMode::new(0.0), &mut rng, Some(newcomer)).unwrap();
    assert!(env.agent(AgentId(3)).unwrap().owned_contents().is_empty());

    let mut env = friends_network(Pipeline::external());
    distribute(&mut env, &contents, &RunMode::new(0.0), &mut rng, Some(newcomer)).unwrap();
    let owned = env.agent(AgentId(3)).unwrap().owned_contents();
    assert!(!owned.is_empty());
    assert!(owned.iter().all(|id| id.0 >= 5));
}

/// Test that an incomplete ground truth stops the run
#[test]
fn test_incomplete_privacy_is_fatal() {
    let schema = RelationSchema::new([RelationType::Friend, RelationType::Family]);
    let data = three_agents(Vec::new());
    let mut env = build_environment(&data, &schema, true, Pipeline::external()).unwrap();

    let content = friend_content(1, 1, &["beach"], SharingDecision::Permit);
    let result = env.add_content(content, &RunMode::new(0.0));
    assert!(matches!(result, Err(SimError::InvalidPrivacy { .. })));
}

/// Test that a record with an unknown decision encoding is dropped while the rest loads
#[test]
fn test_loading_skips_unknown_encodings() {
    let json = r#"{
        "agents": [{"id": 1}, {"id": 2}],
        "relations": [{"source": 1, "destination": 2, "relation_type": "friend"}],
        "contents": [
            {"id": 1, "tags": ["beach"], "privacy": {"rebac": {"friend": "permit"}}},
            {"id": 2, "tags": ["party"], "privacy": {"rebac": {"friend": 2}}},
            {"id": 3, "tags": ["party"], "privacy": {"rebac": {"friend": 0.8}}},
            {"id": 4, "tags": ["office"], "privacy": {"rebac": {"friend": "private"}}}
        ]
    }"#;
    let data = Dataset::from_json(json).unwrap();

    let ids: Vec<ContentId> = data.contents.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![ContentId(1), ContentId(3), ContentId(4)]);
    assert_eq!(
        data.contents[1].privacy.get(RelationType::Friend),
        Some(SharingDecision::Permit)
    );
    assert_eq!(
        data.contents[2].privacy.get(RelationType::Friend),
        Some(SharingDecision::Deny)
    );

    // loaded contents run through the simulation like hand-built ones
    let schema = RelationSchema::friends_only();
    let mut env = build_environment(&data, &schema, true, Pipeline::external()).unwrap();
    let mut rng = SmallRng::seed_from_u64(3);
    let summary =
        distribute(&mut env, &data.contents, &RunMode::new(0.0), &mut rng, None).unwrap();
    assert_eq!(summary.distributed, 3);
}

/// Test that a record without a single usable label stops the load
#[test]
fn test_loading_fails_without_usable_label() {
    let json = r#"{
        "agents": [{"id": 1}],
        "contents": [
            {"id": 1, "tags": ["beach"], "privacy": {"rebac": {"friend": "public"}}},
            {"id": 7, "tags": ["beach"], "privacy": {"rebac": {"friend": "secret"}}}
        ]
    }"#;
    let result = Dataset::from_json(json);
    assert!(matches!(
        result,
        Err(SimError::InvalidPrivacy { content: ContentId(7), .. })
    ));
}
