mod common;

use common::{
    event_types, last_event, sample_config, sample_conversation, sample_manager,
    CountingSummarizer, FailingSummarizer,
};
use compactor_core::{
    events, reduce_keep_counts, CompactError, CompactManager, ConfigSettings, Message,
    MessagePartitioner, NullExporter, PolicySettings, TokenEstimator, SUMMARY_PREFIX,
};
use compactor_summarize::ExtractiveSummarizer;
use compactor_telemetry::{HeuristicEstimator, TiktokenEstimator};
use std::borrow::Cow;

#[test]
fn test_small_conversation_does_not_trigger() {
    let (mut manager, log) = sample_manager(sample_config(128_000, 3, 2), CountingSummarizer);
    let msgs = sample_conversation(3);
    assert_eq!(msgs.len(), 7);

    let out = manager.preflight("s1", &msgs, None, None).unwrap();
    assert!(matches!(out, Cow::Borrowed(_)));
    assert_eq!(out.as_ref(), msgs.as_slice());

    assert_eq!(
        event_types(&log),
        vec![events::TOKEN_ESTIMATE, events::TRIGGER_DECISION]
    );
    let estimate = last_event(&log, events::TOKEN_ESTIMATE).unwrap();
    assert_eq!(estimate["tokens_estimated"], 700);
    let decision = last_event(&log, events::TRIGGER_DECISION).unwrap();
    assert_eq!(decision["triggered"], false);
}

#[test]
fn test_high_usage_triggers() {
    let partitioner = MessagePartitioner::new(sample_config(128_000, 3, 2).policy().clone());
    assert!(partitioner.check_trigger(120_000, 128_000));
}

#[test]
fn test_kept_content_over_ceiling_is_infeasible() {
    let partitioner = MessagePartitioner::new(sample_config(128_000, 3, 2).policy().clone());
    assert!(!partitioner.check_budget_feasibility(80_000, 30_000, 20_000, 128_000));
}

#[test]
fn test_keep_counts_degrade_to_floor() {
    let policy = sample_config(128_000, 3, 2).policy().clone();
    let counts = |p: &compactor_core::CompactPolicy| (p.keep_recent_turns(), p.keep_tool_io_pairs());

    let once = reduce_keep_counts(&policy);
    let twice = reduce_keep_counts(&once);
    let thrice = reduce_keep_counts(&twice);
    assert_eq!(counts(&once), (2, 1));
    assert_eq!(counts(&twice), (1, 1));
    assert_eq!(counts(&thrice), (1, 1));
}

#[test]
fn test_failing_summarizer_prunes_without_summary() {
    let (mut manager, log) = sample_manager(sample_config(128_000, 2, 1), FailingSummarizer);
    let mut msgs = sample_conversation(5);
    msgs.insert(3, Message::tool("ls output"));

    let partition = manager.partitioner().partition(&msgs);
    let result = manager.manual_compact("s1", &msgs, "manual").unwrap();

    assert!(result.summary.is_none());
    assert_eq!(result.kept.summary, 0);
    assert_eq!(result.pruned_count, partition.remainder.len());

    let mut expected = partition.pinned.clone();
    expected.extend(partition.recent.clone());
    expected.extend(partition.tool_io.clone());
    assert_eq!(result.messages, expected);

    assert!(!event_types(&log).contains(&events::SUMMARY_CREATED.to_string()));
}

#[test]
fn test_pinned_messages_survive_anywhere() {
    let (mut manager, _) = sample_manager(sample_config(128_000, 1, 1), CountingSummarizer);
    let mut msgs = sample_conversation(6);
    msgs.insert(4, Message::protected("Never touch production", Some("Policy")));
    msgs.insert(9, Message::new("developer", "Use the staging cluster"));

    let result = manager.manual_compact("s1", &msgs, "manual").unwrap();

    let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        &contents[..3],
        &[
            "You are a careful coding assistant",
            "Never touch production",
            "Use the staging cluster"
        ]
    );
    assert!(contents[3].starts_with(SUMMARY_PREFIX));
    assert_eq!(contents[4], "Done with step 5.");
    assert_eq!(result.kept.pinned, 3);
}

#[test]
fn test_compaction_never_grows_content() {
    let (mut manager, log) = sample_manager(sample_config(128_000, 2, 1), CountingSummarizer);
    let msgs = sample_conversation(20);

    let result = manager.manual_compact("s1", &msgs, "manual").unwrap();

    assert!(result.tokens_after <= result.tokens_before);
    assert_eq!(result.tokens_before, 4100);
    // system + summary + two turns
    assert_eq!(result.tokens_after, 400);
    assert_eq!(
        result.summary.as_ref().unwrap().content,
        format!("{SUMMARY_PREFIX}38 earlier messages")
    );

    let pruned = last_event(&log, events::PRUNED_MESSAGES).unwrap();
    assert_eq!(pruned["pruned_count"], 38);
    assert_eq!(pruned["kept"]["recent_turns"], 2);
    assert_eq!(pruned["degradations"], 0);
}

#[test]
fn test_degradation_rescues_tight_budget() {
    // 448 tokens for kept content once the response reserve is held back
    let config = ConfigSettings {
        max_context_tokens: 2_496,
        policy: PolicySettings {
            hard_cap_buffer: 0,
            keep_recent_turns: 5,
            keep_tool_io_pairs: 2,
            ..Default::default()
        },
        ..Default::default()
    }
    .build()
    .unwrap();
    let (mut manager, log) = sample_manager(config, CountingSummarizer);
    let msgs = sample_conversation(6);

    let result = manager.manual_compact("s1", &msgs, "manual").unwrap();

    // 1 pinned + 5 recent = 600 > 448; 1 + 4 = 500 > 448; 1 + 3 = 400 fits
    assert_eq!(result.policy_applied.keep_recent_turns(), 3);
    assert_eq!(result.kept.recent, 3);
    assert_eq!(manager.policy().keep_recent_turns(), 3);
    assert_eq!(last_event(&log, events::PRUNED_MESSAGES).unwrap()["degradations"], 2);

    manager.reset_policy();
    assert_eq!(manager.policy().keep_recent_turns(), 5);
}

#[test]
fn test_insufficient_budget_after_two_degradations() {
    let config = ConfigSettings {
        max_context_tokens: 2_448,
        ..Default::default()
    }
    .build()
    .unwrap();
    let (mut manager, _) = sample_manager(config, CountingSummarizer);
    let msgs: Vec<Message> = (0..5)
        .map(|i| Message::protected(format!("rule {i}"), None))
        .chain([Message::user("hi")])
        .collect();

    match manager.manual_compact("s1", &msgs, "manual") {
        Err(CompactError::InsufficientBudget {
            required,
            available,
        }) => {
            assert_eq!(required, 600);
            assert_eq!(available, 400);
        }
        other => panic!("expected InsufficientBudget, got {other:?}"),
    }
}

#[test]
fn test_preflight_compacts_when_triggered() {
    let config = ConfigSettings {
        max_context_tokens: 10_000,
        policy: PolicySettings {
            trigger_pct: 0.5,
            hard_cap_buffer: 0,
            keep_recent_turns: 2,
            keep_tool_io_pairs: 1,
            ..Default::default()
        },
        ..Default::default()
    }
    .build()
    .unwrap();
    let (mut manager, log) = sample_manager(config, CountingSummarizer);
    let msgs = sample_conversation(30);

    let out = manager.preflight("s1", &msgs, None, Some("system prompt")).unwrap();

    assert!(matches!(out, Cow::Owned(_)));
    assert_eq!(out.len(), 4);
    assert_eq!(
        event_types(&log),
        vec![
            events::TOKEN_ESTIMATE,
            events::TRIGGER_DECISION,
            events::SUMMARY_CREATED,
            events::PRUNED_MESSAGES,
        ]
    );
    assert_eq!(
        last_event(&log, events::PRUNED_MESSAGES).unwrap()["note"],
        "pre-flight trigger"
    );
}

#[test]
fn test_partition_is_lossless() {
    let partitioner = MessagePartitioner::new(sample_config(128_000, 2, 2).policy().clone());
    let mut msgs = sample_conversation(8);
    for (i, idx) in [2, 6, 9, 13].into_iter().enumerate() {
        msgs.insert(idx, Message::tool(format!("tool result {i}")));
    }
    msgs.push(Message::user("Step 0: please continue"));

    let parts = partitioner.partition(&msgs);
    assert_eq!(parts.len(), msgs.len());

    let mut all: Vec<&Message> = parts
        .pinned
        .iter()
        .chain(&parts.recent)
        .chain(&parts.tool_io)
        .chain(&parts.remainder)
        .collect();
    let mut expected: Vec<&Message> = msgs.iter().collect();
    let key = |m: &&Message| (m.role.clone(), m.content.clone());
    all.sort_by_key(key);
    expected.sort_by_key(key);
    assert_eq!(all, expected);
}

#[test]
fn test_failed_compaction_still_delivers_preflight_events() {
    let config = ConfigSettings {
        max_context_tokens: 2_448,
        policy: PolicySettings {
            trigger_pct: 0.5,
            ..Default::default()
        },
        ..Default::default()
    }
    .build()
    .unwrap();
    let (mut manager, log) = sample_manager(config, CountingSummarizer);
    let msgs: Vec<Message> = (0..5)
        .map(|i| Message::protected(format!("rule {i}"), None))
        .chain([Message::user("hi")])
        .collect();

    let result = manager.preflight("s1", &msgs, None, None);
    assert!(matches!(result, Err(CompactError::InsufficientBudget { .. })));
    assert_eq!(
        event_types(&log),
        vec![events::TOKEN_ESTIMATE, events::TRIGGER_DECISION]
    );
}

#[test]
fn test_short_remainder_never_grows_with_real_collaborators() {
    let msgs = vec![
        Message::user("Hi."),
        Message::user("a"),
        Message::assistant("b"),
    ];
    let estimators: Vec<Box<dyn TokenEstimator>> = vec![
        Box::new(HeuristicEstimator),
        Box::new(TiktokenEstimator::for_model("gpt-4").unwrap()),
    ];

    for estimator in estimators {
        let mut manager = CompactManager::new(
            sample_config(128_000, 2, 1),
            estimator,
            Box::new(ExtractiveSummarizer::default()),
            Box::new(NullExporter),
        );
        let result = manager.manual_compact("s1", &msgs, "manual").unwrap();

        assert_eq!(result.pruned_count, 1);
        assert!(result.summary.is_none());
        assert!(result.tokens_after <= result.tokens_before);
        assert_eq!(result.messages, msgs[1..].to_vec());
    }
}
