use context_optimizer::types::{Malformed, ProfileError, Strategy};
use context_optimizer::{
    ContentBlock, ContextOptimizer, ContextWindowProfile, Message, OptimizeError, OptimizerConfig, Role,
};
use serde_json::json;

// ApproxTokenCounter: ceil(len/4), so 4 ASCII chars per token.
fn text_of(tokens: usize) -> String {
    "x".repeat(tokens * 4)
}

fn labeled(label: &str, tokens: usize) -> String {
    let mut s = format!("{label} ");
    s.push_str(&"x".repeat(tokens * 4 - s.len()));
    s
}

#[test]
fn scenario_a_under_budget_is_unchanged() {
    let messages = vec![Message::user(text_of(500)), Message::assistant(text_of(300))];
    let profile = ContextWindowProfile::new(12_000, 10_000);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert_eq!(result.messages, messages);
    assert!(result.strategies.is_empty());
    assert_eq!(result.original_tokens, 800);
    assert_eq!(result.optimized_tokens, 800);
    assert_eq!(result.compression_ratio, 1.0);
    assert!(!result.irreducible_oversize);
    assert!(result.warnings.is_empty());
    assert!(result.cache_boundaries.is_empty());
}

#[test]
fn scenario_b_duplicate_read_within_threshold_is_removed() {
    let file = "export const a = 1;\n".repeat(200);
    let messages = vec![
        Message::user("read a"),
        Message::new(
            Role::Assistant,
            vec![ContentBlock::tool_use("t1", "read_file", json!({"path": "src/a.ts"}))],
        ),
        Message::new(Role::User, vec![ContentBlock::file_read("t1", "src/a.ts", file.clone())]),
        Message::new(
            Role::Assistant,
            vec![ContentBlock::tool_use("t2", "read_file", json!({"path": "src/a.ts"}))],
        ),
        Message::new(Role::User, vec![ContentBlock::file_read("t2", "./src/a.ts", file.clone())]),
        Message::assistant("done"),
    ];
    let profile = ContextWindowProfile::new(2_000, 1_500);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert_eq!(result.strategies, vec![Strategy::Dedup]);
    assert_eq!(result.metrics.dedup_blocks_removed, 1);
    assert_eq!(result.metrics.empty_messages_dropped, 1);
    assert_eq!(result.messages.len(), 5);

    // Turn 2 survives, turn 4 is gone.
    assert_eq!(result.messages[2], messages[2]);
    let surviving_reads = result
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter(|b| b.as_file_read().is_some())
        .count();
    assert_eq!(surviving_reads, 1);
    assert!(result.optimized_tokens <= 1_500);
    assert_eq!(
        result.original_tokens - result.optimized_tokens,
        result.metrics.dedup_tokens_reclaimed
    );
}

#[test]
fn scenario_c_keeps_first_segment_and_top_four() {
    let mut messages = Vec::new();
    for i in 0..20 {
        messages.push(Message::user(labeled(&format!("segment {i} question"), 500)));
        messages.push(Message::assistant(labeled(&format!("segment {i} answer"), 500)));
    }
    let profile = ContextWindowProfile::new(8_000, 5_000);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert_eq!(result.strategies, vec![Strategy::Dedup, Strategy::Truncate]);
    assert_eq!(result.original_tokens, 20_000);
    assert_eq!(result.optimized_tokens, 5_000);
    assert!(!result.irreducible_oversize);

    let mut expected = Vec::new();
    for i in [0, 16, 17, 18, 19] {
        expected.push(messages[i * 2].clone());
        expected.push(messages[i * 2 + 1].clone());
    }
    assert_eq!(result.messages, expected, "segment 0 plus the four most recent, chronological");

    assert_eq!(result.metrics.segments_total, 20);
    assert_eq!(result.metrics.segments_kept, 5);
    assert_eq!(result.metrics.segments_dropped, 15);

    let kept: Vec<usize> = result
        .segment_scores
        .iter()
        .filter(|s| s.kept)
        .map(|s| s.segment_index)
        .collect();
    assert_eq!(kept, vec![0, 16, 17, 18, 19]);
}

#[test]
fn scenario_d_oversized_first_segment_is_flagged() {
    let messages = vec![
        Message::user(text_of(50_000)),
        Message::assistant("ok"),
        Message::user(text_of(100)),
        Message::assistant(text_of(100)),
    ];
    let profile = ContextWindowProfile::new(20_000, 10_000);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert!(result.irreducible_oversize);
    assert_eq!(result.messages, messages[..2].to_vec());
    assert!(result.optimized_tokens > profile.max_allowed_size);
    assert!(result.optimized_tokens <= result.original_tokens);
    assert!(result.to_log_string().contains("irreducible oversize"));
}

#[test]
fn insignificant_dedup_still_truncates() {
    // Dedup reclaims a little and lands under budget, but below the ratio.
    let read = text_of(100);
    let mut messages = vec![
        Message::user("start"),
        Message::new(Role::User, vec![ContentBlock::file_read("t1", "a.rs", read.clone())]),
        Message::new(Role::User, vec![ContentBlock::file_read("t2", "a.rs", read)]),
    ];
    for _ in 0..9 {
        messages.push(Message::user(text_of(100)));
    }
    let total = 2 + 2 * 108 + 900;
    let profile = ContextWindowProfile::new(2_000, total - 50);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();
    assert_eq!(result.original_tokens, total);
    assert_eq!(result.strategies, vec![Strategy::Dedup, Strategy::Truncate]);
    assert!(result.optimized_tokens <= profile.max_allowed_size);

    let lenient = OptimizerConfig::default().with_significance_ratio(0.05);
    let result = ContextOptimizer::with_config(lenient)
        .optimize(&messages, &profile)
        .unwrap();
    assert_eq!(result.strategies, vec![Strategy::Dedup]);
    assert_eq!(result.optimized_tokens, total - 108);
}

#[test]
fn caching_profile_plans_boundaries_without_changing_messages() {
    let messages = vec![
        Message::user(text_of(600)),
        Message::assistant(text_of(600)),
        Message::user(text_of(600)),
        Message::assistant(text_of(600)),
    ];
    let profile = ContextWindowProfile::new(100_000, 90_000).with_prompt_caching(1_000);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert_eq!(result.messages, messages);
    assert_eq!(result.strategies, vec![Strategy::CacheBoundaries]);
    assert_eq!(result.cache_boundaries, vec![2]);
    assert_eq!(result.metrics.cache_boundary_count, 1);

    let overridden = OptimizerConfig::default().with_cache_threshold(500);
    let result = ContextOptimizer::with_config(overridden)
        .optimize(&messages, &profile)
        .unwrap();
    assert_eq!(result.cache_boundaries, vec![0, 2]);
}

#[test]
fn malformed_messages_are_excluded_with_warnings() {
    let messages = vec![
        Message::user("hello"),
        Message::new(Role::Other("system".into()), vec![ContentBlock::text("be brief")]),
        Message::new(
            Role::Assistant,
            vec![
                ContentBlock::text("calling"),
                ContentBlock::tool_use("t1", "", json!({})),
            ],
        ),
    ];
    let profile = ContextWindowProfile::new(1_000, 1_000);

    let result = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    assert_eq!(
        result.messages,
        vec![Message::user("hello"), Message::assistant("calling")]
    );
    assert!(result.strategies.is_empty());
    assert_eq!(result.warnings.len(), 2);
    assert_eq!(
        result.warnings[0].reason,
        Malformed::UnknownRole {
            role: "system".into()
        }
    );
    assert_eq!(result.warnings[1].reason, Malformed::EmptyToolName);
    assert_eq!(result.warnings[1].block_index, Some(1));
}

#[test]
fn invalid_profile_is_rejected_before_running() {
    let messages = vec![Message::user("hi")];
    let optimizer = ContextOptimizer::default();

    assert_eq!(
        optimizer
            .optimize(&messages, &ContextWindowProfile::new(1_000, 0))
            .unwrap_err(),
        OptimizeError::InvalidProfile(ProfileError::ZeroAllowedSize)
    );
    assert!(matches!(
        optimizer.optimize(&messages, &ContextWindowProfile::new(1_000, 2_000)),
        Err(OptimizeError::InvalidProfile(ProfileError::AllowedExceedsMaximum { .. }))
    ));

    let bad_config = OptimizerConfig::default().with_significance_ratio(1.5);
    assert!(matches!(
        ContextOptimizer::with_config(bad_config).optimize(&messages, &ContextWindowProfile::new(10, 10)),
        Err(OptimizeError::InvalidConfig(_))
    ));
}

#[test]
fn empty_conversation_yields_empty_result() {
    let profile = ContextWindowProfile::new(10, 10);
    let result = ContextOptimizer::default().optimize(&[], &profile).unwrap();

    assert!(result.messages.is_empty());
    assert_eq!(result.original_tokens, 0);
    assert_eq!(result.compression_ratio, 1.0);
    assert!(result.strategies.is_empty());
}
