use chrono::{TimeZone, Utc};
use context_optimizer::{
    ContentBlock, ContextOptimizer, ContextWindowProfile, Message, OptimizationResult, Role,
};
use serde_json::json;

fn build_transcript() -> Vec<Message> {
    let lib_rs = "pub fn answer() -> u32 { 42 }\n".repeat(120);
    let mut messages = vec![Message::user("Fix the failing build in src/lib.rs")];

    for round in 0..15 {
        messages.push(Message::new(
            Role::Assistant,
            vec![
                ContentBlock::text(format!("Round {round}: reading the file again.")),
                ContentBlock::tool_use(format!("r{round}"), "read_file", json!({"path": "src/lib.rs"})),
            ],
        ));
        let content = if round % 4 == 3 {
            format!("{lib_rs}// edited in round {round}\n")
        } else {
            lib_rs.clone()
        };
        messages.push(Message::new(
            Role::User,
            vec![ContentBlock::file_read(format!("r{round}"), "src/lib.rs", content)],
        ));
        messages.push(Message::assistant(format!("Observation {round}: {}", "y".repeat(600))));
    }

    messages
}

fn normalized_json(mut result: OptimizationResult) -> String {
    // computed_at is informational
    result.metrics.computed_at = Utc.timestamp_opt(0, 0).unwrap();
    serde_json::to_string_pretty(&result).unwrap()
}

#[test]
fn optimization_is_byte_for_byte_deterministic() {
    let messages = build_transcript();
    let profile = ContextWindowProfile::new(16_000, 6_000).with_prompt_caching(1_500);

    // ------------------------------------------------------------
    // 1. Run the same optimization with two independent optimizers
    // ------------------------------------------------------------
    let first = ContextOptimizer::default().optimize(&messages, &profile).unwrap();
    let second = ContextOptimizer::default().optimize(&messages, &profile).unwrap();

    // ------------------------------------------------------------
    // 2. Byte-for-byte determinism check
    // ------------------------------------------------------------
    assert_eq!(
        normalized_json(first.clone()),
        normalized_json(second),
        "Optimization output is not deterministic"
    );

    // ------------------------------------------------------------
    // 3. Sanity on what the pipeline actually did
    // ------------------------------------------------------------
    assert!(first.metrics.dedup_blocks_removed > 0);
    assert!(first.optimized_tokens <= profile.max_allowed_size);
    assert_eq!(first.strategy_names()[0], "dedup");
    assert_eq!(first.strategy_names().last(), Some(&"cache-boundaries"));
}

#[test]
fn repeated_runs_agree_across_budgets() {
    let messages = build_transcript();
    let optimizer = ContextOptimizer::default();

    for budget in [1_000, 3_000, 7_500, 12_000] {
        let profile = ContextWindowProfile::new(16_000, budget);
        let runs: Vec<String> = (0..3)
            .map(|_| normalized_json(optimizer.optimize(&messages, &profile).unwrap()))
            .collect();
        assert!(runs.windows(2).all(|w| w[0] == w[1]), "budget {budget} diverged");
    }
}
