//! Integration tests for the dynamic invocation pipeline

use super::test_utils::{counter_oracle, scripted_agent};
use gremlin::config::AgentConfig;
use gremlin::{Invocation, InvocationFailure, Reply};
use serde_json::json;
use std::collections::HashMap;

#[tokio::test]
async fn test_counter_scenario() {
    let (counter, oracle) = scripted_agent("counter", AgentConfig::default());
    counter_oracle(&oracle);

    for expected in 1..=3 {
        let reply = counter.call("increment", vec![]).await.unwrap();
        assert_eq!(reply.as_value(), Some(&json!(expected)));
    }

    let value = counter.call("getValue", vec![]).await.unwrap();
    assert_eq!(value.as_value(), Some(&json!(3)));

    let named = counter
        .call("setName", vec![json!("tally")])
        .await
        .unwrap();
    assert_eq!(named.as_value(), Some(&json!("Name set to tally")));

    let context = counter.context().await;
    assert_eq!(context.get("value"), Some(&json!(3)));
    assert_eq!(context.get("name"), Some(&json!("tally")));

    assert_eq!(oracle.request_count(), 5);
}

#[tokio::test]
async fn test_set_get_increment_scenario() {
    let (counter, oracle) = scripted_agent("counter", AgentConfig::default());
    oracle
        .on_method("setValue", "context.value = args[0]; return context.value;")
        .on_method("getValue", "return context.value;")
        .on_method("increment", "context.value += 1; return context.value;");

    let set = counter.call("setValue", vec![json!(0)]).await.unwrap();
    assert_eq!(set.as_value(), Some(&json!(0)));

    let got = counter.call("getValue", vec![]).await.unwrap();
    assert_eq!(got.as_value(), Some(&json!(0)));

    let incremented = counter.call("increment", vec![]).await.unwrap();
    assert_eq!(incremented.as_value(), Some(&json!(1)));

    assert_eq!(counter.context().await.get("value"), Some(&json!(1)));
    assert_eq!(oracle.request_count(), 3);
}

#[tokio::test]
async fn test_exactly_one_oracle_request_per_invocation() {
    let (agent, oracle) = scripted_agent("calculator", AgentConfig::default());
    oracle.on_method("add", "return args[0] + args[1];");

    let reply = agent.call("add", vec![json!(2), json!(3)]).await.unwrap();
    assert_eq!(reply.as_value(), Some(&json!(5)));
    assert_eq!(oracle.request_count(), 1);

    agent.call("add", vec![json!(4), json!(5)]).await.unwrap();
    assert_eq!(oracle.request_count(), 2, "no caching between identical calls");
}

#[tokio::test]
async fn test_prompts_are_deterministic_for_equal_state() {
    let (first, first_oracle) = scripted_agent("calculator", AgentConfig::default());
    let (second, second_oracle) = scripted_agent("calculator", AgentConfig::default());
    first_oracle.on_method("add", "return args[0] + args[1];");
    second_oracle.on_method("add", "return args[0] + args[1];");

    first.call("add", vec![json!(2), json!(3)]).await.unwrap();
    second.call("add", vec![json!(2), json!(3)]).await.unwrap();

    assert_eq!(first_oracle.prompts(), second_oracle.prompts());
}

#[tokio::test]
async fn test_execution_failure_leaves_context_unchanged() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());
    counter_oracle(&oracle);
    oracle.on_method("explode", "context.value = 999; throw \"kaboom\";");

    agent.call("increment", vec![]).await.unwrap();
    let before = agent.context().await;

    let err = agent.call("explode", vec![]).await.unwrap_err();
    assert_eq!(err.method, "explode");
    assert!(err.is_execution());
    assert!(err.to_string().starts_with("Failed to execute explode:"));

    assert_eq!(agent.context().await, before);
    let value = agent.call("getValue", vec![]).await.unwrap();
    assert_eq!(value.as_value(), Some(&json!(1)));
}

#[tokio::test]
async fn test_oracle_failure_leaves_context_unchanged() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());
    counter_oracle(&oracle);
    oracle.fail_method("broken", 503);

    agent.call("increment", vec![]).await.unwrap();
    let before = agent.context().await;

    let err = agent.call("broken", vec![]).await.unwrap_err();
    assert!(err.is_oracle());
    assert!(err.to_string().contains("503"));
    assert_eq!(agent.context().await, before);
}

#[tokio::test]
async fn test_unserializable_argument_is_rejected_before_oracle() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());

    let mut tuple_keys = HashMap::new();
    tuple_keys.insert((1, 2), "pair");
    let err = Invocation::new("store")
        .unwrap()
        .arg(&json!("ok"))
        .unwrap()
        .arg(&tuple_keys)
        .unwrap_err();
    assert!(err.is_serialization());
    assert_eq!(err.method, "store");

    assert_eq!(oracle.request_count(), 0);
    assert!(agent.context().await.is_empty());
}

#[tokio::test]
async fn test_integer_beyond_signed_range_is_rejected_before_oracle() {
    let (agent, oracle) = scripted_agent("echo", AgentConfig::default());
    oracle.on_method("echo", "return args[0];");

    let err = agent.call("echo", vec![json!(u64::MAX)]).await.unwrap_err();
    assert!(err.is_serialization());
    assert_eq!(err.method, "echo");
    assert_eq!(oracle.request_count(), 0);

    let reply = agent.call("echo", vec![json!(i64::MAX)]).await.unwrap();
    assert_eq!(reply.as_value(), Some(&json!(i64::MAX)));
}

#[tokio::test]
async fn test_reserved_prefix_never_reaches_oracle() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());

    let reply = agent.call("_private", vec![json!(1)]).await.unwrap();
    assert!(reply.is_undefined());

    let err = agent
        .invoke(Invocation::new("_private").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err.cause, InvocationFailure::InvalidMethodName(_)));

    assert_eq!(oracle.request_count(), 0);
}

#[tokio::test]
async fn test_primitive_results_are_returned_raw_in_wet_mode() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default().replication(true));
    counter_oracle(&oracle);

    let reply = agent.call("increment", vec![]).await.unwrap();
    assert!(matches!(reply, Reply::Value(ref v) if v == &json!(1)));
}

#[tokio::test]
async fn test_concurrent_invocations_do_not_lose_updates() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());
    counter_oracle(&oracle);

    let calls = (0..10).map(|_| agent.call("increment", vec![]));
    let replies = futures::future::join_all(calls).await;

    let mut seen: Vec<i64> = replies
        .into_iter()
        .map(|r| r.unwrap().into_value().unwrap().as_i64().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (1..=10).collect::<Vec<_>>());

    assert_eq!(agent.context().await.get("value"), Some(&json!(10)));
    assert_eq!(oracle.request_count(), 10);
}

#[tokio::test]
async fn test_concurrent_invocations_across_tasks() {
    let (agent, oracle) = scripted_agent("counter", AgentConfig::default());
    counter_oracle(&oracle);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let agent = agent.clone();
            tokio::spawn(async move { agent.call("increment", vec![]).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(agent.context().await.get("value"), Some(&json!(8)));
}
