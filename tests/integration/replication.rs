//! Integration tests for wet-mode replication

use super::test_utils::scripted_agent;
use gremlin::config::AgentConfig;
use gremlin::Reply;
use serde_json::json;

const ADD_ITEM: &str = "if !(\"items\" in context) { context.items = []; } \
                        context.items.push(args[0]); return context.items.len();";

#[tokio::test]
async fn test_shopping_cart_spawns_child_for_items() {
    let (cart, oracle) = scripted_agent("cart", AgentConfig::default().replication(true));
    oracle
        .on_method("addItem", ADD_ITEM)
        .on_method("getItems", "return context.items;")
        .on_method("describe", "return identity;");

    cart.call("addItem", vec![json!("apple")]).await.unwrap();
    cart.call("addItem", vec![json!("pear")]).await.unwrap();

    let items = cart
        .call("getItems", vec![])
        .await
        .unwrap()
        .into_agent()
        .expect("array result becomes a child agent");
    assert_eq!(items.identity(), "cart.getItems");
    assert!(items.context().await.is_empty());
    assert!(items.config().replication);

    let described = items.call("describe", vec![]).await.unwrap();
    assert_eq!(described.as_value(), Some(&json!("cart.getItems")));

    // Parent context is untouched by the child's calls
    assert_eq!(
        cart.context().await.get("items"),
        Some(&json!(["apple", "pear"]))
    );
}

#[tokio::test]
async fn test_children_chain_identities() {
    let (root, oracle) = scripted_agent("root", AgentConfig::default().replication(true));
    oracle
        .on_method("branch", "return #{ depth: 1 };")
        .on_method("leaf", "return [1, 2, 3];");

    let branch = root.call("branch", vec![]).await.unwrap().into_agent().unwrap();
    let leaf = branch.call("leaf", vec![]).await.unwrap().into_agent().unwrap();

    assert_eq!(branch.identity(), "root.branch");
    assert_eq!(leaf.identity(), "root.branch.leaf");
    assert_eq!(oracle.request_count(), 2);
}

#[tokio::test]
async fn test_child_state_is_independent() {
    let (root, oracle) = scripted_agent("root", AgentConfig::default().replication(true));
    oracle
        .on_method("spawn", "return #{};")
        .on_method(
            "increment",
            "context.value = (context.value ?? 0) + 1; return context.value;",
        );

    root.call("increment", vec![]).await.unwrap();
    let child = root.call("spawn", vec![]).await.unwrap().into_agent().unwrap();

    let first = child.call("increment", vec![]).await.unwrap();
    assert_eq!(first.as_value(), Some(&json!(1)));
    assert_eq!(root.context().await.get("value"), Some(&json!(1)));
}

#[tokio::test]
async fn test_dry_mode_returns_composites_raw() {
    let (cart, oracle) = scripted_agent("cart", AgentConfig::default());
    oracle
        .on_method("addItem", ADD_ITEM)
        .on_method("getItems", "return context.items;");

    cart.call("addItem", vec![json!("apple")]).await.unwrap();
    let reply = cart.call("getItems", vec![]).await.unwrap();
    assert!(matches!(reply, Reply::Value(ref v) if v == &json!(["apple"])));
}
