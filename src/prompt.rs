//! Prompt construction for the code-generation oracle.
//!
//! The prompt is a pure function of identity, method name, arguments and context snapshot.
//! Arguments are serialized one by one in call order; the snapshot is an ordered map, so the
//! same inputs always render byte-identical text.

use crate::context::{ContextSnapshot, RESERVED_PREFIX};
use crate::error::SerializationError;
use crate::types::Invocation;
use serde_json::{Number, Value};
use std::fmt::Write;

/// Renders oracle prompts for dynamic invocations
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the instruction payload for one invocation
    pub fn build(
        identity: &str,
        invocation: &Invocation,
        snapshot: &ContextSnapshot,
    ) -> Result<String, SerializationError> {
        let method = invocation.method();
        let args = render_args(invocation)?;
        let context = render_context(snapshot)?;

        let mut prompt = String::new();
        write_prompt(&mut prompt, identity, method, &args, &context)
            .map_err(|e| SerializationError::Prompt(e.to_string()))?;
        Ok(prompt)
    }
}

fn render_args(invocation: &Invocation) -> Result<String, SerializationError> {
    let mut rendered = Vec::with_capacity(invocation.args().len());
    for (index, arg) in invocation.args().iter().enumerate() {
        if let Some(number) = inexact_number(arg) {
            return Err(SerializationError::Argument {
                index,
                source: inexact_error(number),
            });
        }
        let encoded = serde_json::to_string(arg)
            .map_err(|source| SerializationError::Argument { index, source })?;
        rendered.push(format!("args[{}]: {}", index, encoded));
    }
    if rendered.is_empty() {
        Ok("(none)".to_string())
    } else {
        Ok(rendered.join(", "))
    }
}

fn render_context(snapshot: &ContextSnapshot) -> Result<String, SerializationError> {
    // Per-key pass first so a failure names the offending key.
    for (key, value) in snapshot {
        if let Some(number) = inexact_number(value) {
            return Err(SerializationError::ContextValue {
                key: key.clone(),
                source: inexact_error(number),
            });
        }
        serde_json::to_string(value).map_err(|source| SerializationError::ContextValue {
            key: key.clone(),
            source,
        })?;
    }
    serde_json::to_string(snapshot).map_err(|e| SerializationError::Prompt(e.to_string()))
}

/// First number the script engine cannot hold exactly. Integers are 64-bit signed there, so
/// anything only representable as `u64` would silently turn into a float.
fn inexact_number(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(number) if number.is_u64() && !number.is_i64() => Some(number),
        Value::Array(items) => items.iter().find_map(inexact_number),
        Value::Object(map) => map.values().find_map(inexact_number),
        _ => None,
    }
}

fn inexact_error(number: &Number) -> serde_json::Error {
    <serde_json::Error as serde::ser::Error>::custom(format!(
        "number {} is outside the signed 64-bit integer range",
        number
    ))
}

fn write_prompt(
    out: &mut String,
    identity: &str,
    method: &str,
    args: &str,
    context: &str,
) -> std::fmt::Result {
    writeln!(
        out,
        "You are a helpful AI assistant living inside a Rhai object called '{identity}'."
    )?;
    writeln!(
        out,
        "Someone is calling the method '{method}' on you and you need to respond by generating \
         Rhai script that will be executed in your context."
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "You have access to 'context' (an object map) to store persistent data, 'identity' \
         (a string) for your name, and 'args' (an array) holding the call arguments."
    )?;
    writeln!(out)?;
    writeln!(out, "Rules:")?;
    writeln!(out, "- Respond with only valid Rhai code that can be executed directly")?;
    writeln!(out, "- Do not wrap the code in markdown fences and do not add explanations")?;
    writeln!(
        out,
        "- Implement exactly what a caller expects from a method named '{method}' - be helpful and predictable"
    )?;
    writeln!(
        out,
        "- Read and write persistent data only through 'context'; keys must not start with '{RESERVED_PREFIX}'"
    )?;
    writeln!(
        out,
        "- 'context' already holds your full memory; keep keys you do not mean to change"
    )?;
    writeln!(out, "- Make the object behave naturally as a {identity} would")?;
    writeln!(
        out,
        "- Only use built-in Rhai features; there is no filesystem, network or module import"
    )?;
    writeln!(
        out,
        "- Functions declared with 'fn' cannot see 'context', 'args' or 'identity'; pass them in as parameters or write the code inline"
    )?;
    writeln!(out, "- End with an explicit 'return' of the result")?;
    writeln!(out)?;
    writeln!(out, "Method being called: {method}")?;
    writeln!(out, "Arguments: {args}")?;
    writeln!(out, "Your current memory (context): {context}")?;
    writeln!(out)?;
    writeln!(out, "Examples:")?;
    writeln!(
        out,
        "- For increment(): context.value = (context.value ?? 0) + 1; return context.value;"
    )?;
    writeln!(out, "- For add(x, y): return args[0] + args[1];")?;
    writeln!(out, "- For getName(): return identity;")?;
    writeln!(
        out,
        "- For setName(name): context.name = args[0]; return context.name;"
    )?;
    writeln!(out)?;
    write!(out, "Code:")
}
