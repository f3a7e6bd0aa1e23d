//! Rhai-backed interpreter for generated code.
//!
//! Rhai has no filesystem, network or process access of its own. On top of that the engine
//! is built with module imports and `eval` disabled, `print`/`debug` routed to tracing, and
//! the configured operation, depth, size and wall-clock limits applied to every run.

use super::{ExecutionScope, Interpreter};
use crate::config::ExecutionLimits;
use crate::context::{is_reserved, ContextSnapshot};
use crate::error::ExecutionError;
use crate::types::{ExecutionResult, GeneratedCode};
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, Map, Scope};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

const IDENTITY_VAR: &str = "identity";
const CONTEXT_VAR: &str = "context";
const ARGS_VAR: &str = "args";

/// Sandboxed Rhai interpreter
#[derive(Debug, Clone, Default)]
pub struct RhaiInterpreter {
    limits: ExecutionLimits,
}

impl RhaiInterpreter {
    pub fn new(limits: ExecutionLimits) -> Self {
        Self { limits }
    }

    fn engine(&self, started: Instant) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(self.limits.max_operations);
        engine.set_max_call_levels(self.limits.max_call_levels);
        engine.set_max_expr_depths(self.limits.max_expr_depth, self.limits.max_expr_depth);
        engine.set_max_string_size(self.limits.max_string_size);
        engine.set_max_array_size(self.limits.max_array_size);
        engine.set_max_map_size(self.limits.max_map_size);
        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.on_print(|text| debug!(target: "gremlin::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            debug!(target: "gremlin::script", source = ?source, position = %pos, "{}", text)
        });

        let budget = Duration::from_millis(self.limits.max_duration_ms);
        engine.on_progress(move |_ops| {
            if started.elapsed() > budget {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });

        engine
    }
}

impl Interpreter for RhaiInterpreter {
    fn execute(
        &self,
        code: &GeneratedCode,
        scope: ExecutionScope<'_>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let started = Instant::now();
        let engine = self.engine(started);

        let ast = engine
            .compile(code.as_str())
            .map_err(|e| ExecutionError::Parse(e.to_string()))?;

        let mut rhai_scope = Scope::new();
        rhai_scope.push_constant(IDENTITY_VAR, scope.identity.to_string());
        rhai_scope.push_dynamic(CONTEXT_VAR, bind(CONTEXT_VAR, &scope.context)?);
        rhai_scope.push_constant_dynamic(ARGS_VAR, bind(ARGS_VAR, scope.args)?);
        let bound = rhai_scope.len();

        let returned = engine
            .eval_ast_with_scope::<Dynamic>(&mut rhai_scope, &ast)
            .map_err(|err| self.classify(&err))?;

        // Drop top-level `let`s so a local named `context` cannot stand in for the handle.
        rhai_scope.rewind(bound);
        let context = read_context(&rhai_scope)?;
        let value = rhai::serde::from_dynamic::<Value>(&returned)
            .map_err(|e| ExecutionError::IncompatibleResult(format!("{} ({})", e, returned.type_name())))?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            keys = context.len(),
            "Generated code evaluated"
        );

        Ok(ExecutionResult { value, context })
    }

    fn name(&self) -> &str {
        "rhai"
    }
}

impl RhaiInterpreter {
    fn classify(&self, err: &EvalAltResult) -> ExecutionError {
        match root_cause(err) {
            EvalAltResult::ErrorTerminated(..) => ExecutionError::DeadlineExceeded {
                limit_ms: self.limits.max_duration_ms,
            },
            cause @ (EvalAltResult::ErrorTooManyOperations(..)
            | EvalAltResult::ErrorStackOverflow(..)
            | EvalAltResult::ErrorDataTooLarge(..)) => {
                ExecutionError::LimitExceeded(cause.to_string())
            }
            _ => ExecutionError::Runtime(err.to_string()),
        }
    }
}

/// Unwrap errors raised inside nested function calls
fn root_cause(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => root_cause(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => root_cause(inner),
        other => other,
    }
}

fn bind<T: serde::Serialize + ?Sized>(name: &str, value: &T) -> Result<Dynamic, ExecutionError> {
    rhai::serde::to_dynamic(value).map_err(|e| ExecutionError::Binding {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn read_context(scope: &Scope) -> Result<ContextSnapshot, ExecutionError> {
    let handle = scope
        .get_value::<Dynamic>(CONTEXT_VAR)
        .ok_or_else(|| ExecutionError::InvalidContext("nothing".to_string()))?;
    let type_name = handle.type_name();
    let map = handle
        .try_cast::<Map>()
        .ok_or_else(|| ExecutionError::InvalidContext(type_name.to_string()))?;

    let mut snapshot = ContextSnapshot::new();
    for (key, value) in map {
        let key = key.to_string();
        if is_reserved(&key) {
            return Err(ExecutionError::ReservedContextKey(key));
        }
        let value = rhai::serde::from_dynamic::<Value>(&value).map_err(|e| {
            ExecutionError::IncompatibleResult(format!("context key '{}': {}", key, e))
        })?;
        snapshot.insert(key, value);
    }
    Ok(snapshot)
}
