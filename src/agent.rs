//! Dynamic Agent
//!
//! An [`Agent`] has no predefined behavior. Each call goes through the interception layer;
//! dynamic calls build a prompt from the identity, arguments and context, ask the oracle for
//! code, run it in the sandbox and commit the resulting context. A failure anywhere leaves
//! the context exactly as it was.
//!
//! Invocations on one agent are serialized: the context lock is held from prompt build to
//! commit, so overlapping calls never lose each other's updates.

use crate::config::AgentConfig;
use crate::context::{ContextSnapshot, ContextStore};
use crate::dispatch::{DeclaredMember, InterceptionLayer, Resolution};
use crate::engine::{ExecutionScope, Interpreter, RhaiInterpreter};
use crate::error::{ConfigError, InvocationError, InvocationFailure};
use crate::oracle::{CodeOracle, HttpOracle};
use crate::prompt::PromptBuilder;
use crate::replication::ReplicationPolicy;
use crate::types::Invocation;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What a member access produced
#[derive(Debug, Clone)]
pub enum Reply {
    /// Raw value returned by generated code or a declared member
    Value(Value),
    /// Child agent spawned by wet mode
    Agent(Agent),
    /// Reserved member; nothing happened
    Undefined,
}

impl Reply {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_agent(self) -> Option<Agent> {
        match self {
            Reply::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Reply::Undefined)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Agent(agent) => write!(f, "<agent {}>", agent.identity()),
            Reply::Undefined => f.write_str("undefined"),
        }
    }
}

struct AgentInner {
    identity: String,
    config: AgentConfig,
    context: Mutex<ContextStore>,
    interception: InterceptionLayer,
    replication: ReplicationPolicy,
    oracle: Arc<dyn CodeOracle>,
    interpreter: Arc<dyn Interpreter>,
}

/// Handle to a dynamic agent. Clones share identity, context and the invocation lock.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("identity", &self.inner.identity)
            .field("model", &self.inner.config.model)
            .field("replication", &self.inner.replication.is_enabled())
            .finish()
    }
}

/// Build an agent from explicit parts. Used for construction and for wet-mode children.
pub fn make_agent(
    identity: impl Into<String>,
    config: AgentConfig,
    oracle: Arc<dyn CodeOracle>,
    interpreter: Arc<dyn Interpreter>,
) -> Agent {
    let interception = InterceptionLayer::with_exceptions(config.reserved_exceptions.iter().cloned());
    let replication = ReplicationPolicy::new(config.replication);

    Agent {
        inner: Arc::new(AgentInner {
            identity: identity.into(),
            config,
            context: Mutex::new(ContextStore::new()),
            interception,
            replication,
            oracle,
            interpreter,
        }),
    }
}

impl Agent {
    /// Create an agent talking to the HTTP oracle described by `config`
    pub fn new(identity: impl Into<String>, config: AgentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let oracle = Arc::new(HttpOracle::new(&config)?);
        let interpreter = Arc::new(RhaiInterpreter::new(config.limits.clone()));
        Ok(make_agent(identity, config, oracle, interpreter))
    }

    /// Create an agent with a caller-supplied oracle and interpreter
    pub fn with_components(
        identity: impl Into<String>,
        config: AgentConfig,
        oracle: Arc<dyn CodeOracle>,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        make_agent(identity, config, oracle, interpreter)
    }

    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Snapshot of the current context; waits for an in-flight invocation to finish
    pub async fn context(&self) -> ContextSnapshot {
        self.inner.context.lock().await.get()
    }

    pub(crate) fn oracle(&self) -> Arc<dyn CodeOracle> {
        Arc::clone(&self.inner.oracle)
    }

    pub(crate) fn interpreter(&self) -> Arc<dyn Interpreter> {
        Arc::clone(&self.inner.interpreter)
    }

    /// Access member `name` with `args`, the way a caller would call a method
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Reply, InvocationError> {
        match self.inner.interception.resolve(name) {
            Resolution::Declared(member) => Ok(self.declared(member).await),
            Resolution::Reserved => {
                debug!(agent = %self.inner.identity, member = name, "Reserved member accessed");
                Ok(Reply::Undefined)
            }
            Resolution::Dynamic => {
                let invocation = Invocation::with_args(name, args)?;
                self.invoke(invocation).await
            }
        }
    }

    /// Run the dynamic pipeline for `invocation`
    pub async fn invoke(&self, invocation: Invocation) -> Result<Reply, InvocationError> {
        let method = invocation.method().to_string();
        if self.inner.interception.resolve(&method) != Resolution::Dynamic {
            return Err(InvocationError::new(
                method.clone(),
                InvocationFailure::InvalidMethodName(method),
            ));
        }

        match self.run_pipeline(&invocation).await {
            Ok(value) => Ok(self.inner.replication.apply(self, &method, value)),
            Err(cause) => {
                warn!(agent = %self.inner.identity, method = %method, error = %cause, "Invocation failed");
                Err(InvocationError::new(method, cause))
            }
        }
    }

    async fn run_pipeline(&self, invocation: &Invocation) -> Result<Value, InvocationFailure> {
        let inner = &self.inner;
        let mut store = inner.context.lock().await;
        let snapshot = store.get();

        let prompt = PromptBuilder::build(&inner.identity, invocation, &snapshot)?;
        debug!(
            agent = %inner.identity,
            method = invocation.method(),
            args = invocation.args().len(),
            prompt_bytes = prompt.len(),
            "Prompt built"
        );

        let code = inner.oracle.generate(&prompt).await?;
        if inner.config.verbose {
            info!(agent = %inner.identity, method = invocation.method(), "Generated code:\n{}", code);
        } else {
            debug!(agent = %inner.identity, method = invocation.method(), code = %code, "Generated code");
        }

        let result = inner.interpreter.execute(
            &code,
            ExecutionScope {
                identity: &inner.identity,
                args: invocation.args(),
                context: snapshot,
            },
        )?;

        store.commit(result.context);
        debug!(
            agent = %inner.identity,
            method = invocation.method(),
            revision = store.revision(),
            interpreter = inner.interpreter.name(),
            "Context committed"
        );

        Ok(result.value)
    }

    async fn declared(&self, member: DeclaredMember) -> Reply {
        match member {
            DeclaredMember::Identity => Reply::Value(Value::String(self.inner.identity.clone())),
            DeclaredMember::Context => {
                Reply::Value(Value::Object(self.context().await.into_iter().collect()))
            }
            DeclaredMember::Config => Reply::Value(self.inner.config.redacted()),
        }
    }
}
