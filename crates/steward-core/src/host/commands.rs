//! Named command registry
//!
//! Commands are how the agent core reaches back into host behavior it
//! does not own. Names are unique: registering a duplicate is a fatal
//! error, executing an unregistered name is a silent no-op.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{StewardError, StewardResult};

/// A registered command handler, invoked synchronously
pub type CommandHandler = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

type CommandMap = Arc<Mutex<HashMap<String, CommandHandler>>>;

/// Registry mapping unique command names to handlers
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: CommandMap,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command handler under a unique name.
    ///
    /// Fails if the name is already registered. The returned disposable
    /// unregisters the command when dropped.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> StewardResult<CommandDisposable> {
        let name = name.into();
        let mut commands = self.commands.lock();
        if commands.contains_key(&name) {
            return Err(StewardError::command(&name, "command already registered"));
        }
        commands.insert(name.clone(), Arc::new(handler));
        Ok(CommandDisposable {
            name,
            commands: self.commands.clone(),
        })
    }

    /// Execute a command by name.
    ///
    /// An unregistered name is a no-op yielding `None` ("undefined");
    /// otherwise the handler runs synchronously and its result is
    /// delivered as an already-resolved value.
    pub async fn execute(&self, name: &str, args: &[Value]) -> Option<Value> {
        let handler = self.commands.lock().get(name).cloned()?;
        Some(handler(args))
    }

    /// Whether a command name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.lock().contains_key(name)
    }

    /// Names of all registered commands, for diagnostics.
    pub fn names(&self) -> Vec<String> {
        self.commands.lock().keys().cloned().collect()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

/// Unregisters its command when released
pub struct CommandDisposable {
    name: String,
    commands: CommandMap,
}

impl CommandDisposable {
    /// The registered command name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for CommandDisposable {
    fn drop(&mut self) {
        self.commands.lock().remove(&self.name);
    }
}

impl std::fmt::Debug for CommandDisposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDisposable")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_execute() {
        let registry = CommandRegistry::new();
        let _disposable = registry
            .register("steward.echo", |args| {
                args.first().cloned().unwrap_or(Value::Null)
            })
            .unwrap();

        let result = registry.execute("steward.echo", &[json!("hi")]).await;
        assert_eq!(result, Some(json!("hi")));
    }

    #[tokio::test]
    async fn test_execute_unregistered_is_noop() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.execute("missing", &[]).await, None);
    }

    #[test]
    fn test_duplicate_registration_is_fatal() {
        let registry = CommandRegistry::new();
        let _keep = registry.register("dup", |_| Value::Null).unwrap();
        let err = registry.register("dup", |_| Value::Null).unwrap_err();
        assert!(matches!(err, StewardError::Command { .. }));
    }

    #[tokio::test]
    async fn test_disposable_unregisters_on_drop() {
        let registry = CommandRegistry::new();
        {
            let _disposable = registry.register("scoped", |_| json!(1)).unwrap();
            assert!(registry.contains("scoped"));
        }
        assert!(!registry.contains("scoped"));
        assert_eq!(registry.execute("scoped", &[]).await, None);

        // The name is free again after release.
        let _again = registry.register("scoped", |_| json!(2)).unwrap();
    }
}
