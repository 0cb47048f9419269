//! Route table derived from a unit's initializer.
//!
//! The demo application wires its routes in the initializer:
//!
//! ```text
//! ldc str "/hello"
//! ldc str "hello v1"
//! invoke virtual com.example.Router get (Ljava/lang/String;Ljava/lang/String;)V
//! ```
//!
//! registers `GET /hello → "hello v1"`. A `get` preceded by a single string
//! constant registers that body at `/`.

use rustc_hash::FxHashMap;

use crate::unit::{ConstantKind, Instruction, Unit};

/// Simple name of the routing type whose `get` registers a route.
const ROUTER: &str = "Router";
const GET: &str = "get";

/// `GET` routes, path to body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routes {
    routes: FxHashMap<String, String>,
}

impl Routes {
    /// Collect the routes registered by every initializer of `unit`.
    pub fn of(unit: &Unit) -> Self {
        let mut routes = Self::default();
        for method in unit.initializers() {
            let mut strings: Vec<String> = Vec::new();
            for instruction in &method.body {
                match instruction {
                    Instruction::Ldc {
                        kind: ConstantKind::Str,
                        value,
                    } => strings.push(unquote(value).to_string()),
                    Instruction::Invoke { owner, name, .. } if is_router_get(owner, name) => {
                        routes.register(&mut strings);
                    }
                    _ => {}
                }
            }
        }
        routes
    }

    fn register(&mut self, strings: &mut Vec<String>) {
        let Some(body) = strings.pop() else { return };
        let path = strings.pop().unwrap_or_else(|| "/".to_string());
        self.routes.insert(normalize_route(&path), body);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.routes.get(&normalize_route(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

fn is_router_get(owner: &str, name: &str) -> bool {
    let simple = owner.rsplit(['.', '/']).next().unwrap_or(owner);
    simple == ROUTER && name == GET
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Leading slash, no trailing slash (except root), no query string.
fn normalize_route(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}
