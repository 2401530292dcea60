//! YAML-declared rules
//!
//! Simple rules can be written as data instead of closures and registered on
//! a `RuleEngine` at runtime:
//!
//! ```yaml
//! - name: drop_var_dump
//!   description: Remove var_dump() debug calls
//!   node: Expr_FuncCall
//!   when:
//!     - path: name.name
//!       equals: var_dump
//!   action: remove
//!
//! - name: json_encode_flags
//!   node: FuncCall
//!   when:
//!     - path: name.name
//!       equals: json_encode
//!     - path: args.1
//!       exists: false
//!   action:
//!     append_args: [0]
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    load_rules_from_dir, load_rules_from_file, load_rules_from_string, register_rules, LoadError,
};
pub use schema::{Action, Condition, DeclaredRule};
