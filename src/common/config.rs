use std::fmt::Display;

use anyhow::{anyhow, Result};

/// Collects config fields while walking the option tree.
trait Visit {
    fn some<V: Display>(&mut self, key: &str, value: V, description: &'static str);
}

/// A node of the option tree: either a leaf value (bool, usize, ...) or a
/// namespace struct whose fields are themselves `ConfigField`s.
/// `set` receives the key with this node's own segment already stripped.
trait ConfigField {
    fn visit<V: Visit>(&self, v: &mut V, key: &str, description: &'static str);
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// leaf values ignore the remaining key and parse the string in place
macro_rules! config_field {
    ($t:ty) => {
        impl ConfigField for $t {
            fn visit<V: Visit>(&self, v: &mut V, key: &str, description: &'static str) {
                v.some(key, self, description)
            }
            fn set(&mut self, _: &str, value: &str) -> Result<()> {
                *self = value
                    .parse()
                    .map_err(|e| anyhow!("cannot parse {:?} as {}: {}", value, stringify!($t), e))?;
                Ok(())
            }
        }
    };
}

config_field!(bool);
config_field!(usize);

/// Declares a namespace struct. Every field carries its doc comment (used as
/// the entry description) and a default.
macro_rules! config_namespace {
    (
        $(#[doc=$struct_d:tt])*
        $vis:vis struct $struct_name: ident {
            $(
            $(#[doc=$d:tt])*
            $field_vis:vis $field_name:ident : $field_type: ty, default=$default:expr
            )*$(,)*
        }
    ) => {
        $(#[doc = $struct_d])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        #[non_exhaustive]
        $vis struct $struct_name {
            $(
                $(#[doc=$d])*
                $field_vis $field_name: $field_type,
            )*
        }

        impl ConfigField for $struct_name {
            fn visit<V: Visit>(&self, v: &mut V, key_prefix: &str, _description: &'static str) {
                $(
                    let key = format!(concat!("{}.", stringify!($field_name)), key_prefix);
                    let desc = concat!($($d),*).trim();
                    self.$field_name.visit(v, key.as_str(), desc);
                )*
            }
            fn set(&mut self, key: &str, value: &str) -> Result<()> {
                let (key, remaining) = key.split_once('.').unwrap_or((key, ""));
                match key {
                    $(
                        stringify!($field_name) => self.$field_name.set(remaining, value),
                    )*
                    _ => Err(anyhow!("unknown key {} in {}", key, stringify!($struct_name))),
                }
            }
        }

        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field_name: $default),*
                }
            }
        }
    };
}

config_namespace! {
    /// Options applied to a single Morris traversal.
    pub struct TraversalOptions {
        /// Maximum number of steps (loop iterations plus followed predecessor
        /// links) before the traversal is aborted. 0 means no limit. A well
        /// formed tree of n nodes always finishes in fewer than 4n steps.
        pub step_limit: usize, default = 0

        /// Emit a trace event for every thread created or removed.
        pub log_threads: bool, default = false
    }
}

impl TraversalOptions {
    /// `step_limit` as an optional bound, `None` when unlimited.
    pub fn limit(&self) -> Option<usize> {
        match self.step_limit {
            0 => None,
            n => Some(n),
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_log_threads(mut self, log_threads: bool) -> Self {
        self.log_threads = log_threads;
        self
    }
}

#[derive(Debug)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConfigOptions {
    pub traversal: TraversalOptions,
}

impl ConfigField for ConfigOptions {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (key, rem) = key.split_once('.').unwrap_or((key, ""));
        match key {
            "traversal" => self.traversal.set(rem, value),
            _ => Err(anyhow!("unknown entry type for key {}", key)),
        }
    }
    fn visit<V: Visit>(&self, v: &mut V, _key_prefix: &str, _description: &'static str) {
        self.traversal.visit(v, "morris.traversal", "");
    }
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option by its dotted key relative to `morris`,
    /// e.g. `traversal.step_limit`. A leading `morris.` is accepted too.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.strip_prefix("morris.").unwrap_or(key);
        ConfigField::set(self, key, value)
    }

    pub fn entries(&self) -> Vec<ConfigEntry> {
        struct Visitor(Vec<ConfigEntry>);
        impl Visit for Visitor {
            fn some<V: Display>(&mut self, key: &str, value: V, description: &'static str) {
                self.0.push(ConfigEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    description,
                })
            }
        }
        let mut v = Visitor(vec![]);
        self.visit(&mut v, "morris", "");
        v.0
    }
}
