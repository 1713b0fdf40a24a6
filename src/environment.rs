use std::collections::BTreeMap;

/// The shell's variable table.
///
/// A mirroring environment forwards every change into the process
/// environment so that exec'd children inherit it. A detached one keeps
/// changes to itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    mirror: bool,
}

impl Environment {
    pub fn new() -> Self {
        // Import all OS environment variables when starting the process
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        Environment { vars, mirror: true }
    }

    pub fn detached() -> Self {
        Environment {
            vars: BTreeMap::new(),
            mirror: false,
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Environment {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            mirror: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if self.mirror && os_storable(key, value) {
            // SAFETY: the shell mutates its environment from a single thread,
            // and only between pipelines.
            unsafe { std::env::set_var(key, value) };
        }
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn unset(&mut self, key: &str) {
        if self.mirror && os_storable(key, "") {
            // SAFETY: see `set`.
            unsafe { std::env::remove_var(key) };
        }
        self.vars.remove(key);
    }

    /// All variables, sorted by name.
    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// std::env::set_var panics on names the OS cannot hold
fn os_storable(key: &str, value: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0']) && !value.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_includes_os_env() {
        let env = Environment::new();
        // At least one OS env var should exist
        assert!(!env.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut env = Environment::detached();
        env.set("FOO", "bar");
        assert_eq!(env.get("FOO"), Some("bar"));
        env.set("FOO", "baz");
        assert_eq!(env.get("FOO"), Some("baz"));
    }

    #[test]
    fn test_unset() {
        let mut env = Environment::from_pairs([("FOO", "bar")]);
        env.unset("FOO");
        assert_eq!(env.get("FOO"), None);
        env.unset("NEVER_SET");
        assert!(env.is_empty());
    }

    #[test]
    fn test_all_is_sorted() {
        let env = Environment::from_pairs([("ZED", "1"), ("ALPHA", "2"), ("MID", "3")]);
        let names: Vec<&str> = env.all().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["ALPHA", "MID", "ZED"]);
    }

    #[test]
    fn test_detached_does_not_touch_process_env() {
        let mut env = Environment::detached();
        env.set("TINYSH_DETACHED_TEST_VAR", "1");
        assert!(std::env::var_os("TINYSH_DETACHED_TEST_VAR").is_none());
    }

    #[test]
    fn test_unstorable_names_stay_in_table() {
        let mut env = Environment::detached();
        env.set("", "x");
        env.set("A=B", "y");
        assert_eq!(env.get(""), Some("x"));
        assert_eq!(env.get("A=B"), Some("y"));
        assert!(!os_storable("A=B", "y"));
        assert!(!os_storable("OK", "nul\0"));
        assert!(os_storable("OK", "fine"));
    }
}
