use crate::environment::Environment;

/// Variable substitution for a single word: `$?`, `$$`, `$NAME` and `${NAME}`.
pub struct Expander<'a> {
    env: &'a Environment,
    last_status: i32,
    pid: u32,
}

impl<'a> Expander<'a> {
    pub fn new(env: &'a Environment, last_status: i32) -> Self {
        Expander {
            env,
            last_status,
            pid: std::process::id(),
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Unset variables expand to nothing; a `$` that starts no known form
    /// is kept as is.
    pub fn expand(&self, word: &str) -> String {
        let chars: Vec<char> = word.chars().collect();
        let mut out = String::with_capacity(word.len());
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if ch != '$' || i + 1 >= chars.len() {
                out.push(ch);
                i += 1;
                continue;
            }

            i += 1;
            match chars[i] {
                '?' => {
                    out.push_str(&self.last_status.to_string());
                    i += 1;
                }
                '$' => {
                    out.push_str(&self.pid.to_string());
                    i += 1;
                }
                c if c == '{' || c == '_' || c.is_ascii_alphabetic() => {
                    let braced = c == '{';
                    if braced {
                        i += 1;
                    }
                    let start = i;
                    while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                        i += 1;
                    }
                    let name: String = chars[start..i].iter().collect();
                    // An unterminated `${NAME` still expands
                    if braced && chars.get(i) == Some(&'}') {
                        i += 1;
                    }
                    out.push_str(self.env.get(&name).unwrap_or(""));
                }
                _ => out.push('$'),
            }
        }

        out
    }
}
