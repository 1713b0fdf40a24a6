use std::io::{self, BufRead, Write};

/// Prompt display and line reading for the interactive loop.
pub struct ShellPrompt<R> {
    reader: R,
    prompt: String,
}

impl ShellPrompt<io::StdinLock<'static>> {
    pub fn stdin(prompt: &str) -> Self {
        ShellPrompt::new(io::stdin().lock(), prompt)
    }
}

impl<R: BufRead> ShellPrompt<R> {
    pub fn new(reader: R, prompt: &str) -> Self {
        ShellPrompt {
            reader,
            prompt: prompt.to_string(),
        }
    }

    pub fn show_prompt(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "{}", self.prompt)?;
        out.flush()
    }

    /// Next line without its terminator, or `None` at end of input.
    /// Bytes that are not UTF-8 are replaced rather than rejected.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) if buf.is_empty() => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_until_eof() {
        let mut prompt = ShellPrompt::new(&b"echo one\r\necho two\nlast"[..], "$ ");
        assert_eq!(prompt.read_line().unwrap().as_deref(), Some("echo one"));
        assert_eq!(prompt.read_line().unwrap().as_deref(), Some("echo two"));
        assert_eq!(prompt.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(prompt.read_line().unwrap(), None);
    }

    #[test]
    fn test_empty_line_is_not_eof() {
        let mut prompt = ShellPrompt::new(&b"\n"[..], "$ ");
        assert_eq!(prompt.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(prompt.read_line().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut prompt = ShellPrompt::new(&b"echo \xff\n"[..], "$ ");
        assert_eq!(prompt.read_line().unwrap().as_deref(), Some("echo \u{fffd}"));
    }

    #[test]
    fn test_show_prompt() {
        let prompt = ShellPrompt::new(&b""[..], "tinysh> ");
        let mut out = Vec::new();
        prompt.show_prompt(&mut out).unwrap();
        assert_eq!(out, b"tinysh> ");
    }
}
