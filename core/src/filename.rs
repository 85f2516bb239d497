//! Maps stored destination paths (`{app}\Sub\File.exe`) to safe relative
//! output paths. Variables expand recursively with `{{` escapes, characters
//! the local filesystem rejects become `$`, and `.`/`..` segments collapse so
//! the result can never leave the output directory.

use std::collections::HashMap;

/// Separator used for produced paths.
const PATH_SEP: char = '/';

fn is_path_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

fn is_unsafe_path_char(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || (c as u32) < 32
}

fn replace_unsafe_chars(input: &str) -> String {
    input
        .chars()
        .map(|c| if is_unsafe_path_char(c) { '$' } else { c })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FilenameMap {
    /// Explicit variable substitutions; unmapped variables expand to their
    /// own (sanitized) name.
    overrides: HashMap<String, String>,
    pub lowercase: bool,
}

impl FilenameMap {
    pub fn new(lowercase: bool) -> Self {
        FilenameMap {
            overrides: HashMap::new(),
            lowercase,
        }
    }

    pub fn set(&mut self, variable: &str, replacement: &str) {
        self.overrides
            .insert(variable.to_owned(), replacement.to_owned());
    }

    fn lookup(&self, key: &str) -> String {
        match self.overrides.get(key) {
            Some(replacement) => replacement.clone(),
            None => replace_unsafe_chars(key),
        }
    }

    fn expand_variables(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        close: bool,
    ) -> String {
        let mut result = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' if close => break,
                '}' => result.push('}'),
                '{' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        result.push('{');
                    } else {
                        // Nested variables expand inside-out.
                        let inner = self.expand_variables(chars, true);
                        result.push_str(&self.lookup(&inner));
                    }
                }
                c if is_unsafe_path_char(c) => result.push('$'),
                c => result.push(c),
            }
        }

        result
    }

    /// Collapses separators and dot segments; `..` backtracks within the
    /// partial result and cannot escape it.
    fn shorten_path(path: &str) -> String {
        let mut result = String::with_capacity(path.len());
        for segment in path.split(is_path_separator) {
            match segment {
                "" | "." => {}
                ".." => {
                    let cut = result.rfind(PATH_SEP).unwrap_or(0);
                    result.truncate(cut);
                }
                _ => {
                    if !result.is_empty() {
                        result.push(PATH_SEP);
                    }
                    result.push_str(segment);
                }
            }
        }
        result
    }

    /// Produces the relative output path for a stored destination.
    pub fn convert(&self, stored: &str) -> String {
        let path = if self.lowercase {
            stored.to_lowercase()
        } else {
            stored.to_owned()
        };

        let mut chars = path.chars().peekable();
        let expanded = self.expand_variables(&mut chars, false);
        Self::shorten_path(&expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_expand_to_their_names() {
        let map = FilenameMap::new(false);
        assert_eq!(map.convert("{app}\\bin\\tool.exe"), "app/bin/tool.exe");
        assert_eq!(map.convert("{win}/x"), "win/x");
    }

    #[test]
    fn overrides_take_precedence() {
        let mut map = FilenameMap::new(false);
        map.set("app", "");
        assert_eq!(map.convert("{app}\\readme.txt"), "readme.txt");
    }

    #[test]
    fn escapes_and_literal_braces() {
        let map = FilenameMap::new(false);
        assert_eq!(map.convert("a{{b"), "a{b");
        assert_eq!(map.convert("a}b"), "a}b");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        let map = FilenameMap::new(false);
        assert_eq!(map.convert("dir\\a:b*c.txt"), "dir/a$b$c.txt");
        assert_eq!(map.convert("{code:GetPath|x}"), "code$GetPath$x");
    }

    #[test]
    fn dot_segments_cannot_escape() {
        let map = FilenameMap::new(false);
        assert_eq!(map.convert("a\\..\\..\\..\\etc\\passwd"), "etc/passwd");
        assert_eq!(map.convert(".\\a\\.\\b"), "a/b");
        assert_eq!(map.convert("a\\b\\..\\c"), "a/c");
    }

    #[test]
    fn lowercase_mode() {
        let map = FilenameMap::new(true);
        assert_eq!(map.convert("{app}\\ReadMe.TXT"), "app/readme.txt");
    }
}
