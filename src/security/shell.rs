//! Quote-aware splitting of a command line into simple commands.
//!
//! This is not a shell parser. It recognizes just enough POSIX `sh` lexing to
//! find every place a new command can start, and refuses the constructs that
//! would let a command run without appearing as a separate segment.
//!
//! Separators: `|`, `||`, `&`, `&&`, `;` and newline.
//! Quoting: single quotes, double quotes and backslash escapes; separators
//! inside quotes do not split.
//! Refused: `$(..)` and backticks (also inside double quotes), `<(..)` and
//! `>(..)`, parentheses, `<` and `>` redirection, unterminated quotes and a
//! trailing backslash.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// One simple command from a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    words: Vec<String>,
    text: String,
}

impl Segment {
    /// The dequoted words, command name first.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The segment as written, trimmed.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A construct the splitter refuses to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSyntaxError {
    /// `$(...)` or backticks.
    CommandSubstitution,
    /// `<(...)` or `>(...)`.
    ProcessSubstitution,
    /// `(...)` grouping.
    Subshell,
    /// `<` or `>` in any form.
    Redirection,
    /// A quote with no closing partner.
    UnterminatedQuote,
    /// A backslash as the final character.
    TrailingEscape,
}

impl ShellSyntaxError {
    /// Short human-readable name of the construct.
    #[must_use]
    pub fn construct(self) -> &'static str {
        match self {
            Self::CommandSubstitution => "command substitution",
            Self::ProcessSubstitution => "process substitution",
            Self::Subshell => "subshell",
            Self::Redirection => "redirection",
            Self::UnterminatedQuote => "unterminated quote",
            Self::TrailingEscape => "trailing backslash",
        }
    }
}

impl fmt::Display for ShellSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.construct())
    }
}

impl std::error::Error for ShellSyntaxError {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Accumulates words and raw text for the segment being scanned.
#[derive(Default)]
struct SegmentBuilder {
    words: Vec<String>,
    word: String,
    in_word: bool,
    text: String,
}

impl SegmentBuilder {
    fn push_char(&mut self, c: char) {
        self.word.push(c);
        self.in_word = true;
    }

    fn end_word(&mut self) {
        if self.in_word {
            self.words.push(std::mem::take(&mut self.word));
            self.in_word = false;
        }
    }

    fn finish(&mut self, out: &mut Vec<Segment>) {
        self.end_word();
        let words = std::mem::take(&mut self.words);
        let text = std::mem::take(&mut self.text);
        if !words.is_empty() {
            out.push(Segment {
                words,
                text: text.trim().to_string(),
            });
        }
    }
}

/// Splits `line` into simple commands.
///
/// Segments with no words (for example after a trailing `;`) are dropped,
/// so the result may be empty.
///
/// # Errors
///
/// Returns the first refused construct found, scanning left to right.
pub fn split_commands(line: &str) -> Result<Vec<Segment>, ShellSyntaxError> {
    let mut segments = Vec::new();
    let mut current = SegmentBuilder::default();
    let mut quote = Quote::None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                current.text.push(c);
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push_char(c);
                }
            }
            Quote::Double => {
                current.text.push(c);
                match c {
                    '"' => quote = Quote::None,
                    '\\' => double_quoted_escape(&mut chars, &mut current)?,
                    '`' => return Err(ShellSyntaxError::CommandSubstitution),
                    '$' if chars.peek() == Some(&'(') => {
                        return Err(ShellSyntaxError::CommandSubstitution)
                    }
                    _ => current.push_char(c),
                }
            }
            Quote::None => match c {
                '\\' => match chars.next() {
                    // Line continuation.
                    Some('\n') => {}
                    Some(escaped) => {
                        current.text.push(c);
                        current.text.push(escaped);
                        current.push_char(escaped);
                    }
                    None => return Err(ShellSyntaxError::TrailingEscape),
                },
                '\'' => {
                    current.text.push(c);
                    current.in_word = true;
                    quote = Quote::Single;
                }
                '"' => {
                    current.text.push(c);
                    current.in_word = true;
                    quote = Quote::Double;
                }
                '`' => return Err(ShellSyntaxError::CommandSubstitution),
                '$' if chars.peek() == Some(&'(') => {
                    return Err(ShellSyntaxError::CommandSubstitution)
                }
                '<' | '>' if chars.peek() == Some(&'(') => {
                    return Err(ShellSyntaxError::ProcessSubstitution)
                }
                '<' | '>' => return Err(ShellSyntaxError::Redirection),
                '(' | ')' => return Err(ShellSyntaxError::Subshell),
                '|' | '&' => {
                    if chars.peek() == Some(&c) {
                        chars.next();
                    }
                    current.finish(&mut segments);
                }
                ';' | '\n' => current.finish(&mut segments),
                ' ' | '\t' => {
                    current.text.push(c);
                    current.end_word();
                }
                _ => {
                    current.text.push(c);
                    current.push_char(c);
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(ShellSyntaxError::UnterminatedQuote);
    }
    current.finish(&mut segments);
    Ok(segments)
}

/// Inside double quotes a backslash only escapes `$`, `` ` ``, `"`, `\` and newline.
fn double_quoted_escape(
    chars: &mut Peekable<Chars<'_>>,
    current: &mut SegmentBuilder,
) -> Result<(), ShellSyntaxError> {
    match chars.next() {
        Some('\n') => Ok(()),
        Some(escaped @ ('$' | '`' | '"' | '\\')) => {
            current.text.push(escaped);
            current.push_char(escaped);
            Ok(())
        }
        Some(other) => {
            current.text.push(other);
            current.push_char('\\');
            current.push_char(other);
            Ok(())
        }
        None => Err(ShellSyntaxError::UnterminatedQuote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<Vec<String>> {
        split_commands(line)
            .unwrap()
            .into_iter()
            .map(|s| s.words().to_vec())
            .collect()
    }

    #[test]
    fn single_command_splits_on_whitespace() {
        assert_eq!(words("ls  -la\t/tmp"), vec![vec!["ls", "-la", "/tmp"]]);
    }

    #[test]
    fn only_blanks_separate_words() {
        for line in ["ls\u{a0}x", "ls\u{b}x", "ls\rx", "ls\u{2003}x", "ls\u{c}x"] {
            let split = words(line);
            assert_eq!(split.len(), 1, "{line:?}");
            assert_eq!(split[0], vec![line.to_string()], "{line:?}");
        }
    }

    #[test]
    fn every_separator_starts_a_segment() {
        let expected: Vec<Vec<String>> = vec![
            vec!["a".into()],
            vec!["b".into()],
            vec!["c".into()],
            vec!["d".into()],
            vec!["e".into()],
            vec!["f".into()],
            vec!["g".into()],
        ];
        assert_eq!(words("a | b || c & d && e ; f\ng"), expected);
    }

    #[test]
    fn separators_need_no_spaces() {
        assert_eq!(words("ls|grep x"), vec![vec!["ls"], vec!["grep", "x"]]);
        assert_eq!(words("ls;rm"), vec![vec!["ls"], vec!["rm"]]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(words("ls ;"), vec![vec!["ls"]]);
        assert!(split_commands("  ; & ").unwrap().is_empty());
        assert!(split_commands("").unwrap().is_empty());
    }

    #[test]
    fn quotes_protect_separators() {
        assert_eq!(
            words(r#"grep "a|b;c" file"#),
            vec![vec!["grep", "a|b;c", "file"]]
        );
        assert_eq!(words("echo 'x && y'"), vec![vec!["echo", "x && y"]]);
    }

    #[test]
    fn quotes_are_removed_from_words() {
        assert_eq!(words(r#"'l's "-la""#), vec![vec!["ls", "-la"]]);
        assert_eq!(words(r"l\s"), vec![vec!["ls"]]);
    }

    #[test]
    fn empty_quoted_word_is_kept() {
        assert_eq!(words(r#"echo """#), vec![vec!["echo", ""]]);
    }

    #[test]
    fn escaped_separator_does_not_split() {
        assert_eq!(words(r"echo a\;b"), vec![vec!["echo", "a;b"]]);
    }

    #[test]
    fn line_continuation_joins_lines() {
        assert_eq!(words("ls \\\n-la"), vec![vec!["ls", "-la"]]);
    }

    #[test]
    fn segment_text_is_trimmed_source() {
        let segments = split_commands("ls -la |  grep 'x y' ").unwrap();
        assert_eq!(segments[0].text(), "ls -la");
        assert_eq!(segments[1].text(), "grep 'x y'");
    }

    #[test]
    fn refuses_command_substitution() {
        for line in ["echo $(id)", "echo `id`", r#"echo "$(id)""#, r#"echo "`id`""#] {
            assert_eq!(
                split_commands(line),
                Err(ShellSyntaxError::CommandSubstitution),
                "{line}"
            );
        }
    }

    #[test]
    fn allows_dollar_inside_single_quotes() {
        assert_eq!(words("echo '$(id)'"), vec![vec!["echo", "$(id)"]]);
    }

    #[test]
    fn refuses_process_substitution() {
        assert_eq!(
            split_commands("diff <(ls) b"),
            Err(ShellSyntaxError::ProcessSubstitution)
        );
        assert_eq!(
            split_commands("tee >(sh)"),
            Err(ShellSyntaxError::ProcessSubstitution)
        );
    }

    #[test]
    fn refuses_redirection() {
        for line in ["echo x > f", "cat < f", "ls 2>&1", "echo x >> f"] {
            assert_eq!(
                split_commands(line),
                Err(ShellSyntaxError::Redirection),
                "{line}"
            );
        }
    }

    #[test]
    fn refuses_subshell() {
        assert_eq!(split_commands("(rm x)"), Err(ShellSyntaxError::Subshell));
    }

    #[test]
    fn refuses_unterminated_input() {
        assert_eq!(
            split_commands("echo 'oops"),
            Err(ShellSyntaxError::UnterminatedQuote)
        );
        assert_eq!(
            split_commands("echo \"oops"),
            Err(ShellSyntaxError::UnterminatedQuote)
        );
        assert_eq!(split_commands("echo \\"), Err(ShellSyntaxError::TrailingEscape));
    }
}
