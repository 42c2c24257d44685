use super::extensions::{basename, strip_extension, CodeExtensions};
use super::{finalize, strip_glob, strip_quotes, strip_regex};

/// Scan a shell command left to right for the first lookup-worthy token.
///
/// `grep`/`rg` arm search mode, `cat`/`head`/`tail`/`less`/`wc` arm read mode,
/// `find` disarms both. The first non-flag token after an armed command ends
/// the scan. `-name`/`-iname` capture the following token immediately.
pub(crate) fn scan(command: &str, extensions: &CodeExtensions) -> Option<String> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let mut in_search = false;
    let mut in_read = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "grep" | "rg" => {
                in_search = true;
                in_read = false;
            }
            "cat" | "head" | "tail" | "less" | "wc" => {
                in_read = true;
                in_search = false;
            }
            "find" => {
                in_search = false;
                in_read = false;
            }
            "-name" | "-iname" => {
                if let Some(next) = tokens.get(i + 1) {
                    let unquoted = strip_quotes(next);
                    let name = strip_glob(strip_extension(basename(&unquoted)));
                    if let Some(candidate) = finalize(&name) {
                        return Some(candidate);
                    }
                    i += 1;
                }
            }
            _ if token.starts_with('-') => {}
            _ if in_search => return finalize(&strip_regex(&strip_quotes(token))),
            _ if in_read => {
                let path = strip_quotes(token);
                if !extensions.is_code_path(&path) {
                    return None;
                }
                return finalize(strip_extension(basename(&path)));
            }
            _ => {}
        }
        i += 1;
    }

    None
}
