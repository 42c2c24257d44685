use std::collections::HashSet;

/// Source extensions recognized out of the box.
const DEFAULT_EXTENSIONS: &[&str] = &[
    // C family
    "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "hxx", "m", "mm", "cs",
    // JVM
    "java", "kt", "kts", "scala", "groovy", "clj",
    // Web
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "vue", "svelte",
    // Systems
    "rs", "go", "zig", "nim", "swift", "dart",
    // Scripting
    "py", "rb", "php", "lua", "pl", "pm", "r", "jl", "sh", "bash",
    // Functional
    "hs", "ml", "mli", "fs", "fsx", "ex", "exs", "erl",
    // Contracts
    "sol", "vy", "move", "cairo",
];

/// The set of file extensions treated as source code.
#[derive(Debug, Clone)]
pub struct CodeExtensions {
    set: HashSet<String>,
}

impl Default for CodeExtensions {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl CodeExtensions {
    /// The default table plus `extra` (with or without a leading dot).
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: HashSet<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        for ext in extra {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() {
                set.insert(ext);
            }
        }
        Self { set }
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.set.contains(&ext.to_ascii_lowercase())
    }

    /// True when the basename of `path` carries a recognized extension.
    pub fn is_code_path(&self, path: &str) -> bool {
        extension(basename(path)).is_some_and(|ext| self.contains(ext))
    }
}

/// Final path component, accepting both separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// Extension of a file name, without the dot. Dotfiles have none.
pub fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// File name with its final extension removed.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
