use crate::event::ContentBlock;

const LABEL: &str = "graph context";

/// One block for a single-pattern lookup, naming every pattern looked up.
pub fn single_block(patterns: &[String], sections: &[String]) -> ContentBlock {
    ContentBlock::text(format!(
        "[{LABEL}: {}]\n{}",
        patterns.join(", "),
        sections.join("\n\n")
    ))
}

/// One block for a multi-file read. `hits` are `(file name, context)` in dispatch order.
pub fn batch_block(hits: &[(String, String)]) -> ContentBlock {
    if let [(name, text)] = hits {
        return ContentBlock::text(format!("[{LABEL}: {name}]\n{text}"));
    }

    let mut out = format!("[{LABEL}: {} files]", hits.len());
    for (name, text) in hits {
        out.push_str(&format!("\n\n### {name}\n{text}"));
    }
    ContentBlock::text(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_lists_patterns_and_separates_sections() {
        let block = single_block(
            &["withdraw".into(), "Vault".into()],
            &["ctx one".into(), "ctx two".into()],
        );
        assert_eq!(block.kind, "text");
        assert_eq!(
            block.text.as_deref(),
            Some("[graph context: withdraw, Vault]\nctx one\n\nctx two")
        );
    }

    #[test]
    fn batch_block_single_file_uses_its_name() {
        let block = batch_block(&[("a.sol".into(), "ctx".into())]);
        assert_eq!(block.text.as_deref(), Some("[graph context: a.sol]\nctx"));
    }

    #[test]
    fn batch_block_multiple_files_get_subsections() {
        let block = batch_block(&[("a.sol".into(), "one".into()), ("b.sol".into(), "two".into())]);
        assert_eq!(
            block.text.as_deref(),
            Some("[graph context: 2 files]\n\n### a.sol\none\n\n### b.sol\ntwo")
        );
    }
}
