/// Greedily packs whitespace-separated words into lines of at most `max_width`
/// characters. A word longer than `max_width` gets a line of its own and is never split.
pub fn wrap(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_width {
            lines.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current.trim().to_string());
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_whole() {
        assert_eq!(wrap("Acme", 20), vec!["Acme"]);
        assert_eq!(wrap("", 20), vec![""]);
        assert_eq!(wrap("exactly twenty chars", 20), vec!["exactly twenty chars"]);
    }

    #[test]
    fn long_text_wraps_on_word_boundaries() {
        let lines = wrap("International Business Machines Corporation", 20);
        assert_eq!(lines, vec!["International", "Business Machines", "Corporation"]);
        for line in &lines {
            assert!(line.chars().count() <= 20, "line too long: {line:?}");
        }
    }

    #[test]
    fn oversized_word_is_not_split() {
        let lines = wrap("Supercalifragilisticexpialidocious Ltd", 20);
        assert_eq!(lines, vec!["Supercalifragilisticexpialidocious", "Ltd"]);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let lines = wrap("Big    Company   With  Spaces Everywhere", 20);
        assert_eq!(lines, vec!["Big Company With", "Spaces Everywhere"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let lines = wrap("Société Générale Éditions", 20);
        assert_eq!(lines, vec!["Société Générale", "Éditions"]);
    }
}
