/// Reduces arbitrary text to a filesystem-safe name.
///
/// Allow-list: ASCII alphanumerics, space, `-` and `_`. Everything else is
/// dropped, runs of whitespace collapse to a single `_`, and the result is
/// truncated to `max_length` characters.
pub(crate) fn sanitize_for_filesystem(text: &str, max_length: usize) -> String {
    let filtered = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_'))
        .collect::<String>();

    let mut result = String::with_capacity(filtered.len());
    let mut in_whitespace = false;

    for c in filtered.trim().chars() {
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            result.push('_');
            in_whitespace = false;
        }
        result.push(c);
    }

    result.chars().take(max_length).collect()
}

#[cfg(test)]
mod sanitize_tests {
    use super::sanitize_for_filesystem;

    #[test]
    fn should_keep_alphanumerics_dashes_and_underscores() {
        assert_eq!(
            sanitize_for_filesystem("01 - Daft_Punk - One More Time", 120),
            "01_-_Daft_Punk_-_One_More_Time"
        );
    }

    #[test]
    fn should_drop_characters_outside_the_allow_list() {
        assert_eq!(
            sanitize_for_filesystem("AC/DC: Back In Black (Remaster) [2003]", 120),
            "ACDC_Back_In_Black_Remaster_2003"
        );
    }

    #[test]
    fn should_collapse_whitespace_runs() {
        assert_eq!(sanitize_for_filesystem("a  \t b", 120), "a_b");
    }

    #[test]
    fn should_trim_leading_and_trailing_whitespace() {
        assert_eq!(sanitize_for_filesystem("  hello  ", 120), "hello");
    }

    #[test]
    fn should_truncate_to_max_length() {
        assert_eq!(sanitize_for_filesystem("abcdefgh", 3), "abc");
    }

    #[test]
    fn should_return_empty_string_for_fully_unsafe_input() {
        assert_eq!(sanitize_for_filesystem("///***???", 120), "");
    }
}
