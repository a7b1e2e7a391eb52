//! Title-to-filename sanitization and collection path layout.

use std::path::{Path, PathBuf};

const DEFAULT_TITLE: &str = "video";

/// Longest sanitized title, in characters.
const MAX_TITLE_CHARS: usize = 200;
/// Stem length used when truncating a title that carries an extension.
const TRUNCATED_STEM_CHARS: usize = 196;
/// Longest full destination path tolerated before falling back to a
/// generic name.
pub const MAX_PATH_CHARS: usize = 255;

/// Maps one character to its filesystem-safe replacement.
///
/// Reserved filename characters become `-`, and the fullwidth CJK
/// punctuation commonly found in video titles is folded to ASCII so the
/// result stays stable under repeated sanitization.
fn substitute(c: char) -> char {
    match c {
        // Reserved on Windows, troublesome everywhere.
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
        // Fullwidth forms of the same reserved characters.
        '？' | '＊' | '／' | '＼' | '｜' | '〈' | '〉' | '“' | '”' => '-',
        '：' | '、' | '·' | '…' | '—' | '－' => '-',
        '《' | '（' => '(',
        '》' | '）' => ')',
        '【' | '「' | '『' => '[',
        '】' | '」' | '』' => ']',
        '，' => ',',
        '。' => '.',
        '！' => '!',
        '；' => ';',
        '‘' | '’' => '\'',
        '～' => '~',
        '￥' => '$',
        '％' => '%',
        '＃' => '#',
        '＆' => '&',
        '＋' => '+',
        '＝' => '=',
        '＠' => '@',
        '＾' => '^',
        other => other,
    }
}

/// Sanitizes a display title into a filesystem-safe name.
///
/// Runs of spaces or dashes are collapsed so substitution cannot inflate
/// the name, the ends are stripped of separators, and an empty result
/// falls back to a generic title. Idempotent: sanitizing twice yields
/// the same string.
pub fn sanitize_title(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if (c as u32) < 0x20 { ' ' } else { substitute(c) };
        // Collapse runs of the separators substitution produces.
        if (c == ' ' || c == '-') && result.ends_with(c) {
            continue;
        }
        result.push(c);
    }

    let strip = [' ', '.', '-'];
    let result = result
        .trim_start_matches(|c| strip.contains(&c))
        .trim_end_matches(|c| strip.contains(&c))
        .to_string();

    if result.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if result.chars().count() <= MAX_TITLE_CHARS {
        return result;
    }

    let truncated = truncate_preserving_ext(&result);
    let truncated = truncated
        .trim_end_matches(|c| strip.contains(&c))
        .to_string();
    if truncated.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        truncated
    }
}

fn truncate_preserving_ext(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let (stem, ext) = name.split_at(idx);
            let mut out: String = stem.chars().take(TRUNCATED_STEM_CHARS).collect();
            out.push_str(ext);
            out
        }
        _ => name.chars().take(MAX_TITLE_CHARS).collect(),
    }
}

/// Filename for a standalone video: `<title>.mp4`.
pub fn video_file_name(title: &str) -> String {
    format!("{}.mp4", sanitize_title(title))
}

/// Filename for one collection entry: `<NN>-<title>.mp4`. The
/// zero-padded ordinal keeps duplicate titles distinct and the directory
/// sorted in collection order.
pub fn item_file_name(ordinal: u32, title: &str) -> String {
    format!("{ordinal:02}-{}.mp4", sanitize_title(title))
}

/// Destination path for one collection entry under `dir`, falling back
/// to a generic `<NN>-video<N>.mp4` name when the full path would exceed
/// [`MAX_PATH_CHARS`] characters.
pub fn item_path(dir: &Path, ordinal: u32, title: &str) -> PathBuf {
    let path = dir.join(item_file_name(ordinal, title));
    if path.to_string_lossy().chars().count() > MAX_PATH_CHARS {
        return dir.join(format!("{ordinal:02}-video{ordinal}.mp4"));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_title("a/b\\c:d*e?f\"g<h>i|j"), "a-b-c-d-e-f-g-h-i-j");
    }

    #[test]
    fn folds_fullwidth_punctuation() {
        assert_eq!(sanitize_title("【合集】第１话：开端！"), "[合集]第１话-开端!");
        assert_eq!(sanitize_title("《指南》（上）"), "(指南)(上)");
        assert_eq!(sanitize_title("什么？真的吗～"), "什么-真的吗~");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(sanitize_title("a///b"), "a-b");
        assert_eq!(sanitize_title("a   b"), "a b");
        assert_eq!(sanitize_title("a:：、b"), "a-b");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(sanitize_title("  .name. -"), "name");
        assert_eq!(sanitize_title("...hidden"), "hidden");
    }

    #[test]
    fn control_characters_become_spaces() {
        assert_eq!(sanitize_title("line\none\ttwo"), "line one two");
        assert_eq!(sanitize_title("\u{1}\u{2}x"), "x");
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(sanitize_title(""), "video");
        assert_eq!(sanitize_title("???"), "video");
        assert_eq!(sanitize_title(" . "), "video");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let cases = [
            "a/b\\c:d",
            "【标题】：测试？？",
            "  spaced   out  ",
            "《大全》（完整版）！",
            "trailing...",
            "",
            "plain title 01",
        ];
        for case in cases {
            let once = sanitize_title(case);
            assert_eq!(sanitize_title(&once), once, "not idempotent for {case:?}");
        }
    }

    #[test]
    fn truncates_long_titles_preserving_extension() {
        let long = format!("{}.mp4", "x".repeat(300));
        let out = sanitize_title(&long);
        assert_eq!(out.chars().count(), TRUNCATED_STEM_CHARS + 4);
        assert!(out.ends_with(".mp4"));

        let no_ext = "y".repeat(300);
        let out = sanitize_title(&no_ext);
        assert_eq!(out.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn ordinal_prefix_keeps_duplicate_titles_distinct() {
        let dir = Path::new("downloads/series");
        let a = item_path(dir, 1, "episode");
        let b = item_path(dir, 2, "episode");
        assert_ne!(a, b);
        assert_eq!(a.file_name().unwrap(), "01-episode.mp4");
        assert_eq!(b.file_name().unwrap(), "02-episode.mp4");
    }

    #[test]
    fn over_long_path_falls_back_to_generic_name() {
        let dir = PathBuf::from(format!("downloads/{}", "d".repeat(200)));
        let path = item_path(&dir, 7, &"t".repeat(150));
        assert_eq!(path.file_name().unwrap(), "07-video7.mp4");
        assert!(path.to_string_lossy().chars().count() <= MAX_PATH_CHARS);
    }

    #[test]
    fn short_path_keeps_title() {
        let dir = Path::new("downloads/series");
        let path = item_path(dir, 3, "第三集");
        assert_eq!(path.file_name().unwrap(), "03-第三集.mp4");
    }
}
