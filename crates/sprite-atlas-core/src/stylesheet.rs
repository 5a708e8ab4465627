use crate::config::AtlasConfig;
use crate::layout::GridPlan;
use crate::model::PlacedItem;
use std::fmt::Write;

/// Line terminator written after every rule.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// ASCII-lowercases `name` and replaces every byte outside `[a-z0-9_]` with `_`.
///
/// Works on UTF-8 bytes, so a multi-byte character becomes one `_` per byte.
pub fn sanitize_name(name: &str) -> String {
    name.bytes()
        .map(|b| match b.to_ascii_lowercase() {
            c @ (b'a'..=b'z' | b'0'..=b'9' | b'_') => c as char,
            _ => '_',
        })
        .collect()
}

/// Renders the container rule followed by one offset rule per placed item.
///
/// The container rule's background position is the full atlas size, not
/// `0 0`. Item rules follow `placed` order.
pub fn render_stylesheet(placed: &[PlacedItem], plan: &GridPlan, cfg: &AtlasConfig) -> String {
    let class = &cfg.css_class;
    let mut css = String::new();
    let _ = write!(
        css,
        "{} {{ background: url('{}') no-repeat {}px {}px; }}{}",
        class, cfg.css_path, plan.width, plan.height, LINE_ENDING
    );
    for item in placed {
        let _ = write!(
            css,
            "{}{}-{} {{ background-position: -{}px -{}px; }}{}",
            class,
            class,
            sanitize_name(&item.name),
            item.x,
            item.y,
            LINE_ENDING
        );
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_replaces() {
        assert_eq!(sanitize_name("Arrow-Left.v2"), "arrow_left_v2");
        assert_eq!(sanitize_name("snake_case_9"), "snake_case_9");
        assert_eq!(sanitize_name("a b\tc"), "a_b_c");
        assert_eq!(sanitize_name("Ünïcode"), "__n__code");
        assert_eq!(sanitize_name("Über"), "__ber");
        // Kelvin sign is not ASCII, so it is not folded to `k`
        assert_eq!(sanitize_name("\u{212A}"), "___");
        assert_eq!(sanitize_name("漢"), "___");
        assert_eq!(sanitize_name(""), "");
    }
}
