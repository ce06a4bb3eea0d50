// src/utils/html.rs

/// Sanitizes admin-authored question text and options.
///
/// Formatting tags such as <b>, <sup> and <sub> (common in maths and
/// chemistry questions) survive; <script>, event handlers and the like are
/// stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
