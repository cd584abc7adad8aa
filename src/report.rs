const EXPECTED_PREFIX: &str = "expecting:";
const ACTUAL_PREFIX: &str = "found    :";
const MARKER_PREFIX: &str = "error    :";

/// Renders bytes as lowercase hex, two bytes per space-separated group.
#[must_use]
pub fn hex_words(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(|word| word.iter().map(|byte| format!("{byte:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column of byte `index` inside a `hex_words` dump.
#[must_use]
pub fn marker_column(index: usize) -> usize {
    index * 2 + index / 2
}

/// Three aligned lines: expected dump, actual dump and a caret under the byte
/// at `index`.
#[must_use]
pub fn render_payload_diff(expected: &[u8], actual: &[u8], index: usize) -> String {
    format!(
        "{EXPECTED_PREFIX}{}\n{ACTUAL_PREFIX}{}\n{MARKER_PREFIX}{:width$}^\n",
        hex_words(expected),
        hex_words(actual),
        "",
        width = marker_column(index)
    )
}
