/// Escape text for embedding inside a single-quoted SQL literal.
///
/// Every `'` is doubled; nothing else is touched. This only keeps a value
/// inside its literal, it is not a general injection defence.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
