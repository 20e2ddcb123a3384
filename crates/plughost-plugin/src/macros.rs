//! Convenience macros for plugin development.

/// Builds an [`ExtraFields`](crate::plugin::ExtraFields) map.
///
/// # Example
/// ```rust
/// use plughost_plugin::extra_fields;
/// use serde_json::json;
///
/// let extra = extra_fields! {
///     "homepage" => json!("https://acme.test"),
///     "retries" => json!(3),
/// };
/// assert_eq!(extra.len(), 2);
/// ```
#[macro_export]
macro_rules! extra_fields {
    () => {
        $crate::plugin::ExtraFields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::plugin::ExtraFields::new();
        $(
            fields.insert($key.to_string(), $value);
        )+
        fields
    }};
}
