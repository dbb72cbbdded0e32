use serde::{Deserialize, Deserializer};

/// Deserializes an explicit `null` as the type's default value.
///
/// Introspection responses use `null` rather than `[]` for absent lists,
/// e.g. `fields` on a SCALAR.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
