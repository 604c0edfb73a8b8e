/// Separator placed between the namespace and each key part.
pub const KEY_SEPARATOR: char = ':';

/// Joins a namespace and its parameters into a cache key, e.g.
/// `derive_key("weather", ["delhi"])` gives `"weather:delhi"`.
///
/// Parts are used verbatim. Callers that let user input into a key should make
/// sure the separator cannot appear in it, or two different parameter lists
/// may collide.
pub fn derive_key<I, S>(namespace: &str, parts: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut key = String::from(namespace);
  for part in parts {
    key.push(KEY_SEPARATOR);
    key.push_str(part.as_ref());
  }
  key
}
