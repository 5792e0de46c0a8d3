//! Mapping between human-readable topic names and arXiv category codes.
//!
//! Users pick topics by name when onboarding; the arXiv API wants category codes such as
//! `cs.AI`. The table here is fixed at compile time. Lookups ignore ASCII case and surrounding
//! whitespace.
//!
//! # Examples
//!
//! ```
//! use arxivist::category;
//!
//! assert_eq!(category::map_to_code("Machine Learning"), "cs.LG");
//! assert_eq!(category::map_to_code("  artificial intelligence "), "cs.AI");
//!
//! // Unknown topics pass through, since arXiv accepts free-form category fragments
//! assert_eq!(category::map_to_code("hep-th"), "hep-th");
//! ```

use std::borrow::Cow;

/// Topic name and category code pairs, in the order they are offered to users.
const TOPICS: &[(&str, &str)] = &[
  ("Artificial Intelligence", "cs.AI"),
  ("Machine Learning", "cs.LG"),
  ("Computer Vision", "cs.CV"),
  ("Natural Language Processing", "cs.CL"),
  ("Robotics", "cs.RO"),
  ("Cryptography and Security", "cs.CR"),
  ("Distributed Computing", "cs.DC"),
  ("Data Structures and Algorithms", "cs.DS"),
  ("Databases", "cs.DB"),
  ("Human-Computer Interaction", "cs.HC"),
  ("Information Retrieval", "cs.IR"),
  ("Networking", "cs.NI"),
  ("Programming Languages", "cs.PL"),
  ("Software Engineering", "cs.SE"),
  ("Computational Complexity", "cs.CC"),
  ("Neural and Evolutionary Computing", "cs.NE"),
  ("Statistics", "stat.ML"),
  ("Mathematics", "math"),
  ("Physics", "physics"),
  ("Quantum Physics", "quant-ph"),
  ("Astrophysics", "astro-ph"),
  ("Condensed Matter", "cond-mat"),
  ("Quantitative Biology", "q-bio"),
  ("Quantitative Finance", "q-fin"),
  ("Economics", "econ"),
  ("Electrical Engineering", "eess"),
];

/// Returns the category code for `topic`, or `topic` itself (trimmed) when it isn't in the table.
pub fn map_to_code(topic: &str) -> Cow<'_, str> {
  match lookup(topic) {
    Some(code) => Cow::Borrowed(code),
    None => Cow::Borrowed(topic.trim()),
  }
}

/// Returns the category code for `topic` only if the topic is in the table.
pub fn lookup(topic: &str) -> Option<&'static str> {
  let topic = topic.trim();
  TOPICS.iter().find(|(name, _)| name.eq_ignore_ascii_case(topic)).map(|(_, code)| *code)
}

/// All known topic names, in display order.
pub fn topics() -> impl Iterator<Item = &'static str> { TOPICS.iter().map(|(name, _)| *name) }

/// Reverse lookup, used to label papers by their primary category.
pub fn topic_for_code(code: &str) -> Option<&'static str> {
  TOPICS.iter().find(|(_, c)| *c == code).map(|(name, _)| *name)
}

/// Whether `code` can be placed in a `cat:` query.
pub fn is_usable_code(code: &str) -> bool { !code.is_empty() && !code.contains(char::is_whitespace) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_known_topics_map_to_codes() {
    assert_eq!(map_to_code("Artificial Intelligence"), "cs.AI");
    assert_eq!(map_to_code("COMPUTER VISION"), "cs.CV");
    assert_eq!(map_to_code("\tquantum physics\n"), "quant-ph");
  }

  #[test]
  fn test_unknown_topics_pass_through() {
    assert_eq!(map_to_code("cs.GT"), "cs.GT");
    assert_eq!(map_to_code(" Underwater Basket Weaving "), "Underwater Basket Weaving");
    assert_eq!(lookup("cs.GT"), None);
  }

  #[test]
  fn test_usable_codes() {
    assert!(is_usable_code("cs.AI"));
    assert!(is_usable_code("hep-th"));
    assert!(!is_usable_code(""));
    assert!(!is_usable_code("Underwater Basket Weaving"));
  }

  #[test]
  fn test_table_is_consistent() {
    let names: Vec<_> = topics().collect();
    assert_eq!(names.len(), TOPICS.len());
    for name in names {
      let code = lookup(name).unwrap();
      assert!(is_usable_code(code));
      assert_eq!(topic_for_code(code), Some(name));
    }
  }
}
