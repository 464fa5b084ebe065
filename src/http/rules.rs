//! Configured header manipulation (`header_up` / `header_down`).
//!
//! Operations run in a fixed order: add, set, delete, replace. A delete entry
//! ending in `*` removes every header with that prefix.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::HeaderRulesConfig;

/// A header rule that cannot be turned into valid HTTP.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid header name {0:?}")]
    Name(String),
    #[error("invalid value for header {0:?}")]
    Value(String),
}

#[derive(Debug, Clone)]
enum Delete {
    Exact(HeaderName),
    Prefix(String),
}

#[derive(Debug, Clone)]
struct Replace {
    field: HeaderName,
    search: String,
    replace: String,
}

/// Compiled, immutable header rules.
#[derive(Debug, Clone, Default)]
pub struct HeaderRules {
    add: Vec<(HeaderName, HeaderValue)>,
    set: Vec<(HeaderName, HeaderValue)>,
    delete: Vec<Delete>,
    replace: Vec<Replace>,
}

fn header_name(name: &str) -> Result<HeaderName, RuleError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| RuleError::Name(name.to_string()))
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), RuleError> {
    let value = HeaderValue::from_str(value).map_err(|_| RuleError::Value(name.to_string()))?;
    Ok((header_name(name)?, value))
}

impl HeaderRules {
    pub fn compile(config: &HeaderRulesConfig) -> Result<Self, RuleError> {
        let add = config
            .add
            .iter()
            .map(|(name, value)| header_pair(name, value))
            .collect::<Result<_, _>>()?;
        let set = config
            .set
            .iter()
            .map(|(name, value)| header_pair(name, value))
            .collect::<Result<_, _>>()?;
        let delete = config
            .delete
            .iter()
            .map(|name| match name.strip_suffix('*') {
                Some(prefix) => Ok(Delete::Prefix(prefix.to_ascii_lowercase())),
                None => header_name(name).map(Delete::Exact),
            })
            .collect::<Result<_, _>>()?;
        let replace = config
            .replace
            .iter()
            .map(|r| {
                Ok(Replace {
                    field: header_name(&r.field)?,
                    search: r.search.clone(),
                    replace: r.replace.clone(),
                })
            })
            .collect::<Result<_, RuleError>>()?;

        Ok(Self {
            add,
            set,
            delete,
            replace,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.set.is_empty() && self.delete.is_empty() && self.replace.is_empty()
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.add {
            headers.append(name.clone(), value.clone());
        }
        for (name, value) in &self.set {
            headers.insert(name.clone(), value.clone());
        }
        for rule in &self.delete {
            match rule {
                Delete::Exact(name) => {
                    headers.remove(name);
                }
                Delete::Prefix(prefix) => {
                    let doomed: Vec<HeaderName> = headers
                        .keys()
                        .filter(|name| name.as_str().starts_with(prefix.as_str()))
                        .cloned()
                        .collect();
                    for name in doomed {
                        headers.remove(&name);
                    }
                }
            }
        }
        for rule in &self.replace {
            let values: Vec<HeaderValue> = headers
                .get_all(&rule.field)
                .iter()
                .map(|value| match value.to_str() {
                    Ok(text) if text.contains(rule.search.as_str()) => {
                        HeaderValue::from_str(&text.replace(rule.search.as_str(), &rule.replace))
                            .unwrap_or_else(|_| value.clone())
                    }
                    _ => value.clone(),
                })
                .collect();
            if values.is_empty() {
                continue;
            }
            headers.remove(&rule.field);
            for value in values {
                headers.append(rule.field.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HeaderReplacement;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(header_name(name).unwrap(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn add_set_delete_replace() {
        let mut config = HeaderRulesConfig::default();
        config.add.insert("X-Added".into(), "yes".into());
        config.set.insert("Accept".into(), "application/json".into());
        config.delete.push("Cookie".into());
        config.delete.push("x-internal-*".into());
        config.replace.push(HeaderReplacement {
            field: "Location".into(),
            search: "internal.local".into(),
            replace: "example.com".into(),
        });
        let rules = HeaderRules::compile(&config).unwrap();

        let mut map = headers(&[
            ("accept", "text/html"),
            ("accept", "text/plain"),
            ("cookie", "session=1"),
            ("x-internal-a", "1"),
            ("x-internal-b", "2"),
            ("location", "https://internal.local/next"),
        ]);
        rules.apply(&mut map);

        assert_eq!(map.get_all("accept").iter().count(), 1);
        assert_eq!(map["accept"], "application/json");
        assert_eq!(map["x-added"], "yes");
        assert!(map.get("cookie").is_none());
        assert!(map.get("x-internal-a").is_none());
        assert!(map.get("x-internal-b").is_none());
        assert_eq!(map["location"], "https://example.com/next");
    }

    #[test]
    fn add_appends_to_existing_values() {
        let mut config = HeaderRulesConfig::default();
        config.add.insert("vary".into(), "origin".into());
        let rules = HeaderRules::compile(&config).unwrap();

        let mut map = headers(&[("vary", "accept")]);
        rules.apply(&mut map);
        let values: Vec<_> = map.get_all("vary").iter().collect();
        assert_eq!(values, vec!["accept", "origin"]);
    }

    #[test]
    fn rejects_invalid_rules() {
        let mut config = HeaderRulesConfig::default();
        config.set.insert("bad header".into(), "x".into());
        assert!(matches!(HeaderRules::compile(&config), Err(RuleError::Name(_))));

        let mut config = HeaderRulesConfig::default();
        config.set.insert("x-ok".into(), "line\nbreak".into());
        assert!(matches!(HeaderRules::compile(&config), Err(RuleError::Value(_))));
    }

    #[test]
    fn empty_rules_are_a_no_op() {
        let rules = HeaderRules::compile(&HeaderRulesConfig::default()).unwrap();
        assert!(rules.is_empty());
        let mut map = headers(&[("a", "1")]);
        rules.apply(&mut map);
        assert_eq!(map, headers(&[("a", "1")]));
    }
}
