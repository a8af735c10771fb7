//! UTM campaign URL composition.
//!
//! `compose` takes a base URL and a [`ParameterSet`] and returns the base
//! URL's origin and path with the populated `utm_*` pairs appended in a
//! fixed order. Query strings and fragments already present on the base URL
//! are dropped.

pub mod presets;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::{form_urlencoded, Url};

/// One of the five recognized campaign parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtmParam {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmParam {
    /// All parameters in serialization order.
    pub const ALL: [UtmParam; 5] = [
        UtmParam::Source,
        UtmParam::Medium,
        UtmParam::Campaign,
        UtmParam::Term,
        UtmParam::Content,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UtmParam::Source => "source",
            UtmParam::Medium => "medium",
            UtmParam::Campaign => "campaign",
            UtmParam::Term => "term",
            UtmParam::Content => "content",
        }
    }

    /// Query-string key, e.g. `utm_source`.
    pub fn key(self) -> &'static str {
        match self {
            UtmParam::Source => "utm_source",
            UtmParam::Medium => "utm_medium",
            UtmParam::Campaign => "utm_campaign",
            UtmParam::Term => "utm_term",
            UtmParam::Content => "utm_content",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for UtmParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown UTM parameter `{0}`")]
pub struct UnknownParam(pub String);

impl FromStr for UtmParam {
    type Err = UnknownParam;

    /// Accepts both `source` and `utm_source`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("utm_").unwrap_or(lower.as_str());
        UtmParam::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| UnknownParam(s.to_string()))
    }
}

/// Values for the five UTM parameters. Empty strings are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: [Option<String>; 5],
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, param: UtmParam, value: impl Into<String>) {
        let value = value.into();
        self.values[param.index()] = if value.is_empty() { None } else { Some(value) };
    }

    pub fn get(&self, param: UtmParam) -> Option<&str> {
        self.values[param.index()].as_deref()
    }

    /// Populated parameters in serialization order.
    pub fn populated(&self) -> impl Iterator<Item = (UtmParam, &str)> + '_ {
        UtmParam::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).map(|v| (p, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

impl<S: Into<String>> FromIterator<(UtmParam, S)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (UtmParam, S)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (param, value) in iter {
            set.set(param, value);
        }
        set
    }
}

/// The base URL could not be parsed as an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid base URL `{input}`: {reason}")]
pub struct InvalidBaseUrl {
    pub input: String,
    #[source]
    pub reason: url::ParseError,
}

/// Compose `base_url` with the populated parameters of `params`.
///
/// The result is the origin (scheme, host, non-default port) and path of
/// `base_url`, followed by `?utm_source=...&utm_medium=...` for whichever
/// parameters are set, always in the order of [`UtmParam::ALL`]. Values are
/// form-urlencoded (space becomes `+`, non-ASCII is UTF-8 percent-encoded).
/// With no parameters set the prefix is returned without a trailing `?`.
pub fn compose(base_url: &str, params: &ParameterSet) -> Result<String, InvalidBaseUrl> {
    let url = Url::parse(base_url).map_err(|reason| InvalidBaseUrl {
        input: base_url.to_string(),
        reason,
    })?;

    let mut composed = canonical_prefix(&url);

    if !params.is_empty() {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (param, value) in params.populated() {
            query.append_pair(param.key(), value);
        }
        composed.push('?');
        composed.push_str(&query.finish());
    }

    Ok(composed)
}

/// Origin plus path, without query, fragment or credentials.
fn canonical_prefix(url: &Url) -> String {
    let origin = url.origin();
    if origin.is_tuple() {
        return format!("{}{}", origin.ascii_serialization(), url.path());
    }

    // Opaque origins (custom schemes, mailto:, file:) serialize as "null",
    // so strip the parts we drop and keep the rest of the URL.
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    // Only fails for URLs that cannot carry credentials, which have none.
    let _ = stripped.set_username("");
    let _ = stripped.set_password(None);
    stripped.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(UtmParam, &str)]) -> ParameterSet {
        pairs.iter().map(|(p, v)| (*p, *v)).collect()
    }

    #[test]
    fn test_source_and_medium() {
        let set = params(&[(UtmParam::Source, "google"), (UtmParam::Medium, "cpc")]);
        assert_eq!(
            compose("https://example.com", &set).unwrap(),
            "https://example.com/?utm_source=google&utm_medium=cpc"
        );
    }

    #[test]
    fn test_existing_query_and_fragment_dropped() {
        let set = params(&[(UtmParam::Campaign, "spring_sale")]);
        assert_eq!(
            compose("https://example.com/landing?old=1#frag", &set).unwrap(),
            "https://example.com/landing?utm_campaign=spring_sale"
        );
    }

    #[test]
    fn test_cyrillic_term_is_percent_encoded() {
        let set = params(&[(UtmParam::Term, "купить кроссовки")]);
        assert_eq!(
            compose("https://example.com", &set).unwrap(),
            "https://example.com/?utm_term=\
             %D0%BA%D1%83%D0%BF%D0%B8%D1%82%D1%8C+\
             %D0%BA%D1%80%D0%BE%D1%81%D1%81%D0%BE%D0%B2%D0%BA%D0%B8"
        );
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let set = params(&[(UtmParam::Content, "a&b=c?d#e/f")]);
        assert_eq!(
            compose("https://example.com/p", &set).unwrap(),
            "https://example.com/p?utm_content=a%26b%3Dc%3Fd%23e%2Ff"
        );
    }

    #[test]
    fn test_no_params_has_no_question_mark() {
        assert_eq!(
            compose("https://example.com/landing?x=1#top", &ParameterSet::new()).unwrap(),
            "https://example.com/landing"
        );
        let empty = params(&[(UtmParam::Source, ""), (UtmParam::Term, "")]);
        assert_eq!(
            compose("https://example.com", &empty).unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let full = params(&[
            (UtmParam::Source, "google"),
            (UtmParam::Medium, "cpc"),
            (UtmParam::Campaign, "promo"),
        ]);
        for bad in ["not a url", "ht!tp://bad", "", "example.com", "https://"] {
            let err = compose(bad, &full).unwrap_err();
            assert_eq!(err.input, bad);
            assert!(compose(bad, &ParameterSet::new()).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_order_is_fixed_regardless_of_insertion() {
        let forward = params(&[
            (UtmParam::Source, "vk"),
            (UtmParam::Medium, "social"),
            (UtmParam::Campaign, "brand"),
            (UtmParam::Term, "shoes"),
            (UtmParam::Content, "banner_top"),
        ]);
        let reversed = params(&[
            (UtmParam::Content, "banner_top"),
            (UtmParam::Term, "shoes"),
            (UtmParam::Campaign, "brand"),
            (UtmParam::Medium, "social"),
            (UtmParam::Source, "vk"),
        ]);
        let a = compose("https://shop.example.com/sale", &forward).unwrap();
        let b = compose("https://shop.example.com/sale", &reversed).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            "https://shop.example.com/sale?utm_source=vk&utm_medium=social\
             &utm_campaign=brand&utm_term=shoes&utm_content=banner_top"
        );
    }

    #[test]
    fn test_every_subset_keeps_order() {
        let values = ["s", "m", "c", "t", "x"];
        for mask in 0u8..32 {
            let mut set = ParameterSet::new();
            let mut expected = Vec::new();
            for (i, param) in UtmParam::ALL.into_iter().enumerate() {
                if mask & (1 << i) != 0 {
                    set.set(param, values[i]);
                    expected.push(format!("{}={}", param.key(), values[i]));
                }
            }
            let url = compose("http://example.org:8080/a/b?q=1", &set).unwrap();
            let expected = if expected.is_empty() {
                "http://example.org:8080/a/b".to_string()
            } else {
                format!("http://example.org:8080/a/b?{}", expected.join("&"))
            };
            assert_eq!(url, expected);
        }
    }

    #[test]
    fn test_compose_is_idempotent() {
        let set = params(&[(UtmParam::Source, "telegram"), (UtmParam::Term, "a b")]);
        let first = compose("https://example.com/x", &set);
        let second = compose("https://example.com/x", &set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_port_and_credentials_dropped() {
        let set = params(&[(UtmParam::Source, "email")]);
        assert_eq!(
            compose("https://user:pw@Example.COM:443/path", &set).unwrap(),
            "https://example.com/path?utm_source=email"
        );
    }

    #[test]
    fn test_non_http_schemes_are_accepted() {
        let set = params(&[(UtmParam::Source, "newsletter")]);
        assert_eq!(
            compose("ftp://files.example.com/pub", &set).unwrap(),
            "ftp://files.example.com/pub?utm_source=newsletter"
        );
        assert_eq!(
            compose("myapp://open/screen?old=1#x", &set).unwrap(),
            "myapp://open/screen?utm_source=newsletter"
        );
        assert_eq!(
            compose("mailto:team@example.com", &set).unwrap(),
            "mailto:team@example.com?utm_source=newsletter"
        );
    }

    #[test]
    fn test_parameter_set_normalizes_empty() {
        let mut set = ParameterSet::new();
        set.set(UtmParam::Medium, "cpm");
        assert_eq!(set.get(UtmParam::Medium), Some("cpm"));
        set.set(UtmParam::Medium, "");
        assert_eq!(set.get(UtmParam::Medium), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_populated_in_fixed_order() {
        let set = params(&[(UtmParam::Term, "t"), (UtmParam::Source, "s")]);
        let pairs: Vec<_> = set.populated().collect();
        assert_eq!(pairs, vec![(UtmParam::Source, "s"), (UtmParam::Term, "t")]);
    }

    #[test]
    fn test_param_from_str() {
        assert_eq!("source".parse::<UtmParam>(), Ok(UtmParam::Source));
        assert_eq!("UTM_Campaign".parse::<UtmParam>(), Ok(UtmParam::Campaign));
        assert!("utm_id".parse::<UtmParam>().is_err());
        assert_eq!(UtmParam::Term.to_string(), "utm_term");
    }
}
