// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! CloudStack request signing.
//!
//! Every API call carries an HMAC-SHA1 signature computed over the
//! lower-cased canonical query string. The canonical string is built from the
//! byte-wise sorted parameter names with form-urlencoded values; the very same
//! encoded string is signed and sent, so each value is encoded exactly once.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::Error;

type HmacSha1 = Hmac<Sha1,>;

/// Static credentials used to sign CloudStack requests.
///
/// The secret is URL-escaped once at construction and the escaped form is
/// used as the HMAC key. The API key is kept raw; it is encoded together with
/// the other parameter values while the canonical query string is built.
///
/// Escaping uses the form-urlencoded set: alphanumerics and `*-._` are kept,
/// `~` becomes `%7E`. CloudStack-generated secrets only contain
/// `[A-Za-z0-9_-]` and are used unchanged.
#[derive(Clone,)]
pub struct Credentials
{
    endpoint:   String,
    api_key:    String,
    secret_key: String,
}

impl Credentials
{
    /// Creates credentials for the endpoint, e.g. `https://cloud/client/api`.
    pub fn new(endpoint: impl Into<String,>, api_key: impl Into<String,>, secret_key: &str,) -> Self
    {
        Self {
            endpoint:   endpoint.into(),
            api_key:    api_key.into(),
            secret_key: encode(secret_key,),
        }
    }

    /// Base endpoint URL the signed query string is appended to.
    pub fn endpoint(&self,) -> &str
    {
        &self.endpoint
    }

    /// Builds the fully-qualified signed URL for `command`.
    ///
    /// The fixed `command`, `response` and `apiKey` parameters override any
    /// caller-supplied value under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] when the HMAC cannot be keyed.
    ///
    /// # Example
    ///
    /// ```
    /// use cloudstack_sd::Credentials;
    ///
    /// let credentials = Credentials::new("https://cloud.example/client/api", "key", "secret",);
    /// let url = credentials.sign("listProjects", &[("simple", "true",)],).expect("signed url",);
    /// assert!(url.starts_with(
    ///     "https://cloud.example/client/api?apiKey=key&command=listProjects&response=json&simple=true&signature="
    /// ));
    /// ```
    pub fn sign(&self, command: &str, params: &[(&str, &str,)],) -> Result<String, Error,>
    {
        let mut merged: BTreeMap<&str, &str,> = params.iter().copied().collect();
        merged.insert("command", command,);
        merged.insert("response", "json",);
        merged.insert("apiKey", &self.api_key,);

        let query = canonical_query(&merged,);
        let signature = self.signature(command, &query,)?;

        Ok(format!("{}?{}&signature={}", self.endpoint, query, encode(&signature,)),)
    }

    fn signature(&self, command: &str, query: &str,) -> Result<String, Error,>
    {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes(),).map_err(|e| {
            Error::Signing {
                command: command.to_owned(), message: e.to_string(),
            }
        },)?;
        mac.update(query.to_ascii_lowercase().as_bytes(),);

        Ok(BASE64.encode(mac.finalize().into_bytes(),),)
    }
}

impl std::fmt::Debug for Credentials
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("Credentials",)
            .field("endpoint", &self.endpoint,)
            .field("api_key", &"<redacted>",)
            .field("secret_key", &"<redacted>",)
            .finish()
    }
}

/// Joins sorted `key=value` pairs with `&`, encoding every value once.
///
/// [`BTreeMap`] iteration yields keys in byte-wise ascending order, which is
/// the order the CloudStack signature scheme requires.
pub fn canonical_query<K, V,>(params: &BTreeMap<K, V,>,) -> String
where
    K: AsRef<str,>,
    V: AsRef<str,>,
{
    params
        .iter()
        .map(|(key, value,)| format!("{}={}", key.as_ref(), encode(value.as_ref(),)),)
        .collect::<Vec<_,>>()
        .join("&",)
}

/// Percent-encodes a value using form-urlencoding (space becomes `+`).
fn encode(value: &str,) -> String
{
    form_urlencoded::byte_serialize(value.as_bytes(),).collect()
}

#[cfg(test)]
mod tests
{
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn credentials() -> Credentials
    {
        Credentials::new("https://cloud.example/client/api", "api key", "secret/key",)
    }

    fn query_of(url: &str,) -> &str
    {
        let (_, query,) = url.split_once('?',).expect("url has a query",);
        let (query, _,) = query.rsplit_once("&signature=",).expect("url carries a signature",);
        query
    }

    proptest! {
        #[test]
        fn canonical_keys_are_strictly_ascending(
            params in proptest::collection::hash_map("[A-Za-z]{1,12}", "[ -~]{0,16}", 0..12)
        ) {
            let sorted: BTreeMap<_, _> = params.iter().collect();
            let query = canonical_query(&sorted);
            let keys: Vec<&str> = if query.is_empty() {
                Vec::new()
            } else {
                query.split('&').map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key)).collect()
            };
            prop_assert_eq!(keys.len(), params.len());
            prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn signing_is_deterministic()
    {
        let credentials = credentials();
        let params = [("projectid", "p-1",), ("simple", "true",),];

        let first = credentials.sign("listVirtualMachines", &params,).expect("first signature",);
        let second = credentials.sign("listVirtualMachines", &params,).expect("second signature",);
        assert_eq!(first, second);
    }

    #[test]
    fn parameter_order_does_not_affect_url()
    {
        let credentials = credentials();

        let forward = credentials
            .sign("listVirtualMachines", &[("projectid", "p-1",), ("simple", "true",),],)
            .expect("signed",);
        let reverse = credentials
            .sign("listVirtualMachines", &[("simple", "true",), ("projectid", "p-1",),],)
            .expect("signed",);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn fixed_parameters_are_merged_and_sorted()
    {
        let url = credentials()
            .sign("listVirtualMachines", &[("simple", "true",), ("projectid", "p-1",),],)
            .expect("signed",);

        assert_eq!(
            query_of(&url),
            "apiKey=api+key&command=listVirtualMachines&projectid=p-1&response=json&simple=true"
        );
    }

    #[test]
    fn uppercase_keys_sort_before_lowercase()
    {
        let url = credentials().sign("listProjects", &[("Zone", "z",), ("account", "a",),],).expect("signed",);
        let query = query_of(&url,);
        let keys: Vec<&str,> =
            query.split('&',).filter_map(|pair| pair.split_once('=',).map(|(key, _,)| key,),).collect();

        assert_eq!(keys, ["Zone", "account", "apiKey", "command", "response"]);
    }

    #[test]
    fn fixed_parameters_override_caller_values()
    {
        let url = credentials()
            .sign("listProjects", &[("command", "deployVirtualMachine",), ("response", "xml",),],)
            .expect("signed",);

        let query = query_of(&url,);
        assert!(query.contains("command=listProjects"));
        assert!(query.contains("response=json"));
        assert!(!query.contains("deployVirtualMachine"));
    }

    #[test]
    fn signature_matches_reference_hmac()
    {
        let credentials = Credentials::new("http://localhost/client/api", "key", "secret",);
        let url = credentials.sign("listProjects", &[],).expect("signed",);

        let mut mac = HmacSha1::new_from_slice(b"secret",).expect("hmac key",);
        mac.update(b"apikey=key&command=listprojects&response=json",);
        let expected = encode(&BASE64.encode(mac.finalize().into_bytes(),),);

        assert_eq!(
            url,
            format!(
                "http://localhost/client/api?apiKey=key&command=listProjects&response=json&signature={expected}"
            )
        );
    }

    #[test]
    fn signature_is_computed_over_lowercased_query()
    {
        let upper = Credentials::new("http://localhost/client/api", "KEY", "secret",);
        let lower = Credentials::new("http://localhost/client/api", "key", "secret",);

        let signature = |url: String| url.rsplit_once("&signature=",).map(|(_, sig,)| sig.to_owned(),);
        let upper_sig = signature(upper.sign("listProjects", &[],).expect("signed",),);
        let lower_sig = signature(lower.sign("listProjects", &[],).expect("signed",),);

        assert_eq!(upper_sig, lower_sig);
    }

    #[test]
    fn values_are_encoded_once()
    {
        let url = credentials().sign("listProjects", &[("name", "a b&c=d%",),],).expect("signed",);

        assert!(query_of(&url).contains("name=a+b%26c%3Dd%25"));
        assert!(!url.contains("%2525"));
    }

    #[test]
    fn signature_is_percent_encoded()
    {
        let url = credentials().sign("listProjects", &[("simple", "true",),],).expect("signed",);
        let (_, signature,) = url.rsplit_once("&signature=",).expect("signature",);

        assert!(!signature.contains('+'));
        assert!(!signature.contains('/'));
        assert!(!signature.contains('='));
    }

    #[test]
    fn secret_escaping_keeps_generated_secrets_unchanged()
    {
        let generated = "Aw3_x-9qLz0K-mN_8pRt";
        assert_eq!(Credentials::new("https://c/api", "k", generated,).secret_key, generated);

        let unusual = Credentials::new("https://c/api", "k", "a~b*c d+e",);
        assert_eq!(unusual.secret_key, "a%7Eb*c+d%2Be");

        let mut mac = HmacSha1::new_from_slice(b"a%7Eb*c+d%2Be",).expect("hmac key",);
        mac.update(b"apikey=k&command=listprojects&response=json",);
        let expected = encode(&BASE64.encode(mac.finalize().into_bytes(),),);
        let url = unusual.sign("listProjects", &[],).expect("signed url",);
        assert!(url.ends_with(&format!("&signature={expected}")));
    }

    #[test]
    fn debug_output_redacts_keys()
    {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("api key"));
        assert!(!rendered.contains("secret%2Fkey"));
    }
}
