use std::collections::BTreeMap;
use std::fmt::Write;

use async_trait::async_trait;
use http::header::{self, HeaderValue};
use http::request::Parts;
use log::debug;
use percent_encoding::percent_decode_str;
use storwire_core::hash::{base64_decode, base64_hmac_sha256};
use storwire_core::time::{format_http_date, now, DateTime};
use storwire_core::{Context, Error, Result, SignRequest, SigningRequest};

use crate::constants::*;
use crate::{Credential, Service};

/// Authorization scheme used to sign requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SigningScheme {
    /// `SharedKey`: signs the full header subset and the sorted query.
    #[default]
    SharedKey,
    /// `SharedKeyLite`: signs a shorter string, only `comp` from the query.
    SharedKeyLite,
}

impl SigningScheme {
    /// Name used in the `Authorization` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningScheme::SharedKey => "SharedKey",
            SigningScheme::SharedKeyLite => "SharedKeyLite",
        }
    }
}

/// RequestSigner that implement Azure Storage Shared Key Authorization.
///
/// The service family is read from the request extensions and picks the
/// canonicalization rule; requests without one are signed as blob requests.
///
/// - [Authorize with Shared Key](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
#[derive(Debug, Default)]
pub struct RequestSigner {
    scheme: SigningScheme,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer using the `SharedKey` scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another signing scheme.
    pub fn with_scheme(mut self, scheme: SigningScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid("credential is required"));
        };
        let service = req
            .extensions
            .get::<Service>()
            .copied()
            .unwrap_or(Service::Blob);

        let mut ctx = SigningRequest::build(req)?;

        // A forced signing time always wins over the date set by the pipeline.
        if self.time.is_some() || !ctx.headers.contains_key(X_MS_DATE) {
            let now_time = self.time.unwrap_or_else(now);
            ctx.headers
                .insert(X_MS_DATE, format_http_date(now_time).parse()?);
        }

        let string_to_sign = string_to_sign(&ctx, self.scheme, service, &cred.account_name)?;
        let key = base64_decode(&cred.account_key)?;
        let signature = base64_hmac_sha256(&key, string_to_sign.as_bytes());

        ctx.headers.insert(header::AUTHORIZATION, {
            let mut value: HeaderValue = format!(
                "{} {}:{signature}",
                self.scheme.as_str(),
                cred.account_name
            )
            .parse()?;
            value.set_sensitive(true);
            value
        });

        ctx.apply(req)
    }
}

/// Construct string to sign for given scheme and service family.
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
pub(crate) fn string_to_sign(
    ctx: &SigningRequest,
    scheme: SigningScheme,
    service: Service,
    account_name: &str,
) -> Result<String> {
    let mut s = String::with_capacity(256);

    match (scheme, service) {
        (SigningScheme::SharedKey, Service::Blob | Service::Queue) => {
            // VERB, then eleven standard headers in fixed order.
            writeln!(&mut s, "{}", ctx.method.as_str())?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_ENCODING)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_LANGUAGE)?)?;
            writeln!(&mut s, "{}", {
                let content_length = ctx.header_get_or_default(&header::CONTENT_LENGTH)?;
                if content_length == "0" {
                    ""
                } else {
                    content_length
                }
            })?;
            writeln!(&mut s, "{}", content_md5(ctx)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_TYPE)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::DATE)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_MODIFIED_SINCE)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_MATCH)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_NONE_MATCH)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_UNMODIFIED_SINCE)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::RANGE)?)?;
            writeln!(&mut s, "{}", canonicalize_header(ctx)?)?;
            write!(&mut s, "{}", canonicalize_resource(ctx, account_name))?;
        }
        (SigningScheme::SharedKey, Service::Table) => {
            writeln!(&mut s, "{}", ctx.method.as_str())?;
            writeln!(&mut s, "{}", content_md5(ctx)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_TYPE)?)?;
            writeln!(&mut s, "{}", table_date(ctx)?)?;
            write!(&mut s, "{}", canonicalize_resource_lite(ctx, account_name))?;
        }
        (SigningScheme::SharedKeyLite, Service::Blob | Service::Queue) => {
            writeln!(&mut s, "{}", ctx.method.as_str())?;
            writeln!(&mut s, "{}", content_md5(ctx)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_TYPE)?)?;
            writeln!(&mut s, "{}", ctx.header_get_or_default(&header::DATE)?)?;
            writeln!(&mut s, "{}", canonicalize_header(ctx)?)?;
            write!(&mut s, "{}", canonicalize_resource_lite(ctx, account_name))?;
        }
        (SigningScheme::SharedKeyLite, Service::Table) => {
            writeln!(&mut s, "{}", table_date(ctx)?)?;
            write!(&mut s, "{}", canonicalize_resource_lite(ctx, account_name))?;
        }
    }

    debug!("string to sign: {}", &s);

    Ok(s)
}

fn content_md5(ctx: &SigningRequest) -> Result<&str> {
    match ctx.headers.get(CONTENT_MD5) {
        Some(v) => Ok(v.to_str()?),
        None => Ok(""),
    }
}

fn table_date(ctx: &SigningRequest) -> Result<&str> {
    match ctx.headers.get(X_MS_DATE) {
        Some(v) => Ok(v.to_str()?),
        None => ctx.header_get_or_default(&header::DATE),
    }
}

/// ## Reference
///
/// - [Constructing the canonicalized headers string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-headers-string)
fn canonicalize_header(ctx: &SigningRequest) -> Result<String> {
    Ok(SigningRequest::header_to_string(
        ctx.header_to_vec_with_prefix("x-ms-")?,
        ":",
        "\n",
    ))
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalize_resource(ctx: &SigningRequest, account_name: &str) -> String {
    if ctx.query.is_empty() {
        return format!("/{}{}", account_name, ctx.path);
    }

    // Repeated keys collapse into one line with sorted, comma joined values.
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in &ctx.query {
        params
            .entry(percent_decode_str(k).decode_utf8_lossy().to_lowercase())
            .or_default()
            .push(percent_decode_str(v).decode_utf8_lossy().into_owned());
    }

    let mut s = format!("/{}{}", account_name, ctx.path);
    for (k, mut values) in params {
        values.sort();
        s.push('\n');
        s.push_str(&k);
        s.push(':');
        s.push_str(&values.join(","));
    }
    s
}

/// Lite and table resources only keep the `comp` parameter.
fn canonicalize_resource_lite(ctx: &SigningRequest, account_name: &str) -> String {
    match ctx.query_get("comp") {
        Some(comp) => format!("/{}{}?comp={}", account_name, ctx.path, comp),
        None => format!("/{}{}", account_name, ctx.path),
    }
}
