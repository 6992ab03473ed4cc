//! Payload signing independent of HTTP.
//!
//! A payload is an ordered list of arguments rendered into one canonical
//! message, then signed with the identity's ed25519 key:
//!
//! - strings and text are written as UTF-8
//! - byte slices are copied verbatim
//! - integers are written in decimal
//! - floats use the shortest round-trip digits, switching to `d.ddde±XX`
//!   for very small or large magnitudes
//! - absent values (`None`, [`Arg::Nil`]) contribute nothing
//!
//! Arguments with no rendering (booleans, arrays, objects) only exist on the
//! dynamic path ([`PayloadSigner::sign_values`]) and fail the whole call.

use std::fmt::{Display, LowerExp};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::identity::{signing_key_from_bytes, Identity};

/// Decimal exponents outside `[-4, 6)` switch floats to exponent form.
const MIN_PLAIN_EXP: i32 = -4;
const MAX_PLAIN_EXP: i32 = 6;

/// A value with a canonical byte rendering.
pub trait Canonical {
    /// Append the canonical bytes to `out`.
    fn render(&self, out: &mut Vec<u8>);
}

impl Canonical for str {
    fn render(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Canonical for String {
    fn render(&self, out: &mut Vec<u8>) {
        self.as_str().render(out);
    }
}

impl Canonical for [u8] {
    fn render(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl Canonical for Vec<u8> {
    fn render(&self, out: &mut Vec<u8>) {
        self.as_slice().render(out);
    }
}

macro_rules! canonical_decimal {
    ($($ty:ty),*) => {
        $(
            impl Canonical for $ty {
                fn render(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(self.to_string().as_bytes());
                }
            }
        )*
    };
}

canonical_decimal!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Canonical for f32 {
    fn render(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format_float(*self, self.is_nan(), self.is_infinite()).as_bytes());
    }
}

impl Canonical for f64 {
    fn render(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format_float(*self, self.is_nan(), self.is_infinite()).as_bytes());
    }
}

impl<T: Canonical> Canonical for Option<T> {
    fn render(&self, out: &mut Vec<u8>) {
        if let Some(value) = self {
            value.render(out);
        }
    }
}

impl<T: Canonical + ?Sized> Canonical for &T {
    fn render(&self, out: &mut Vec<u8>) {
        (**self).render(out);
    }
}

/// Dynamically typed payload argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Contributes nothing.
    Nil,
    Str(String),
    Bytes(Vec<u8>),
    Int(i128),
    UInt(u128),
    Float(f64),
    /// Anything rendered through its `Display` form.
    Text(String),
}

impl Arg {
    /// Wrap any displayable value.
    pub fn text(value: impl Display) -> Self {
        Self::Text(value.to_string())
    }

    /// Convert a JSON value; `index` is the argument position for errors.
    pub fn from_json(index: usize, value: &Value) -> ClientResult<Self> {
        let unsupported = |kind: &str| ClientError::UnsupportedArgument {
            index,
            kind: kind.to_string(),
        };

        match value {
            Value::Null => Ok(Self::Nil),
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i.into()))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::UInt(u.into()))
                } else {
                    n.as_f64().map(Self::Float).ok_or_else(|| unsupported("number"))
                }
            }
            Value::Bool(_) => Err(unsupported("bool")),
            Value::Array(_) => Err(unsupported("array")),
            Value::Object(_) => Err(unsupported("object")),
        }
    }
}

impl Canonical for Arg {
    fn render(&self, out: &mut Vec<u8>) {
        match self {
            Self::Nil => {}
            Self::Str(s) | Self::Text(s) => s.render(out),
            Self::Bytes(b) => b.render(out),
            Self::Int(i) => i.render(out),
            Self::UInt(u) => u.render(out),
            Self::Float(f) => f.render(out),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value.into())
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Self::UInt(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Render `args` in order into one message.
pub fn canonical_message(args: &[&dyn Canonical]) -> Vec<u8> {
    let mut out = Vec::new();
    for arg in args {
        arg.render(&mut out);
    }
    out
}

fn format_float<F: Display + LowerExp>(value: F, nan: bool, infinite: bool) -> String {
    if nan {
        return "NaN".to_string();
    }
    let scientific = format!("{value:e}");
    if infinite {
        return if scientific.starts_with('-') { "-Inf" } else { "+Inf" }.to_string();
    }

    // `{:e}` always yields `<mantissa>e<exp>` for finite values.
    let (mantissa, exp) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (MIN_PLAIN_EXP..MAX_PLAIN_EXP).contains(&exp) {
        value.to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

/// A canonical message and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedPayload {
    pub fn message_hex(&self) -> String {
        hex::encode(&self.message)
    }

    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

/// Signs canonical payloads with an ed25519 key.
#[derive(Clone)]
pub struct PayloadSigner {
    key: SigningKey,
}

impl PayloadSigner {
    /// Signer from a 32-byte seed or 64-byte keypair.
    pub fn new(seed: &[u8]) -> ClientResult<Self> {
        Ok(Self {
            key: signing_key_from_bytes(seed)?,
        })
    }

    /// Signer using the identity's private key.
    pub fn from_identity(identity: &dyn Identity) -> ClientResult<Self> {
        Self::new(identity.private_key())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().as_bytes())
    }

    /// Render `args` and sign the result.
    pub fn sign(&self, args: &[&dyn Canonical]) -> SignedPayload {
        let message = canonical_message(args);
        let signature = self.key.sign(&message).to_bytes().to_vec();
        debug!(args = args.len(), bytes = message.len(), "signed payload");
        SignedPayload { message, signature }
    }

    /// Like [`sign`](Self::sign), hex encoding message and signature.
    pub fn sign_hex(&self, args: &[&dyn Canonical]) -> (String, String) {
        let signed = self.sign(args);
        (signed.message_hex(), signed.signature_hex())
    }

    /// Sign JSON values. Every value is checked before anything is rendered.
    pub fn sign_values(&self, values: &[Value]) -> ClientResult<SignedPayload> {
        let args = values
            .iter()
            .enumerate()
            .map(|(index, value)| Arg::from_json(index, value))
            .collect::<ClientResult<Vec<_>>>()?;

        let refs: Vec<&dyn Canonical> = args.iter().map(|arg| arg as &dyn Canonical).collect();
        Ok(self.sign(&refs))
    }

    /// Check a signature produced by this signer's key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.key.verifying_key().verify(message, &signature).is_ok()
    }
}

impl std::fmt::Debug for PayloadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadSigner")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}
