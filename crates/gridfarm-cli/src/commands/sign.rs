//! `gridfarm sign` - sign a payload with the local identity.

use std::path::Path;

use anyhow::Result;
use gridfarm_client::PayloadSigner;
use serde_json::Value;

use crate::args::SignArgs;
use crate::seed;

pub fn run(args: SignArgs, seed_path: &Path) -> Result<()> {
    let identity = seed::load(seed_path)?;
    let signer = PayloadSigner::from_identity(&identity)?;

    let signed = signer.sign_values(&payload_values(&args.args))?;
    println!("message:   {}", signed.message_hex());
    println!("signature: {}", signed.signature_hex());
    Ok(())
}

/// Strings, numbers and null given as JSON keep their JSON meaning; any other
/// argument is signed as the literal text.
fn payload_values(args: &[String]) -> Vec<Value> {
    args.iter()
        .map(|arg| match serde_json::from_str::<Value>(arg) {
            Ok(value @ (Value::String(_) | Value::Number(_) | Value::Null)) => value,
            _ => Value::String(arg.clone()),
        })
        .collect()
}
