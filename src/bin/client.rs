use std::io::{self, Write};

use clap::Parser;
use num_bigint::BigUint;
use rand::RngCore;
use schnorr_auth::crypto::encoding::{from_hex, to_hex};
use schnorr_auth::protocol::{Commitment, Keypair};
use schnorr_auth::{SchnorrGroup, SecureRng};
use serde_json::json;
use sha2::{Digest, Sha256};

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Schnorr zero-knowledge authentication client", long_about = None)]
#[command(version)]
struct Args {
    /// Base URL of the authentication server
    #[arg(short, long, env = "AUTH_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server: String,
}

fn read_line(prompt: &str) -> String {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .expect("Error reading input");
    buf.trim().to_string()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();
    let http = reqwest::Client::new();

    let username = read_line("Please state username: ");
    let password = read_line("Please provide password: ");

    // Derive the private scalar from the password; the secret never leaves
    // this process.
    let digest = Sha256::digest(password.as_bytes());
    let mut x = group.scalar_reduce(&BigUint::from_bytes_be(&digest));
    if x.bits() == 0 {
        x = BigUint::from(1u32);
    }
    let keypair = Keypair::from_secret(&group, &x)?;

    let mut salt_bytes = [0u8; 16];
    rng.fill_bytes(&mut salt_bytes);
    let register = http
        .post(format!("{}/api/v1/auth/register", args.server))
        .json(&json!({
            "username": username,
            "publicKeyY": keypair.public_hex(),
            "salt": hex::encode(salt_bytes),
        }))
        .send()
        .await?;
    match register.status().as_u16() {
        201 => println!("✅ Registration successful"),
        409 => println!("ℹ️  User already registered, logging in"),
        status => {
            println!("❌ Registration failed with status {status}");
            return Ok(());
        }
    }

    let commitment = Commitment::generate(&group, &mut rng);
    let challenge: serde_json::Value = http
        .post(format!("{}/api/v1/auth/challenge", args.server))
        .json(&json!({
            "username": username,
            "clientR": commitment.commitment_hex(),
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let challenge_id = challenge["challengeId"]
        .as_str()
        .ok_or("challenge response missing challengeId")?;
    let c = from_hex(
        challenge["c"]
            .as_str()
            .ok_or("challenge response missing c")?,
    )?;
    println!("✅ Challenge received ({challenge_id})");

    let s = keypair.respond(&group, &commitment, &c);
    let verify = http
        .post(format!("{}/api/v1/auth/verify", args.server))
        .json(&json!({
            "challengeId": challenge_id,
            "s": to_hex(&s),
            "clientR": commitment.commitment_hex(),
            "username": username,
        }))
        .send()
        .await?;

    if verify.status().is_success() {
        let body: serde_json::Value = verify.json().await?;
        let token = body["token"].as_str().unwrap_or_default();
        let preview = &token[..token.len().min(16)];
        println!(
            "✅ Successful login! token: {preview}…, expires in {}s",
            body["expiresIn"]
        );
    } else {
        println!("❌ Authentication failed ({})", verify.status());
    }

    Ok(())
}
