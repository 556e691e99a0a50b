//! End-to-end scenarios over the HTTP surface.

mod common;

use common::{api, body_json, test_app};
use num_bigint::BigUint;
use schnorr_auth::crypto::encoding::{from_hex, to_hex};
use schnorr_auth::protocol::{Commitment, Keypair};
use schnorr_auth::{SchnorrGroup, SecureRng};
use serde_json::json;
use warp::test::RequestBuilder;

fn register_request(username: &str, public_key_y: &str) -> RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&json!({
            "username": username,
            "publicKeyY": public_key_y,
            "salt": "a1b2c3d4e5f60718",
        }))
}

fn challenge_request(username: &str, client_r: &str) -> RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/challenge")
        .json(&json!({"username": username, "clientR": client_r}))
}

fn verify_request(challenge_id: &str, s: &str, client_r: &str, username: &str) -> RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/verify")
        .json(&json!({
            "challengeId": challenge_id,
            "s": s,
            "clientR": client_r,
            "username": username,
        }))
}

#[tokio::test]
async fn happy_path_then_replay_is_rejected() {
    common::init_tracing();
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();

    // x = 7, Y = g^7 = 128; r = 11, R = g^11 = 2048.
    let keypair = Keypair::from_secret(&group, &BigUint::from(7u32)).unwrap();
    let commitment = Commitment::from_nonce(&group, &BigUint::from(11u32)).unwrap();
    assert_eq!(keypair.public_hex(), "80");
    assert_eq!(commitment.commitment_hex(), "800");

    let res = register_request("alice", &keypair.public_hex()).reply(&api).await;
    assert_eq!(res.status(), 201);

    let res = challenge_request("alice", &commitment.commitment_hex())
        .reply(&api)
        .await;
    assert_eq!(res.status(), 200);
    let challenge = body_json(res.body());
    let challenge_id = challenge["challengeId"].as_str().unwrap().to_string();
    let c = from_hex(challenge["c"].as_str().unwrap()).unwrap();

    let s = keypair.respond(&group, &commitment, &c);

    let res = verify_request(&challenge_id, &to_hex(&s), "800", "alice")
        .reply(&api)
        .await;
    assert_eq!(res.status(), 200);
    let token = body_json(res.body());
    assert_eq!(token["type"], "Bearer");
    assert_eq!(token["username"], "alice");
    assert_eq!(token["expiresIn"], 86_400u64);
    assert!(!token["token"].as_str().unwrap().is_empty());

    // Same payload again: the session was consumed.
    let res = verify_request(&challenge_id, &to_hex(&s), "800", "alice")
        .reply(&api)
        .await;
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn wrong_proof_consumes_the_session() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();

    let keypair = Keypair::generate(&group, &mut rng);
    let commitment = Commitment::generate(&group, &mut rng);
    let r_hex = commitment.commitment_hex();

    let res = register_request("alice", &keypair.public_hex()).reply(&api).await;
    assert_eq!(res.status(), 201);

    let res = challenge_request("alice", &r_hex).reply(&api).await;
    let challenge = body_json(res.body());
    let challenge_id = challenge["challengeId"].as_str().unwrap().to_string();
    let c = from_hex(challenge["c"].as_str().unwrap()).unwrap();
    let s = keypair.respond(&group, &commitment, &c);

    // s' = s + 1 fails the equation.
    let res = verify_request(&challenge_id, &to_hex(&(&s + 1u32)), &r_hex, "alice")
        .reply(&api)
        .await;
    assert_eq!(res.status(), 401);

    // The correct s no longer helps: the session is consumed.
    let res = verify_request(&challenge_id, &to_hex(&s), &r_hex, "alice")
        .reply(&api)
        .await;
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn tampered_commitment_is_rejected_and_session_removed() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();

    let keypair = Keypair::generate(&group, &mut rng);
    let commitment = Commitment::generate(&group, &mut rng);

    let res = register_request("alice", &keypair.public_hex()).reply(&api).await;
    assert_eq!(res.status(), 201);

    let res = challenge_request("alice", &commitment.commitment_hex())
        .reply(&api)
        .await;
    let challenge = body_json(res.body());
    let challenge_id = challenge["challengeId"].as_str().unwrap().to_string();
    let c = from_hex(challenge["c"].as_str().unwrap()).unwrap();
    let s = keypair.respond(&group, &commitment, &c);

    let tampered = (&commitment.commitment + 1u32) % group.p();
    let res = verify_request(&challenge_id, &to_hex(&s), &to_hex(&tampered), "alice")
        .reply(&api)
        .await;
    assert_eq!(res.status(), 401);
    assert!(app.store.is_empty().await, "store entry must be removed");
}

#[tokio::test]
async fn unknown_user_receives_indistinguishable_challenge() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();

    let keypair = Keypair::generate(&group, &mut rng);
    let commitment = Commitment::generate(&group, &mut rng);
    let r_hex = commitment.commitment_hex();

    let res = register_request("alice", &keypair.public_hex()).reply(&api).await;
    assert_eq!(res.status(), 201);

    let known = challenge_request("alice", &r_hex).reply(&api).await;
    let ghost = challenge_request("ghost", &r_hex).reply(&api).await;
    assert_eq!(known.status(), 200);
    assert_eq!(ghost.status(), 200);

    let known = body_json(known.body());
    let ghost = body_json(ghost.body());

    // Identical field set, identical group parameters.
    let keys = |v: &serde_json::Value| {
        let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        k.sort();
        k
    };
    assert_eq!(keys(&known), keys(&ghost));
    assert_eq!(known["p"], ghost["p"]);
    assert_eq!(known["q"], ghost["q"]);
    assert_eq!(ghost["g"], "2");

    // Any proof against the decoy challenge fails.
    let res = verify_request(
        ghost["challengeId"].as_str().unwrap(),
        "1234abcd",
        &r_hex,
        "ghost",
    )
    .reply(&api)
    .await;
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn register_validation_and_conflicts() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();

    // Username out of policy.
    for bad in ["ab", "bad-name!", "has space"] {
        let res = register_request(bad, "80").reply(&api).await;
        assert_eq!(res.status(), 400, "username {bad:?}");
    }

    // Key not hex / out of range.
    for bad in ["not-hex", "", "0", "1"] {
        let res = register_request("alice", bad).reply(&api).await;
        assert_eq!(res.status(), 400, "publicKeyY {bad:?}");
    }
    let res = register_request("alice", &to_hex(group.p())).reply(&api).await;
    assert_eq!(res.status(), 400, "publicKeyY = p");

    // Malformed salt.
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&json!({"username": "alice", "publicKeyY": "80", "salt": "xyz"}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), 400);

    // First registration succeeds, duplicate conflicts.
    let res = register_request("alice", "80").reply(&api).await;
    assert_eq!(res.status(), 201);
    let res = register_request("alice", "800").reply(&api).await;
    assert_eq!(res.status(), 409);
    assert_eq!(app.directory.len().await, 1);
}

#[tokio::test]
async fn challenge_rejects_malformed_and_out_of_range_commitments() {
    let app = test_app();
    let api = api(&app);

    for bad_r in ["", "zz", "0", "1"] {
        let res = challenge_request("alice", bad_r).reply(&api).await;
        assert_eq!(res.status(), 400, "clientR {bad_r:?}");
    }

    // Missing field entirely.
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/challenge")
        .json(&json!({"username": "alice"}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn verify_rejects_malformed_input() {
    let app = test_app();
    let api = api(&app);

    let res = verify_request("", "12", "800", "alice").reply(&api).await;
    assert_eq!(res.status(), 400, "empty challengeId");

    let res = verify_request("some-id", "-12", "800", "alice").reply(&api).await;
    assert_eq!(res.status(), 400, "negative s never parses");

    let res = verify_request("some-id", "12", "800", "a").reply(&api).await;
    assert_eq!(res.status(), 400, "username out of policy");
}

#[tokio::test]
async fn uppercase_hex_is_accepted_on_the_wire() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();

    let keypair = Keypair::generate(&group, &mut rng);
    let commitment = Commitment::generate(&group, &mut rng);
    let r_upper = commitment.commitment_hex().to_uppercase();

    let res = register_request("alice", &keypair.public_hex().to_uppercase())
        .reply(&api)
        .await;
    assert_eq!(res.status(), 201);

    let res = challenge_request("alice", &r_upper).reply(&api).await;
    assert_eq!(res.status(), 200);
    let challenge = body_json(res.body());
    let c = from_hex(challenge["c"].as_str().unwrap()).unwrap();
    let s = keypair.respond(&group, &commitment, &c);

    let res = verify_request(
        challenge["challengeId"].as_str().unwrap(),
        &to_hex(&s).to_uppercase(),
        &r_upper,
        "alice",
    )
    .reply(&api)
    .await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn challenge_response_carries_exact_group_constants() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();
    let commitment = Commitment::generate(&group, &mut rng);

    let res = challenge_request("whoever", &commitment.commitment_hex())
        .reply(&api)
        .await;
    let challenge = body_json(res.body());

    assert_eq!(challenge["p"], to_hex(group.p()));
    assert_eq!(challenge["q"], to_hex(group.q()));
    assert_eq!(challenge["g"], "2");
    // Lowercase, no 0x prefix, no leading zeros.
    let p = challenge["p"].as_str().unwrap();
    assert!(p
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    assert_eq!(p.len(), 384);
}

#[tokio::test]
async fn auth_failures_share_one_external_shape() {
    let app = test_app();
    let api = api(&app);
    let group = SchnorrGroup::rfc3526_1536();
    let mut rng = SecureRng::new();

    let keypair = Keypair::generate(&group, &mut rng);
    let commitment = Commitment::generate(&group, &mut rng);
    let r_hex = commitment.commitment_hex();

    let res = register_request("alice", &keypair.public_hex()).reply(&api).await;
    assert_eq!(res.status(), 201);

    // Unknown session.
    let unknown = verify_request(
        "11111111-2222-3333-4444-555555555555",
        "12",
        &r_hex,
        "alice",
    )
    .reply(&api)
    .await;

    // Wrong proof against a live session.
    let res = challenge_request("alice", &r_hex).reply(&api).await;
    let challenge = body_json(res.body());
    let wrong = verify_request(
        challenge["challengeId"].as_str().unwrap(),
        "12",
        &r_hex,
        "alice",
    )
    .reply(&api)
    .await;

    assert_eq!(unknown.status(), 401);
    assert_eq!(wrong.status(), 401);

    let unknown = body_json(unknown.body());
    let wrong = body_json(wrong.body());
    assert_eq!(unknown["code"], wrong["code"]);
    assert_eq!(unknown["message"], wrong["message"]);
    assert_eq!(unknown["code"], "AUTH_FAILED");
    assert_eq!(unknown["message"], "Authentication failed");
}
