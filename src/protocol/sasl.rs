//! SASL PLAIN credentials.
//!
//! The server challenges with status 407; the client answers with
//! `NUL ‖ username ‖ NUL ‖ password`, base64 encoded, sent under the
//! challenge's request id.

use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::Uuid;

use super::message::Request;

/// Raw PLAIN blob (no authorization identity).
pub fn plain_blob(username: &str, password: &str) -> Vec<u8> {
    let mut blob = Vec::with_capacity(username.len() + password.len() + 2);
    blob.push(0);
    blob.extend_from_slice(username.as_bytes());
    blob.push(0);
    blob.extend_from_slice(password.as_bytes());
    blob
}

/// Base64 PLAIN blob.
pub fn encode_plain(username: &str, password: &str) -> String {
    STANDARD.encode(plain_blob(username, password))
}

/// Answer to the challenge `challenge_id`.
pub fn authentication_request(challenge_id: Uuid, username: &str, password: &str) -> Request {
    Request::authentication(challenge_id, encode_plain(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_blob() {
        assert_eq!(plain_blob("user", "pass"), b"\0user\0pass");
        assert_eq!(plain_blob("", ""), b"\0\0");
    }

    #[test]
    fn test_encode_plain() {
        assert_eq!(encode_plain("user", "pass"), "AHVzZXIAcGFzcw==");

        let decoded = STANDARD.decode(encode_plain("admin", "s3cr3t")).unwrap();
        assert_eq!(decoded, b"\0admin\0s3cr3t");
    }

    #[test]
    fn test_authentication_request() {
        let challenge = Uuid::new_v4();
        let req = authentication_request(challenge, "user", "pass");

        assert_eq!(req.request_id(), challenge);
        assert_eq!(req.op(), "authentication");
        assert_eq!(req.processor(), "traversal");
        assert_eq!(req.args().sasl.as_deref(), Some("AHVzZXIAcGFzcw=="));
    }
}
