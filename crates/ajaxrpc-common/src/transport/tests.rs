//! Integration tests for the transport layer
//!
//! These tests check that what the HTTP helpers produce is readable by the
//! codec and the other way around.

#[cfg(test)]
mod tests {
    use crate::protocol::{Fault, Reply, Request, Value};
    use crate::transport::{HttpTransport, JsonCodec};
    use http_body_util::BodyExt;

    #[test]
    fn test_codec_output_parses_as_http_body() {
        let original = Request::new("echo", ("hello", 42i64));
        let encoded = JsonCodec::default().encode_request(&original).unwrap();

        let parsed = HttpTransport::parse_request(&encoded).unwrap();
        assert_eq!(parsed, original);
    }

    #[tokio::test]
    async fn test_http_body_decodes_with_codec() {
        let reply = Reply::Fault(Fault::user(801, "quota exceeded"));
        let response = HttpTransport::to_http_response(&reply);
        let body = response.into_body().collect().await.unwrap().to_bytes();

        let decoded = JsonCodec::default().decode_reply(&body).unwrap();
        assert_eq!(decoded, reply);
        assert_eq!(decoded.fault().unwrap().code, 801);
    }

    #[test]
    fn test_invalid_request_data_returns_error() {
        let invalid_data = vec![0xFF, 0xFF, 0xFF, 0xFF];
        assert!(JsonCodec::default().decode_request(&invalid_data).is_err());
        assert!(HttpTransport::parse_request(&invalid_data).is_err());
    }

    #[test]
    fn test_unknown_value_tag_is_rejected() {
        let body = br#"{"method":"m","params":[{"i4":1}]}"#;
        assert!(HttpTransport::parse_request(body).is_err());

        let body = br#"{"method":"m","params":["nil"]}"#;
        let request = HttpTransport::parse_request(body).unwrap();
        assert_eq!(request.params, vec![Value::Nil]);
    }
}
