use super::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: String) -> EvolutionClient {
    EvolutionClient::new(&base_url, "evo-key", "main", Duration::from_secs(5))
}

#[tokio::test]
async fn test_send_posts_to_instance_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/main"))
        .and(header("apikey", "evo-key"))
        .and(body_partial_json(serde_json::json!({
            "number": "5511999999999",
            "text": "Bom dia!",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "key": {"id": "MSG1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(server.uri())
        .send("5511999999999", "Bom dia!", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_forwards_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/main"))
        .and(body_partial_json(serde_json::json!({
            "options": {"delay": 1200}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = serde_json::json!({"delay": 1200});
    client(server.uri())
        .send("5511999999999", "oi", Some(&options))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_http_error_is_err() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid apikey"))
        .mount(&server)
        .await;

    let err = client(server.uri())
        .send("5511999999999", "oi", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_send_tolerates_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client(server.uri()).send("5511999999999", "oi", None).await.unwrap();
}

#[tokio::test]
async fn test_send_media_posts_to_media_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendMedia/main"))
        .and(header("apikey", "evo-key"))
        .and(body_partial_json(serde_json::json!({
            "number": "5511999999999",
            "media": "https://cdn.example/catalogo.pdf",
            "fileName": "catalogo.pdf",
            "caption": "segue o catálogo",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "key": {"id": "MEDIA1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(server.uri())
        .send_media(
            "5511999999999",
            "https://cdn.example/catalogo.pdf",
            Some("catalogo.pdf"),
            Some("segue o catálogo"),
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_media_omits_absent_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendMedia/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let out = client(server.uri())
        .send_media("5511999999999", "https://cdn.example/foto.jpg", None, None, None)
        .await
        .unwrap();
    assert!(out.is_object());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("fileName").is_none());
    assert!(body.get("caption").is_none());
}

#[tokio::test]
async fn test_send_media_http_error_is_err() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(415).set_body_string("unsupported media"))
        .mount(&server)
        .await;

    let err = client(server.uri())
        .send_media("5511999999999", "bad-media", None, None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("415"));
}

#[tokio::test]
async fn test_set_webhook_targets_named_instance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance/setWebhook/secondary"))
        .and(header("apikey", "evo-key"))
        .and(body_partial_json(serde_json::json!({
            "webhook": "https://ponte.example/webhook",
            "enabled": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "webhook": {"enabled": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = client(server.uri())
        .set_webhook("secondary", "https://ponte.example/webhook")
        .await
        .unwrap();
    assert_eq!(out.pointer("/webhook/enabled"), Some(&serde_json::json!(true)));
}
