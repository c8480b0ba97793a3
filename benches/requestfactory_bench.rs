use asyncnet::http::realm::RealmBuilder;
use asyncnet::http::requestfactory::RequestFactory;
use asyncnet::socket::proxy::ProxyServer;
use asyncnet::urlrequest::{ClientConfig, Request};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;

fn benchmark_plain_get(c: &mut Criterion) {
    let factory = RequestFactory::new(ClientConfig::default());
    let request = Request::builder(Method::GET, "http://example.com/search?q=rust")
        .unwrap()
        .header("Accept-Language", "en-GB,en;q=0.9")
        .unwrap()
        .header("Accept-Encoding", "gzip, deflate, br")
        .unwrap()
        .cookie(cookie::Cookie::new("session", "0123456789abcdef"))
        .build();

    c.bench_function("wire_request_plain_get", |b| {
        b.iter(|| {
            factory
                .new_wire_request(black_box(&request), false, None, None, None)
                .unwrap()
        })
    });
}

fn benchmark_proxied_digest_post(c: &mut Criterion) {
    let factory = RequestFactory::new(ClientConfig::default());
    let proxy = ProxyServer::builder("proxy.local", 3128).build();
    let realm = RealmBuilder::new(Some("user"), Some("secret"))
        .parse_www_authenticate_header(r#"Digest realm="api", nonce="abc123", qop="auth""#)
        .use_preemptive_auth(true)
        .build()
        .unwrap();
    let request = Request::builder(Method::POST, "http://api.example.com/v1/items")
        .unwrap()
        .form_param("name", "widget")
        .form_param("count", "3")
        .build();

    // Includes a fresh cnonce and digest per request
    c.bench_function("wire_request_proxied_digest_post", |b| {
        b.iter(|| {
            factory
                .new_wire_request(black_box(&request), false, Some(&proxy), Some(&realm), None)
                .unwrap()
        })
    });
}

criterion_group!(benches, benchmark_plain_get, benchmark_proxied_digest_post);
criterion_main!(benches);
