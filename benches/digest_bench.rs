use asyncnet::http::digestauth::{self, DigestParams, DigestScratch};
use asyncnet::http::realm::RealmBuilder;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url::Url;

const CHALLENGE: &str = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

fn benchmark_compute_response(c: &mut Criterion) {
    let params = DigestParams {
        principal: "Mufasa",
        realm_name: "testrealm@host.com",
        password: "Circle Of Life",
        nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093",
        cnonce: "0a4f113b",
        nc: "00000001",
        method: "GET",
        digest_uri: "/dir/index.html",
        algorithm: Some("MD5-sess"),
        qop: Some("auth-int"),
    };

    // One scratch buffer for the whole run, as a builder would use it
    let mut scratch = DigestScratch::new();
    c.bench_function("digest_compute_response", |b| {
        b.iter(|| digestauth::compute_response(&mut scratch, black_box(&params)).unwrap())
    });
}

fn benchmark_challenge_build(c: &mut Criterion) {
    let uri = Url::parse("http://www.nowhere.org/dir/index.html").unwrap();

    c.bench_function("realm_from_challenge", |b| {
        b.iter(|| {
            RealmBuilder::new(Some("Mufasa"), Some("Circle Of Life"))
                .parse_www_authenticate_header(black_box(CHALLENGE))
                .uri(Some(uri.clone()))
                .build()
                .unwrap()
        })
    });
}

criterion_group!(benches, benchmark_compute_response, benchmark_challenge_build);
criterion_main!(benches);
