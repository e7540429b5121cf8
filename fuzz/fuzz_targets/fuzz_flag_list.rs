#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stackql::{build_flags, ClientConfig, ProxyConfig};

#[derive(Arbitrary, Debug)]
struct Input {
    max_results: Option<u32>,
    page_limit: Option<u32>,
    max_depth: Option<u32>,
    api_timeout_ms: Option<u64>,
    proxy_host: Option<String>,
    proxy_port: Option<u16>,
    proxy_scheme: Option<String>,
    output_format: Option<String>,
    auth: Option<String>,
}

fuzz_target!(|input: Input| {
    let proxy = (input.proxy_host.is_some() || input.proxy_port.is_some() || input.proxy_scheme.is_some())
        .then(|| ProxyConfig {
            host: input.proxy_host,
            port: input.proxy_port,
            scheme: input.proxy_scheme,
            ..Default::default()
        });

    let config = ClientConfig {
        max_results: input.max_results,
        page_limit: input.page_limit,
        max_depth: input.max_depth,
        api_timeout_ms: input.api_timeout_ms,
        proxy,
        output_format: input.output_format,
        auth: input.auth.map(serde_json::Value::String),
        ..Default::default()
    };

    if let Ok(flags) = build_flags(&config) {
        // Flags always come in name/value pairs
        assert_eq!(flags.len() % 2, 0);
        for pair in flags.chunks(2) {
            assert!(pair[0].starts_with("--"));
        }
        // Building twice yields the same order
        assert_eq!(build_flags(&config).ok(), Some(flags));
    }
});
