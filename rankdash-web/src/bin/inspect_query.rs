//! Query Inspector - Shows how a request URI moves through the filters
//!
//! Usage: cargo run -p rankdash-web --bin inspect_query <filters-file> <uri> [namespace]
//!
//! Prints the decoded parameters, request arguments, redirect decision,
//! filter dict, group labels, canonical URL and cache key.

use rankdash_core::{FilterSetConfig, NoTranslation};
use rankdash_filters::{FilterSet, HookRegistry};
use rankdash_storage::CacheAndProfile;
use rankdash_web::{init_tracing, RequestContext, WebConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: cargo run -p rankdash-web --bin inspect_query <filters-file> <uri> [namespace]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run -p rankdash-web --bin inspect_query filters.yaml '/rank?country=EU,UK'");
        std::process::exit(1);
    }

    let config = WebConfig::from_env();
    init_tracing(&config);

    let filters_path = Path::new(&args[1]);
    let uri = &args[2];
    let namespace = args.get(3).map(String::as_str).unwrap_or("inspect");

    let filter_config = match FilterSetConfig::load(filters_path) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };
    let filters = match FilterSet::from_config(&filter_config, &HookRegistry::new()) {
        Ok(f) => f,
        Err(e) => fail(&e),
    };

    println!("FILTERS: {}", filters.keys().into_iter().collect::<Vec<_>>().join(", "));
    println!("URI:     {}", uri);
    println!();

    let ctx = match RequestContext::new(&filters, &config, uri) {
        Ok(ctx) => ctx,
        Err(e) => fail(&e),
    };

    println!("RAW PARAMS:");
    for (key, values) in ctx.raw_params().iter() {
        println!("  {:?} = {:?}", key, values);
    }
    println!();

    section("REQUEST ARGS", ctx.request_args());
    println!("REDIRECT: {}", ctx.needs_redirect());
    println!();

    let output = match ctx.filter_dict(&NoTranslation) {
        Ok(output) => output,
        Err(e) => fail(&e),
    };
    section("FILTER DICT", &output.filter_dict);
    section("LABELS", &output.labels);

    match ctx.canonical_url() {
        Ok(url) => println!("CANONICAL URL: {}", url),
        Err(e) => fail(&e),
    }

    let key = CacheAndProfile::new(namespace).cache_key(&output.filter_dict, &BTreeMap::new());
    println!("CACHE KEY:     {}", key);
}

fn section<T: Serialize>(title: &str, value: &T) {
    println!("{}:", title);
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("  <unserialisable: {}>", e),
    }
    println!();
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    std::process::exit(1);
}
